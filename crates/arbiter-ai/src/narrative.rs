//! Conflict-of-interest narratives.
//!
//! The aggregated [`ArbitratorProfile`] is handed to an LLM twice: once for a
//! background narrative, and once (when the operator names counterparties)
//! for possible connections between the arbitrator and those entities. The
//! model is asked to collect, not to judge.

use std::path::Path;

use arbiter_core::ArbitratorProfile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::{GenerateRequest, LlmError, TextGenerator};

// ── Prompt templates ──

const BACKGROUND_SYSTEM_PROMPT: &str = "\
You are a legal researcher preparing material for a conflict-of-interest review of an arbitrator.

Report everything that could matter to such a review, without weighing severity or relevance:
- professional history: employers, firms, positions held and for how long
- client relationships and notable appointments, with case details
- financial interests: shareholdings, board seats, consulting and speaking income
- personal and institutional connections: family, alumni networks, memberships
- publications, speeches and public positions on investment or state disputes
- political or institutional affiliations that are a matter of public record

Be exhaustive and specific. Where a fact comes from the case data supplied, say so. \
Do not omit an item because it seems minor.";

const CONNECTIONS_SYSTEM_PROMPT: &str = "\
You look for connections between a person and a list of organisations or people.

For each entity, report:
1. direct connections (employment, board membership, representation)
2. indirect connections (shared firms, chambers, institutions, co-arbitrators)
3. documented interactions (events, publications, prior cases)

Report every possible connection, including weak or indirect ones, and name your sources.";

const DETAILED_MAX_TOKENS: u32 = 4000;
const BRIEF_MAX_TOKENS: u32 = 2000;
const BACKGROUND_TEMPERATURE: f32 = 0.7;
const CONNECTIONS_TEMPERATURE: f32 = 0.5;

/// Background request built from the full profile.
pub fn background_request(
    profile: &ArbitratorProfile,
    detailed: bool,
) -> Result<GenerateRequest, LlmError> {
    let profile_json = serde_json::to_string_pretty(profile)?;
    Ok(GenerateRequest {
        system_prompt: BACKGROUND_SYSTEM_PROMPT.to_string(),
        user_prompt: format!(
            "Collect all information about this arbitrator that could be relevant to a \
             conflict-of-interest review. The aggregated case record follows.\n\n{profile_json}"
        ),
        max_tokens: if detailed {
            DETAILED_MAX_TOKENS
        } else {
            BRIEF_MAX_TOKENS
        },
        temperature: BACKGROUND_TEMPERATURE,
    })
}

/// Connections request for `name` against `entities`.
pub fn connections_request(name: &str, entities: &[String]) -> GenerateRequest {
    let list: Vec<String> = entities.iter().map(|e| format!("- {e}")).collect();
    GenerateRequest {
        system_prompt: CONNECTIONS_SYSTEM_PROMPT.to_string(),
        user_prompt: format!(
            "Find all possible connections between arbitrator {name} \
             and the following entities:\n\n{}",
            list.join("\n")
        ),
        max_tokens: DETAILED_MAX_TOKENS,
        temperature: CONNECTIONS_TEMPERATURE,
    }
}

/// Saved result of a conflict-of-interest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoiReport {
    /// RFC 3339 timestamp.
    pub timestamp: String,
    pub arbitrator_name: String,
    pub model: String,
    pub total_cases_found: usize,
    pub background: String,
    pub connections: Option<String>,
    pub entities_searched: Vec<String>,
}

impl CoiReport {
    /// Write the report as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), LlmError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "saved report");
        Ok(())
    }
}

/// `<Name_With_Underscores>_<YYYYmmdd_HHMMSS>.json`
pub fn default_report_filename(name: &str, at: DateTime<Utc>) -> String {
    let stem: String = name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .collect();
    let stem = if stem.is_empty() { "arbitrator" } else { stem.as_str() };
    format!("{stem}_{}.json", at.format("%Y%m%d_%H%M%S"))
}

/// Run the background request and, if `entities` is non-empty, the
/// connections request.
pub async fn research<G: TextGenerator + ?Sized>(
    generator: &G,
    profile: &ArbitratorProfile,
    entities: &[String],
    detailed: bool,
) -> Result<CoiReport, LlmError> {
    let name = profile.name().ok_or(LlmError::MissingName)?;

    info!(name = %name, "collecting background");
    let background = generator
        .generate(&background_request(profile, detailed)?)
        .await?;

    let connections = if entities.is_empty() {
        None
    } else {
        info!(name = %name, entities = entities.len(), "searching connections");
        Some(
            generator
                .generate(&connections_request(&name, entities))
                .await?,
        )
    };

    Ok(CoiReport {
        timestamp: Utc::now().to_rfc3339(),
        arbitrator_name: name,
        model: generator.model_name().to_string(),
        total_cases_found: profile.total_cases_found,
        background,
        connections,
        entities_searched: entities.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use arbiter_core::{Resolution, Resource, arbitrator_profile};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    struct Recorder {
        requests: Mutex<Vec<GenerateRequest>>,
    }

    #[async_trait]
    impl TextGenerator for Recorder {
        async fn generate(&self, request: &GenerateRequest) -> Result<String, LlmError> {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            Ok(format!("answer {}", requests.len()))
        }

        fn model_name(&self) -> &str {
            "recorder"
        }
    }

    fn profile(name: Option<&str>) -> ArbitratorProfile {
        let attributes = match name {
            Some(n) => json!({"name": n, "firm": "Smith LLP"}),
            None => json!({}),
        };
        let individual: Resource = serde_json::from_value(json!({
            "id": "7",
            "type": "individuals",
            "attributes": attributes
        }))
        .unwrap();
        arbitrator_profile(&Resolution {
            individual,
            cases: vec![],
        })
    }

    fn recorder() -> Recorder {
        Recorder {
            requests: Mutex::new(Vec::new()),
        }
    }

    #[test]
    fn background_request_embeds_profile() {
        let req = background_request(&profile(Some("John Smith")), false).unwrap();
        assert_eq!(req.max_tokens, BRIEF_MAX_TOKENS);
        assert!(req.user_prompt.contains("\"firm\": \"Smith LLP\""));
        assert!(req.user_prompt.contains("\"total_cases_found\": 0"));

        let req = background_request(&profile(Some("John Smith")), true).unwrap();
        assert_eq!(req.max_tokens, DETAILED_MAX_TOKENS);
    }

    #[test]
    fn connections_request_lists_entities() {
        let entities = ["Andes Mining".to_string(), "Republic of X".to_string()];
        let req = connections_request("John Smith", &entities);
        assert!(req.user_prompt.contains("arbitrator John Smith"));
        assert!(req.user_prompt.ends_with("- Andes Mining\n- Republic of X"));
        assert_eq!(req.temperature, CONNECTIONS_TEMPERATURE);
    }

    #[test]
    fn report_filename() {
        let at = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(
            default_report_filename("Maria  de la Cruz", at),
            "Maria_de_la_Cruz_20260304_050607.json"
        );
        assert_eq!(default_report_filename("  ", at), "arbitrator_20260304_050607.json");
        assert_eq!(
            default_report_filename("A/B", at),
            "AB_20260304_050607.json"
        );
    }

    #[tokio::test]
    async fn research_without_entities_makes_one_call() {
        let generator = recorder();
        let report = research(&generator, &profile(Some("John Smith")), &[], true)
            .await
            .unwrap();
        assert_eq!(report.arbitrator_name, "John Smith");
        assert_eq!(report.model, "recorder");
        assert_eq!(report.background, "answer 1");
        assert!(report.connections.is_none());
        assert_eq!(generator.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn research_with_entities_asks_for_connections() {
        let generator = recorder();
        let entities = vec!["Andes Mining".to_string()];
        let report = research(&generator, &profile(Some("John Smith")), &entities, false)
            .await
            .unwrap();
        assert_eq!(report.connections.as_deref(), Some("answer 2"));
        assert_eq!(report.entities_searched, entities);
        let requests = generator.requests.lock().unwrap();
        assert_eq!(requests[1].system_prompt, CONNECTIONS_SYSTEM_PROMPT);
    }

    #[tokio::test]
    async fn research_requires_a_name() {
        let generator = recorder();
        let err = research(&generator, &profile(None), &[], true).await.unwrap_err();
        assert!(matches!(err, LlmError::MissingName));
        assert!(generator.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn report_saves_as_json() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("report.json");
        let report = CoiReport {
            timestamp: "2026-01-01T00:00:00+00:00".into(),
            arbitrator_name: "John Smith".into(),
            model: "m".into(),
            total_cases_found: 2,
            background: "text".into(),
            connections: None,
            entities_searched: vec![],
        };
        report.save(&path).unwrap();
        let loaded: CoiReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, report);
    }
}
