//! Output shapes.
//!
//! Both shapes are projections of what was fetched. Missing fields get a
//! neutral placeholder; nothing here invents people or companies.

use serde::Serialize;
use serde_json::Value;

use crate::classify::{PartyRole, RoleMatcher, find_arbitrator, find_party};
use crate::entity::{Case, Individual, Party};
use crate::resolve::{CaseRecord, Resolution, ResolvedCase};
use crate::Resource;

pub const UNTITLED_CASE: &str = "Untitled Case";
pub const NO_REFERENCE: &str = "No Reference";
pub const UNKNOWN_CLAIMANT: &str = "Unknown Claimant";
pub const UNKNOWN_RESPONDENT: &str = "Unknown Respondent";

/// Key added to each confirmed decision in the arbitrator-centric shape.
pub const ARBITRATOR_ROLE_KEY: &str = "arbitrator_role";

/// Case-centric shape: the raw records plus who is who.
#[derive(Debug, Clone, Serialize)]
pub struct CaseSummary {
    pub case: Resource,
    pub parties: Vec<Resource>,
    pub decisions: Vec<Resource>,
    pub individuals: Vec<Resource>,
    pub entities: CaseEntities,
}

/// Names picked out of a case by role. `None` when nobody holds the role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CaseEntities {
    pub arbitrator: Option<String>,
    /// The `firm` attribute of the individual named in `arbitrator`.
    pub arbitrator_firm: Option<String>,
    pub claimant: Option<String>,
    pub respondent: Option<String>,
    pub funder: Option<String>,
}

pub fn case_summary(record: &CaseRecord, matcher: &dyn RoleMatcher) -> CaseSummary {
    let parties: Vec<Party> = record.parties.iter().map(Party::from_resource).collect();
    let individuals: Vec<Individual> = record
        .individuals
        .iter()
        .map(Individual::from_resource)
        .collect();
    let party_name = |role| find_party(&parties, role).and_then(|p| p.name.clone());
    let arbitrator = find_arbitrator(&individuals, matcher);

    let entities = CaseEntities {
        arbitrator: arbitrator.and_then(|i| i.name.clone()),
        arbitrator_firm: arbitrator.and_then(|i| i.firm()),
        claimant: party_name(PartyRole::Claimant),
        respondent: party_name(PartyRole::Respondent),
        funder: party_name(PartyRole::Funder),
    };

    CaseSummary {
        case: record.case.clone(),
        parties: record.parties.clone(),
        decisions: record.decisions.clone(),
        individuals: record.individuals.clone(),
        entities,
    }
}

/// Arbitrator-centric shape.
#[derive(Debug, Clone, Serialize)]
pub struct ArbitratorProfile {
    pub arbitrator_info: Resource,
    pub cases: Vec<CaseEntry>,
    pub total_cases_found: usize,
}

impl ArbitratorProfile {
    pub fn name(&self) -> Option<String> {
        self.arbitrator_info.attr_text("name")
    }
}

/// One case in an [`ArbitratorProfile`].
#[derive(Debug, Clone, Serialize)]
pub struct CaseEntry {
    pub id: String,
    pub title: String,
    pub reference: String,
    pub year: Value,
    pub claimant: String,
    pub respondent: String,
    pub full_case_details: Resource,
    pub parties: Vec<Resource>,
    /// Decision records with [`ARBITRATOR_ROLE_KEY`] added.
    pub arbitrator_decisions: Vec<Resource>,
}

impl CaseEntry {
    pub fn from_resolved(resolved: &ResolvedCase) -> Self {
        let case = Case::from_resource(&resolved.case);
        let parties: Vec<Party> = resolved.parties.iter().map(Party::from_resource).collect();
        let party_name = |role, fallback: &str| {
            find_party(&parties, role)
                .and_then(|p| p.name.clone())
                .unwrap_or_else(|| fallback.to_string())
        };

        let arbitrator_decisions = resolved
            .decisions
            .iter()
            .map(|confirmed| {
                let mut decision = confirmed.decision.clone();
                let role = confirmed.role.clone().map(Value::String).unwrap_or(Value::Null);
                decision
                    .extra
                    .entry(ARBITRATOR_ROLE_KEY.to_string())
                    .or_insert(role);
                decision
            })
            .collect();

        Self {
            id: resolved.id.clone(),
            title: case.title.unwrap_or_else(|| UNTITLED_CASE.to_string()),
            reference: case.reference.unwrap_or_else(|| NO_REFERENCE.to_string()),
            year: case.year.unwrap_or(Value::Null),
            claimant: party_name(PartyRole::Claimant, UNKNOWN_CLAIMANT),
            respondent: party_name(PartyRole::Respondent, UNKNOWN_RESPONDENT),
            full_case_details: resolved.case.clone(),
            parties: resolved.parties.clone(),
            arbitrator_decisions,
        }
    }
}

pub fn arbitrator_profile(resolution: &Resolution) -> ArbitratorProfile {
    let cases: Vec<CaseEntry> = resolution.cases.iter().map(CaseEntry::from_resolved).collect();
    let mut arbitrator_info = resolution.individual.clone();
    arbitrator_info
        .attributes
        .insert("total_cases_found".into(), Value::from(cases.len()));

    ArbitratorProfile {
        arbitrator_info,
        total_cases_found: cases.len(),
        cases,
    }
}
