//! Free-text role classification.
//!
//! Roles arrive as arbitrary strings ("Presiding Arbitrator", "Respondent
//! State", "Third-Party Funder"). Matching is case-insensitive substring
//! containment against a keyword list, so anything containing a keyword
//! matches, including strings like "Secretary to the Tribunal". Callers that
//! need exact roles can supply their own [`RoleMatcher`].

use crate::entity::{Individual, Party};

/// Keywords that mark an individual as sitting on the tribunal.
pub const ARBITRATOR_KEYWORDS: &[&str] = &["arbitrator", "judge", "tribunal", "president"];

/// First keyword (in list order) contained in `role`, ignoring case.
pub fn matching_keyword<'k>(role: &str, keywords: &[&'k str]) -> Option<&'k str> {
    let role = role.to_lowercase();
    keywords
        .iter()
        .copied()
        .find(|kw| role.contains(&kw.to_lowercase()))
}

/// Whether `role` contains any of `keywords`, ignoring case.
pub fn classify_role(role: &str, keywords: &[&str]) -> bool {
    matching_keyword(role, keywords).is_some()
}

/// Decides whether a role string denotes a tribunal member.
pub trait RoleMatcher: Send + Sync {
    /// The label that matched, if any.
    fn matches(&self, role: &str) -> Option<&str>;

    fn is_match(&self, role: &str) -> bool {
        self.matches(role).is_some()
    }
}

/// Keyword containment matcher. Keywords are tried in the order given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordMatcher {
    keywords: Vec<String>,
}

impl KeywordMatcher {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// Matcher over [`ARBITRATOR_KEYWORDS`].
    pub fn arbitrator() -> Self {
        Self::new(ARBITRATOR_KEYWORDS)
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

impl Default for KeywordMatcher {
    fn default() -> Self {
        Self::arbitrator()
    }
}

impl RoleMatcher for KeywordMatcher {
    fn matches(&self, role: &str) -> Option<&str> {
        let role = role.to_lowercase();
        self.keywords
            .iter()
            .find(|kw| role.contains(kw.as_str()))
            .map(String::as_str)
    }
}

/// Roles a case party can hold in the case-centric output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartyRole {
    Claimant,
    Respondent,
    Funder,
}

impl PartyRole {
    /// Keywords in priority order. A funder is looked for first, then any
    /// third party.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Claimant => &["claimant"],
            Self::Respondent => &["respondent"],
            Self::Funder => &["funder", "third-party"],
        }
    }
}

/// First party holding `role`. Earlier keywords take priority over party order.
pub fn find_party(parties: &[Party], role: PartyRole) -> Option<&Party> {
    role.keywords().iter().find_map(|kw| {
        parties.iter().find(|p| {
            p.role
                .as_deref()
                .is_some_and(|r| classify_role(r, &[*kw]))
        })
    })
}

/// First individual whose role the matcher accepts.
pub fn find_arbitrator<'a>(
    individuals: &'a [Individual],
    matcher: &dyn RoleMatcher,
) -> Option<&'a Individual> {
    individuals
        .iter()
        .find(|i| i.role.as_deref().is_some_and(|r| matcher.is_match(r)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn party(id: &str, role: &str) -> Party {
        Party {
            id: id.into(),
            name: Some(format!("party {id}")),
            role: Some(role.into()),
            party_type: None,
        }
    }

    #[test]
    fn case_insensitive_substring() {
        assert!(classify_role("Presiding Arbitrator", ARBITRATOR_KEYWORDS));
        assert!(classify_role("PRESIDENT OF THE TRIBUNAL", ARBITRATOR_KEYWORDS));
        assert!(classify_role("ad hoc judge", ARBITRATOR_KEYWORDS));
        assert!(!classify_role("Counsel for Claimant", ARBITRATOR_KEYWORDS));
        assert!(!classify_role("", ARBITRATOR_KEYWORDS));
    }

    #[test]
    fn over_matches_anything_containing_a_keyword() {
        assert!(classify_role("Secretary to the Arbitrator", ARBITRATOR_KEYWORDS));
        assert!(classify_role("ASSISTANT TO THE TRIBUNAL", ARBITRATOR_KEYWORDS));
        // "arbitration" is not a superstring of "arbitrator".
        assert!(!classify_role("ARBITRATION CLERK", ARBITRATOR_KEYWORDS));
    }

    #[test]
    fn first_keyword_in_order_is_reported() {
        let role = "President of the Tribunal";
        assert_eq!(matching_keyword(role, ARBITRATOR_KEYWORDS), Some("tribunal"));
        assert_eq!(
            matching_keyword(role, &["president", "tribunal"]),
            Some("president")
        );
    }

    #[test]
    fn keyword_matcher_folds_its_own_keywords() {
        let m = KeywordMatcher::new(["Arbitrator", "", "JUDGE"]);
        assert_eq!(m.keywords(), ["arbitrator", "judge"]);
        assert_eq!(m.matches("Co-Arbitrator"), Some("arbitrator"));
        assert!(!m.is_match("Tribunal Secretary"));
        assert!(KeywordMatcher::default().is_match("Tribunal Secretary"));
    }

    #[test]
    fn find_party_by_role() {
        let parties = vec![
            party("1", "Respondent State"),
            party("2", "Claimant"),
            party("3", "Third-Party"),
            party("4", "Litigation Funder"),
        ];
        assert_eq!(find_party(&parties, PartyRole::Claimant).unwrap().id, "2");
        assert_eq!(find_party(&parties, PartyRole::Respondent).unwrap().id, "1");
        // A funder wins over an earlier third party.
        assert_eq!(find_party(&parties, PartyRole::Funder).unwrap().id, "4");
    }

    #[test]
    fn funder_falls_back_to_third_party() {
        let parties = vec![party("1", "Claimant"), party("3", "third-party intervener")];
        assert_eq!(find_party(&parties, PartyRole::Funder).unwrap().id, "3");
        assert!(find_party(&parties[..1], PartyRole::Funder).is_none());
    }

    #[test]
    fn find_arbitrator_uses_matcher() {
        let people = vec![
            Individual {
                id: "1".into(),
                name: Some("Counsel".into()),
                role: Some("Counsel".into()),
                attributes: Default::default(),
            },
            Individual {
                id: "2".into(),
                name: Some("Chair".into()),
                role: Some("President".into()),
                attributes: Default::default(),
            },
        ];
        assert_eq!(
            find_arbitrator(&people, &KeywordMatcher::arbitrator()).unwrap().id,
            "2"
        );
        assert!(find_arbitrator(&people, &KeywordMatcher::new(["judge"])).is_none());
    }
}
