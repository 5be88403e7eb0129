//! Typed views over the generic [`Resource`] records returned by the case API.

use serde_json::{Map, Value};

use crate::Resource;

/// An arbitration case.
#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub id: String,
    pub title: Option<String>,
    pub reference: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub organization: Option<String>,
    /// Passed through as sent: the API uses both numbers and strings.
    pub year: Option<Value>,
}

impl Case {
    pub fn from_resource(r: &Resource) -> Self {
        Self {
            id: r.id.clone(),
            title: r.attr_text("title"),
            reference: r.attr_text("reference"),
            status: r.attr_text("status"),
            start_date: r.attr_text("startDate"),
            end_date: r.attr_text("endDate"),
            organization: r.attr_text("organization"),
            year: r.attr("year").cloned(),
        }
    }
}

/// A party to a case. `role` is free text ("Claimant", "Respondent State", ...).
#[derive(Debug, Clone, PartialEq)]
pub struct Party {
    pub id: String,
    pub name: Option<String>,
    pub role: Option<String>,
    pub party_type: Option<String>,
}

impl Party {
    pub fn from_resource(r: &Resource) -> Self {
        Self {
            id: r.id.clone(),
            name: r.attr_text("name"),
            role: r.attr_text("role"),
            party_type: r.attr_text("type"),
        }
    }
}

/// A person appearing in decisions: arbitrators, counsel, experts.
///
/// `attributes` keeps everything the API sent (firm, nationality, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    pub id: String,
    pub name: Option<String>,
    pub role: Option<String>,
    pub attributes: Map<String, Value>,
}

impl Individual {
    pub fn from_resource(r: &Resource) -> Self {
        Self {
            id: r.id.clone(),
            name: r.attr_text("name"),
            role: r.attr_text("role"),
            attributes: r.attributes.clone(),
        }
    }

    /// `firm` attribute, blank counted as absent.
    pub fn firm(&self) -> Option<String> {
        match self.attributes.get("firm")? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn case_view_reads_camel_case_dates() {
        let r: Resource = serde_json::from_value(json!({
            "id": "100",
            "type": "cases",
            "attributes": {
                "title": "Company A v. State B",
                "reference": "ARB/21/123",
                "startDate": "2021-03-15",
                "endDate": "",
                "organization": "ICSID",
                "year": 2021
            }
        }))
        .unwrap();
        let case = Case::from_resource(&r);
        assert_eq!(case.start_date.as_deref(), Some("2021-03-15"));
        assert_eq!(case.end_date, None);
        assert_eq!(case.year, Some(json!(2021)));
        assert_eq!(case.status, None);
    }

    #[test]
    fn individual_keeps_free_form_attributes() {
        let r: Resource = serde_json::from_value(json!({
            "id": "7",
            "type": "individuals",
            "attributes": {"name": "John Smith", "firm": "Smith LLP", "nationality": "Swiss"}
        }))
        .unwrap();
        let ind = Individual::from_resource(&r);
        assert_eq!(ind.name.as_deref(), Some("John Smith"));
        assert_eq!(ind.role, None);
        assert_eq!(ind.attributes["firm"], "Smith LLP");
        assert_eq!(ind.firm().as_deref(), Some("Smith LLP"));
    }
}
