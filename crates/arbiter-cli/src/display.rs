//! Vertical text cards for case, arbitrator and report records.
//!
//! Cards go to any [`Write`] so they can be checked in tests; `main` hands
//! them a locked stdout.

use std::io::{self, Write};
use std::path::Path;

use arbiter_ai::CoiReport;
use arbiter_core::format::{ARBITRATOR_ROLE_KEY, UNTITLED_CASE};
use arbiter_core::{ArbitratorProfile, CaseSummary, Resource};
use serde_json::Value;

const MAX_LIST_ITEMS: usize = 10;
const MAX_TITLE_CHARS: usize = 60;

// ── Public API ──

/// Case-centric card: case fields, who is who, then the fetched lists.
pub fn write_case_card(w: &mut dyn Write, summary: &CaseSummary) -> io::Result<()> {
    let case = &summary.case;
    let title = case
        .attr_text("title")
        .unwrap_or_else(|| UNTITLED_CASE.to_string());
    writeln!(w, "=== {title} ===")?;
    if let Some(reference) = case.attr_text("reference") {
        writeln!(w, "{reference}")?;
    }
    writeln!(w)?;

    let mut rows = vec![("id", case.id.clone())];
    rows.extend(attribute_rows(case, &["title", "reference"]));
    write_section(w, "Case", &rows)?;

    let e = &summary.entities;
    let entities: Vec<(&str, String)> = [
        ("arbitrator", &e.arbitrator),
        ("arbitrator firm", &e.arbitrator_firm),
        ("claimant", &e.claimant),
        ("respondent", &e.respondent),
        ("funder", &e.funder),
    ]
    .into_iter()
    .filter_map(|(label, name)| name.clone().map(|n| (label, n)))
    .collect();
    write_section(w, "Entities", &entities)?;

    write_list(w, "Parties", &summary.parties, |p| labelled(p, "name", "role"))?;
    write_list(w, "Decisions", &summary.decisions, |d| labelled(d, "title", "date"))?;
    write_list(w, "Individuals", &summary.individuals, |i| {
        labelled(i, "name", "role")
    })?;
    Ok(())
}

/// Arbitrator-centric card: the individual's fields and each confirmed case.
pub fn write_profile_card(w: &mut dyn Write, profile: &ArbitratorProfile) -> io::Result<()> {
    let info = &profile.arbitrator_info;
    let name = profile.name().unwrap_or_else(|| format!("#{}", info.id));
    writeln!(w, "=== {name} ===")?;
    writeln!(w)?;

    let mut rows = vec![("id", info.id.clone())];
    rows.extend(attribute_rows(info, &["name", "total_cases_found"]));
    write_section(w, "Arbitrator", &rows)?;

    writeln!(w, "Cases ({}):", profile.total_cases_found)?;
    if profile.cases.is_empty() {
        writeln!(w, "  none confirmed")?;
    }
    for entry in profile.cases.iter().take(MAX_LIST_ITEMS) {
        match scalar(&entry.year) {
            Some(year) => writeln!(w, "  {:<30}  {year}", entry.reference)?,
            None => writeln!(w, "  {}", entry.reference)?,
        }
        writeln!(w, "      {}", truncate(&entry.title, MAX_TITLE_CHARS))?;
        writeln!(w, "      {} v. {}", entry.claimant, entry.respondent)?;

        let mut roles: Vec<String> = Vec::new();
        for decision in &entry.arbitrator_decisions {
            if let Some(role) = decision.extra.get(ARBITRATOR_ROLE_KEY).and_then(scalar)
                && !roles.contains(&role)
            {
                roles.push(role);
            }
        }
        if !roles.is_empty() {
            writeln!(w, "      role: {}", roles.join(", "))?;
        }
    }
    if profile.cases.len() > MAX_LIST_ITEMS {
        writeln!(w, "  ... and {} more", profile.cases.len() - MAX_LIST_ITEMS)?;
    }
    writeln!(w)
}

/// Summary of a saved conflict-of-interest report followed by its narratives.
pub fn write_report_card(w: &mut dyn Write, report: &CoiReport, path: &Path) -> io::Result<()> {
    writeln!(w, "=== Conflict-of-interest research: {} ===", report.arbitrator_name)?;
    writeln!(w)?;

    let entities = if report.entities_searched.is_empty() {
        "none".to_string()
    } else {
        report.entities_searched.join(", ")
    };
    write_section(
        w,
        "Report",
        &[
            ("model", report.model.clone()),
            ("cases found", report.total_cases_found.to_string()),
            ("entities searched", entities),
            ("saved to", path.display().to_string()),
        ],
    )?;

    writeln!(w, "Background")?;
    writeln!(w, "{}", report.background.trim())?;
    writeln!(w)?;
    if let Some(connections) = &report.connections {
        writeln!(w, "Connections")?;
        writeln!(w, "{}", connections.trim())?;
        writeln!(w)?;
    }
    Ok(())
}

// ── Section rendering ──

fn write_section(w: &mut dyn Write, header: &str, rows: &[(&str, String)]) -> io::Result<()> {
    if rows.is_empty() {
        return Ok(());
    }
    writeln!(w, "{header}")?;
    for (label, value) in rows {
        writeln!(w, "  {label:<26} {value}")?;
    }
    writeln!(w)
}

fn write_list(
    w: &mut dyn Write,
    header: &str,
    items: &[Resource],
    line: impl Fn(&Resource) -> String,
) -> io::Result<()> {
    if items.is_empty() {
        return Ok(());
    }
    writeln!(w, "{header} ({}):", items.len())?;
    for item in items.iter().take(MAX_LIST_ITEMS) {
        writeln!(w, "  {}", line(item))?;
    }
    if items.len() > MAX_LIST_ITEMS {
        writeln!(w, "  ... and {} more", items.len() - MAX_LIST_ITEMS)?;
    }
    writeln!(w)
}

/// Scalar attributes in key order, minus `skip`. Objects are left out.
fn attribute_rows<'a>(resource: &'a Resource, skip: &[&str]) -> Vec<(&'a str, String)> {
    resource
        .attributes
        .iter()
        .filter(|(key, _)| !skip.contains(&key.as_str()))
        .filter_map(|(key, value)| scalar(value).map(|s| (key.as_str(), s)))
        .collect()
}

/// `primary` padded, then `secondary`; falls back to `#id`.
fn labelled(resource: &Resource, primary: &str, secondary: &str) -> String {
    let main = resource
        .attr_text(primary)
        .map(|s| truncate(&s, MAX_TITLE_CHARS))
        .unwrap_or_else(|| format!("#{}", resource.id));
    match resource.attr_text(secondary) {
        Some(extra) => format!("{main:<30}  {extra}"),
        None => main,
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Object(_) => None,
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Bool(b) => Some(if *b { "yes" } else { "no" }.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(scalar).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}
