//! Case resolution: turns a free-text name into a confirmed individual and
//! the cases they sat on, by paginating the decision search and cross-checking
//! each case's decisions.
//!
//! # Algorithm
//!
//! 1. Search decisions for the name with individuals side-loaded; the first
//!    side-loaded individual whose name contains the query (ignoring case)
//!    wins. Ties go to API response order; near-namesakes are not told apart.
//! 2. Page through the decision search for that individual's name with cases
//!    side-loaded, collecting distinct case IDs in first-seen order. Stop at
//!    the cap, on an empty page, or on the API's last page.
//! 3. For each case, keep only the decisions whose individuals include the
//!    resolved id. Cases with no such decision are dropped.
//!
//! Every request is awaited before the next is sent.

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::{Envelope, FetchError, Resource};

/// Page size used for decision searches unless overridden.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Query for `GET /decisions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionSearch {
    pub search: String,
    pub fields: Option<String>,
    pub include: Option<String>,
    pub page: u32,
    pub count: u32,
}

impl DecisionSearch {
    /// First page of decisions mentioning `name`, with individuals side-loaded.
    pub fn for_individuals(name: &str) -> Self {
        Self {
            search: name.to_string(),
            fields: Some("individuals.name".into()),
            include: Some("individuals".into()),
            page: 1,
            count: DEFAULT_PAGE_SIZE,
        }
    }

    /// One page of decisions mentioning `name`, with cases side-loaded.
    pub fn for_cases(name: &str, page: u32) -> Self {
        Self {
            search: name.to_string(),
            fields: Some("individuals.name".into()),
            include: Some("cases".into()),
            page,
            count: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    /// Query-string pairs in a stable order.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("search", self.search.clone())];
        if let Some(fields) = &self.fields {
            pairs.push(("fields", fields.clone()));
        }
        if let Some(include) = &self.include {
            pairs.push(("include", include.clone()));
        }
        pairs.push(("page", self.page.to_string()));
        pairs.push(("count", self.count.to_string()));
        pairs
    }
}

/// The upstream resources the aggregator reads.
#[async_trait]
pub trait CaseApi: Send + Sync {
    /// `GET /cases?page=&count=`
    async fn list_cases(&self, page: u32, count: u32) -> Result<Envelope, FetchError>;
    /// `GET /cases/{id}`
    async fn get_case(&self, case_id: &str) -> Result<Envelope, FetchError>;
    /// `GET /cases/{id}/parties`
    async fn case_parties(&self, case_id: &str) -> Result<Envelope, FetchError>;
    /// `GET /cases/{id}/decisions`
    async fn case_decisions(&self, case_id: &str) -> Result<Envelope, FetchError>;
    /// `GET /decisions?search=...`
    async fn search_decisions(&self, search: &DecisionSearch) -> Result<Envelope, FetchError>;
    /// `GET /decisions/{id}/individuals`
    async fn decision_individuals(&self, decision_id: &str) -> Result<Envelope, FetchError>;
    /// `GET /individuals/{id}`
    async fn get_individual(&self, individual_id: &str) -> Result<Envelope, FetchError>;
}

/// Distinct case IDs in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseIds {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl CaseIds {
    /// Add `id` unless already present. Returns whether it was new.
    pub fn insert(&mut self, id: &str) -> bool {
        if self.seen.contains(id) {
            return false;
        }
        self.seen.insert(id.to_string());
        self.order.push(id.to_string());
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.order
    }
}

/// Everything fetched for one case in the case-centric view.
#[derive(Debug, Clone)]
pub struct CaseRecord {
    pub case: Resource,
    pub parties: Vec<Resource>,
    pub decisions: Vec<Resource>,
    /// Individuals of every decision, concatenated in decision order.
    pub individuals: Vec<Resource>,
}

/// A decision confirmed to involve the resolved individual.
#[derive(Debug, Clone)]
pub struct ConfirmedDecision {
    pub decision: Resource,
    /// The individual's role as listed on this decision.
    pub role: Option<String>,
}

/// A case with at least one confirmed decision.
#[derive(Debug, Clone)]
pub struct ResolvedCase {
    pub id: String,
    pub case: Resource,
    pub parties: Vec<Resource>,
    pub decisions: Vec<ConfirmedDecision>,
}

/// Result of resolving a name.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub individual: Resource,
    pub cases: Vec<ResolvedCase>,
}

/// Drives a [`CaseApi`] through the resolution steps.
pub struct Resolver<'a, A: CaseApi + ?Sized> {
    api: &'a A,
    page_size: u32,
}

impl<'a, A: CaseApi + ?Sized> Resolver<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self {
            api,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Resolve `name` and collect up to `target_case_count` confirmed cases.
    ///
    /// Returns `Ok(None)` when no individual matches. Only a failure of the
    /// initial search is returned as an error; per-case failures are logged
    /// and the case skipped.
    pub async fn resolve(
        &self,
        name: &str,
        target_case_count: usize,
    ) -> Result<Option<Resolution>, FetchError> {
        let Some(individual) = self.find_individual(name).await? else {
            info!(name, "no individual matches");
            return Ok(None);
        };
        let individual = self.enrich_individual(individual).await;
        let search_name = individual
            .attr_text("name")
            .unwrap_or_else(|| name.to_string());
        info!(id = %individual.id, name = %search_name, "resolved individual");

        let case_ids = self.collect_case_ids(&search_name, target_case_count).await;
        info!(count = case_ids.len(), "collected candidate cases");

        let mut cases = Vec::new();
        for case_id in case_ids.iter().take(target_case_count) {
            match self.confirm_case(case_id, &individual.id).await {
                Ok(Some(case)) => cases.push(case),
                Ok(None) => {
                    debug!(case_id, "no decision in case confirms the individual");
                }
                Err(e) => {
                    warn!(case_id, error = %e, "skipping case");
                }
            }
        }
        info!(count = cases.len(), "confirmed cases");

        Ok(Some(Resolution { individual, cases }))
    }

    /// First side-loaded individual whose name contains `name`, ignoring case.
    pub async fn find_individual(&self, name: &str) -> Result<Option<Resource>, FetchError> {
        let search = DecisionSearch::for_individuals(name).with_count(self.page_size);
        let envelope = self.api.search_decisions(&search).await?;
        let needle = name.to_lowercase();
        Ok(envelope
            .included_of_type("individuals")
            .into_iter()
            .find(|ind| {
                ind.attr_text("name")
                    .is_some_and(|n| n.to_lowercase().contains(&needle))
            }))
    }

    /// Overlay the full `/individuals/{id}` record on the side-loaded one.
    /// Falls back to the side-loaded record if the fetch fails.
    async fn enrich_individual(&self, mut individual: Resource) -> Resource {
        let detail = match self.api.get_individual(&individual.id).await {
            Ok(env) => env.single(),
            Err(e) => Err(e),
        };
        match detail {
            Ok(detail) => {
                for (key, value) in detail.attributes {
                    if !value.is_null() {
                        individual.attributes.insert(key, value);
                    }
                }
                if individual.relationships.is_none() {
                    individual.relationships = detail.relationships;
                }
            }
            Err(e) => {
                warn!(
                    id = %individual.id,
                    error = %e,
                    "individual details unavailable, using search record"
                );
            }
        }
        individual
    }

    /// Page through the decision search collecting distinct case IDs.
    ///
    /// Never returns more than `target` IDs. A failing page ends pagination
    /// and keeps what was found so far.
    pub async fn collect_case_ids(&self, name: &str, target: usize) -> CaseIds {
        let mut ids = CaseIds::default();
        if target == 0 {
            return ids;
        }

        let mut page = 1u32;
        loop {
            let search = DecisionSearch::for_cases(name, page).with_count(self.page_size);
            let envelope = match self.api.search_decisions(&search).await {
                Ok(env) => env,
                Err(e) => {
                    warn!(
                        page,
                        error = %e,
                        "decision search page failed, keeping cases found so far"
                    );
                    break;
                }
            };
            let decisions = match envelope.list() {
                Ok(d) => d,
                Err(e) => {
                    warn!(
                        page,
                        error = %e,
                        "decision search page malformed, keeping cases found so far"
                    );
                    break;
                }
            };
            if decisions.is_empty() {
                debug!(page, "no more decisions");
                break;
            }

            for case in envelope.included_of_type("cases") {
                if ids.insert(&case.id) {
                    debug!(case_id = %case.id, page, "found case");
                }
                if ids.len() >= target {
                    break;
                }
            }

            if ids.len() >= target || page >= envelope.total_pages() {
                break;
            }
            page += 1;
        }
        ids
    }

    /// Fetch a case and keep the decisions that list `individual_id`.
    ///
    /// `Ok(None)` means the case exists but no decision confirms the individual.
    pub async fn confirm_case(
        &self,
        case_id: &str,
        individual_id: &str,
    ) -> Result<Option<ResolvedCase>, FetchError> {
        let case = self.api.get_case(case_id).await?.single()?;
        let parties = self.api.case_parties(case_id).await?.list()?;
        let decisions = self.api.case_decisions(case_id).await?.list()?;

        let mut confirmed = Vec::new();
        for decision in decisions {
            let individuals = self.decision_individuals(&decision.id).await;
            if let Some(found) = individuals.iter().find(|i| i.id == individual_id) {
                confirmed.push(ConfirmedDecision {
                    role: found.attr_text("role"),
                    decision,
                });
            }
        }

        if confirmed.is_empty() {
            return Ok(None);
        }
        Ok(Some(ResolvedCase {
            id: case_id.to_string(),
            case,
            parties,
            decisions: confirmed,
        }))
    }

    /// Individuals on a decision. Failures degrade to an empty list.
    pub async fn decision_individuals(&self, decision_id: &str) -> Vec<Resource> {
        let result = match self.api.decision_individuals(decision_id).await {
            Ok(env) => env.list(),
            Err(e) => Err(e),
        };
        result.unwrap_or_else(|e| {
            warn!(decision_id, error = %e, "could not fetch decision individuals");
            Vec::new()
        })
    }

    /// Fetch a case with its parties, decisions, and the decisions' individuals.
    pub async fn fetch_case(&self, case_id: &str) -> Result<CaseRecord, FetchError> {
        info!(case_id, "fetching case");
        let case = self.api.get_case(case_id).await?.single()?;
        let parties = self.api.case_parties(case_id).await?.list()?;
        let decisions = self.api.case_decisions(case_id).await?.list()?;

        let mut individuals = Vec::new();
        for decision in &decisions {
            individuals.extend(self.decision_individuals(&decision.id).await);
        }
        info!(
            parties = parties.len(),
            decisions = decisions.len(),
            individuals = individuals.len(),
            "fetched case"
        );

        Ok(CaseRecord {
            case,
            parties,
            decisions,
            individuals,
        })
    }

    /// ID of the first case the API lists.
    pub async fn first_case_id(&self) -> Result<String, FetchError> {
        self.api
            .list_cases(1, 1)
            .await?
            .list()?
            .into_iter()
            .next()
            .map(|c| c.id)
            .ok_or_else(|| FetchError::NotFound("no cases available".into()))
    }
}

/// Resolve `name` against `api` with the default page size.
pub async fn resolve_individual_and_cases<A: CaseApi + ?Sized>(
    api: &A,
    name: &str,
    target_case_count: usize,
) -> Result<Option<Resolution>, FetchError> {
    Resolver::new(api).resolve(name, target_case_count).await
}
