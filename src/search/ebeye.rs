//! EBI Search Client
//!
//! Read-only queries against the EBI Search REST service (JSON flavour):
//! - domain hierarchy and per-domain field descriptions
//! - text queries with paging, sorting and facets
//! - entry retrieval and cross-references between domains
//! - top terms of a field
//!
//! Every request adds `format=json`. Failures surface as [`SearchError`].

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::utils::http::{build_client, error_description};

/// Errors that can occur during search operations
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse search results: {0}")]
    ParseError(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        SearchError::RequestFailed(e.to_string())
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(e: serde_json::Error) -> Self {
        SearchError::ParseError(e.to_string())
    }
}

/// A search domain. Which members are filled depends on the call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub subdomains: Vec<Domain>,
    #[serde(default)]
    pub index_infos: Vec<NameValue>,
    #[serde(default)]
    pub field_infos: Vec<FieldInfo>,
    #[serde(default)]
    pub reference_entry_count: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NameValue {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FieldInfo {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub options: Vec<NameValue>,
}

impl FieldInfo {
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.name == name)
            .map(|o| o.value.as_str())
    }
}

/// One hit. `fields` maps each requested field to its values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, Vec<String>>,
    #[serde(default, rename = "fieldURLs")]
    pub field_urls: Vec<NameValue>,
    #[serde(default, rename = "viewURLs")]
    pub view_urls: Vec<NameValue>,
    #[serde(default)]
    pub reference_count: Option<u64>,
    #[serde(default)]
    pub references: Vec<Entry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Facet {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub facet_values: Vec<FacetValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FacetValue {
    pub label: String,
    pub value: String,
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TopTerm {
    pub text: String,
    #[serde(default)]
    pub doc_freq: u64,
}

/// Envelope shared by every response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    #[serde(default)]
    pub hit_count: Option<u64>,
    #[serde(default)]
    pub entries: Vec<Entry>,
    #[serde(default)]
    pub facets: Vec<Facet>,
    #[serde(default)]
    pub domains: Vec<Domain>,
    #[serde(default)]
    pub top_terms: Vec<TopTerm>,
}

/// Query options. Unset members are left to the service defaults.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub query: String,
    pub fields: Vec<String>,
    pub start: Option<u32>,
    pub size: Option<u32>,
    pub field_url: bool,
    pub view_url: bool,
    pub sort_field: Option<String>,
    pub order: Option<String>,
    pub facet_count: Option<u32>,
    pub facet_fields: Vec<String>,
    pub facets: Vec<String>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn with_fields(mut self, fields: &str) -> Self {
        self.fields = split_list(fields);
        self
    }

    pub fn with_page(mut self, start: Option<u32>, size: Option<u32>) -> Self {
        self.start = start;
        self.size = size;
        self
    }

    fn to_params(&self, faceted: bool) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if !self.query.is_empty() {
            params.push(("query", self.query.clone()));
        }
        push_paging(&mut params, &self.fields, self.start, self.size, self.field_url, self.view_url);
        if let Some(sort) = &self.sort_field {
            params.push(("sortfield", sort.clone()));
        }
        if let Some(order) = &self.order {
            params.push(("order", order.clone()));
        }
        if faceted {
            if let Some(count) = self.facet_count {
                params.push(("facetcount", count.to_string()));
            }
            if !self.facet_fields.is_empty() {
                params.push(("facetfields", self.facet_fields.join(",")));
            }
            if !self.facets.is_empty() {
                params.push(("facets", self.facets.join(",")));
            }
        }
        params
    }
}

fn push_paging(
    params: &mut Vec<(&'static str, String)>,
    fields: &[String],
    start: Option<u32>,
    size: Option<u32>,
    field_url: bool,
    view_url: bool,
) {
    if !fields.is_empty() {
        params.push(("fields", fields.join(",")));
    }
    if let Some(start) = start {
        params.push(("start", start.to_string()));
    }
    if let Some(size) = size {
        params.push(("size", size.to_string()));
    }
    if field_url {
        params.push(("fieldurl", "true".to_string()));
    }
    if view_url {
        params.push(("viewurl", "true".to_string()));
    }
}

/// Split a comma separated list, dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub struct EbeyeClient {
    client: Client,
    base_url: String,
}

impl EbeyeClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SearchError> {
        let client =
            build_client("ebeye", timeout).map_err(|e| SearchError::RequestFailed(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&'static str, String)],
    ) -> Result<T, SearchError> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(url = %url, params = params.len(), "GET");

        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("format", "json")])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SearchError::RequestFailed(format!(
                "{} {}",
                status.as_u16(),
                error_description(&body)
            )));
        }
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn domain_hierarchy(&self) -> Result<Vec<Domain>, SearchError> {
        let result: SearchResult = self.get("allebi", &[]).await?;
        Ok(result.domains)
    }

    pub async fn domain_details(&self, domain: &str) -> Result<Vec<Domain>, SearchError> {
        let result: SearchResult = self.get(domain, &[]).await?;
        Ok(result.domains)
    }

    pub async fn number_of_results(&self, domain: &str, query: &str) -> Result<u64, SearchError> {
        let params = [("query", query.to_string()), ("size", "0".to_string())];
        let result: SearchResult = self.get(domain, &params).await?;
        let hits = result
            .hit_count
            .ok_or_else(|| SearchError::ParseError("response has no hitCount".to_string()))?;
        info!(domain = %domain, hits, "Counted results");
        Ok(hits)
    }

    pub async fn results(&self, domain: &str, query: &SearchQuery) -> Result<Vec<Entry>, SearchError> {
        let result: SearchResult = self.get(domain, &query.to_params(false)).await?;
        Ok(result.entries)
    }

    /// Entries plus facets.
    pub async fn faceted_results(
        &self,
        domain: &str,
        query: &SearchQuery,
    ) -> Result<SearchResult, SearchError> {
        self.get(domain, &query.to_params(true)).await
    }

    /// `ids` is comma separated.
    pub async fn entries(
        &self,
        domain: &str,
        ids: &str,
        fields: &[String],
        field_url: bool,
        view_url: bool,
    ) -> Result<Vec<Entry>, SearchError> {
        let mut params = Vec::new();
        push_paging(&mut params, fields, None, None, field_url, view_url);
        let result: SearchResult = self
            .get(&format!("{}/entry/{}", domain, ids), &params)
            .await?;
        Ok(result.entries)
    }

    pub async fn domains_referenced_in_domain(&self, domain: &str) -> Result<Vec<Domain>, SearchError> {
        let result: SearchResult = self.get(&format!("{}/xref", domain), &[]).await?;
        Ok(result.domains)
    }

    pub async fn domains_referenced_in_entry(
        &self,
        domain: &str,
        entry: &str,
    ) -> Result<Vec<Domain>, SearchError> {
        let result: SearchResult = self
            .get(&format!("{}/entry/{}/xref", domain, entry), &[])
            .await?;
        Ok(result.domains)
    }

    /// Entries of `ref_domain` referenced by `ids`; only `fields`, paging
    /// and the URL switches of `query` are used.
    pub async fn referenced_entries(
        &self,
        domain: &str,
        ids: &str,
        ref_domain: &str,
        query: &SearchQuery,
    ) -> Result<Vec<Entry>, SearchError> {
        let mut params = Vec::new();
        push_paging(
            &mut params,
            &query.fields,
            query.start,
            query.size,
            query.field_url,
            query.view_url,
        );
        let result: SearchResult = self
            .get(&format!("{}/entry/{}/xref/{}", domain, ids, ref_domain), &params)
            .await?;
        Ok(result.entries)
    }

    pub async fn top_terms(
        &self,
        domain: &str,
        field: &str,
        size: Option<u32>,
    ) -> Result<Vec<TopTerm>, SearchError> {
        let params: Vec<_> = size.map(|s| ("size", s.to_string())).into_iter().collect();
        let result: SearchResult = self
            .get(&format!("{}/topterms/{}", domain, field), &params)
            .await?;
        Ok(result.top_terms)
    }
}
