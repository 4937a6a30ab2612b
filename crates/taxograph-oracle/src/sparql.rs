//! SPARQL endpoint client
//!
//! Implements the engine's oracle traits over an HTTP SPARQL endpoint with
//! JSON results. Batched selects chunk their VALUES lists so large identifier
//! sets stay within endpoint limits.

use crate::error::{OracleError, OracleResult};
use crate::response::{join_values, parse_ask, parse_bindings};
use async_trait::async_trait;
use serde_json::Value;
use taxograph_core::{
    title_case, ClassificationOracle, EntityId, Error, LabelLookup, LabeledEntity, Record,
};
use tracing::debug;

pub const WIKIDATA_ENDPOINT: &str = "https://query.wikidata.org/sparql";
pub const WIKIDATA_ENTITY_PREFIX: &str = "http://www.wikidata.org/entity/";

const DEFAULT_BATCH_SIZE: usize = 400;

/// Client for a SPARQL endpoint serving `application/sparql-results+json`
#[derive(Debug, Clone)]
pub struct SparqlClient {
    endpoint: String,
    entity_prefix: String,
    batch_size: usize,
    http: reqwest::Client,
}

impl Default for SparqlClient {
    fn default() -> Self {
        Self::new(WIKIDATA_ENDPOINT)
    }
}

impl SparqlClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            entity_prefix: WIKIDATA_ENTITY_PREFIX.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            http: reqwest::Client::new(),
        }
    }

    pub fn with_entity_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.entity_prefix = prefix.into();
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn query_json(&self, query: &str) -> OracleResult<Value> {
        debug!(endpoint = %self.endpoint, "sparql query: {query}");
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("query", query), ("format", "json")])
            .header("Accept", "application/sparql-results+json")
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// Run an ASK query
    pub async fn run_ask(&self, query: &str) -> OracleResult<bool> {
        let body = self.query_json(query).await?;
        parse_ask(&body)
    }

    /// Run a SELECT query and flatten the bindings
    pub async fn run_select(&self, query: &str, fields: &[&str]) -> OracleResult<Vec<Record>> {
        let body = self.query_json(query).await?;
        parse_bindings(&body, fields)
    }

    /// Run a SELECT template once per chunk of `values`, substituting the
    /// joined chunk for the `{values}` placeholder.
    ///
    /// `prefix` is applied to every value before joining (`Some("wd:")` for
    /// entity terms, `Some("str")` for quoted literals, `None` for raw terms).
    pub async fn bulk_select(
        &self,
        values: &[String],
        template: &str,
        fields: &[&str],
        prefix: Option<&str>,
    ) -> OracleResult<Vec<Record>> {
        let mut records = Vec::new();
        for chunk in values.chunks(self.batch_size) {
            let query = template.replace("{values}", &join_values(chunk, prefix));
            records.extend(self.run_select(&query, fields).await?);
        }
        Ok(records)
    }
}

fn to_core_error(e: OracleError) -> Error {
    Error::Oracle(e.to_string())
}

#[async_trait]
impl ClassificationOracle for SparqlClient {
    async fn ask(&self, query: &str) -> taxograph_core::Result<bool> {
        self.run_ask(query).await.map_err(to_core_error)
    }

    async fn select(&self, query: &str, fields: &[&str]) -> taxograph_core::Result<Vec<Record>> {
        self.run_select(query, fields).await.map_err(to_core_error)
    }
}

#[async_trait]
impl LabelLookup for SparqlClient {
    async fn labels_of(&self, ids: &[EntityId]) -> taxograph_core::Result<Vec<LabeledEntity>> {
        let values: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        let template = "SELECT ?entity ?entityLabel WHERE { \
             VALUES ?entity { {values} } \
             ?entity rdfs:label ?entityLabel . \
             FILTER (LANG(?entityLabel) = 'en') }";
        let records = self
            .bulk_select(&values, template, &["entity", "entityLabel"], Some("wd:"))
            .await
            .map_err(to_core_error)?;

        let mut labels: std::collections::HashMap<EntityId, String> = records
            .into_iter()
            .filter_map(|mut r| {
                let entity = r.remove("entity")?;
                let label = r.remove("entityLabel")?;
                Some((
                    EntityId::from_uri(&entity, &self.entity_prefix),
                    title_case(&label),
                ))
            })
            .collect();
        Ok(ids
            .iter()
            .map(|id| LabeledEntity::new(id.clone(), labels.remove(id)))
            .collect())
    }
}
