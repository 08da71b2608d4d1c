//! PubMed literature search over the NCBI E-utilities JSON API.
//!
//! Two requests per search: `esearch` for the top ids, then `esummary` for
//! their metadata. Failures never reach the caller; they are logged and the
//! search yields no articles.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::PubMedConfig;
use crate::error::AppError;

const UNKNOWN_AUTHORS: &str = "Autores desconhecidos";

/// One search hit as handed to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleSummary {
    pub id: String,
    pub title: String,
    pub authors: String,
    pub pub_date: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct PubMedClient {
    client: Client,
    base_url: String,
    article_base_url: String,
    domain_filter: String,
    max_results: usize,
}

impl PubMedClient {
    pub fn new(config: &PubMedConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Config(format!("failed to build PubMed HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            article_base_url: config.article_base_url.trim_end_matches('/').to_string(),
            domain_filter: config.domain_filter.trim().to_string(),
            max_results: config.max_results,
        })
    }

    /// Top articles for `query`, restricted to the configured domain.
    pub async fn search(&self, query: &str) -> Vec<ArticleSummary> {
        match self.try_search(query).await {
            Ok(articles) => {
                info!(query, count = articles.len(), "pubmed search finished");
                articles
            }
            Err(e) => {
                warn!(query, error = %e, "pubmed search failed");
                Vec::new()
            }
        }
    }

    async fn try_search(&self, query: &str) -> Result<Vec<ArticleSummary>, reqwest::Error> {
        let term = if self.domain_filter.is_empty() {
            query.to_string()
        } else {
            format!("{query} AND {}", self.domain_filter)
        };
        let retmax = self.max_results.to_string();

        let search: ESearchResponse = self
            .client
            .get(format!("{}/esearch.fcgi", self.base_url))
            .query(&[
                ("db", "pubmed"),
                ("term", term.as_str()),
                ("retmode", "json"),
                ("retmax", retmax.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let ids = search.esearchresult.idlist;
        if ids.is_empty() {
            debug!(%term, "pubmed search returned no ids");
            return Ok(Vec::new());
        }

        let joined = ids.join(",");
        let summary: ESummaryResponse = self
            .client
            .get(format!("{}/esummary.fcgi", self.base_url))
            .query(&[("db", "pubmed"), ("id", joined.as_str()), ("retmode", "json")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut result = summary.result;
        let articles = result
            .uids
            .iter()
            .filter_map(|uid| {
                let entry = result.entries.remove(uid)?;
                match serde_json::from_value::<ESummaryItem>(entry) {
                    Ok(item) => Some(self.to_article(uid, item)),
                    Err(e) => {
                        debug!(uid, error = %e, "skipping malformed esummary entry");
                        None
                    }
                }
            })
            .collect();

        Ok(articles)
    }

    fn to_article(&self, uid: &str, item: ESummaryItem) -> ArticleSummary {
        let id = item.uid.unwrap_or_else(|| uid.to_string());
        ArticleSummary {
            url: format!("{}/{id}/", self.article_base_url),
            title: item.title,
            authors: format_authors(item.authors.as_deref()),
            pub_date: item.pubdate,
            id,
        }
    }
}

/// First two names joined by `", "`, plus `" et al."` when there are more.
pub fn format_authors(authors: Option<&[Author]>) -> String {
    let Some(authors) = authors.filter(|a| !a.is_empty()) else {
        return UNKNOWN_AUTHORS.to_string();
    };
    let mut out = authors
        .iter()
        .take(2)
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    if authors.len() > 2 {
        out.push_str(" et al.");
    }
    out
}

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ESearchResponse {
    esearchresult: ESearchResult,
}

#[derive(Debug, Deserialize)]
struct ESearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ESummaryResponse {
    result: ESummaryResult,
}

/// `result` holds `uids` plus one object per uid keyed by the uid itself.
#[derive(Debug, Deserialize)]
struct ESummaryResult {
    #[serde(default)]
    uids: Vec<String>,
    #[serde(flatten)]
    entries: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ESummaryItem {
    #[serde(default)]
    uid: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    pubdate: String,
    #[serde(default)]
    authors: Option<Vec<Author>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Author {
    pub name: String,
}
