//! Attribution metadata from commit history.
//!
//! Each document is looked up in a [`CommitHistory`] source; the commits
//! since a cutoff give `lastUpdated` and extend `contributors`. Failures of
//! any kind leave the document as parsed.

use crate::config::AttributionConfig;
use crate::models::{Attributes, ParsedDocument, CONTRIBUTORS_KEY, LAST_UPDATED_KEY};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("docjson/", env!("CARGO_PKG_VERSION"));

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Failed to build HTTP client: {0}")]
    Client(reqwest::Error),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Unexpected status {0}")]
    Status(StatusCode),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

/// A commit as returned by the history API
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CommitRecord {
    /// Account that authored the commit; null when it maps to no account
    #[serde(default)]
    pub author: Option<CommitAccount>,
    pub commit: CommitDetails,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CommitAccount {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CommitDetails {
    #[serde(default)]
    pub author: Option<CommitSignature>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CommitSignature {
    pub date: DateTime<Utc>,
}

impl CommitRecord {
    pub fn login(&self) -> Option<&str> {
        self.author.as_ref().map(|a| a.login.as_str())
    }

    pub fn authored_at(&self) -> Option<DateTime<Utc>> {
        self.commit.author.as_ref().map(|a| a.date)
    }
}

/// Outcome of a history lookup
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryResponse {
    Commits(Vec<CommitRecord>),
    RateLimited,
}

/// Source of per-file commit history
#[async_trait]
pub trait CommitHistory: Send + Sync {
    async fn commits(
        &self,
        path: &str,
        since: DateTime<Utc>,
    ) -> Result<HistoryResponse, HistoryError>;
}

/// Commit history from the GitHub REST API
pub struct GitHubHistory {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl GitHubHistory {
    pub fn new(config: &AttributionConfig) -> Result<Self, HistoryError> {
        let repo = config
            .repo
            .as_deref()
            .ok_or(HistoryError::MissingField("attribution.repo"))?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(HistoryError::Client)?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/repos/{}/commits",
                config.api_base.trim_end_matches('/'),
                repo.trim_matches('/')
            ),
            token: config.token.clone().filter(|t| !t.is_empty()),
        })
    }
}

#[async_trait]
impl CommitHistory for GitHubHistory {
    async fn commits(
        &self,
        path: &str,
        since: DateTime<Utc>,
    ) -> Result<HistoryResponse, HistoryError> {
        let mut query = vec![
            ("since", since.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("path", path.to_string()),
            ("per_page", "100".to_string()),
        ];
        if let Some(token) = &self.token {
            query.push(("access_token", token.clone()));
        }

        let response = self
            .client
            .get(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
            return Ok(HistoryResponse::RateLimited);
        }
        if !status.is_success() {
            return Err(HistoryError::Status(status));
        }

        let commits: Vec<CommitRecord> = response.json().await?;
        Ok(HistoryResponse::Commits(commits))
    }
}

/// Merges commit history into parsed documents
#[derive(Clone)]
pub struct AttributionEnricher {
    source: Option<Arc<dyn CommitHistory>>,
    since: DateTime<Utc>,
    path_prefix: String,
}

impl AttributionEnricher {
    pub fn new(source: Arc<dyn CommitHistory>, since: DateTime<Utc>) -> Self {
        Self {
            source: Some(source),
            since,
            path_prefix: String::new(),
        }
    }

    /// An enricher that never touches documents
    pub fn disabled() -> Self {
        Self {
            source: None,
            since: DateTime::<Utc>::default(),
            path_prefix: String::new(),
        }
    }

    /// Build from config, talking to the GitHub API when enabled
    pub fn from_config(config: &AttributionConfig) -> Result<Self, HistoryError> {
        if !config.enabled {
            return Ok(Self::disabled());
        }
        let history = GitHubHistory::new(config)?;
        if config.token.is_none() {
            tracing::debug!("No API token configured; commit history is subject to anonymous rate limits");
        }
        Ok(Self::new(Arc::new(history), config.since).with_path_prefix(&config.path_prefix))
    }

    pub fn with_path_prefix(mut self, prefix: &str) -> Self {
        self.path_prefix = prefix.to_string();
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.source.is_some()
    }

    /// Add `lastUpdated` and `contributors` to `doc` from the history of
    /// `src_path`. Never fails; on any error `doc` is returned unchanged.
    pub async fn enrich(&self, src_path: &str, mut doc: ParsedDocument) -> ParsedDocument {
        let Some(source) = &self.source else {
            return doc;
        };

        let path = format!("{}{}", self.path_prefix, src_path);
        match source.commits(&path, self.since).await {
            Ok(HistoryResponse::Commits(commits)) => {
                tracing::debug!("{} commits touch {}", commits.len(), path);
                merge_attribution(&mut doc.attributes, &commits, self.since);
            }
            Ok(HistoryResponse::RateLimited) => {
                tracing::warn!(
                    "Ignoring commit history for {} due to API rate limit. To resolve, set GITHUB_TOKEN.",
                    path
                );
            }
            Err(e) => {
                tracing::warn!("Commit history unavailable for {}: {}", path, e);
            }
        }

        doc
    }
}

/// Set `lastUpdated` to the newest authored date (or `since` when there
/// are no commits) and append unseen author logins to `contributors`.
pub fn merge_attribution(attributes: &mut Attributes, commits: &[CommitRecord], since: DateTime<Utc>) {
    let last_updated = commits
        .iter()
        .filter_map(CommitRecord::authored_at)
        .max()
        .unwrap_or(since);
    attributes.insert(
        LAST_UPDATED_KEY.to_string(),
        Value::String(last_updated.to_rfc3339_opts(SecondsFormat::Secs, true)),
    );

    let contributors = match attributes.get(CONTRIBUTORS_KEY) {
        Some(Value::Array(existing)) => existing.clone(),
        Some(Value::Null) | None => Vec::new(),
        Some(single) => vec![single.clone()],
    };

    // Declared values can repeat; keep the first of each
    let mut deduped: Vec<Value> = Vec::with_capacity(contributors.len());
    for value in contributors {
        if !deduped.contains(&value) {
            deduped.push(value);
        }
    }

    for login in commits.iter().filter_map(CommitRecord::login) {
        let value = Value::String(login.to_string());
        if !deduped.contains(&value) {
            deduped.push(value);
        }
    }

    attributes.insert(CONTRIBUTORS_KEY.to_string(), Value::Array(deduped));
}
