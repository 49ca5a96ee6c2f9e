//! Async HTTP client wrapping the Redil JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use redil_core::{
  org::HierarchyLevel,
  stats::{GroupScore, PairScore, ScopeSummary},
  tree::TreeNode,
};
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

const NO_QUERY: [(&str, &str); 0] = [];

/// Connection settings for the Redil API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub username: String,
  pub password: String,
}

/// Query parameters shared by the `/stats/*` endpoints. Unset fields are
/// left to the server's defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub level:       Option<HierarchyLevel>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub id:          Option<Uuid>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub start_month: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub start_year:  Option<i32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub end_month:   Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub end_year:    Option<i32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub n:           Option<usize>,
}

impl StatsQuery {
  /// The same date range, narrowed to one node.
  pub fn at(self, level: HierarchyLevel, id: Uuid) -> Self {
    Self { level: Some(level), id: Some(id), ..self }
  }
}

/// The subset of `GET /me` the CLI displays.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Me {
  pub username: String,
  pub role:     String,
}

/// Async HTTP client for the Redil JSON REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    if self.config.username.is_empty() {
      req
    } else {
      req.basic_auth(&self.config.username, Some(&self.config.password))
    }
  }

  async fn get_json<T, Q>(&self, path: &str, query: &Q) -> Result<T>
  where
    T: DeserializeOwned,
    Q: Serialize + ?Sized,
  {
    tracing::debug!(%path, "GET");
    let resp = self
      .auth(self.client.get(self.url(path)))
      .query(query)
      .send()
      .await
      .with_context(|| format!("GET {path} failed"))?;

    let status = resp.status();
    if !status.is_success() {
      let detail = resp
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|body| body["error"].as_str().map(str::to_owned))
        .unwrap_or_default();
      return Err(anyhow!("GET {path} → {status} {detail}"));
    }
    resp.json().await.with_context(|| format!("deserialising {path}"))
  }

  /// `GET /api/me`
  pub async fn me(&self) -> Result<Me> { self.get_json("/me", &NO_QUERY).await }

  /// `GET /api/hierarchy`
  pub async fn hierarchy(&self) -> Result<Vec<TreeNode>> {
    self.get_json("/hierarchy", &NO_QUERY).await
  }

  /// `GET /api/stats/summary`
  pub async fn summary(&self, query: &StatsQuery) -> Result<ScopeSummary> {
    self.get_json("/stats/summary", query).await
  }

  /// `GET /api/stats/top-groups`
  pub async fn top_groups(&self, query: &StatsQuery) -> Result<Vec<GroupScore>> {
    self.get_json("/stats/top-groups", query).await
  }

  /// `GET /api/stats/top-pairs`
  pub async fn top_pairs(&self, query: &StatsQuery) -> Result<Vec<PairScore>> {
    self.get_json("/stats/top-pairs", query).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn stats_query_omits_unset_fields() {
    let q = StatsQuery { start_year: Some(2024), n: Some(3), ..Default::default() };
    let json = serde_json::to_value(q).unwrap();
    assert_eq!(json, serde_json::json!({ "startYear": 2024, "n": 3 }));
  }

  #[test]
  fn at_keeps_the_range() {
    let id = Uuid::new_v4();
    let q = StatsQuery { start_month: Some(2), ..Default::default() }
      .at(HierarchyLevel::Zone, id);
    assert_eq!(q.start_month, Some(2));
    assert_eq!(q.level, Some(HierarchyLevel::Zone));
    assert_eq!(q.id, Some(id));
  }

  #[test]
  fn urls_are_rooted_at_api() {
    let client = ApiClient::new(ApiConfig {
      base_url: "http://localhost:8080/".into(),
      username: String::new(),
      password: String::new(),
    })
    .unwrap();
    assert_eq!(client.url("/me"), "http://localhost:8080/api/me");
  }
}
