//! Async HTTP client wrapping the armoury JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use armoury_core::{
  aggregate::DashboardStats,
  transaction::{NewIssue, Transaction},
};
use reqwest::{Client, Response};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use uuid::Uuid;

/// Connection settings for the armoury API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
}

/// Async HTTP client for the armoury JSON REST API.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

#[derive(Deserialize)]
struct ErrorBody {
  error: String,
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
    format!(
      "{}/api{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  /// Decode a success body, or surface the server's `{"error": ..}` message.
  async fn decode<T: DeserializeOwned>(what: &str, resp: Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
      let detail = resp
        .json::<ErrorBody>()
        .await
        .map(|b| b.error)
        .unwrap_or_default();
      return Err(anyhow!("{what} → {status}: {detail}"));
    }
    resp.json().await.with_context(|| format!("deserialising {what}"))
  }

  // ── Transactions ──────────────────────────────────────────────────────────

  /// `GET /api/transactions[?q=<filter>]`
  pub async fn list_transactions(&self, filter: Option<&str>) -> Result<Vec<Transaction>> {
    let mut req = self.client.get(self.url("/transactions"));
    if let Some(q) = filter {
      req = req.query(&[("q", q)]);
    }
    let resp = req.send().await.context("GET /transactions failed")?;
    Self::decode("GET /transactions", resp).await
  }

  /// `POST /api/transactions`
  pub async fn issue(&self, input: &NewIssue) -> Result<Transaction> {
    let resp = self
      .client
      .post(self.url("/transactions"))
      .json(input)
      .send()
      .await
      .context("POST /transactions failed")?;
    Self::decode("POST /transactions", resp).await
  }

  /// `POST /api/transactions/<id>/return`
  pub async fn return_weapon(&self, id: Uuid, storeman: &str) -> Result<Transaction> {
    let path = format!("/transactions/{id}/return");
    let resp = self
      .client
      .post(self.url(&path))
      .json(&json!({ "signature_storeman": storeman }))
      .send()
      .await
      .with_context(|| format!("POST {path} failed"))?;
    Self::decode(&format!("POST {path}"), resp).await
  }

  // ── Stats ─────────────────────────────────────────────────────────────────

  /// `GET /api/stats`
  pub async fn stats(&self) -> Result<DashboardStats> {
    let resp = self
      .client
      .get(self.url("/stats"))
      .send()
      .await
      .context("GET /stats failed")?;
    Self::decode("GET /stats", resp).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn url_joins_api_prefix() {
    let client = ApiClient::new(ApiConfig { base_url: "http://host:8080/".into() }).unwrap();
    assert_eq!(client.url("/stats"), "http://host:8080/api/stats");
  }

  #[tokio::test]
  async fn return_failure_names_the_record() {
    let client = ApiClient::new(ApiConfig { base_url: "http://127.0.0.1:1".into() }).unwrap();
    let id = Uuid::new_v4();
    let err = client.return_weapon(id, "Sgt Lee").await.unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains(&format!("POST /transactions/{id}/return failed")), "{msg}");
    assert!(!msg.contains("{id}"), "{msg}");
  }
}
