use anyhow::{Context, Result};
use lw_core::{
    snapshot_from_wire, statuses_from_wire, LogEntry, SnapshotPayload, StationPayload,
    StatusPayload,
};
use std::collections::BTreeMap;

/// Read-only client for the three poll sources. No timeouts: an in-flight
/// read that never resolves simply never updates its payload again, and
/// the next tick issues a fresh one regardless.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
}

impl ApiClient {
    pub fn new(base: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    pub async fn fetch_snapshot(&self) -> Result<SnapshotPayload> {
        let raw: BTreeMap<String, Option<StationPayload>> = self
            .http
            .get(self.url("/api/last_files"))
            .send()
            .await
            .context("evidence snapshot request failed")?
            .error_for_status()
            .context("evidence snapshot request rejected")?
            .json()
            .await
            .context("evidence snapshot decode failed")?;
        Ok(snapshot_from_wire(raw))
    }

    pub async fn fetch_statuses(&self) -> Result<StatusPayload> {
        let raw: BTreeMap<String, String> = self
            .http
            .get(self.url("/api/status"))
            .send()
            .await
            .context("status request failed")?
            .error_for_status()
            .context("status request rejected")?
            .json()
            .await
            .context("status decode failed")?;
        Ok(statuses_from_wire(raw))
    }

    pub async fn fetch_logs(&self) -> Result<Vec<LogEntry>> {
        self.http
            .get(self.url("/api/logs"))
            .send()
            .await
            .context("log batch request failed")?
            .error_for_status()
            .context("log batch request rejected")?
            .json()
            .await
            .context("log batch decode failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let client = ApiClient::new("http://127.0.0.1:8080/".to_string());
        assert_eq!(client.url("/api/status"), "http://127.0.0.1:8080/api/status");
    }
}
