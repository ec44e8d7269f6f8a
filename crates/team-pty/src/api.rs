//! Client for the collaborator HTTP API that owns teams, members and projects.
//!
//! List calls degrade to empty results on any failure. Creation calls report
//! success as a flag. Only member deletion surfaces its error.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};

use team_pty_core::{Error, MemberRole, Project, Result, ServerSettings, Team};

/// Collaborator API client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    /// Create a client for `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    /// Create a client from the server settings.
    pub fn from_settings(settings: &ServerSettings) -> Result<Self> {
        Self::new(
            settings.api_base_url.clone(),
            Duration::from_secs(settings.request_timeout_secs),
        )
    }

    /// Absolute url for an API path.
    ///
    /// Paths join the base url with exactly one `/`; absolute `http://` and
    /// `https://` urls pass through unchanged.
    pub fn endpoint(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        if path.is_empty() {
            return base.to_string();
        }
        let suffix = path.trim_start_matches('/');
        format!("{base}/{suffix}")
    }

    async fn request_json<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::Api(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Api(format!("response read failed: {e}")))?;

        if !status.is_success() {
            return Err(Error::Api(format!("request failed with status {status}: {body}")));
        }

        serde_json::from_str(&body)
            .map_err(|e| Error::Api(format!("response was malformed JSON: {e}")))
    }

    async fn request_status_only(&self, request: reqwest::RequestBuilder) -> Result<()> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::Api(format!("request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(Error::Api(format!("request failed with status {status}: {body}")))
        }
    }

    /// Teams of a user, members included. Empty on failure.
    pub async fn list_teams(&self, user_id: i64) -> Vec<Team> {
        let request = self
            .client
            .get(self.endpoint("/api/teams"))
            .query(&[("userId", user_id)]);
        match self.request_json::<Vec<Team>>(request).await {
            Ok(teams) => {
                debug!("Loaded teams: user={}, count={}", user_id, teams.len());
                teams
            }
            Err(e) => {
                warn!("Failed to load teams: user={}, error={}", user_id, e);
                Vec::new()
            }
        }
    }

    /// Projects of a team. Empty on failure.
    pub async fn list_projects(&self, team_id: i64) -> Vec<Project> {
        let request = self
            .client
            .get(self.endpoint("/api/projects"))
            .query(&[("teamId", team_id)]);
        match self.request_json::<Vec<Project>>(request).await {
            Ok(projects) => projects,
            Err(e) => {
                warn!("Failed to load projects: team={}, error={}", team_id, e);
                Vec::new()
            }
        }
    }

    /// Create a team owned by a user.
    pub async fn create_team(&self, name: &str, user_id: i64) -> bool {
        let request = self
            .client
            .post(self.endpoint("/api/teams"))
            .json(&json!({ "name": name.trim(), "userId": user_id }));
        self.succeeded("create team", request).await
    }

    /// Create a project in a team.
    pub async fn create_project(&self, name: &str, team_id: i64) -> bool {
        let request = self
            .client
            .post(self.endpoint("/api/projects"))
            .json(&json!({ "name": name.trim(), "teamId": team_id }));
        self.succeeded("create project", request).await
    }

    /// Create a member in a team.
    pub async fn create_member(
        &self,
        name: &str,
        role: &MemberRole,
        config: Option<&str>,
        team_id: i64,
    ) -> bool {
        let config = config.map(str::trim).filter(|c| !c.is_empty());
        let request = self.client.post(self.endpoint("/api/members")).json(&json!({
            "name": name.trim(),
            "role": role.as_str(),
            "config": config,
            "teamId": team_id,
        }));
        self.succeeded("create member", request).await
    }

    /// Delete a member.
    pub async fn delete_member(&self, member_id: i64) -> Result<()> {
        let request = self
            .client
            .delete(self.endpoint(&format!("/api/members/{member_id}")));
        self.request_status_only(request).await
    }

    async fn succeeded(&self, action: &str, request: reqwest::RequestBuilder) -> bool {
        match self.request_status_only(request).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to {}: {}", action, e);
                false
            }
        }
    }
}
