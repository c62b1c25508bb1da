//! Superset guest-token client.
//!
//! Thin two-step proxy against a Superset instance: log in with the service
//! account for an access token, then exchange it for a dashboard-scoped
//! guest token. The client is optional; installations without Superset run
//! with it unconfigured.

use serde_json::{json, Value};

use crate::config::Config;
use crate::error::{AppError, Result};

/// Client for Superset's security API
pub struct SupersetClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl SupersetClient {
    /// Build the client from configuration; None when any of the Superset
    /// settings is missing.
    pub fn from_config(config: &Config) -> Option<Self> {
        let base_url = config.superset_url.clone()?;
        let username = config.superset_username.clone()?;
        let password = config.superset_password.clone()?;

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Some(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            username,
            password,
        })
    }

    /// Fetch a guest token scoped to the given dashboard.
    pub async fn guest_token(&self, dashboard_id: &str) -> Result<String> {
        let access_token = self.login().await?;

        let response = self
            .http
            .post(format!("{}/api/v1/security/guest_token/", self.base_url))
            .bearer_auth(access_token)
            .json(&guest_token_payload(dashboard_id))
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await?;
        body.get("token")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                AppError::Upstream("Superset guest token response had no token".to_string())
            })
    }

    async fn login(&self) -> Result<String> {
        let response = self
            .http
            .post(format!("{}/api/v1/security/login", self.base_url))
            .json(&self.login_payload())
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await?;
        body.get("access_token")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                AppError::Upstream("Superset login response had no access token".to_string())
            })
    }

    fn login_payload(&self) -> Value {
        json!({
            "username": self.username,
            "password": self.password,
            "provider": "db",
            "refresh": true,
        })
    }
}

/// Payload for the guest-token exchange. The embedded user is a fixed
/// anonymous identity; row-level security rules are left empty.
pub(crate) fn guest_token_payload(dashboard_id: &str) -> Value {
    json!({
        "user": {
            "username": "guest",
            "first_name": "Guest",
            "last_name": "User",
            "email": "guest@gmail.com",
        },
        "resources": [{"type": "dashboard", "id": dashboard_id}],
        "rls": [],
    })
}
