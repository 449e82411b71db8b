//! Custom domain registration through the Heroku platform API.

use async_trait::async_trait;
use serde_json::json;
use sv_worker_core::contract::DomainRegistrar;
use sv_worker_core::error::BoxError;

pub const API_URL: &str = "https://api.heroku.com";
const ACCEPT: &str = "application/vnd.heroku+json; version=3";

pub struct HerokuDomains {
    http: reqwest::Client,
    api_url: String,
    app: String,
    user: String,
    token: String,
}

impl HerokuDomains {
    pub fn new(http: reqwest::Client, app: &str, user: &str, token: &str) -> Self {
        Self::with_url(http, API_URL, app, user, token)
    }

    pub fn with_url(
        http: reqwest::Client,
        api_url: &str,
        app: &str,
        user: &str,
        token: &str,
    ) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            app: app.to_string(),
            user: user.to_string(),
            token: token.to_string(),
        }
    }

    pub fn domains_url(&self) -> String {
        format!("{}/apps/{}/domains", self.api_url, self.app)
    }
}

#[async_trait]
impl DomainRegistrar for HerokuDomains {
    async fn register(&self, domain: &str) -> Result<(), BoxError> {
        let resp = self
            .http
            .post(self.domains_url())
            .basic_auth(&self.user, Some(&self.token))
            .header(reqwest::header::ACCEPT, ACCEPT)
            .json(&json!({ "hostname": domain }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(domain, %status, body = %body, "Domain registration rejected");
            return Err(format!("domain registration for {domain} failed with {status}: {body}").into());
        }
        tracing::info!(domain, app = %self.app, "Registered domain");
        Ok(())
    }
}
