use crate::config::ApiCredentials;
use crate::model::{Error, Result};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// JSON over HTTP with basic auth, shared by the Jira and Confluence clients.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    credentials: ApiCredentials,
}

impl ApiClient {
    pub fn new(credentials: ApiCredentials) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("weekly-report/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, credentials })
    }

    pub fn base_url(&self) -> &str {
        &self.credentials.base_url
    }

    pub async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let url = self.url(path);
        let request = self.http.get(&url).query(query);
        self.send(url, request).await
    }

    pub async fn put_json(&self, path: &str, body: &Value) -> Result<Value> {
        let url = self.url(path);
        let request = self.http.put(&url).json(body);
        self.send(url, request).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.credentials.base_url)
    }

    async fn send(&self, url: String, request: RequestBuilder) -> Result<Value> {
        tracing::debug!(%url, "Sending request");
        let response = request
            .basic_auth(&self.credentials.email, Some(&self.credentials.token))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Transport {
                url,
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<Value>().await?)
    }
}
