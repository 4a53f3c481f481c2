//! REST client for the patent registry backend.
//!
//! Every request picks up the current bearer token from the shared
//! session at send time; anonymous requests simply omit the header.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::auth::SharedSession;
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::models::{NewPatent, PatentSummary};
use crate::search::SearchBackend;

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

pub struct PatentApiClient {
    base_url: String,
    client: Client,
    session: SharedSession,
}

impl PatentApiClient {
    pub fn new(config: &ApiConfig, session: SharedSession) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            session,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let token = self.session.read().unwrap().token().map(str::to_string);
        let builder = self.client.request(method, url);
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        let message = if message.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        } else {
            message
        };
        Err(Error::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Exchange credentials for a bearer token. The token is returned to
    /// the caller; adopting it is the session's job.
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        debug!(email, "logging in");
        let response = self
            .request(Method::POST, "/auth/login")
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        let body: LoginResponse = Self::check(response).await?.json().await?;
        Ok(body.token)
    }

    /// Ask the server whether the current token is still good.
    pub async fn validate(&self) -> Result<bool> {
        let response = self.request(Method::GET, "/auth/validate").send().await?;
        match Self::check(response).await {
            Ok(_) => Ok(true),
            Err(Error::Api { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn search_patents(&self, query: &str) -> Result<Vec<PatentSummary>> {
        let response = self
            .request(Method::GET, "/patents/search")
            .query(&[("query", query)])
            .send()
            .await?;
        let body: Value = Self::check(response).await?.json().await?;
        parse_search_response(body)
    }

    pub async fn create_patent(&self, patent: &NewPatent) -> Result<PatentSummary> {
        let response = self
            .request(Method::POST, "/patents")
            .json(patent)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn get_patent(&self, id: &str) -> Result<PatentSummary> {
        let response = self
            .request(Method::GET, &format!("/patents/{id}"))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn update_patent(&self, id: &str, patent: &NewPatent) -> Result<PatentSummary> {
        let response = self
            .request(Method::PUT, &format!("/patents/{id}"))
            .json(patent)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn delete_patent(&self, id: &str) -> Result<()> {
        let response = self
            .request(Method::DELETE, &format!("/patents/{id}"))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl SearchBackend for PatentApiClient {
    async fn search(&self, query: &str) -> Result<Vec<PatentSummary>> {
        self.search_patents(query).await
    }
}

/// Unwrap a search response body.
///
/// The backend has shipped two shapes over time: a bare array, and an
/// envelope object with the array under `data`. Anything else is a
/// shape error.
pub fn parse_search_response(body: Value) -> Result<Vec<PatentSummary>> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(Error::InvalidResponseShape(format!(
                    "`data` field is {}, not an array",
                    value_kind(&other)
                )))
            }
            None => {
                return Err(Error::InvalidResponseShape(
                    "object without a `data` array".to_string(),
                ))
            }
        },
        other => {
            return Err(Error::InvalidResponseShape(format!(
                "expected an array or an envelope object, got {}",
                value_kind(&other)
            )))
        }
    };

    items
        .into_iter()
        .map(|item| {
            serde_json::from_value(item)
                .map_err(|e| Error::InvalidResponseShape(format!("bad record in list: {e}")))
        })
        .collect()
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
