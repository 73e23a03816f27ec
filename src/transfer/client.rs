use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::{ApiError, DirEntry, Endpoint, TransferReceipt, TransferRequest};
use crate::config::AppConfig;

/// Timeout for any single service request
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// List envelope used by the service: `{"DATA": [...]}`
#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(rename = "DATA")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ActivationReply {
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorReply {
    #[serde(default)]
    message: Option<String>,
}

/// HTTP client for the remote transfer service.
#[derive(Clone)]
pub struct TransferClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl TransferClient {
    pub fn new(config: &AppConfig) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: config.service_url().trim_end_matches('/').to_string(),
            token: config.access_token(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut req = self.http.request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let resp = self.request(Method::GET, path).query(query).send().await?;
        let resp = check(resp).await?;
        Ok(resp.json().await?)
    }

    /// Full-text search for endpoints matching `query`.
    pub async fn search(&self, query: &str) -> Result<Vec<Endpoint>, ApiError> {
        debug!(query, "endpoint search");
        let page: Page<Endpoint> = self
            .get_json("/endpoint_search", &[("filter_fulltext", query)])
            .await?;
        Ok(page.data)
    }

    /// Activation is a prerequisite authorization step: listing an endpoint
    /// before a successful activation fails on the service side.
    pub async fn activate(&self, endpoint_id: &str) -> Result<(), ApiError> {
        debug!(endpoint_id, "activate endpoint");
        let resp = self
            .request(Method::POST, &format!("/endpoint/{endpoint_id}/autoactivate"))
            .send()
            .await?;
        let reply: ActivationReply = check(resp).await?.json().await?;
        if reply.code.starts_with("AutoActivationFailed") {
            let message = if reply.message.is_empty() {
                format!("Could not activate endpoint {endpoint_id}")
            } else {
                reply.message
            };
            return Err(ApiError::Service(message));
        }
        Ok(())
    }

    pub async fn list_directory(
        &self,
        endpoint_id: &str,
        path: &str,
    ) -> Result<Vec<DirEntry>, ApiError> {
        debug!(endpoint_id, path, "list directory");
        let page: Page<DirEntry> = self
            .get_json(&format!("/operation/endpoint/{endpoint_id}/ls"), &[("path", path)])
            .await?;
        Ok(page.data)
    }

    /// Submit a transfer request. The service performs the actual data
    /// movement; the returned receipt only acknowledges the submission.
    pub async fn submit(&self, request: &TransferRequest) -> Result<TransferReceipt, ApiError> {
        debug!(
            source = %request.source_endpoint,
            destination = %request.destination_endpoint,
            items = request.items.len(),
            "submit transfer"
        );
        let resp = self
            .request(Method::POST, "/transfer")
            .json(request)
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }
}

/// Map a non-2xx reply to the service's display message.
async fn check(resp: Response) -> Result<Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = match resp.json::<ErrorReply>().await {
        Ok(ErrorReply { message: Some(m) }) if !m.is_empty() => m,
        _ => format!("service returned {status}"),
    };
    Err(ApiError::Service(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_page_envelope() {
        let page: Page<Endpoint> = serde_json::from_str(
            r#"{"DATA": [{"id": "abc", "display_name": "Campus Cluster", "owner_string": "ops@campus"}]}"#,
        )
        .unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].display_name, "Campus Cluster");
    }

    #[test]
    fn test_empty_page_envelope() {
        let page: Page<Endpoint> = serde_json::from_str(r#"{"DATA": []}"#).unwrap();
        assert!(page.data.is_empty());
    }

    #[test]
    fn test_activation_reply_parses_without_message() {
        let reply: ActivationReply =
            serde_json::from_str(r#"{"code": "AutoActivated.CachedCredential"}"#).unwrap();
        assert!(!reply.code.starts_with("AutoActivationFailed"));
        assert!(reply.message.is_empty());
    }
}
