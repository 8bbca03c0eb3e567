//! `WorkflowBackend` over HTTP

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use workflow_editor::{BackendError, WorkflowBackend, WorkflowList, WorkflowPatch, WorkflowRecord};

use crate::config::{ClientConfig, ClientError};

/// Workflow backend talking to a REST service
pub struct HttpWorkflowBackend {
    /// HTTP client for API requests
    http_client: reqwest::Client,
    /// Validated service root
    base_url: Url,
}

/// The list endpoint answers with a bare array; some deployments wrap it
#[derive(Deserialize)]
#[serde(untagged)]
enum ListResponse {
    Bare(Vec<WorkflowRecord>),
    Wrapped(WorkflowList),
}

impl From<ListResponse> for WorkflowList {
    fn from(response: ListResponse) -> Self {
        match response {
            ListResponse::Bare(workflows) => WorkflowList::from(workflows),
            ListResponse::Wrapped(list) => list,
        }
    }
}

impl HttpWorkflowBackend {
    /// Create a backend from a validated configuration
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let http_client = reqwest::Client::builder().timeout(config.timeout()).build()?;
        let base_url = Url::parse(config.base()).map_err(|e| ClientError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// Use an existing client, e.g. one shared with other services
    pub fn with_client(http_client: reqwest::Client, config: &ClientConfig) -> Result<Self, ClientError> {
        let mut backend = Self::new(config)?;
        backend.http_client = http_client;
        Ok(backend)
    }

    /// `{base}/workflows` or `{base}/workflows/{id}`, with the id percent-encoded
    fn url(&self, id: Option<&str>) -> Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| BackendError::Other(format!("'{}' cannot be a base URL", self.base_url)))?;
            segments.pop_if_empty().push("workflows");
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, BackendError> {
        let response = request.send().await.map_err(classify)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, body))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, BackendError> {
        self.send(request).await?.json::<T>().await.map_err(classify)
    }
}

/// Map a transport failure onto the backend error taxonomy
fn classify(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout
    } else if e.is_decode() {
        BackendError::Parse(e.to_string())
    } else {
        BackendError::Network(e.to_string())
    }
}

fn status_error(status: StatusCode, body: String) -> BackendError {
    log::debug!("Workflow service answered {}: {}", status, body);
    BackendError::Status {
        status: status.as_u16(),
        body,
    }
}

#[async_trait]
impl WorkflowBackend for HttpWorkflowBackend {
    async fn list(&self) -> Result<WorkflowList, BackendError> {
        let url = self.url(None)?;
        let response: ListResponse = self.send_json(self.http_client.get(url)).await?;
        Ok(response.into())
    }

    async fn get(&self, id: &str) -> Result<WorkflowRecord, BackendError> {
        let url = self.url(Some(id))?;
        self.send_json(self.http_client.get(url)).await
    }

    async fn create(&self, record: &WorkflowRecord) -> Result<WorkflowRecord, BackendError> {
        let url = self.url(None)?;
        log::debug!("POST {}", url);
        self.send_json(self.http_client.post(url).json(record)).await
    }

    async fn update(&self, record: &WorkflowRecord) -> Result<WorkflowRecord, BackendError> {
        let url = self.url(Some(&record.id))?;
        log::debug!("PUT {}", url);
        self.send_json(self.http_client.put(url).json(record)).await
    }

    async fn patch(&self, id: &str, changes: &WorkflowPatch) -> Result<WorkflowRecord, BackendError> {
        let url = self.url(Some(id))?;
        log::debug!("PATCH {}", url);
        self.send_json(self.http_client.patch(url).json(changes)).await
    }

    async fn delete(&self, id: &str) -> Result<(), BackendError> {
        let url = self.url(Some(id))?;
        log::debug!("DELETE {}", url);
        self.send(self.http_client.delete(url)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base: &str) -> HttpWorkflowBackend {
        HttpWorkflowBackend::new(&ClientConfig::new(base)).unwrap()
    }

    #[test]
    fn test_collection_and_item_urls() {
        let backend = backend("https://workflows.example.com");
        assert_eq!(
            backend.url(None).unwrap().as_str(),
            "https://workflows.example.com/workflows"
        );
        assert_eq!(
            backend.url(Some("494")).unwrap().as_str(),
            "https://workflows.example.com/workflows/494"
        );
    }

    #[test]
    fn test_urls_under_a_path_prefix() {
        let backend = backend("http://localhost:8080/api/v1/");
        assert_eq!(
            backend.url(Some("workflow-1")).unwrap().as_str(),
            "http://localhost:8080/api/v1/workflows/workflow-1"
        );
    }

    #[test]
    fn test_ids_are_encoded() {
        let backend = backend("http://localhost:8080");
        assert_eq!(
            backend.url(Some("a/b c")).unwrap().as_str(),
            "http://localhost:8080/workflows/a%2Fb%20c"
        );
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        assert!(HttpWorkflowBackend::new(&ClientConfig::new("workflows")).is_err());
    }

    #[test]
    fn test_status_errors_keep_code_and_body() {
        let err = status_error(StatusCode::NOT_FOUND, "no such workflow".to_string());
        assert_eq!(
            err,
            BackendError::Status {
                status: 404,
                body: "no such workflow".to_string()
            }
        );
        assert_eq!(err.user_message(), "Resource not found.");
        assert_eq!(
            status_error(StatusCode::BAD_GATEWAY, String::new()).user_message(),
            "Request failed with status code 502"
        );
    }

    #[test]
    fn test_list_accepts_bare_and_wrapped_bodies() {
        let bare: ListResponse = serde_json::from_value(serde_json::json!([
            {"id": "1", "name": "Onboarding"},
            {"id": "2", "name": "Billing", "nodes": [
                {"id": "1", "type": "start", "position": {"x": 0, "y": 0}},
                {"id": "2", "type": "condition", "position": {"x": 0, "y": 100}}
            ]}
        ]))
        .unwrap();
        let list = WorkflowList::from(bare);
        assert_eq!(list.total, 2);
        assert_eq!(list.workflows[1].name, "Billing");

        let wrapped: ListResponse = serde_json::from_value(serde_json::json!({
            "workflows": [{"id": "1", "name": "Onboarding"}],
            "total": 7
        }))
        .unwrap();
        assert_eq!(WorkflowList::from(wrapped).total, 7);
    }
}
