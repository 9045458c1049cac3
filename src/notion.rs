//! Outbound client for the Notion REST API.
//!
//! One thin HTTP transport behind the [`NotionApi`] trait. Read endpoints
//! decode into the typed models from [`crate::schema`]; the two write
//! endpoints return the raw status and body so callers can report non-200
//! responses verbatim.

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::schema::{BlockChildren, QueryResponse, SearchResponse, WorkspaceObject};

/// API version pin sent with every request.
pub const NOTION_VERSION: &str = "2022-06-28";

/// Default base URL of the remote API.
pub const DEFAULT_API_URL: &str = "https://api.notion.com/v1";

/// Connection settings, read once at startup and threaded into the client.
#[derive(Debug, Clone)]
pub struct NotionConfig {
    pub api_key: String,
    pub api_url: String,
}

impl NotionConfig {
    /// Read settings from the environment. A missing key is not an error
    /// here; the remote API rejects unauthenticated requests on first use.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("NOTION_API_KEY").unwrap_or_default(),
            api_url: std::env::var("NOTION_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
        }
    }
}

/// Result type for outbound API calls.
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("API request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// Raw outcome of a write endpoint. Callers inspect the status themselves;
/// only an exact 200 counts as success.
#[derive(Debug, Clone)]
pub struct WriteOutcome {
    pub status: StatusCode,
    pub body: String,
}

impl WriteOutcome {
    pub fn is_success(&self) -> bool {
        self.status == StatusCode::OK
    }

    /// The `id` field of the response body, when the body is a JSON object.
    pub fn page_id(&self) -> Option<String> {
        let value: Value = serde_json::from_str(&self.body).ok()?;
        Some(value.get("id")?.as_str()?.to_string())
    }
}

/// The outbound surface of the remote workspace API.
#[async_trait]
pub trait NotionApi: Send + Sync {
    async fn search(&self, query: &str, filter_type: Option<&str>) -> ApiResult<SearchResponse>;

    async fn retrieve_database(&self, database_id: &str) -> ApiResult<Value>;

    async fn query_database(
        &self,
        database_id: &str,
        filter: Option<Value>,
        sorts: Option<Vec<Value>>,
    ) -> ApiResult<QueryResponse>;

    async fn retrieve_page(&self, page_id: &str) -> ApiResult<WorkspaceObject>;

    async fn list_block_children(&self, block_id: &str) -> ApiResult<BlockChildren>;

    async fn create_page(&self, parent_page_id: &str, title: &str) -> ApiResult<WriteOutcome>;

    async fn append_paragraph(&self, block_id: &str, text: &str) -> ApiResult<WriteOutcome>;
}

/// HTTP client for the Notion REST API.
pub struct NotionClient {
    http: reqwest::Client,
    config: NotionConfig,
}

impl NotionClient {
    pub fn new(config: NotionConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_url.trim_end_matches('/'), path)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, self.endpoint(path))
            .bearer_auth(&self.config.api_key)
            .header("Notion-Version", NOTION_VERSION)
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> ApiResult<T> {
        debug!(%path, "notion api read");
        let mut request = self.request(method, path);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }
        Ok(response.json().await?)
    }

    async fn write(&self, method: Method, path: &str, body: Value) -> ApiResult<WriteOutcome> {
        debug!(%path, "notion api write");
        let response = self.request(method, path).json(&body).send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok(WriteOutcome { status, body })
    }
}

fn search_body(query: &str, filter_type: Option<&str>) -> Value {
    let mut body = serde_json::Map::new();
    if !query.is_empty() {
        body.insert("query".into(), Value::String(query.to_string()));
    }
    if let Some(object) = filter_type {
        body.insert(
            "filter".into(),
            serde_json::json!({"property": "object", "value": object}),
        );
    }
    Value::Object(body)
}

// Absent optionals are left out of the body entirely; the remote API rejects
// explicit nulls for filter and sorts.
fn query_body(filter: Option<Value>, sorts: Option<Vec<Value>>) -> Value {
    let mut body = serde_json::Map::new();
    if let Some(filter) = filter {
        body.insert("filter".into(), filter);
    }
    if let Some(sorts) = sorts {
        body.insert("sorts".into(), Value::Array(sorts));
    }
    Value::Object(body)
}

fn paragraph_children(text: &str) -> Value {
    serde_json::json!({
        "children": [{
            "object": "block",
            "type": "paragraph",
            "paragraph": {
                "rich_text": [{"type": "text", "text": {"content": text}}]
            },
        }]
    })
}

#[async_trait]
impl NotionApi for NotionClient {
    async fn search(&self, query: &str, filter_type: Option<&str>) -> ApiResult<SearchResponse> {
        self.read_json(Method::POST, "search", Some(search_body(query, filter_type)))
            .await
    }

    async fn retrieve_database(&self, database_id: &str) -> ApiResult<Value> {
        self.read_json(Method::GET, &format!("databases/{database_id}"), None)
            .await
    }

    async fn query_database(
        &self,
        database_id: &str,
        filter: Option<Value>,
        sorts: Option<Vec<Value>>,
    ) -> ApiResult<QueryResponse> {
        self.read_json(
            Method::POST,
            &format!("databases/{database_id}/query"),
            Some(query_body(filter, sorts)),
        )
        .await
    }

    async fn retrieve_page(&self, page_id: &str) -> ApiResult<WorkspaceObject> {
        self.read_json(Method::GET, &format!("pages/{page_id}"), None)
            .await
    }

    async fn list_block_children(&self, block_id: &str) -> ApiResult<BlockChildren> {
        self.read_json(Method::GET, &format!("blocks/{block_id}/children"), None)
            .await
    }

    async fn create_page(&self, parent_page_id: &str, title: &str) -> ApiResult<WriteOutcome> {
        let body = serde_json::json!({
            "parent": {"type": "page_id", "page_id": parent_page_id},
            "properties": {
                "title": {
                    "title": [{"type": "text", "text": {"content": title}}]
                }
            }
        });
        self.write(Method::POST, "pages", body).await
    }

    async fn append_paragraph(&self, block_id: &str, text: &str) -> ApiResult<WriteOutcome> {
        self.write(
            Method::PATCH,
            &format!("blocks/{block_id}/children"),
            paragraph_children(text),
        )
        .await
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_body_omits_empty_parts() {
        assert_eq!(search_body("", None), json!({}));
        assert_eq!(search_body("roadmap", None), json!({"query": "roadmap"}));
        assert_eq!(
            search_body("", Some("database")),
            json!({"filter": {"property": "object", "value": "database"}}),
        );
    }

    #[test]
    fn test_query_body_omits_absent_optionals() {
        assert_eq!(query_body(None, None), json!({}));

        let filter = json!({"property": "Status", "select": {"equals": "Done"}});
        let sorts = vec![json!({"property": "Due", "direction": "ascending"})];
        assert_eq!(
            query_body(Some(filter.clone()), Some(sorts.clone())),
            json!({"filter": filter, "sorts": sorts}),
        );
    }

    #[test]
    fn test_paragraph_children_shape() {
        assert_eq!(
            paragraph_children("hello"),
            json!({
                "children": [{
                    "object": "block",
                    "type": "paragraph",
                    "paragraph": {
                        "rich_text": [{"type": "text", "text": {"content": "hello"}}]
                    },
                }]
            }),
        );
    }

    #[test]
    fn test_write_outcome_success_is_exactly_200() {
        assert!(testing::FakeApi::outcome(200, "{}").is_success());
        assert!(!testing::FakeApi::outcome(201, "{}").is_success());
        assert!(!testing::FakeApi::outcome(400, "{}").is_success());
    }

    #[test]
    fn test_write_outcome_page_id() {
        let outcome = testing::FakeApi::outcome(200, r#"{"object": "page", "id": "abc123"}"#);
        assert_eq!(outcome.page_id().as_deref(), Some("abc123"));

        assert_eq!(testing::FakeApi::outcome(200, "not json").page_id(), None);
        assert_eq!(testing::FakeApi::outcome(200, "{}").page_id(), None);
    }

    #[test]
    fn test_config_endpoint_trims_trailing_slash() {
        let client = NotionClient::new(NotionConfig {
            api_key: "secret".into(),
            api_url: "http://localhost:8080/v1/".into(),
        });
        assert_eq!(client.endpoint("search"), "http://localhost:8080/v1/search");
    }
}
