//! MCP server exposing a Notion workspace as tools and resources.
//!
//! Tools cover search, page content, database queries, and two write
//! operations; resources expose read-only database views. Every operation is
//! a stateless pass-through to the remote API with light response reshaping.

mod format;
mod notion;
mod resources;
mod schema;

use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars,
    schemars::JsonSchema,
    service::{RequestContext, RoleServer},
    tool, tool_handler, tool_router,
    transport::stdio,
    ErrorData as McpError,
    ServerHandler, ServiceExt,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use format::{format_page_content, format_query_results, format_search_results};
use notion::{ApiError, NotionApi, NotionClient, NotionConfig};

/// MCP server for a Notion workspace.
#[derive(Clone)]
pub struct NotionServer {
    api: Arc<dyn NotionApi>,
    tool_router: ToolRouter<Self>,
}

impl NotionServer {
    pub fn new(api: Arc<dyn NotionApi>) -> Self {
        Self {
            api,
            tool_router: Self::tool_router(),
        }
    }
}

// === Tool Input Types ===

/// Search Notion pages and databases
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchInput {
    /// Search query; an empty string matches everything
    query: String,
    /// Filter by object type: "page" or "database" (optional)
    #[serde(default)]
    filter_type: Option<String>,
}

/// Get the content of a specific page
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetPageContentInput {
    /// The ID of the Notion page
    page_id: String,
}

/// Query a database with optional filters and sorts
#[derive(Debug, Deserialize, JsonSchema)]
pub struct QueryDatabaseInput {
    /// The ID of the Notion database
    database_id: String,
    /// Filter conditions, passed to the API verbatim (optional)
    #[serde(default)]
    filter: Option<Value>,
    /// Sort conditions, passed to the API verbatim (optional)
    #[serde(default)]
    sorts: Option<Vec<Value>>,
}

/// Append a text paragraph to a page
#[derive(Debug, Deserialize, JsonSchema)]
pub struct AppendToPageInput {
    /// The ID of the Notion page or block
    page_id: String,
    /// The content to append
    text: String,
}

/// Create a new page under a parent and append content to it
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateAndAppendInput {
    /// ID of the parent page
    parent_page_id: String,
    /// Title of the new page
    title: String,
    /// Text content to append to the new page
    content: String,
}

// === Operations ===
//
// Each returns the final tool text: Ok for a success summary, Err for a
// labeled failure string. Neither variant escapes to the protocol host.

impl NotionServer {
    async fn run_search(&self, query: &str, filter_type: Option<&str>) -> Result<String, String> {
        self.api
            .search(query, filter_type)
            .await
            .map(|response| format_search_results(&response.results))
            .map_err(|e| format!("Error searching Notion: {}", e))
    }

    async fn run_get_page_content(&self, page_id: &str) -> Result<String, String> {
        let label = |e: ApiError| format!("Error getting page content: {}", e);
        let page = self.api.retrieve_page(page_id).await.map_err(label)?;
        let blocks = self.api.list_block_children(page_id).await.map_err(label)?;
        Ok(format_page_content(&page, &blocks.results))
    }

    async fn run_query_database(
        &self,
        database_id: &str,
        filter: Option<Value>,
        sorts: Option<Vec<Value>>,
    ) -> Result<String, String> {
        self.api
            .query_database(database_id, filter, sorts)
            .await
            .map(|response| format_query_results(&response.results))
            .map_err(|e| format!("Error querying database: {}", e))
    }

    async fn run_append(&self, page_id: &str, text: &str) -> Result<String, String> {
        match self.api.append_paragraph(page_id, text).await {
            Ok(outcome) if outcome.is_success() => {
                Ok("Successfully added content to Notion page".to_string())
            }
            Ok(outcome) => Err(format!("Failed to add content: {}", outcome.body)),
            Err(e) => Err(format!("Error appending to page: {}", e)),
        }
    }

    async fn run_create_and_append(
        &self,
        parent_page_id: &str,
        title: &str,
        content: &str,
    ) -> Result<String, String> {
        let created = match self.api.create_page(parent_page_id, title).await {
            Ok(outcome) => outcome,
            Err(e) => return Err(format!("Error creating and appending page: {}", e)),
        };
        if !created.is_success() {
            return Err(format!("Failed to create page: {}", created.body));
        }

        let page_id = created.page_id().unwrap_or_default();
        match self.api.append_paragraph(&page_id, content).await {
            Ok(outcome) if outcome.is_success() => Ok(format!(
                "Page created and content appended successfully. Page ID: {}",
                page_id
            )),
            Ok(outcome) => Err(format!(
                "Page created but failed to append content (page ID: {}): {}",
                page_id, outcome.body
            )),
            Err(e) => Err(format!("Error creating and appending page: {}", e)),
        }
    }
}

fn tool_text(result: Result<String, String>) -> CallToolResult {
    match result {
        Ok(text) => CallToolResult::success(vec![Content::text(text)]),
        Err(text) => CallToolResult::error(vec![Content::text(text)]),
    }
}

// === Tool Implementations ===

#[tool_router]
impl NotionServer {
    /// Search pages and databases
    #[tool(
        description = "Search Notion pages and databases. An empty query matches everything; filter_type narrows results to 'page' or 'database' objects."
    )]
    async fn search_notion(
        &self,
        Parameters(input): Parameters<SearchInput>,
    ) -> Result<CallToolResult, McpError> {
        let filter_type = input.filter_type.as_deref().filter(|f| !f.is_empty());
        Ok(tool_text(self.run_search(&input.query, filter_type).await))
    }

    /// Read a page's title, URL, and text content
    #[tool(
        description = "Get the content of a specific Notion page: its title, URL, and the text of its direct child blocks."
    )]
    async fn get_page_content(
        &self,
        Parameters(input): Parameters<GetPageContentInput>,
    ) -> Result<CallToolResult, McpError> {
        Ok(tool_text(self.run_get_page_content(&input.page_id).await))
    }

    /// Query a database's entries
    #[tool(
        description = "Query a Notion database. Filter and sorts follow the Notion API query format and are passed through unchanged."
    )]
    async fn query_database(
        &self,
        Parameters(input): Parameters<QueryDatabaseInput>,
    ) -> Result<CallToolResult, McpError> {
        Ok(tool_text(
            self.run_query_database(&input.database_id, input.filter, input.sorts)
                .await,
        ))
    }

    /// Append one paragraph to a page
    #[tool(description = "Append a text paragraph to a Notion page.")]
    async fn append_to_notion_page(
        &self,
        Parameters(input): Parameters<AppendToPageInput>,
    ) -> Result<CallToolResult, McpError> {
        Ok(tool_text(self.run_append(&input.page_id, &input.text).await))
    }

    /// Create a child page, then append content to it
    #[tool(
        description = "Create a new Notion page under a parent page and append a text paragraph to it. Reports the new page ID even when only the append step fails, so the append can be retried."
    )]
    async fn create_and_append_page(
        &self,
        Parameters(input): Parameters<CreateAndAppendInput>,
    ) -> Result<CallToolResult, McpError> {
        Ok(tool_text(
            self.run_create_and_append(&input.parent_page_id, &input.title, &input.content)
                .await,
        ))
    }
}

#[tool_handler]
impl ServerHandler for NotionServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Notion workspace MCP server. \
                 Tools: search_notion, get_page_content, query_database, \
                 append_to_notion_page, create_and_append_page. \
                 Resources: workspace://databases lists all databases; \
                 workspace://database/{database_id} returns one database and \
                 its entries."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            ..Default::default()
        }
    }

    fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        use rmcp::model::AnnotateAble;
        async move {
            Ok(ListResourcesResult {
                resources: resources::build_resources()
                    .into_iter()
                    .map(|r| r.no_annotation())
                    .collect(),
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        async move {
            let text = if request.uri == resources::DATABASES_URI {
                resources::list_databases(self.api.as_ref()).await
            } else if let Some(database_id) = request.uri.strip_prefix(resources::DATABASE_PREFIX) {
                if database_id.is_empty() {
                    return Err(McpError::invalid_params(
                        "database_id must not be empty".to_string(),
                        None,
                    ));
                }
                resources::get_database(self.api.as_ref(), database_id).await
            } else {
                return Err(McpError::invalid_params(
                    format!("Unknown resource URI: {}", request.uri),
                    None,
                ));
            };

            Ok(ReadResourceResult {
                contents: vec![ResourceContents::TextResourceContents {
                    uri: request.uri,
                    mime_type: Some("application/json".to_string()),
                    text,
                    meta: None,
                }],
            })
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = NotionConfig::from_env();
    tracing::info!(api_url = %config.api_url, "Notion MCP server starting");

    let server = NotionServer::new(Arc::new(NotionClient::new(config)));

    let service = server.serve(stdio()).await.inspect_err(|e| {
        tracing::error!("Server error: {:?}", e);
    })?;

    service.waiting().await?;

    Ok(())
}
