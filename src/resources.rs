//! Read-only resource views over the remote workspace.
//!
//! Both views return JSON text. Remote failures become an `{"error": ...}`
//! payload inside the resource body; they never surface as protocol errors.

use rmcp::model::RawResource;
use serde::Serialize;
use serde_json::{json, Value};

use crate::notion::{ApiError, ApiResult, NotionApi};

/// URI of the database listing resource.
pub const DATABASES_URI: &str = "workspace://databases";

/// URI prefix of the single-database resource.
pub const DATABASE_PREFIX: &str = "workspace://database/";

/// One row of the database listing.
#[derive(Debug, Serialize)]
pub struct DatabaseSummary {
    pub id: String,
    pub title: String,
    pub url: String,
}

/// Static resources advertised to clients. The parameterized
/// `workspace://database/{database_id}` form is readable but not listable,
/// so it is documented in the listing's description instead.
pub fn build_resources() -> Vec<RawResource> {
    let mut databases = RawResource::new(DATABASES_URI, "databases");
    databases.description = Some(
        "All Notion databases visible to the integration. Read \
         workspace://database/{database_id} for one database and its entries."
            .to_string(),
    );
    databases.mime_type = Some("application/json".to_string());
    vec![databases]
}

fn to_pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

fn error_payload(error: &ApiError) -> String {
    to_pretty(&json!({"error": error.to_string()}))
}

/// All databases visible to the integration, as `{id, title, url}` rows.
pub async fn list_databases(api: &dyn NotionApi) -> String {
    match api.search("", Some("database")).await {
        Ok(response) => {
            let rows: Vec<DatabaseSummary> = response
                .results
                .iter()
                .map(|db| DatabaseSummary {
                    id: db.id.clone(),
                    title: db.native_title(),
                    url: db.url.clone().unwrap_or_default(),
                })
                .collect();
            serde_json::to_string_pretty(&rows).unwrap_or_default()
        }
        Err(e) => error_payload(&e),
    }
}

async fn fetch_database(api: &dyn NotionApi, database_id: &str) -> ApiResult<Value> {
    let database = api.retrieve_database(database_id).await?;
    let pages = api.query_database(database_id, None, None).await?;
    Ok(json!({"database": database, "pages": pages.results}))
}

/// A single database's metadata together with the first page of its entries.
pub async fn get_database(api: &dyn NotionApi, database_id: &str) -> String {
    match fetch_database(api, database_id).await {
        Ok(payload) => to_pretty(&payload),
        Err(e) => error_payload(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notion::testing::FakeApi;
    use crate::schema::{QueryResponse, SearchResponse};

    #[test]
    fn test_static_resource_listing() {
        let resources = build_resources();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].uri, DATABASES_URI);
    }

    #[tokio::test]
    async fn test_databases_rows() {
        let api = FakeApi::default();
        *api.search.lock().unwrap() = Some(Ok(serde_json::from_value::<SearchResponse>(json!({
            "results": [
                {"id": "db1", "url": "https://notion.example/db1",
                 "title": [{"plain_text": "Tasks"}]},
                {"id": "db2", "title": []},
            ],
        }))
        .unwrap()));

        let payload = list_databases(&api).await;
        let parsed: Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(
            parsed,
            json!([
                {"id": "db1", "title": "Tasks", "url": "https://notion.example/db1"},
                {"id": "db2", "title": "Untitled", "url": ""},
            ]),
        );
    }

    #[tokio::test]
    async fn test_databases_failure_becomes_error_payload() {
        let api = FakeApi::default();
        *api.search.lock().unwrap() = Some(Err(FakeApi::status_error("connection reset")));
        let expected = FakeApi::status_error("connection reset").to_string();

        let payload = list_databases(&api).await;
        let parsed: Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(parsed, json!({"error": expected}));
    }

    #[tokio::test]
    async fn test_database_combines_metadata_and_pages() {
        let api = FakeApi::default();
        *api.database.lock().unwrap() =
            Some(Ok(json!({"id": "db1", "object": "database"})));
        *api.query.lock().unwrap() = Some(Ok(QueryResponse {
            results: vec![json!({"id": "p1"}), json!({"id": "p2"})],
        }));

        let payload = get_database(&api, "db1").await;
        let parsed: Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(
            parsed,
            json!({
                "database": {"id": "db1", "object": "database"},
                "pages": [{"id": "p1"}, {"id": "p2"}],
            }),
        );
    }

    #[tokio::test]
    async fn test_database_query_failure_becomes_error_payload() {
        let api = FakeApi::default();
        *api.database.lock().unwrap() = Some(Ok(json!({"id": "db1"})));
        *api.query.lock().unwrap() = Some(Err(FakeApi::status_error("bad request")));

        let payload = get_database(&api, "db1").await;
        let parsed: Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(
            parsed["error"],
            FakeApi::status_error("bad request").to_string(),
        );
    }
}
