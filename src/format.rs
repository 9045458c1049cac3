//! Human-readable summaries returned by the action tools.

use serde_json::Value;

use crate::schema::{Block, WorkspaceObject};

const NO_URL: &str = "No URL";

/// Header with the result count, then one `- title (url)` line per result.
pub fn format_search_results(results: &[WorkspaceObject]) -> String {
    let mut output = format!("Found {} results:\n\n", results.len());
    for item in results {
        let url = item.url.as_deref().unwrap_or(NO_URL);
        output.push_str(&format!("- {} ({})\n", item.display_title(), url));
    }
    output
}

/// Page header followed by one bulleted line per text-bearing block, in the
/// order the remote API returned them.
pub fn format_page_content(page: &WorkspaceObject, blocks: &[Block]) -> String {
    let url = page.url.as_deref().unwrap_or(NO_URL);
    let mut content = format!(
        "Page Title: {}\nURL: {}\n\nContent:\n",
        page.property_title(),
        url
    );
    for block in blocks {
        if let Some(text) = block.text() {
            content.push_str(&format!("- {}\n", text));
        }
    }
    content
}

/// Header with the entry count, then one `- title (url)` line per entry.
pub fn format_query_results(results: &[Value]) -> String {
    let mut content = format!("Database query returned {} results:\n\n", results.len());
    for entry in results {
        let page: WorkspaceObject = serde_json::from_value(entry.clone()).unwrap_or_default();
        let url = page.url.as_deref().unwrap_or(NO_URL);
        content.push_str(&format!("- {} ({})\n", page.property_title(), url));
    }
    content
}
