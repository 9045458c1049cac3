//! Wire models for remote workspace objects.
//!
//! Everything here is a transient projection of JSON returned by the Notion
//! API; nothing is owned or persisted by this server.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Fallback display title used whenever no usable title text is present.
pub const UNTITLED: &str = "Untitled";

/// One fragment of styled text; concatenating runs yields display text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RichText {
    #[serde(default)]
    pub plain_text: Option<String>,
}

/// A property value attached to a page or database entry. Only title-typed
/// properties are ever inspected, so every other type collapses to `Other`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum PropertyValue {
    #[serde(rename = "title")]
    Title {
        #[serde(default)]
        title: Vec<RichText>,
    },
    #[serde(other)]
    Other,
}

/// Named, typed fields attached to a database entry (page).
pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// Display title from a property bag: the first title-typed property's first
/// run, or [`UNTITLED`] when no usable title exists.
pub fn extract_title(properties: &PropertyMap) -> String {
    for value in properties.values() {
        if let PropertyValue::Title { title } = value {
            return title
                .first()
                .and_then(|run| run.plain_text.as_deref())
                .unwrap_or(UNTITLED)
                .to_string();
        }
    }
    UNTITLED.to_string()
}

/// A page or database projected from the remote API.
///
/// Databases carry their title in the native `title` array; pages carry it
/// as a title-typed entry in `properties`. Search results mix both shapes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkspaceObject {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<Vec<RichText>>,
    #[serde(default)]
    pub properties: Option<PropertyMap>,
}

impl WorkspaceObject {
    /// Title from the native title array only.
    pub fn native_title(&self) -> String {
        self.title
            .as_deref()
            .and_then(|runs| runs.first())
            .and_then(|run| run.plain_text.as_deref())
            .unwrap_or(UNTITLED)
            .to_string()
    }

    /// Title for mixed search results: the native title array when it has
    /// runs, otherwise the property bag.
    pub fn display_title(&self) -> String {
        match self.title.as_deref() {
            Some(runs) if !runs.is_empty() => runs
                .first()
                .and_then(|run| run.plain_text.as_deref())
                .unwrap_or(UNTITLED)
                .to_string(),
            _ => self.property_title(),
        }
    }

    /// Title from the property bag, as carried by pages and database entries.
    pub fn property_title(&self) -> String {
        self.properties
            .as_ref()
            .map(extract_title)
            .unwrap_or_else(|| UNTITLED.to_string())
    }
}

/// One content node in a page body. The text payload lives under a key equal
/// to the declared type (`"paragraph": {"rich_text": [...]}`), so the
/// remaining fields are kept as raw JSON and resolved on demand.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Block {
    #[serde(rename = "type", default)]
    pub block_type: String,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct BlockPayload {
    #[serde(default)]
    rich_text: Option<Vec<RichText>>,
}

impl Block {
    /// Concatenated rich text of this block, if it is a text-bearing type
    /// and the text is non-blank after trimming.
    pub fn text(&self) -> Option<String> {
        let payload = self.fields.get(&self.block_type)?;
        let payload: BlockPayload = serde_json::from_value(payload.clone()).ok()?;
        let runs = payload.rich_text?;
        let text: String = runs
            .iter()
            .filter_map(|run| run.plain_text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// First page of search results.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<WorkspaceObject>,
}

/// First page of database query results, kept raw so the database resource
/// can pass entries through verbatim.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Vec<Value>,
}

/// Direct children of a block or page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlockChildren {
    #[serde(default)]
    pub results: Vec<Block>,
}
