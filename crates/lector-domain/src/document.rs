//! Documents handed to the pipeline

use crate::traits::DocumentText;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;

/// Field names checked, in order, when building a document from loose JSON
const TEXT_FIELDS: [&str; 3] = ["content", "text", "data"];

/// An immutable text payload plus optional name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Display name (usually the file name)
    pub name: Option<String>,
    /// Plain text content
    pub text: String,
}

impl Document {
    /// Create an unnamed document
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            name: None,
            text: text.into(),
        }
    }

    /// Attach a name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Build a document from whatever object an ingestion layer produced
    ///
    /// The first of `content`, `text`, `data` present on an object is used;
    /// non-string values there are coerced to their JSON text. Objects with
    /// none of those fields are serialized whole. A bare string is used as-is
    /// and any other bare value becomes its JSON text. A string `name` field
    /// becomes the document name.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::String(s) => Self::new(s.clone()),
            Value::Object(map) => {
                let name = map
                    .get("name")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                let text = TEXT_FIELDS
                    .iter()
                    .find_map(|field| map.get(*field))
                    .map(value_to_text)
                    .unwrap_or_else(|| value.to_string());
                Self { name, text }
            }
            other => Self::new(other.to_string()),
        }
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl DocumentText for Document {
    fn plain_text(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.text)
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl From<String> for Document {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<&str> for Document {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}
