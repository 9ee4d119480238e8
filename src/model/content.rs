//! Chapter content payloads and word counting

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single block of a structured document
///
/// The block is held as the caller sent it; only a string `text` field is
/// read for sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Block(Value);

impl Block {
    pub fn new(text: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("text".to_string(), Value::String(text.into()));
        Self(Value::Object(fields))
    }

    /// Text span of the block, if it carries one as a string
    pub fn text(&self) -> Option<&str> {
        self.0.get("text").and_then(Value::as_str)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

/// A structured document: a `blocks` array plus whatever editor metadata
/// travels alongside it (ids, timestamps, versions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub blocks: Vec<Block>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Content of a chapter or version
///
/// Plain text arrives as a JSON string, structured documents as
/// `{"blocks": [{"text": ...}, ...], ...}`. Anything else is kept as-is so it
/// round-trips through storage, but sizes to zero words.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    PlainText(String),
    Blocks(Document),
    Other(Value),
}

impl Content {
    pub fn plain(text: impl Into<String>) -> Self {
        Content::PlainText(text.into())
    }

    pub fn blocks<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Content::Blocks(Document {
            blocks: texts.into_iter().map(Block::new).collect(),
            extra: Map::new(),
        })
    }

    /// Number of whitespace-delimited words in this content
    pub fn word_count(&self) -> u32 {
        match self {
            Content::PlainText(text) => count_tokens(text),
            Content::Blocks(doc) => doc.blocks.iter().filter_map(Block::text).map(count_tokens).sum(),
            Content::Other(_) => 0,
        }
    }
}

/// Word count of optional content; absent content counts as zero.
pub fn word_count(content: Option<&Content>) -> u32 {
    content.map(Content::word_count).unwrap_or(0)
}

fn count_tokens(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}
