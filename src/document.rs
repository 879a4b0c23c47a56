use serde_json::Value;

use crate::error::ParseError;
use crate::highlight::highlight;
use crate::types::MarkedNode;

/// A successfully parsed selection: its canonical pretty form and the
/// highlighted tree built from it. Replaced wholesale on every new selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pretty: String,
    marked: MarkedNode,
}

impl Document {
    /// Parses `raw`, re-serializes it with 2-space indentation and highlights it.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let value: Value = serde_json::from_str(raw)?;
        let pretty = canonicalize(&value)?;
        let marked = highlight(&pretty);
        Ok(Self { pretty, marked })
    }

    pub fn pretty(&self) -> &str {
        &self.pretty
    }

    pub fn marked(&self) -> &MarkedNode {
        &self.marked
    }
}

/// Stable 2-space pretty print. Object keys keep their source order.
pub fn canonicalize(value: &Value) -> Result<String, ParseError> {
    Ok(serde_json::to_string_pretty(value)?)
}
