use serde::Serialize;

/// Semantic category of a highlighted JSON token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Key,
    String,
    Number,
    Boolean,
    Null,
}

impl Category {
    /// CSS class used by the HTML renderer.
    pub fn class_name(self) -> &'static str {
        match self {
            Category::Key => "json-key",
            Category::String => "json-string",
            Category::Number => "json-number",
            Category::Boolean => "json-boolean",
            Category::Null => "json-null",
        }
    }
}

/// Typed markup tree produced by the highlighter and overlaid by search.
///
/// Renderers walk this tree to build concrete display elements; it is never
/// serialized to a markup string and parsed back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MarkedNode {
    Plain {
        text: String,
    },
    Tagged {
        category: Category,
        text: String,
    },
    Wrapper {
        children: Vec<MarkedNode>,
    },
    /// A located query occurrence. `category` keeps the class of the token it
    /// was cut from, `None` for untagged text.
    Match {
        index: usize,
        category: Option<Category>,
        text: String,
        current: bool,
    },
}

/// One occurrence of the query in the plain-text projection.
///
/// `start` and `len` count chars; the byte range is kept for slicing leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchSpan {
    pub start: usize,
    pub len: usize,
    #[serde(skip)]
    pub(crate) byte_start: usize,
    #[serde(skip)]
    pub(crate) byte_end: usize,
}

impl MatchSpan {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// The marked tree with match wrappers layered on top.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedView {
    pub root: MarkedNode,
    pub current: Option<usize>,
    /// False when the current match straddles two leaves and therefore has no
    /// wrapper to scroll to.
    pub current_rendered: bool,
}

/// The mutually exclusive states of the display pane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum Presentation {
    Placeholder,
    Error { message: String },
    Formatted,
}
