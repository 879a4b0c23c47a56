use crate::types::{Category, MarkedNode};

pub fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((cut, _)) => format!("{}…", &s[..cut]),
        None => s.to_string(),
    }
}

impl MarkedNode {
    pub fn plain(text: impl Into<String>) -> Self {
        MarkedNode::Plain { text: text.into() }
    }

    pub fn tagged(category: Category, text: impl Into<String>) -> Self {
        MarkedNode::Tagged { category, text: text.into() }
    }

    /// Leaf text, `None` for wrappers.
    pub fn leaf_text(&self) -> Option<&str> {
        match self {
            MarkedNode::Plain { text }
            | MarkedNode::Tagged { text, .. }
            | MarkedNode::Match { text, .. } => Some(text),
            MarkedNode::Wrapper { .. } => None,
        }
    }

    /// Category carried by a leaf.
    pub fn category(&self) -> Option<Category> {
        match self {
            MarkedNode::Tagged { category, .. } => Some(*category),
            MarkedNode::Match { category, .. } => *category,
            _ => None,
        }
    }

    /// Depth-first concatenation of all leaf text, ignoring tags.
    pub fn projection(&self) -> String {
        let mut out = String::new();
        self.for_each_leaf(&mut |leaf| {
            if let Some(text) = leaf.leaf_text() {
                out.push_str(text);
            }
        });
        out
    }

    pub fn for_each_leaf<'a>(&'a self, f: &mut impl FnMut(&'a MarkedNode)) {
        match self {
            MarkedNode::Wrapper { children } => {
                for child in children {
                    child.for_each_leaf(f);
                }
            }
            leaf => f(leaf),
        }
    }

    /// All leaves in document order.
    pub fn leaves(&self) -> Vec<&MarkedNode> {
        let mut out = Vec::new();
        self.for_each_leaf(&mut |leaf| out.push(leaf));
        out
    }

    /// Match wrappers in document order.
    pub fn matches(&self) -> Vec<&MarkedNode> {
        self.leaves()
            .into_iter()
            .filter(|leaf| matches!(leaf, MarkedNode::Match { .. }))
            .collect()
    }
}

/// Accumulates sibling nodes, merging adjacent plain text.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    children: Vec<MarkedNode>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plain(&mut self, text: &str) -> &mut Self {
        if text.is_empty() {
            return self;
        }
        if let Some(MarkedNode::Plain { text: last }) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(MarkedNode::plain(text));
        }
        self
    }

    pub fn tagged(&mut self, category: Category, text: &str) -> &mut Self {
        if !text.is_empty() {
            self.children.push(MarkedNode::tagged(category, text));
        }
        self
    }

    /// Pushes a plain or tagged fragment depending on `category`.
    pub fn fragment(&mut self, category: Option<Category>, text: &str) -> &mut Self {
        match category {
            Some(category) => self.tagged(category, text),
            None => self.plain(text),
        }
    }

    pub fn push(&mut self, node: MarkedNode) -> &mut Self {
        self.children.push(node);
        self
    }

    pub fn build(self) -> MarkedNode {
        MarkedNode::Wrapper { children: self.children }
    }
}
