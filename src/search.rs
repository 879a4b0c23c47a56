use regex::{Regex, RegexBuilder};
use serde::Serialize;
use tracing::{debug, warn};

use crate::tree::TreeBuilder;
use crate::types::{MarkedNode, MatchSpan, RenderedView};

/// Position of the current match within the current match set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum Cursor {
    /// No query, or the query has no matches.
    #[default]
    Empty,
    Active { index: usize, total: usize },
}

impl Cursor {
    fn starting(total: usize) -> Self {
        if total == 0 {
            Cursor::Empty
        } else {
            Cursor::Active { index: 0, total }
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            Cursor::Empty => None,
            Cursor::Active { index, .. } => Some(*index),
        }
    }

    /// The current index, `-1` when there is no active match.
    pub fn current_index(&self) -> isize {
        self.index().map_or(-1, |i| i as isize)
    }

    pub fn total(&self) -> usize {
        match self {
            Cursor::Empty => 0,
            Cursor::Active { total, .. } => *total,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Cursor::Empty => Cursor::Empty,
            Cursor::Active { index, total } => Cursor::Active { index: (index + 1) % total, total },
        }
    }

    pub fn previous(self) -> Self {
        match self {
            Cursor::Empty => Cursor::Empty,
            Cursor::Active { index, total } => Cursor::Active { index: (index + total - 1) % total, total },
        }
    }

    /// `"0/0"` when empty, otherwise the 1-based position over the total.
    pub fn counter(&self) -> String {
        match self {
            Cursor::Empty => "0/0".to_string(),
            Cursor::Active { index, total } => format!("{}/{}", index + 1, total),
        }
    }
}

fn literal_regex(query: &str) -> Option<Regex> {
    match RegexBuilder::new(&regex::escape(query)).case_insensitive(true).build() {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(error = %e, "query could not be compiled, treating as no matches");
            None
        }
    }
}

/// Finds every non-overlapping, case-insensitive occurrence of `query` in
/// `haystack`, greedily from the left. The query is matched literally.
pub fn find_matches(haystack: &str, query: &str) -> Vec<MatchSpan> {
    if query.is_empty() {
        return Vec::new();
    }
    let Some(re) = literal_regex(query) else {
        return Vec::new();
    };

    let mut spans = Vec::new();
    let mut chars_before = 0;
    let mut scanned = 0;
    for m in re.find_iter(haystack) {
        chars_before += haystack[scanned..m.start()].chars().count();
        let len = m.as_str().chars().count();
        spans.push(MatchSpan {
            start: chars_before,
            len,
            byte_start: m.start(),
            byte_end: m.end(),
        });
        chars_before += len;
        scanned = m.end();
    }
    spans
}

/// Rebuilds `root` with a match wrapper around every match that lies inside
/// a single leaf. Matches that straddle two leaves are counted by
/// [`find_matches`] but get no wrapper.
pub fn overlay(root: &MarkedNode, matches: &[MatchSpan], current: Option<usize>) -> RenderedView {
    if matches.is_empty() {
        return RenderedView { root: root.clone(), current: None, current_rendered: false };
    }
    let mut walker = Overlay { matches, current, next: 0, offset: 0, current_rendered: false };
    let root = walker.rebuild(root);
    RenderedView { root, current, current_rendered: walker.current_rendered }
}

struct Overlay<'m> {
    matches: &'m [MatchSpan],
    current: Option<usize>,
    next: usize,
    // byte offset of the next leaf within the projection
    offset: usize,
    current_rendered: bool,
}

impl Overlay<'_> {
    fn rebuild(&mut self, node: &MarkedNode) -> MarkedNode {
        match node {
            MarkedNode::Wrapper { children } => MarkedNode::Wrapper {
                children: children.iter().map(|child| self.rebuild(child)).collect(),
            },
            leaf => self.rebuild_leaf(leaf),
        }
    }

    fn rebuild_leaf(&mut self, leaf: &MarkedNode) -> MarkedNode {
        let text = leaf.leaf_text().unwrap_or_default();
        let leaf_start = self.offset;
        let leaf_end = leaf_start + text.len();
        self.offset = leaf_end;

        let mut inside = Vec::new();
        while let Some(span) = self.matches.get(self.next) {
            if span.byte_start >= leaf_end {
                break;
            }
            if span.byte_end <= leaf_end {
                inside.push((self.next, *span));
            } else {
                debug!(index = self.next, start = span.start, "match crosses a token boundary");
            }
            self.next += 1;
        }
        if inside.is_empty() {
            return leaf.clone();
        }

        let category = leaf.category();
        let mut builder = TreeBuilder::new();
        let mut cut = 0;
        for (index, span) in inside {
            let start = span.byte_start - leaf_start;
            let end = span.byte_end - leaf_start;
            let current = self.current == Some(index);
            self.current_rendered |= current;
            builder.fragment(category, &text[cut..start]);
            builder.push(MarkedNode::Match {
                index,
                category,
                text: text[start..end].to_string(),
                current,
            });
            cut = end;
        }
        builder.fragment(category, &text[cut..]);
        builder.build()
    }
}

/// One-shot search: the match set and the view with the first match current.
pub fn search(root: &MarkedNode, query: &str) -> (Vec<MatchSpan>, RenderedView) {
    let matches = find_matches(&root.projection(), query.trim());
    let current = if matches.is_empty() { None } else { Some(0) };
    let view = overlay(root, &matches, current);
    (matches, view)
}

/// Query, match set and cursor for the displayed document.
///
/// The match set is derived fresh on every query change and the cursor is
/// only ever valid for it.
#[derive(Debug, Clone, Default)]
pub struct SearchSession {
    query: String,
    matches: Vec<MatchSpan>,
    cursor: Cursor,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn matches(&self) -> &[MatchSpan] {
        &self.matches
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn counter(&self) -> String {
        self.cursor.counter()
    }

    /// Recomputes the match set for `query` over `root` and moves the cursor
    /// to the first match.
    pub fn set_query(&mut self, root: &MarkedNode, query: &str) -> RenderedView {
        let (matches, view) = search(root, query);
        self.query = query.trim().to_string();
        self.cursor = Cursor::starting(matches.len());
        self.matches = matches;
        debug!(query = %self.query, total = self.matches.len(), "search recomputed");
        view
    }

    /// Advances with wrap-around. `None` when there is nothing to navigate.
    pub fn next(&mut self, root: &MarkedNode) -> Option<RenderedView> {
        self.step(root, Cursor::next)
    }

    pub fn previous(&mut self, root: &MarkedNode) -> Option<RenderedView> {
        self.step(root, Cursor::previous)
    }

    fn step(&mut self, root: &MarkedNode, f: fn(Cursor) -> Cursor) -> Option<RenderedView> {
        if self.cursor == Cursor::Empty {
            return None;
        }
        self.cursor = f(self.cursor);
        Some(self.view(root))
    }

    pub fn view(&self, root: &MarkedNode) -> RenderedView {
        overlay(root, &self.matches, self.cursor.index())
    }

    /// Forgets the query, the match set and the cursor.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
