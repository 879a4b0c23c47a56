use crate::types::{Category, MarkedNode};

const RESET: &str = "\x1b[0m";
const MATCH: &str = "\x1b[7m";
const CURRENT_MATCH: &str = "\x1b[1;30;43m";

/// Output flavour of the terminal surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Format {
    #[default]
    Ansi,
    Html,
    Plain,
}

pub fn render(node: &MarkedNode, format: Format) -> String {
    match format {
        Format::Ansi => to_ansi(node),
        Format::Html => to_html(node),
        Format::Plain => node.projection(),
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Walks the tree into a `<pre>` block. Text is escaped at the leaves, which
/// is the only place untrusted content enters the markup.
pub fn to_html(node: &MarkedNode) -> String {
    let mut out = String::from("<pre>");
    write_html(node, &mut out);
    out.push_str("</pre>");
    out
}

fn write_html(node: &MarkedNode, out: &mut String) {
    match node {
        MarkedNode::Plain { text } => out.push_str(&escape_html(text)),
        MarkedNode::Tagged { category, text } => write_span(*category, text, out),
        MarkedNode::Wrapper { children } => {
            out.push_str("<span>");
            for child in children {
                write_html(child, out);
            }
            out.push_str("</span>");
        }
        MarkedNode::Match { index, category, text, current } => {
            let class = if *current { "search-highlight current" } else { "search-highlight" };
            out.push_str(&format!("<mark class=\"{class}\" data-match=\"{index}\">"));
            match category {
                Some(category) => write_span(*category, text, out),
                None => out.push_str(&escape_html(text)),
            }
            out.push_str("</mark>");
        }
    }
}

fn write_span(category: Category, text: &str, out: &mut String) {
    out.push_str(&format!("<span class=\"{}\">", category.class_name()));
    out.push_str(&escape_html(text));
    out.push_str("</span>");
}

fn ansi_color(category: Category) -> &'static str {
    match category {
        Category::Key => "\x1b[36m",
        Category::String => "\x1b[32m",
        Category::Number => "\x1b[33m",
        Category::Boolean => "\x1b[35m",
        Category::Null => "\x1b[90m",
    }
}

pub fn to_ansi(node: &MarkedNode) -> String {
    let mut out = String::new();
    node.for_each_leaf(&mut |leaf| match leaf {
        MarkedNode::Plain { text } => out.push_str(text),
        MarkedNode::Tagged { category, text } => {
            out.push_str(ansi_color(*category));
            out.push_str(text);
            out.push_str(RESET);
        }
        MarkedNode::Match { text, current, .. } => {
            out.push_str(if *current { CURRENT_MATCH } else { MATCH });
            out.push_str(text);
            out.push_str(RESET);
        }
        MarkedNode::Wrapper { .. } => {}
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::highlight;
    use crate::search::search;

    #[test]
    fn html_escapes_string_contents() {
        let html = to_html(&highlight(r#"{"x": "<script>&"}"#));
        assert!(html.contains("&lt;script&gt;&amp;"), "{html}");
        assert!(!html.contains("<script>"));
        assert!(html.contains("<span class=\"json-key\">&quot;x&quot;</span>"));
    }

    #[test]
    fn html_match_keeps_inner_category() {
        let (_, view) = search(&highlight(r#"{"name": 1}"#), "am");
        let html = to_html(&view.root);
        assert!(html.contains(
            "<mark class=\"search-highlight current\" data-match=\"0\"><span class=\"json-key\">am</span></mark>"
        ), "{html}");
    }

    #[test]
    fn plain_format_is_the_projection() {
        let node = highlight("[null]");
        assert_eq!(render(&node, Format::Plain), "[null]");
        assert_eq!(render(&node, Format::Ansi), "[\x1b[90mnull\x1b[0m]");
    }
}
