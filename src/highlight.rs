use std::sync::OnceLock;

use regex::Regex;

use crate::tree::TreeBuilder;
use crate::types::{Category, MarkedNode};

// Alternation order is the priority order: strings, then literals, then numbers.
const TOKEN_PATTERN: &str = r#"(?P<string>"(?:\\u[a-zA-Z0-9]{4}|\\[^u]|[^\\"])*")(?P<colon>\s*:)?|\b(?P<literal>true|false|null)\b|-?[0-9]+(?:\.[0-9]*)?(?:[eE][+\-]?[0-9]+)?"#;

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TOKEN_PATTERN).expect("token pattern is valid"))
}

/// Splits pretty-printed JSON into plain and tagged fragments.
///
/// Everything the token pattern does not recognise (braces, brackets, commas,
/// colons, whitespace) is emitted as plain text, so concatenating the leaves
/// reproduces `text` exactly.
pub fn highlight(text: &str) -> MarkedNode {
    let mut builder = TreeBuilder::new();
    let mut last = 0;

    for caps in token_regex().captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        builder.plain(&text[last..whole.start()]);

        if let Some(string) = caps.name("string") {
            match caps.name("colon") {
                Some(colon) => {
                    builder.tagged(Category::Key, string.as_str());
                    builder.plain(colon.as_str());
                }
                None => {
                    builder.tagged(Category::String, string.as_str());
                }
            }
        } else if let Some(literal) = caps.name("literal") {
            let category = if literal.as_str() == "null" {
                Category::Null
            } else {
                Category::Boolean
            };
            builder.tagged(category, literal.as_str());
        } else {
            builder.tagged(Category::Number, whole.as_str());
        }

        last = whole.end();
    }
    builder.plain(&text[last..]);

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged(node: &MarkedNode) -> Vec<(Category, String)> {
        node.leaves()
            .into_iter()
            .filter_map(|leaf| match leaf {
                MarkedNode::Tagged { category, text } => Some((*category, text.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn tags_keys_strings_and_numbers() {
        let node = highlight("{\n  \"a\": 1,\n  \"b\": \"x\"\n}");
        assert_eq!(
            tagged(&node),
            vec![
                (Category::Key, "\"a\"".to_string()),
                (Category::Number, "1".to_string()),
                (Category::Key, "\"b\"".to_string()),
                (Category::String, "\"x\"".to_string()),
            ]
        );
    }

    #[test]
    fn colon_after_key_stays_plain() {
        let node = highlight("{\"k\"  : null}");
        assert_eq!(
            node,
            MarkedNode::Wrapper {
                children: vec![
                    MarkedNode::plain("{"),
                    MarkedNode::tagged(Category::Key, "\"k\""),
                    MarkedNode::plain("  : "),
                    MarkedNode::tagged(Category::Null, "null"),
                    MarkedNode::plain("}"),
                ]
            }
        );
    }

    #[test]
    fn escapes_stay_inside_string_token() {
        let node = highlight(r#"["say \"hi\" é", "a:b"]"#);
        assert_eq!(
            tagged(&node),
            vec![
                (Category::String, r#""say \"hi\" é""#.to_string()),
                (Category::String, r#""a:b""#.to_string()),
            ]
        );
    }

    #[test]
    fn literals_and_signed_exponents() {
        let node = highlight("[true, false, -1.5e+10, 0]");
        assert_eq!(
            tagged(&node),
            vec![
                (Category::Boolean, "true".to_string()),
                (Category::Boolean, "false".to_string()),
                (Category::Number, "-1.5e+10".to_string()),
                (Category::Number, "0".to_string()),
            ]
        );
    }

    #[test]
    fn digits_inside_strings_are_not_numbers() {
        let node = highlight(r#"{"id42": "v1.2"}"#);
        assert!(tagged(&node).iter().all(|(c, _)| *c != Category::Number));
    }

    #[test]
    fn markup_characters_pass_through_verbatim() {
        let text = r#"{"html": "<b>&amp;</b>"}"#;
        assert_eq!(highlight(text).projection(), text);
    }
}
