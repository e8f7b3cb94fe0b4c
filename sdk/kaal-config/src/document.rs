//! Document Parser
//!
//! Indentation-delimited recursive descent over the manifest text. Produces a
//! generic tree of [`Node`]s and knows nothing about containers.
//!
//! # Grammar
//! Each physical line is one of:
//! - blank or `#` comment (skipped)
//! - sequence item: `- value`, `- key: value`, or a bare `-` followed by an
//!   indented block
//! - key/value: `key: value`, or `key:` followed by an indented block (or by a
//!   sequence at the key's own indentation)
//!
//! A `- key: value` item opens an implicit mapping at the column of `key`;
//! later lines at that column extend it:
//!
//! ```text
//! physical:
//!   - start: 0x100000
//!     end: 0xe00000
//! ```
//!
//! Anything else aborts parsing with the offending line number. There is no
//! recovery.

use crate::error::ParseError;
use crate::scalar::{self, Scalar};

/// Generic document tree node
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Mapping(Mapping),
    Sequence(Vec<Node>),
    Scalar(Scalar),
}

impl Node {
    pub fn null() -> Self {
        Node::Scalar(Scalar::Null)
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Node::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Node]> {
        match self {
            Node::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Node::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// Look up `key` if this node is a mapping
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_mapping().and_then(|map| map.get(key))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Scalar(Scalar::Null))
    }

    /// Short type name for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Mapping(_) => "mapping",
            Node::Sequence(_) => "sequence",
            Node::Scalar(Scalar::Null) => "null",
            Node::Scalar(Scalar::Bool(_)) => "boolean",
            Node::Scalar(Scalar::Int(_)) => "integer",
            Node::Scalar(Scalar::Float(_)) => "float",
            Node::Scalar(Scalar::Str(_)) => "string",
        }
    }
}

/// Ordered mapping with unique keys
///
/// Re-inserting a key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping {
    entries: Vec<(String, Node)>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Node) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse manifest text into a document tree
///
/// An empty document (only blanks and comments) yields an empty mapping.
pub fn parse(text: &str) -> Result<Node, ParseError> {
    let lines = logical_lines(text)?;
    log::debug!("document: {} logical lines", lines.len());

    let Some(first) = lines.first().copied() else {
        return Ok(Node::Mapping(Mapping::new()));
    };

    let mut parser = Parser { lines, pos: 0 };
    let root = parser.parse_block(first.indent)?;

    if let Some(line) = parser.peek() {
        return Err(ParseError::new(line.number, line.text, "Unexpected indentation"));
    }

    Ok(root)
}

#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    number: usize,
    indent: usize,
    text: &'a str,
}

/// Split text into significant lines, comments stripped
///
/// `- key: value` items are rewritten into a bare `-` marker followed by
/// `key: value` at the key's column, so every later stage only has to handle
/// "item with scalar" and "item with nested block".
fn logical_lines(text: &str) -> Result<Vec<Line<'_>>, ParseError> {
    let mut lines = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let number = idx + 1;
        let body = raw.trim_start();
        if body.is_empty() || body.starts_with('#') {
            continue;
        }

        let leading = &raw[..raw.len() - body.len()];
        if leading.contains('\t') {
            return Err(ParseError::new(number, raw, "Tabs are not allowed in indentation"));
        }

        let body = scalar::strip_comment(body);
        push_line(&mut lines, number, leading.len(), body);
    }

    Ok(lines)
}

fn push_line<'a>(lines: &mut Vec<Line<'a>>, number: usize, indent: usize, text: &'a str) {
    if is_item(text) {
        let rest = &text[1..];
        let content = rest.trim_start();
        if !content.is_empty() && (is_item(content) || split_key(content).is_some()) {
            lines.push(Line {
                number,
                indent,
                text: "-",
            });
            let column = indent + 1 + (rest.len() - content.len());
            push_line(lines, number, column, content);
            return;
        }
    }
    lines.push(Line {
        number,
        indent,
        text,
    });
}

fn is_item(text: &str) -> bool {
    text == "-" || text.starts_with("- ")
}

/// Split `key: rest` at the first unquoted `:` followed by whitespace or EOL
fn split_key(text: &str) -> Option<(&str, &str)> {
    let mut quote: Option<char> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if (ch == '"' || ch == '\'') && idx == 0 => quote = Some(ch),
            None if ch == ':' => {
                let at_boundary = chars.peek().map_or(true, |(_, next)| next.is_whitespace());
                if at_boundary {
                    let key = text[..idx].trim();
                    if key.is_empty() {
                        return None;
                    }
                    let key = scalar::unquote(key).unwrap_or(key);
                    return Some((key, text[idx + 1..].trim()));
                }
            }
            None => {}
        }
    }

    None
}

/// Type an inline value: `{}`, `[a, b]`, or a scalar
fn inline_value(text: &str) -> Node {
    if text == "{}" {
        return Node::Mapping(Mapping::new());
    }
    if let Some(items) = scalar::split_inline_list(text) {
        let items = items.into_iter().map(|item| Node::Scalar(scalar::coerce(item)));
        return Node::Sequence(items.collect());
    }
    Node::Scalar(scalar::coerce(text))
}

struct Parser<'a> {
    lines: Vec<Line<'a>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<Line<'a>> {
        self.lines.get(self.pos).copied()
    }

    fn parse_block(&mut self, indent: usize) -> Result<Node, ParseError> {
        match self.peek() {
            Some(line) if is_item(line.text) => self.parse_sequence(indent),
            Some(_) => self.parse_mapping(indent),
            None => Ok(Node::null()),
        }
    }

    fn parse_mapping(&mut self, base: usize) -> Result<Node, ParseError> {
        let mut map = Mapping::new();

        while let Some(line) = self.peek() {
            if line.indent < base {
                break;
            }
            if is_item(line.text) {
                return Err(ParseError::new(
                    line.number,
                    line.text,
                    "Unexpected sequence item inside mapping",
                ));
            }

            let Some((key, rest)) = split_key(line.text) else {
                return Err(ParseError::new(line.number, line.text, "Unexpected content"));
            };
            self.pos += 1;

            let value = if rest.is_empty() {
                self.parse_nested(line.indent)?
            } else {
                inline_value(rest)
            };
            map.insert(key, value);
        }

        Ok(Node::Mapping(map))
    }

    /// Value of a `key:` line with nothing after the colon
    fn parse_nested(&mut self, key_indent: usize) -> Result<Node, ParseError> {
        match self.peek() {
            Some(next) if next.indent > key_indent => self.parse_block(next.indent),
            Some(next) if next.indent == key_indent && is_item(next.text) => {
                self.parse_sequence(key_indent)
            }
            _ => Ok(Node::null()),
        }
    }

    fn parse_sequence(&mut self, base: usize) -> Result<Node, ParseError> {
        let mut items = Vec::new();

        while let Some(line) = self.peek() {
            if line.indent < base || !is_item(line.text) && line.indent == base {
                break;
            }
            if line.indent > base {
                return Err(ParseError::new(line.number, line.text, "Unexpected indentation"));
            }
            self.pos += 1;

            let content = line.text[1..].trim();
            let item = if content.is_empty() {
                match self.peek() {
                    Some(next) if next.indent > base => self.parse_block(next.indent)?,
                    _ => Node::null(),
                }
            } else {
                inline_value(content)
            };
            items.push(item);
        }

        Ok(Node::Sequence(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
# Test manifest
schemaVersion: 1
kconfig: pb926

containers:
  - id: 0
    name: "hello_world0"
    type: baremetal
    project: hello_world

    pager:
      lma: 0x100000
      vma: 0xa0000000

    memory:
      physical:
        - start: 0x100000
          end: 0xe00000

      virtual:
        - start: 0xa0000000
          end: 0xb0000000

    capabilities:
      pools:
        thread:
          enabled: true
          size: 64

      tctrl:
        enabled: true
        target: current_container

    devices: []
"#;

    #[test]
    fn parses_nested_manifest() {
        let root = parse(SAMPLE).unwrap();
        assert_eq!(root.get("schemaVersion"), Some(&Node::Scalar(Scalar::Int(1))));
        assert_eq!(root.get("kconfig"), Some(&Node::Scalar(Scalar::Str("pb926".into()))));

        let containers = root.get("containers").unwrap().as_sequence().unwrap();
        assert_eq!(containers.len(), 1);

        let cont = &containers[0];
        assert_eq!(cont.get("name"), Some(&Node::Scalar(Scalar::Str("hello_world0".into()))));
        assert_eq!(
            cont.get("pager").unwrap().get("vma"),
            Some(&Node::Scalar(Scalar::Int(0xa000_0000)))
        );

        let physical = cont.get("memory").unwrap().get("physical").unwrap().as_sequence().unwrap();
        assert_eq!(physical.len(), 1);
        assert_eq!(physical[0].get("start"), Some(&Node::Scalar(Scalar::Int(0x100000))));
        assert_eq!(physical[0].get("end"), Some(&Node::Scalar(Scalar::Int(0xe00000))));

        let tctrl = cont.get("capabilities").unwrap().get("tctrl").unwrap();
        assert_eq!(tctrl.get("enabled"), Some(&Node::Scalar(Scalar::Bool(true))));
        assert_eq!(cont.get("devices"), Some(&Node::Sequence(vec![])));
    }

    #[test]
    fn mapping_preserves_order() {
        let root = parse("b: 1\na: 2\nc: 3\n").unwrap();
        let keys: Vec<_> = root.as_mapping().unwrap().keys().collect();
        assert_eq!(keys, ["b", "a", "c"]);
    }

    #[test]
    fn duplicate_key_replaces_value() {
        let root = parse("a: 1\nb: 2\na: 3\n").unwrap();
        let map = root.as_mapping().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("a"), Some(&Node::Scalar(Scalar::Int(3))));
    }

    #[test]
    fn multiple_record_items() {
        let text = concat!(
            "regions:\n",
            "  - start: 0x1000\n",
            "    end: 0x2000\n",
            "  - start: 0x3000\n",
            "    end: 0x4000\n",
        );
        let root = parse(text).unwrap();
        let regions = root.get("regions").unwrap().as_sequence().unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[1].get("start"), Some(&Node::Scalar(Scalar::Int(0x3000))));
        assert_eq!(regions[1].get("end"), Some(&Node::Scalar(Scalar::Int(0x4000))));
    }

    #[test]
    fn sequence_at_key_indentation() {
        let text = "items:\n- a\n- b\nafter: 1\n";
        let root = parse(text).unwrap();
        assert_eq!(
            root.get("items"),
            Some(&Node::Sequence(vec![
                Node::Scalar(Scalar::Str("a".into())),
                Node::Scalar(Scalar::Str("b".into())),
            ]))
        );
        assert_eq!(root.get("after"), Some(&Node::Scalar(Scalar::Int(1))));
    }

    #[test]
    fn item_with_nested_block_under_first_key() {
        let text = "list:\n  - pager:\n      lma: 0x100\n    name: x\n";
        let root = parse(text).unwrap();
        let item = &root.get("list").unwrap().as_sequence().unwrap()[0];
        assert_eq!(item.get("pager").unwrap().get("lma"), Some(&Node::Scalar(Scalar::Int(0x100))));
        assert_eq!(item.get("name"), Some(&Node::Scalar(Scalar::Str("x".into()))));
    }

    #[test]
    fn bare_dash_item_with_block() {
        let text = "list:\n  -\n    a: 1\n  - 2\n";
        let root = parse(text).unwrap();
        let list = root.get("list").unwrap().as_sequence().unwrap();
        assert_eq!(list[0].get("a"), Some(&Node::Scalar(Scalar::Int(1))));
        assert_eq!(list[1], Node::Scalar(Scalar::Int(2)));
    }

    #[test]
    fn inline_values() {
        let root = parse("a: [1, two, \"x,y\"]\nb: {}\nc:\n").unwrap();
        assert_eq!(
            root.get("a"),
            Some(&Node::Sequence(vec![
                Node::Scalar(Scalar::Int(1)),
                Node::Scalar(Scalar::Str("two".into())),
                Node::Scalar(Scalar::Str("x,y".into())),
            ]))
        );
        assert_eq!(root.get("b"), Some(&Node::Mapping(Mapping::new())));
        assert_eq!(root.get("c"), Some(&Node::null()));
    }

    #[test]
    fn comments_and_quotes() {
        let root = parse("name: \"a # not comment\" # comment\nurl: http://x\n").unwrap();
        assert_eq!(root.get("name"), Some(&Node::Scalar(Scalar::Str("a # not comment".into()))));
        assert_eq!(root.get("url"), Some(&Node::Scalar(Scalar::Str("http://x".into()))));
    }

    #[test]
    fn empty_document_is_empty_mapping() {
        assert_eq!(parse("\n# nothing\n\n").unwrap(), Node::Mapping(Mapping::new()));
    }

    #[test]
    fn malformed_line_reports_number() {
        let err = parse("schemaVersion: 1\njust some words\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.content, "just some words");
    }

    #[test]
    fn sequence_item_inside_mapping_is_rejected() {
        let err = parse("a: 1\n- b\n").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn over_indented_item_is_rejected() {
        let err = parse("list:\n  - a\n    - b\n").unwrap_err();
        assert_eq!(err.line, 3);
    }

    #[test]
    fn tab_indentation_is_rejected() {
        let err = parse("a:\n\tb: 1\n").unwrap_err();
        assert_eq!(err.line, 2);
    }
}
