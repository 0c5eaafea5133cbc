// ABOUTME: One-time compilation of literal string segments into a static skeleton
// ABOUTME: Locates every dynamic position and records an ordered part descriptor for it

use tracing::debug;

use crate::dom::{Document, NodeId};

use super::error::{Result, TemplateError};

/// The reserved token joined between literal segments so dynamic positions
/// survive one round-trip through markup parsing and can be located by
/// content inspection. Private to the crate; not a compatibility surface.
pub(crate) const MARKER: &str = "{{}}";

/// The static string segments of one literal site.
///
/// Site identity is the address of the slice: the [`html!`](crate::html!)
/// macro expands to a per-call-site `static`, so one site always presents
/// the same slice and two sites never share one, even with identical text.
pub type TemplateStrings = &'static [&'static str];

/// Immutable descriptor for one dynamic position in a template skeleton.
///
/// `index` is the node's position in the document-order walk produced by
/// [`Document::descendants`] over the finished skeleton; instance binding
/// replays that walk over the clone, so the two can never disagree.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    /// A dynamic attribute; consumes `strings.len() - 1` values per update.
    Attribute {
        index: usize,
        name: String,
        raw_name: String,
        strings: Vec<String>,
    },
    /// A dynamic child position; the indexed node is the slot's start marker
    /// and its next sibling is the end marker. Consumes one value.
    Node { index: usize },
}

impl TemplatePart {
    pub fn index(&self) -> usize {
        match self {
            TemplatePart::Attribute { index, .. } | TemplatePart::Node { index } => *index,
        }
    }
}

/// A parsed template: the static skeleton for one literal site plus the
/// ordered list of dynamic-position descriptors. Parsed once, cached
/// process-wide, and shared behind `Rc` by every result and instance.
#[derive(Debug)]
pub struct Template {
    strings: TemplateStrings,
    parts: Vec<TemplatePart>,
    skeleton: Document,
    root: NodeId,
}

impl Template {
    /// Parse one literal site's segments into a skeleton and part list.
    pub fn parse(strings: TemplateStrings) -> Result<Self> {
        let mut skeleton = Document::new();
        let markup = strings.join(MARKER);
        let root = skeleton.parse_fragment(&markup)?;

        let mut parts = Vec::new();
        // Position of the node currently being placed, counted in the walk
        // of the *finished* skeleton (spliced nodes in, removed nodes out).
        let mut index = 0usize;
        // Which literal segment precedes the next dynamic position.
        let mut segment_cursor = 0usize;
        let mut nodes_to_remove = Vec::new();
        let mut attributes_to_remove: Vec<(NodeId, String)> = Vec::new();

        // Snapshot first: splicing happens while we iterate, and mutating a
        // live walk would desynchronize the indices.
        let snapshot: Vec<NodeId> = skeleton.descendants(root).collect();
        for node in snapshot {
            if skeleton.is_element(node) {
                let attrs: Vec<(String, String)> = skeleton
                    .attributes(node)
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect();
                for (name, value) in attrs {
                    let pieces: Vec<&str> = value.split(MARKER).collect();
                    if pieces.len() > 1 {
                        let preceding = strings[segment_cursor];
                        let raw_name = extract_raw_name(preceding).ok_or_else(|| {
                            TemplateError::MalformedAttribute {
                                segment: preceding.to_string(),
                            }
                        })?;
                        segment_cursor += pieces.len() - 1;
                        parts.push(TemplatePart::Attribute {
                            index,
                            name: name.clone(),
                            raw_name,
                            strings: pieces.iter().map(|s| s.to_string()).collect(),
                        });
                        attributes_to_remove.push((node, name));
                    }
                }
                index += 1;
            } else if let Some(text) = skeleton.text(node).map(str::to_string) {
                if text.contains(MARKER) {
                    let pieces: Vec<&str> = text.split(MARKER).collect();
                    for (i, piece) in pieces.iter().enumerate() {
                        let literal = skeleton.create_text(piece);
                        skeleton.insert_before(literal, node)?;
                        index += 1;
                        if i + 1 < pieces.len() {
                            let start = skeleton.create_text("");
                            let end = skeleton.create_text("");
                            skeleton.insert_before(start, node)?;
                            skeleton.insert_before(end, node)?;
                            parts.push(TemplatePart::Node { index });
                            index += 2;
                            segment_cursor += 1;
                        }
                    }
                    // The unsplit original is removed after the walk; it
                    // occupies no position in the finished skeleton.
                    nodes_to_remove.push(node);
                } else {
                    index += 1;
                }
            } else {
                index += 1;
            }
        }

        for node in nodes_to_remove {
            skeleton.detach(node);
        }
        for (node, name) in attributes_to_remove {
            skeleton.remove_attribute(node, &name)?;
        }

        debug!(
            segments = strings.len(),
            parts = parts.len(),
            "compiled template"
        );
        Ok(Self {
            strings,
            parts,
            skeleton,
            root,
        })
    }

    pub fn strings(&self) -> TemplateStrings {
        self.strings
    }

    pub fn parts(&self) -> &[TemplatePart] {
        &self.parts
    }

    pub fn skeleton(&self) -> &Document {
        &self.skeleton
    }

    pub fn root(&self) -> NodeId {
        self.root
    }
}

/// Extract the attribute name that ends a literal segment, e.g. the `class`
/// in `<div class="`. Mirrors a trailing `name=` / `name="` / `name='`
/// pattern; returns None when the segment does not end in one.
fn extract_raw_name(segment: &str) -> Option<String> {
    let rest = segment
        .strip_suffix('"')
        .or_else(|| segment.strip_suffix('\''))
        .unwrap_or(segment);
    let rest = rest.strip_suffix('=').unwrap_or(rest);
    let start = rest
        .rfind(|c: char| !is_raw_name_char(c))
        .map(|i| i + rest[i..].chars().next().map_or(1, char::len_utf8))
        .unwrap_or(0);
    let name = &rest[start..];
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn is_raw_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '.' || c == '-' || c == '_'
}
