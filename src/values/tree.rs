//! Position-stamped value trees.
//!
//! Values files are parsed through the marked-event parser so that every
//! node and every mapping key carries the exact line and column of its
//! definition. Mapping key order is preserved for completion ordering;
//! lookup ignores it.

use compact_str::CompactString;
use indexmap::IndexMap;
use std::path::PathBuf;
use std::sync::Arc;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::Marker;

/// The file a mark points into: a plain file on disk, or an entry inside a
/// `.tgz` chart package addressed by chart-relative path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValuesFile {
    OnDisk(PathBuf),
    InArchive { archive: PathBuf, inner: String },
}

impl ValuesFile {
    pub fn is_archive(&self) -> bool {
        matches!(self, ValuesFile::InArchive { .. })
    }

    /// Short display name for completion details.
    pub fn display_name(&self) -> String {
        match self {
            ValuesFile::OnDisk(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            ValuesFile::InArchive { archive, inner } => {
                let archive_name = archive
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| archive.display().to_string());
                format!("{}!{}", archive_name, inner)
            }
        }
    }
}

/// Zero-based source position inside a values file.
#[derive(Debug, Clone)]
pub struct Mark {
    pub file: Arc<ValuesFile>,
    pub line: u32,
    pub character: u32,
}

#[derive(Debug, Clone)]
pub enum ValueNode {
    Scalar(ScalarNode),
    Mapping(MappingNode),
    Sequence(SequenceNode),
}

#[derive(Debug, Clone)]
pub struct ScalarNode {
    pub value: CompactString,
    pub mark: Mark,
}

#[derive(Debug, Clone)]
pub struct MappingNode {
    pub entries: IndexMap<CompactString, MappingEntry>,
    pub mark: Mark,
}

#[derive(Debug, Clone)]
pub struct MappingEntry {
    /// Position of the key itself, the navigation target for this entry.
    pub key_mark: Mark,
    pub node: ValueNode,
}

#[derive(Debug, Clone)]
pub struct SequenceNode {
    pub items: Vec<ValueNode>,
    pub mark: Mark,
}

impl ValueNode {
    pub fn mark(&self) -> &Mark {
        match self {
            ValueNode::Scalar(s) => &s.mark,
            ValueNode::Mapping(m) => &m.mark,
            ValueNode::Sequence(s) => &s.mark,
        }
    }

    pub fn as_mapping(&self) -> Option<&MappingNode> {
        match self {
            ValueNode::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Walks the tree along `path`, mapping level by mapping level.
    pub fn descend<S: AsRef<str>>(&self, path: &[S]) -> Option<&ValueNode> {
        let mut current = self;
        for segment in path {
            current = &current.as_mapping()?.entries.get(segment.as_ref())?.node;
        }
        Some(current)
    }

    /// Position of the key defining the final segment of `path`.
    pub fn key_position<S: AsRef<str>>(&self, path: &[S]) -> Option<&Mark> {
        let (last, prefix) = path.split_last()?;
        let container = self.descend(prefix)?.as_mapping()?;
        container
            .entries
            .get(last.as_ref())
            .map(|entry| &entry.key_mark)
    }

    /// One-line rendering of the node for completion details.
    pub fn preview(&self) -> String {
        match self {
            ValueNode::Scalar(s) if s.value.is_empty() => "\"\"".to_string(),
            ValueNode::Scalar(s) => s.value.to_string(),
            ValueNode::Mapping(m) => format!("{{{} keys}}", m.entries.len()),
            ValueNode::Sequence(s) => format!("[{} items]", s.items.len()),
        }
    }
}

/// Parses values text into a position-stamped tree, every mark tagged with
/// `file`. Returns `None` for empty documents and for text that does not
/// scan as YAML; a broken values file contributes nothing.
pub fn parse_values_text(text: &str, file: Arc<ValuesFile>) -> Option<ValueNode> {
    let mut builder = TreeBuilder {
        file,
        stack: Vec::new(),
        root: None,
    };
    let mut parser = Parser::new(text.chars());
    if let Err(e) = parser.load(&mut builder, false) {
        tracing::debug!("values parse failed: {}", e);
        return None;
    }
    builder.root
}

struct TreeBuilder {
    file: Arc<ValuesFile>,
    stack: Vec<Frame>,
    root: Option<ValueNode>,
}

enum Frame {
    Mapping {
        entries: IndexMap<CompactString, MappingEntry>,
        mark: Mark,
        pending_key: Option<(CompactString, Mark)>,
    },
    Sequence {
        items: Vec<ValueNode>,
        mark: Mark,
    },
}

impl TreeBuilder {
    fn mark_at(&self, marker: Marker) -> Mark {
        Mark {
            file: self.file.clone(),
            // Scanner lines are one-based, columns zero-based.
            line: marker.line().saturating_sub(1) as u32,
            character: marker.col() as u32,
        }
    }

    fn attach(&mut self, node: ValueNode) {
        match self.stack.last_mut() {
            Some(Frame::Mapping {
                entries,
                pending_key,
                ..
            }) => match pending_key.take() {
                Some((key, key_mark)) => {
                    entries.insert(key, MappingEntry { key_mark, node });
                }
                None => {
                    // Key position. Non-scalar keys cannot be addressed by a
                    // dotted path and are dropped with their values.
                    if let ValueNode::Scalar(s) = node {
                        *pending_key = Some((s.value, s.mark));
                    }
                }
            },
            Some(Frame::Sequence { items, .. }) => items.push(node),
            None => {
                if self.root.is_none() {
                    self.root = Some(node);
                }
            }
        }
    }
}

impl MarkedEventReceiver for TreeBuilder {
    fn on_event(&mut self, event: Event, marker: Marker) {
        match event {
            Event::Scalar(value, _, _, _) => {
                let mark = self.mark_at(marker);
                self.attach(ValueNode::Scalar(ScalarNode {
                    value: CompactString::from(value),
                    mark,
                }));
            }
            Event::MappingStart(_, _) => {
                let mark = self.mark_at(marker);
                self.stack.push(Frame::Mapping {
                    entries: IndexMap::new(),
                    mark,
                    pending_key: None,
                });
            }
            Event::MappingEnd => {
                if let Some(Frame::Mapping { entries, mark, .. }) = self.stack.pop() {
                    self.attach(ValueNode::Mapping(MappingNode { entries, mark }));
                }
            }
            Event::SequenceStart(_, _) => {
                let mark = self.mark_at(marker);
                self.stack.push(Frame::Sequence {
                    items: Vec::new(),
                    mark,
                });
            }
            Event::SequenceEnd => {
                if let Some(Frame::Sequence { items, mark }) = self.stack.pop() {
                    self.attach(ValueNode::Sequence(SequenceNode { items, mark }));
                }
            }
            Event::Alias(_) => {
                // Anchors are not resolved; the alias site degrades to an
                // empty scalar while the anchor itself resolves normally.
                let mark = self.mark_at(marker);
                self.attach(ValueNode::Scalar(ScalarNode {
                    value: CompactString::default(),
                    mark,
                }));
            }
            _ => {}
        }
    }
}
