//! Arena-backed attributed tree
//!
//! One [`Node`] per markup element or text leaf. Nodes live in an arena and
//! refer to each other through small integer ids, so the parent
//! back-reference is non-owning by construction: each node is owned by the
//! arena, reachable through its parent's child buckets, and a `NodeId` can
//! never extend a node's lifetime.
//!
//! Whether a node is a text leaf or an element container is not known when
//! the start tag is seen; it is decided by the first `set_text` /
//! `add_child` call. The [`Content`] variant makes the two shapes mutually
//! exclusive: attaching a child to a text node (or text to an element node)
//! is a structural violation, not a recoverable condition.

use std::fmt;

/// Index of a node inside its [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A document-level invariant was broken while building or mutating a tree.
///
/// These indicate a malformed or desynchronized event stream and abort the
/// whole build; none of them are recoverable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    /// `set_text` was called on a node that already has children.
    TextOnElement { element: String },
    /// `add_child` was called on a node previously marked as a text leaf.
    ChildOnTextNode { parent: String, child: String },
    /// An end tag did not match the element open on top of the stack.
    MismatchedEnd { expected: String, found: String },
    /// An end tag arrived with no element open.
    UnbalancedEnd { element: String },
    /// The document ended while elements were still open.
    UnclosedElements { open: usize },
    /// The document ended without ever opening a root element.
    MissingRoot,
}

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuralError::TextOnElement { element } => {
                write!(f, "cannot set text on <{element}>: it already has child elements")
            }
            StructuralError::ChildOnTextNode { parent, child } => {
                write!(f, "cannot add <{child}> to <{parent}>: it is a text leaf")
            }
            StructuralError::MismatchedEnd { expected, found } => {
                write!(f, "end tag </{found}> does not close the open element <{expected}>")
            }
            StructuralError::UnbalancedEnd { element } => {
                write!(f, "end tag </{element}> arrived with no element open")
            }
            StructuralError::UnclosedElements { open } => {
                write!(f, "document ended with {open} element(s) still open")
            }
            StructuralError::MissingRoot => {
                write!(f, "document ended without a root element")
            }
        }
    }
}

impl std::error::Error for StructuralError {}

/// Children of an element, grouped by element name.
///
/// Buckets are kept in insertion order of the first occurrence of each
/// distinct child name; within a bucket, nodes are in document order. This
/// grouping is load-bearing: descendant searches and the round-trip writer
/// iterate buckets in this order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildBuckets {
    buckets: Vec<(String, Vec<NodeId>)>,
}

impl ChildBuckets {
    fn push(&mut self, name: &str, id: NodeId) {
        if let Some((_, ids)) = self.buckets.iter_mut().find(|(n, _)| n == name) {
            ids.push(id);
        } else {
            self.buckets.push((name.to_string(), vec![id]));
        }
    }

    /// Nodes of the bucket for `name`, or an empty slice if there is none.
    pub fn get(&self, name: &str) -> &[NodeId] {
        self.buckets
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, ids)| ids.as_slice())
            .unwrap_or(&[])
    }

    /// Iterate buckets in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[NodeId])> {
        self.buckets
            .iter()
            .map(|(name, ids)| (name.as_str(), ids.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// What a node holds: nothing yet, a text payload, or child elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Neither text nor children have been attached (e.g. `<sensor/>`).
    Empty,
    Text(String),
    Element(ChildBuckets),
}

/// One markup element or text leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    name: String,
    attributes: Vec<(String, String)>,
    parent: Option<NodeId>,
    content: Content,
}

impl Node {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attribute value for `name`, or the empty string when absent.
    pub fn attribute(&self, name: &str) -> &str {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }

    /// All attributes in document order.
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    /// Text payload, if this node is a text leaf.
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            Content::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Child buckets, if this node is an element container.
    pub fn buckets(&self) -> Option<&ChildBuckets> {
        match &self.content {
            Content::Element(buckets) => Some(buckets),
            _ => None,
        }
    }
}

/// Owning store for every node of one document.
#[derive(Debug, Clone, Default)]
pub struct Arena {
    nodes: Vec<Node>,
}

impl Arena {
    pub fn new() -> Self {
        Arena::default()
    }

    /// Create a node. Attributes are fixed at creation; the parent link is
    /// set once here and never reassigned.
    pub fn alloc(
        &mut self,
        name: String,
        attributes: Vec<(String, String)>,
        parent: Option<NodeId>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name,
            attributes,
            parent,
            content: Content::Empty,
        });
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Attach a text payload to `id`, marking it as a text leaf.
    pub fn set_text(&mut self, id: NodeId, text: String) -> Result<(), StructuralError> {
        let node = &mut self.nodes[id.0];
        match node.content {
            Content::Element(_) => Err(StructuralError::TextOnElement {
                element: node.name.clone(),
            }),
            _ => {
                node.content = Content::Text(text);
                Ok(())
            }
        }
    }

    /// Append `child` to the matching bucket of `parent`, marking the parent
    /// as an element container. The child's parent link must already point
    /// at `parent`.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), StructuralError> {
        debug_assert_eq!(self.nodes[child.0].parent, Some(parent));
        let child_name = self.nodes[child.0].name.clone();
        let node = &mut self.nodes[parent.0];
        match &mut node.content {
            Content::Text(_) => Err(StructuralError::ChildOnTextNode {
                parent: node.name.clone(),
                child: child_name,
            }),
            Content::Element(buckets) => {
                buckets.push(&child_name, child);
                Ok(())
            }
            Content::Empty => {
                let mut buckets = ChildBuckets::default();
                buckets.push(&child_name, child);
                node.content = Content::Element(buckets);
                Ok(())
            }
        }
    }
}

/// A fully built document tree: the arena plus its root node.
#[derive(Debug, Clone)]
pub struct Tree {
    arena: Arena,
    root: NodeId,
}

impl Tree {
    pub(crate) fn new(arena: Arena, root: NodeId) -> Self {
        Tree { arena, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        self.arena.node(id)
    }

    /// Total number of nodes, root included.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Attribute value of `id`, or the empty string when absent.
    pub fn attribute(&self, id: NodeId, name: &str) -> &str {
        self.node(id).attribute(name)
    }

    /// Text payload of `id`, if it is a text leaf.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.node(id).text()
    }

    /// Direct children of `id` with element name `name`, in document order.
    pub fn children(&self, id: NodeId, name: &str) -> &[NodeId] {
        self.node(id)
            .buckets()
            .map(|buckets| buckets.get(name))
            .unwrap_or(&[])
    }

    /// Every descendant of `id` (at any depth) whose element name matches.
    ///
    /// Results are accumulated bottom-up per branch (a child's matching
    /// descendants come before the child itself) and branches are
    /// concatenated in bucket order, i.e. grouped by first-seen child tag
    /// rather than strict document order. This mirrors the historical
    /// behaviour that downstream tooling depends on.
    pub fn find_descendants(&self, id: NodeId, name: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        if let Some(buckets) = self.node(id).buckets() {
            for (_, ids) in buckets.iter() {
                for &child in ids {
                    found.extend(self.find_descendants(child, name));
                    if self.node(child).name() == name {
                        found.push(child);
                    }
                }
            }
        }
        found
    }
}
