//! Stack-based incremental tree construction
//!
//! The builder consumes a flat [`Event`] sequence and produces exactly one
//! [`Tree`]. Its only state is a LIFO stack of not-yet-closed nodes: a start
//! tag pushes a node whose parent is the current stack top, the matching end
//! tag pops it and attaches it to the new top, and the end of the document
//! pops the sole survivor as the root.
//!
//! An optional allow-list restricts which element names are materialized.
//! Start and end tags of disabled names are skipped symmetrically so the
//! stack never desynchronizes; children of a skipped element are attached to
//! the nearest enabled ancestor.

use std::collections::HashSet;

use crate::mvnx::event::Event;
use crate::mvnx::tree::node::{Arena, NodeId, StructuralError, Tree};

/// Incremental builder; feed it events with [`TreeBuilder::handle`] and
/// collect the result with [`TreeBuilder::finish`].
#[derive(Debug, Default)]
pub struct TreeBuilder {
    arena: Arena,
    stack: Vec<NodeId>,
    root: Option<NodeId>,
    allowed: Option<HashSet<String>>,
    /// One entry per currently open element, materialized or not; tracks
    /// whether the innermost open element was skipped, so its text does not
    /// leak onto the nearest materialized ancestor.
    nesting: Vec<bool>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        TreeBuilder::default()
    }

    /// Builder that only materializes elements whose name is in `names`.
    pub fn with_allow_list<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TreeBuilder {
            allowed: Some(names.into_iter().map(Into::into).collect()),
            ..TreeBuilder::default()
        }
    }

    /// Without a configured allow-list, every element is enabled.
    fn enabled(&self, name: &str) -> bool {
        match &self.allowed {
            Some(allowed) => allowed.contains(name),
            None => true,
        }
    }

    /// Process one event.
    pub fn handle(&mut self, event: Event) -> Result<(), StructuralError> {
        match event {
            Event::StartDocument | Event::Comment(_) => Ok(()),
            Event::StartElement { name, attributes } => {
                if self.enabled(&name) {
                    let parent = self.stack.last().copied();
                    let id = self.arena.alloc(name, attributes, parent);
                    self.stack.push(id);
                    self.nesting.push(true);
                } else {
                    self.nesting.push(false);
                }
                Ok(())
            }
            Event::Characters(text) => {
                // Text inside a skipped element belongs to that element, not
                // to whatever materialized ancestor is on the stack.
                if self.nesting.last() == Some(&false) {
                    return Ok(());
                }
                // Before the root opens there is nothing to attach text to.
                if let Some(&top) = self.stack.last() {
                    self.arena.set_text(top, text)?;
                }
                Ok(())
            }
            Event::EndElement(name) => {
                self.nesting.pop();
                if !self.enabled(&name) {
                    return Ok(());
                }
                let &top = self
                    .stack
                    .last()
                    .ok_or(StructuralError::UnbalancedEnd { element: name.clone() })?;
                if self.arena.node(top).name() != name {
                    return Err(StructuralError::MismatchedEnd {
                        expected: self.arena.node(top).name().to_string(),
                        found: name,
                    });
                }
                // Depth one is the eventual root; it stays until EndDocument.
                if self.stack.len() > 1 {
                    let child = self.stack.pop().unwrap_or(top);
                    let &parent = self.stack.last().unwrap_or(&top);
                    self.arena.add_child(parent, child)?;
                }
                Ok(())
            }
            Event::EndDocument => match self.stack.len() {
                0 => Err(StructuralError::MissingRoot),
                1 => {
                    self.root = self.stack.pop();
                    Ok(())
                }
                open => Err(StructuralError::UnclosedElements { open }),
            },
        }
    }

    /// Consume the builder and return the finished tree.
    pub fn finish(self) -> Result<Tree, StructuralError> {
        if !self.stack.is_empty() {
            return Err(StructuralError::UnclosedElements { open: self.stack.len() });
        }
        let root = self.root.ok_or(StructuralError::MissingRoot)?;
        Ok(Tree::new(self.arena, root))
    }
}

/// Build a tree from a complete event sequence.
pub fn build<I>(events: I) -> Result<Tree, StructuralError>
where
    I: IntoIterator<Item = Event>,
{
    let mut builder = TreeBuilder::new();
    for event in events {
        builder.handle(event)?;
    }
    builder.finish()
}

/// Build a tree, materializing only the listed element names.
pub fn build_with_allow_list<I, N, S>(events: I, names: N) -> Result<Tree, StructuralError>
where
    I: IntoIterator<Item = Event>,
    N: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut builder = TreeBuilder::with_allow_list(names);
    for event in events {
        builder.handle(event)?;
    }
    builder.finish()
}
