//! Markup event model
//!
//! This module defines the flat event sequence consumed by the tree builder.
//! It is the interface boundary towards the tokenizer: anything able to
//! produce these events (the bundled quick-xml adapter in
//! [`crate::mvnx::reader`], a test fixture, a recorded stream) can drive the
//! builder.

/// One attribute as it appears on a start tag, in document order.
pub type Attribute = (String, String);

/// A single markup parse event.
///
/// Events arrive in document order. `Comment` events are accepted and
/// ignored by the builder; they are kept in the model so event sources do
/// not have to filter them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    StartDocument,
    StartElement {
        name: String,
        attributes: Vec<Attribute>,
    },
    Characters(String),
    Comment(String),
    EndElement(String),
    EndDocument,
}

impl Event {
    /// Convenience constructor for a start tag.
    pub fn start(name: &str, attributes: &[(&str, &str)]) -> Self {
        Event::StartElement {
            name: name.to_string(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Convenience constructor for an end tag.
    pub fn end(name: &str) -> Self {
        Event::EndElement(name.to_string())
    }

    /// Convenience constructor for a character run.
    pub fn text(text: &str) -> Self {
        Event::Characters(text.to_string())
    }
}
