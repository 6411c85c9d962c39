//! Typed per-frame records and their extraction from the document tree
//!
//! A [`Frame`] is one sampled instant of the recording: either a live
//! capture sample (`type == "normal"`) or one of the calibration /
//! neutral-pose phase markers that precede it. Frames are derived read-only
//! from the tree and keep no reference back into it, so the tree can be
//! discarded once extraction is done.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::mvnx::schema::{FieldKey, FormatVersion, MappingTable};
use crate::mvnx::tree::{NodeId, Tree};

/// Frame type tag marking a live-capture sample. Anything else is a
/// calibration phase marker.
pub const NORMAL_FRAME_TYPE: &str = "normal";

/// Scalar properties of one frame.
///
/// Counts come from the enclosing frames container; the rest from the frame
/// element itself. `index` is an optional ordinal: it is absent for some
/// calibration frames in one revision and a negative sentinel in another,
/// and both collapse to `None` here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameInfo {
    pub segment_count: u32,
    pub sensor_count: u32,
    pub joint_count: u32,
    /// Time offset from the start of the recording.
    pub time: i64,
    /// Wall-clock time string as written in the document.
    pub clock_time: String,
    /// Monotonically increasing millisecond clock value.
    pub clock_ms: u64,
    pub frame_type: String,
    pub index: Option<i64>,
}

impl FrameInfo {
    pub fn is_normal(&self) -> bool {
        self.frame_type == NORMAL_FRAME_TYPE
    }
}

/// One extracted frame: its properties, the raw data fields keyed by the
/// literal element name, and the synthesized `segment:point` contact pairs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub info: FrameInfo,
    pub data: BTreeMap<String, String>,
    pub contacts: Vec<String>,
}

/// Frame extraction failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// The single-frame parser was handed a node that is not a frame
    /// element. This is a caller-side logic error, not a data-quality
    /// issue, so the whole run aborts.
    NotAFrame { element: String },
    /// The active revision has no element name for a key the extractor
    /// itself depends on.
    UnsupportedKey { key: FieldKey, version: FormatVersion },
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::NotAFrame { element } => {
                write!(f, "expected a frame element, got <{element}>")
            }
            ExtractError::UnsupportedKey { key, version } => {
                write!(f, "field {key:?} is not defined in format version {version}")
            }
        }
    }
}

impl std::error::Error for ExtractError {}

fn required_name(
    mapping: &MappingTable,
    key: FieldKey,
) -> Result<&'static str, ExtractError> {
    mapping.element_name(key).ok_or(ExtractError::UnsupportedKey {
        key,
        version: mapping.version(),
    })
}

/// Extract every frame under the document's frames container(s), in
/// document order.
///
/// A document without a frames container yields an empty sequence with a
/// warning; a calibration-only or allow-list-filtered tree is not an error.
pub fn extract_frames(tree: &Tree, mapping: &MappingTable) -> Result<Vec<Frame>, ExtractError> {
    let frames_name = required_name(mapping, FieldKey::Frames)?;
    let frame_name = required_name(mapping, FieldKey::Frame)?;

    let containers = tree.find_descendants(tree.root(), frames_name);
    if containers.is_empty() {
        log::warn!("document has no <{frames_name}> container; no frames extracted");
        return Ok(Vec::new());
    }

    let mut frames = Vec::new();
    for container in containers {
        for frame_node in tree.find_descendants(container, frame_name) {
            frames.push(parse_frame(tree, frame_node, mapping)?);
        }
    }
    Ok(frames)
}

/// Parse a single frame element.
///
/// Precondition: `id` must name a frame element in the active revision;
/// anything else aborts the run.
pub fn parse_frame(
    tree: &Tree,
    id: NodeId,
    mapping: &MappingTable,
) -> Result<Frame, ExtractError> {
    let frame_name = required_name(mapping, FieldKey::Frame)?;
    let contacts_name = required_name(mapping, FieldKey::Contacts)?;
    let contact_name = required_name(mapping, FieldKey::Contact)?;

    let node = tree.node(id);
    if node.name() != frame_name {
        return Err(ExtractError::NotAFrame {
            element: node.name().to_string(),
        });
    }

    let mut frame = Frame {
        info: frame_info(tree, id),
        ..Frame::default()
    };

    if let Some(buckets) = node.buckets() {
        for (bucket_name, ids) in buckets.iter() {
            if bucket_name == contacts_name {
                for &contacts_node in ids {
                    for &contact in tree.children(contacts_node, contact_name) {
                        frame.contacts.push(format!(
                            "{}:{}",
                            tree.attribute(contact, "segment"),
                            tree.attribute(contact, "point")
                        ));
                    }
                }
            } else if let Some(&first) = ids.first() {
                frame
                    .data
                    .insert(bucket_name.to_string(), tree.text(first).unwrap_or("").to_string());
            }
        }
    }
    Ok(frame)
}

/// Populate the frame properties from the frame's own attributes and its
/// parent container's counts.
fn frame_info(tree: &Tree, id: NodeId) -> FrameInfo {
    let node = tree.node(id);
    let (segment_count, sensor_count, joint_count) = match node.parent() {
        Some(parent) => (
            parse_or_zero(tree.attribute(parent, "segmentCount")),
            parse_or_zero(tree.attribute(parent, "sensorCount")),
            parse_or_zero(tree.attribute(parent, "jointCount")),
        ),
        None => (0, 0, 0),
    };

    FrameInfo {
        segment_count,
        sensor_count,
        joint_count,
        time: node.attribute("time").parse().unwrap_or(0),
        clock_time: node.attribute("tc").to_string(),
        clock_ms: node.attribute("ms").parse().unwrap_or(0),
        frame_type: node.attribute("type").to_string(),
        index: parse_index(node.attribute("index")),
    }
}

fn parse_or_zero(raw: &str) -> u32 {
    raw.parse().unwrap_or(0)
}

/// An absent index and a negative sentinel both mean "unset".
fn parse_index(raw: &str) -> Option<i64> {
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<i64>() {
        Ok(n) if n >= 0 => Some(n),
        Ok(_) => None,
        Err(_) => {
            log::warn!("unparseable frame index '{raw}' treated as unset");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mvnx::event::Event;
    use crate::mvnx::schema::mapping_for;
    use crate::mvnx::tree::build;

    fn capture_doc() -> Tree {
        build(vec![
            Event::StartDocument,
            Event::start("mvnx", &[("version", "4")]),
            Event::start("subject", &[]),
            Event::start(
                "frames",
                &[("segmentCount", "2"), ("sensorCount", "1"), ("jointCount", "1")],
            ),
            Event::start("frame", &[("type", "identity"), ("time", "0"), ("ms", "10")]),
            Event::start("link_orientation", &[]),
            Event::text("1 0 0 0 1 0 0 0"),
            Event::end("link_orientation"),
            Event::end("frame"),
            Event::start(
                "frame",
                &[
                    ("type", "normal"),
                    ("index", "3"),
                    ("time", "40"),
                    ("tc", "10:47:03.048"),
                    ("ms", "100"),
                ],
            ),
            Event::start("link_position", &[]),
            Event::text("1 2 3 4 5 6"),
            Event::end("link_position"),
            Event::start("contacts", &[]),
            Event::start("contact", &[("segment", "LeftFoot"), ("point", "pHeel")]),
            Event::end("contact"),
            Event::start("contact", &[("segment", "RightFoot"), ("point", "pToe")]),
            Event::end("contact"),
            Event::end("contacts"),
            Event::end("frame"),
            Event::end("frames"),
            Event::end("subject"),
            Event::end("mvnx"),
            Event::EndDocument,
        ])
        .unwrap()
    }

    #[test]
    fn test_extract_frames_in_document_order() {
        let tree = capture_doc();
        let mapping = mapping_for(FormatVersion::V4);
        let frames = extract_frames(&tree, mapping).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].info.frame_type, "identity");
        assert_eq!(frames[1].info.frame_type, "normal");
    }

    #[test]
    fn test_frame_properties() {
        let tree = capture_doc();
        let frames = extract_frames(&tree, mapping_for(FormatVersion::V4)).unwrap();
        let normal = &frames[1];
        assert!(normal.info.is_normal());
        assert_eq!(normal.info.index, Some(3));
        assert_eq!(normal.info.time, 40);
        assert_eq!(normal.info.clock_ms, 100);
        assert_eq!(normal.info.clock_time, "10:47:03.048");
        assert_eq!(normal.info.segment_count, 2);
        assert_eq!(normal.info.sensor_count, 1);
        assert_eq!(normal.info.joint_count, 1);
        assert_eq!(normal.data["link_position"], "1 2 3 4 5 6");
    }

    #[test]
    fn test_missing_index_is_unset() {
        let tree = capture_doc();
        let frames = extract_frames(&tree, mapping_for(FormatVersion::V4)).unwrap();
        assert_eq!(frames[0].info.index, None);
    }

    #[test]
    fn test_negative_index_is_unset() {
        assert_eq!(parse_index("-10"), None);
        assert_eq!(parse_index("0"), Some(0));
        assert_eq!(parse_index(""), None);
    }

    #[test]
    fn test_contacts_are_synthesized() {
        let tree = capture_doc();
        let frames = extract_frames(&tree, mapping_for(FormatVersion::V4)).unwrap();
        assert_eq!(frames[1].contacts, vec!["LeftFoot:pHeel", "RightFoot:pToe"]);
        assert!(!frames[1].data.contains_key("contacts"));
    }

    #[test]
    fn test_parse_frame_rejects_non_frame_node() {
        let tree = capture_doc();
        let mapping = mapping_for(FormatVersion::V4);
        let subject = tree.find_descendants(tree.root(), "subject")[0];
        assert_eq!(
            parse_frame(&tree, subject, mapping).unwrap_err(),
            ExtractError::NotAFrame { element: "subject".to_string() }
        );
    }

    #[test]
    fn test_frame_serializes_to_json() {
        let tree = capture_doc();
        let frames = extract_frames(&tree, mapping_for(FormatVersion::V4)).unwrap();
        let json = serde_json::to_value(&frames[1]).unwrap();
        assert_eq!(json["info"]["index"], 3);
        assert_eq!(json["info"]["frame_type"], "normal");
        assert_eq!(json["data"]["link_position"], "1 2 3 4 5 6");
    }

    #[test]
    fn test_document_without_frames_yields_empty() {
        let tree = build(vec![
            Event::StartDocument,
            Event::start("mvnx", &[("version", "4")]),
            Event::start("subject", &[]),
            Event::end("subject"),
            Event::end("mvnx"),
            Event::EndDocument,
        ])
        .unwrap();
        let frames = extract_frames(&tree, mapping_for(FormatVersion::V4)).unwrap();
        assert!(frames.is_empty());
    }
}
