//! Calibration round-trip and metadata log
//!
//! Downstream modeling tools consume the static part of a recording (the
//! subject description plus the calibration frames) as a contract, not a
//! debug dump. [`write_calibration_roundtrip`] re-serializes exactly that
//! subtree as well-formed markup, preserving attribute sets and nesting and
//! stopping at the first live-capture frame. [`write_calibration_log`]
//! renders the same metadata as delimited text.

use crate::mvnx::frames::NORMAL_FRAME_TYPE;
use crate::mvnx::metadata::{joints_info, labels_of, points};
use crate::mvnx::schema::{FieldKey, MappingTable};
use crate::mvnx::tree::{Content, NodeId, Tree};

/// Re-serialize the subject's calibration subtree as well-formed markup.
///
/// Emits the subject element with its attributes, comments, the full
/// segments/points hierarchy, the sensor and joint lists, and the frames
/// container restricted to frames before the first "normal" one. Returns an
/// empty string (with a warning) when the document has no subject.
pub fn write_calibration_roundtrip(tree: &Tree, mapping: &MappingTable) -> String {
    let Some(subject_name) = mapping.element_name(FieldKey::Subject) else {
        return String::new();
    };
    let subjects = tree.find_descendants(tree.root(), subject_name);
    let Some(&subject) = subjects.first() else {
        log::warn!("document has no <{subject_name}> element; nothing to round-trip");
        return String::new();
    };

    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(&open_tag(tree, subject, false));
    out.push('\n');

    for key in [FieldKey::Comment, FieldKey::Segments, FieldKey::Sensors, FieldKey::Joints] {
        if let Some(name) = mapping.element_name(key) {
            for &child in tree.children(subject, name) {
                serialize_node(tree, child, 1, &mut out);
            }
        }
    }

    write_calibration_frames(tree, subject, mapping, &mut out);

    out.push_str(&format!("</{}>\n", tree.node(subject).name()));
    out
}

/// The frames container with only the pre-capture frames.
fn write_calibration_frames(tree: &Tree, subject: NodeId, mapping: &MappingTable, out: &mut String) {
    let (Some(frames_name), Some(frame_name)) = (
        mapping.element_name(FieldKey::Frames),
        mapping.element_name(FieldKey::Frame),
    ) else {
        return;
    };

    for &container in tree.children(subject, frames_name) {
        out.push_str(&indent(1));
        out.push_str(&open_tag(tree, container, false));
        out.push('\n');
        for &frame in tree.children(container, frame_name) {
            if tree.attribute(frame, "type") == NORMAL_FRAME_TYPE {
                break;
            }
            serialize_node(tree, frame, 2, out);
        }
        out.push_str(&indent(1));
        out.push_str(&format!("</{}>\n", tree.node(container).name()));
    }
}

/// Generic recursive serializer; children are written in bucket order.
fn serialize_node(tree: &Tree, id: NodeId, depth: usize, out: &mut String) {
    let node = tree.node(id);
    out.push_str(&indent(depth));
    match node.content() {
        Content::Empty => {
            out.push_str(&open_tag(tree, id, true));
            out.push('\n');
        }
        Content::Text(text) => {
            out.push_str(&open_tag(tree, id, false));
            out.push_str(&escape(text));
            out.push_str(&format!("</{}>\n", node.name()));
        }
        Content::Element(buckets) => {
            out.push_str(&open_tag(tree, id, false));
            out.push('\n');
            for (_, ids) in buckets.iter() {
                for &child in ids {
                    serialize_node(tree, child, depth + 1, out);
                }
            }
            out.push_str(&indent(depth));
            out.push_str(&format!("</{}>\n", node.name()));
        }
    }
}

fn open_tag(tree: &Tree, id: NodeId, self_closing: bool) -> String {
    let node = tree.node(id);
    let mut tag = format!("<{}", node.name());
    for (name, value) in node.attributes() {
        tag.push_str(&format!(" {}=\"{}\"", name, escape(value)));
    }
    tag.push_str(if self_closing { "/>" } else { ">" });
    tag
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render the model metadata (segments, point offsets, joint connectivity,
/// sensors) as sectioned delimited text.
pub fn write_calibration_log(tree: &Tree, mapping: &MappingTable, separator: char) -> String {
    let sep = separator.to_string();
    let mut out = String::new();

    out.push_str("segments\n");
    for label in labels_of(tree, mapping, FieldKey::Segment) {
        out.push_str(&label);
        out.push('\n');
    }

    out.push_str("points\n");
    for point in points(tree, mapping) {
        let offset: Vec<String> = point.offset.iter().map(f64::to_string).collect();
        out.push_str(&[point.segment, point.point, offset.join(&sep)].join(&sep));
        out.push('\n');
    }

    out.push_str("joints\n");
    for joint in joints_info(tree, mapping) {
        out.push_str(&[joint.label, joint.connector1, joint.connector2].join(&sep));
        out.push('\n');
    }

    out.push_str("sensors\n");
    for label in labels_of(tree, mapping, FieldKey::Sensor) {
        out.push_str(&label);
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mvnx::event::Event;
    use crate::mvnx::schema::{mapping_for, FormatVersion};
    use crate::mvnx::tree::build;

    fn doc() -> Tree {
        build(vec![
            Event::StartDocument,
            Event::start("mvnx", &[("version", "4")]),
            Event::start("subject", &[("label", "S01"), ("frameRate", "240")]),
            Event::start("comment", &[]),
            Event::text("morning session"),
            Event::end("comment"),
            Event::start("segments", &[]),
            Event::start("segment", &[("label", "Pelvis")]),
            Event::start("points", &[]),
            Event::start("point", &[("label", "pHipOrigin")]),
            Event::start("pos_b", &[]),
            Event::text("0 0 0"),
            Event::end("pos_b"),
            Event::end("point"),
            Event::end("points"),
            Event::end("segment"),
            Event::end("segments"),
            Event::start("sensors", &[]),
            Event::start("sensor", &[("label", "Pelvis")]),
            Event::end("sensor"),
            Event::end("sensors"),
            Event::start("joints", &[]),
            Event::start("joint", &[("label", "jL5S1")]),
            Event::start("connector1", &[]),
            Event::text("Pelvis/jL5S1"),
            Event::end("connector1"),
            Event::start("connector2", &[]),
            Event::text("L5/jL5S1"),
            Event::end("connector2"),
            Event::end("joint"),
            Event::end("joints"),
            Event::start("frames", &[("segmentCount", "1")]),
            Event::start("frame", &[("type", "identity"), ("time", "0")]),
            Event::start("link_orientation", &[]),
            Event::text("1 0 0 0"),
            Event::end("link_orientation"),
            Event::end("frame"),
            Event::start("frame", &[("type", "tpose"), ("time", "0")]),
            Event::end("frame"),
            Event::start("frame", &[("type", "normal"), ("index", "0"), ("time", "17")]),
            Event::end("frame"),
            Event::start("frame", &[("type", "normal"), ("index", "1"), ("time", "33")]),
            Event::end("frame"),
            Event::end("frames"),
            Event::end("subject"),
            Event::end("mvnx"),
            Event::EndDocument,
        ])
        .unwrap()
    }

    #[test]
    fn test_roundtrip_stops_before_first_normal_frame() {
        let out = write_calibration_roundtrip(&doc(), mapping_for(FormatVersion::V4));
        assert!(out.contains("type=\"identity\""));
        assert!(out.contains("type=\"tpose\""));
        assert!(!out.contains("type=\"normal\""));
    }

    #[test]
    fn test_roundtrip_preserves_subject_attributes() {
        let out = write_calibration_roundtrip(&doc(), mapping_for(FormatVersion::V4));
        assert!(out.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"));
        assert!(out.contains("<subject label=\"S01\" frameRate=\"240\">"));
        assert!(out.trim_end().ends_with("</subject>"));
    }

    #[test]
    fn test_roundtrip_keeps_hierarchy_and_text() {
        let out = write_calibration_roundtrip(&doc(), mapping_for(FormatVersion::V4));
        assert!(out.contains("<comment>morning session</comment>"));
        assert!(out.contains("<segment label=\"Pelvis\">"));
        assert!(out.contains("<pos_b>0 0 0</pos_b>"));
        assert!(out.contains("<sensor label=\"Pelvis\"/>"));
        assert!(out.contains("<connector2>L5/jL5S1</connector2>"));
        assert!(out.contains("<link_orientation>1 0 0 0</link_orientation>"));
    }

    #[test]
    fn test_roundtrip_without_subject_is_empty() {
        let tree = build(vec![
            Event::StartDocument,
            Event::start("mvnx", &[("version", "4")]),
            Event::end("mvnx"),
            Event::EndDocument,
        ])
        .unwrap();
        assert_eq!(write_calibration_roundtrip(&tree, mapping_for(FormatVersion::V4)), "");
    }

    #[test]
    fn test_escaping_in_attributes_and_text() {
        let tree = build(vec![
            Event::StartDocument,
            Event::start("mvnx", &[("version", "4")]),
            Event::start("subject", &[("label", "A<B&\"C\"")]),
            Event::start("comment", &[]),
            Event::text("x < y & z"),
            Event::end("comment"),
            Event::end("subject"),
            Event::end("mvnx"),
            Event::EndDocument,
        ])
        .unwrap();
        let out = write_calibration_roundtrip(&tree, mapping_for(FormatVersion::V4));
        assert!(out.contains("label=\"A&lt;B&amp;&quot;C&quot;\""));
        assert!(out.contains("<comment>x &lt; y &amp; z</comment>"));
    }

    #[test]
    fn test_calibration_log_sections() {
        let out = write_calibration_log(&doc(), mapping_for(FormatVersion::V4), ',');
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "segments");
        assert_eq!(lines[1], "Pelvis");
        assert_eq!(lines[2], "points");
        assert_eq!(lines[3], "Pelvis,pHipOrigin,0,0,0");
        assert_eq!(lines[4], "joints");
        assert_eq!(lines[5], "jL5S1,Pelvis/jL5S1,L5/jL5S1");
        assert_eq!(lines[6], "sensors");
        assert_eq!(lines[7], "Pelvis");
    }
}
