//! Tree-derived recording metadata
//!
//! Name lists, per-segment point offsets and joint connectivity, pulled out
//! of the calibration section of the tree. These feed the column labels of
//! the tabular writer and the metadata log.

use serde::{Deserialize, Serialize};

use crate::mvnx::schema::{FieldKey, MappingTable};
use crate::mvnx::tree::{NodeId, Tree};

/// Segment, sensor and joint labels in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentNames {
    pub segments: Vec<String>,
    pub sensors: Vec<String>,
    pub joints: Vec<String>,
}

/// One anatomical point and its offset within its segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOffset {
    pub segment: String,
    pub point: String,
    pub offset: Vec<f64>,
}

/// One joint and the two segment points it connects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointInfo {
    pub label: String,
    pub connector1: String,
    pub connector2: String,
}

/// `label` attributes of every element mapped by `key`, skipping unlabeled
/// ones. Returns an empty list when the revision has no such element.
pub fn labels_of(tree: &Tree, mapping: &MappingTable, key: FieldKey) -> Vec<String> {
    let Some(name) = mapping.element_name(key) else {
        return Vec::new();
    };
    tree.find_descendants(tree.root(), name)
        .into_iter()
        .map(|id| tree.attribute(id, "label"))
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .collect()
}

/// All name lists used for column label generation.
pub fn document_names(tree: &Tree, mapping: &MappingTable) -> DocumentNames {
    DocumentNames {
        segments: labels_of(tree, mapping, FieldKey::Segment),
        sensors: labels_of(tree, mapping, FieldKey::Sensor),
        joints: labels_of(tree, mapping, FieldKey::Joint),
    }
}

/// Point offsets grouped per segment, in document order.
pub fn points(tree: &Tree, mapping: &MappingTable) -> Vec<PointOffset> {
    let mut out = Vec::new();
    let (Some(segment_name), Some(points_name), Some(point_name), Some(pos_name)) = (
        mapping.element_name(FieldKey::Segment),
        mapping.element_name(FieldKey::Points),
        mapping.element_name(FieldKey::Point),
        mapping.element_name(FieldKey::Pos),
    ) else {
        return out;
    };

    for segment in tree.find_descendants(tree.root(), segment_name) {
        let segment_label = tree.attribute(segment, "label").to_string();
        for &points_node in tree.children(segment, points_name) {
            for &point in tree.children(points_node, point_name) {
                let offset = tree
                    .children(point, pos_name)
                    .first()
                    .and_then(|&pos| tree.text(pos))
                    .map(parse_floats)
                    .unwrap_or_default();
                out.push(PointOffset {
                    segment: segment_label.clone(),
                    point: tree.attribute(point, "label").to_string(),
                    offset,
                });
            }
        }
    }
    out
}

/// Joint labels with their connector endpoints, in document order.
pub fn joints_info(tree: &Tree, mapping: &MappingTable) -> Vec<JointInfo> {
    let (Some(joint_name), Some(connector1), Some(connector2)) = (
        mapping.element_name(FieldKey::Joint),
        mapping.element_name(FieldKey::Connector1),
        mapping.element_name(FieldKey::Connector2),
    ) else {
        return Vec::new();
    };

    tree.find_descendants(tree.root(), joint_name)
        .into_iter()
        .map(|joint| JointInfo {
            label: tree.attribute(joint, "label").to_string(),
            connector1: child_text(tree, joint, connector1),
            connector2: child_text(tree, joint, connector2),
        })
        .collect()
}

fn child_text(tree: &Tree, id: NodeId, name: &str) -> String {
    tree.children(id, name)
        .first()
        .and_then(|&child| tree.text(child))
        .unwrap_or("")
        .to_string()
}

fn parse_floats(text: &str) -> Vec<f64> {
    text.split_whitespace()
        .filter_map(|token| token.parse().ok())
        .collect()
}
