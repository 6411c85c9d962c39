//! Column-labelled tabular output
//!
//! Renders the extracted frame sequence as delimited text: one generated
//! header row, then one data row per live-capture frame. Column labels are
//! `element:item.axis` triples, where the element name comes from the
//! active revision's mapping, item names from the document's segment /
//! sensor / joint lists, and the axis suffix from the field kind (XYZ, or
//! WXYZ for quaternion-valued fields).
//!
//! Alignment is a contract: every row carries exactly the header's column
//! count, with missing data padded by empty separated placeholders.

use crate::mvnx::frames::Frame;
use crate::mvnx::metadata::DocumentNames;
use crate::mvnx::schema::{FieldKey, MappingTable};

/// Selectable output fields, in the order their columns appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputField {
    LinkPosition,
    LinkVelocity,
    LinkAcceleration,
    LinkOrientation,
    LinkAngularVelocity,
    LinkAngularAcceleration,
    SensorOrientation,
    SensorAngularVelocity,
    SensorAcceleration,
    SensorFreeBodyAcceleration,
    SensorMagneticField,
    JointAngle,
    JointAngleXzy,
    CenterOfMass,
}

/// Which name list provides the per-item labels of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemDomain {
    Segments,
    Sensors,
    Joints,
    /// Whole-body quantities have a single synthetic item.
    Body,
}

const XYZ: [&str; 3] = ["X", "Y", "Z"];
const WXYZ: [&str; 4] = ["W", "X", "Y", "Z"];

impl OutputField {
    pub fn key(self) -> FieldKey {
        match self {
            OutputField::LinkPosition => FieldKey::LinkPosition,
            OutputField::LinkVelocity => FieldKey::LinkVelocity,
            OutputField::LinkAcceleration => FieldKey::LinkAcceleration,
            OutputField::LinkOrientation => FieldKey::LinkOrientation,
            OutputField::LinkAngularVelocity => FieldKey::LinkAngularVelocity,
            OutputField::LinkAngularAcceleration => FieldKey::LinkAngularAcceleration,
            OutputField::SensorOrientation => FieldKey::SensorOrientation,
            OutputField::SensorAngularVelocity => FieldKey::SensorAngularVelocity,
            OutputField::SensorAcceleration => FieldKey::SensorAcceleration,
            OutputField::SensorFreeBodyAcceleration => FieldKey::SensorFreeBodyAcceleration,
            OutputField::SensorMagneticField => FieldKey::SensorMagneticField,
            OutputField::JointAngle => FieldKey::JointAngle,
            OutputField::JointAngleXzy => FieldKey::JointAngleXzy,
            OutputField::CenterOfMass => FieldKey::CenterOfMass,
        }
    }

    fn domain(self) -> ItemDomain {
        match self {
            OutputField::LinkPosition
            | OutputField::LinkVelocity
            | OutputField::LinkAcceleration
            | OutputField::LinkOrientation
            | OutputField::LinkAngularVelocity
            | OutputField::LinkAngularAcceleration => ItemDomain::Segments,
            OutputField::SensorOrientation
            | OutputField::SensorAngularVelocity
            | OutputField::SensorAcceleration
            | OutputField::SensorFreeBodyAcceleration
            | OutputField::SensorMagneticField => ItemDomain::Sensors,
            OutputField::JointAngle | OutputField::JointAngleXzy => ItemDomain::Joints,
            OutputField::CenterOfMass => ItemDomain::Body,
        }
    }

    /// Quaternion-valued fields carry four components, everything else
    /// three.
    fn axes(self) -> &'static [&'static str] {
        match self {
            OutputField::LinkOrientation | OutputField::SensorOrientation => &WXYZ,
            _ => &XYZ,
        }
    }
}

/// One resolved column group: a supported field, its literal element name
/// and its item labels.
struct ColumnGroup {
    field: OutputField,
    element: &'static str,
    items: Vec<String>,
}

impl ColumnGroup {
    fn width(&self) -> usize {
        self.items.len() * self.field.axes().len()
    }
}

/// Render the frame sequence as delimited text.
///
/// Fields the active revision does not support contribute no columns and
/// are reported with a warning. Only frames with `type == "normal"`
/// produce rows.
pub fn write_table(
    frames: &[Frame],
    fields: &[OutputField],
    separator: char,
    names: &DocumentNames,
    mapping: &MappingTable,
) -> String {
    let groups = resolve_columns(fields, names, frames, mapping);
    let sep = separator.to_string();

    let mut lines = Vec::new();
    lines.push(header_row(&groups).join(&sep));
    for frame in frames.iter().filter(|f| f.info.is_normal()) {
        lines.push(data_row(frame, &groups).join(&sep));
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn resolve_columns(
    fields: &[OutputField],
    names: &DocumentNames,
    frames: &[Frame],
    mapping: &MappingTable,
) -> Vec<ColumnGroup> {
    let mut groups = Vec::new();
    for &field in fields {
        match mapping.element_name(field.key()) {
            Some(element) => groups.push(ColumnGroup {
                field,
                element,
                items: item_names(field, names, frames),
            }),
            None => log::warn!(
                "field {:?} is not supported by format version {}; skipping",
                field,
                mapping.version()
            ),
        }
    }
    groups
}

/// Item labels for one field. When the document carries no name list for
/// the field's domain, placeholder names are synthesized from the first
/// frame's counts so alignment still holds.
fn item_names(field: OutputField, names: &DocumentNames, frames: &[Frame]) -> Vec<String> {
    let (listed, prefix, count) = match field.domain() {
        ItemDomain::Segments => (
            &names.segments,
            "segment",
            frames.first().map(|f| f.info.segment_count).unwrap_or(0),
        ),
        ItemDomain::Sensors => (
            &names.sensors,
            "sensor",
            frames.first().map(|f| f.info.sensor_count).unwrap_or(0),
        ),
        ItemDomain::Joints => (
            &names.joints,
            "joint",
            frames.first().map(|f| f.info.joint_count).unwrap_or(0),
        ),
        ItemDomain::Body => return vec!["com".to_string()],
    };
    if !listed.is_empty() {
        listed.clone()
    } else {
        (1..=count).map(|i| format!("{prefix}_{i}")).collect()
    }
}

fn header_row(groups: &[ColumnGroup]) -> Vec<String> {
    let mut row = vec!["index".to_string(), "ms".to_string()];
    for group in groups {
        for item in &group.items {
            for axis in group.field.axes() {
                row.push(format!("{}:{}.{}", group.element, item, axis));
            }
        }
    }
    row
}

fn data_row(frame: &Frame, groups: &[ColumnGroup]) -> Vec<String> {
    let mut row = Vec::new();
    row.push(frame.info.index.map(|i| i.to_string()).unwrap_or_default());
    row.push(frame.info.clock_ms.to_string());
    for group in groups {
        let mut cells: Vec<String> = frame
            .data
            .get(group.element)
            .map(|text| text.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        // Pad short (or missing) data and drop surplus tokens, so every row
        // matches the header's column count.
        cells.resize(group.width(), String::new());
        row.extend(cells);
    }
    row
}
