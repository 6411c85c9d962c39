//! Format revisions and logical field mapping
//!
//! Two incompatible MVNX revisions are supported. They describe the same
//! recording but disagree on a handful of element names: the older revision
//! uses bare names for per-frame link quantities (`position`, `orientation`,
//! ...) and `pos_s` for point offsets, the newer one prefixes link
//! quantities with `link_` and uses `pos_b`. One field exists only per
//! revision: `sensor_acceleration` (old) and `sensor_free_body_acceleration`
//! (new).
//!
//! Rather than looking raw strings up in a global table, every logical field
//! the extractor and the writers touch is a [`FieldKey`] variant, and a
//! [`MappingTable`] is a total function from key to literal element name:
//! the answer is always either a name or an explicit "unsupported", never a
//! lookup failure.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;

use crate::mvnx::tree::Tree;

/// A supported MVNX document revision, read from the root `version`
/// attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatVersion {
    V3,
    V4,
}

impl FormatVersion {
    pub fn number(self) -> u32 {
        match self {
            FormatVersion::V3 => 3,
            FormatVersion::V4 => 4,
        }
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// The document revision could not be determined.
///
/// Extraction cannot proceed without a mapping table, so this is fatal at
/// the resolver boundary and never silently defaulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// The root element carries no `version` attribute.
    MissingVersion,
    /// The `version` attribute holds a value no mapping table exists for.
    UnknownVersion(String),
}

impl fmt::Display for VersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionError::MissingVersion => {
                write!(f, "root element has no 'version' attribute")
            }
            VersionError::UnknownVersion(raw) => {
                write!(f, "unknown document version '{raw}' (supported: 3, 4)")
            }
        }
    }
}

impl std::error::Error for VersionError {}

/// Logical field names used by the extractor and the output writers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    // Structural elements
    Subject,
    Comment,
    Segments,
    Segment,
    Points,
    Point,
    Pos,
    Sensors,
    Sensor,
    Joints,
    Joint,
    Connector1,
    Connector2,
    Frames,
    Frame,
    Contacts,
    Contact,
    // Per-frame data fields
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

impl FieldKey {
    /// Every key, for totality checks and iteration.
    pub const ALL: [FieldKey; 31] = [
        FieldKey::Subject,
        FieldKey::Comment,
        FieldKey::Segments,
        FieldKey::Segment,
        FieldKey::Points,
        FieldKey::Point,
        FieldKey::Pos,
        FieldKey::Sensors,
        FieldKey::Sensor,
        FieldKey::Joints,
        FieldKey::Joint,
        FieldKey::Connector1,
        FieldKey::Connector2,
        FieldKey::Frames,
        FieldKey::Frame,
        FieldKey::Contacts,
        FieldKey::Contact,
        FieldKey::LinkPosition,
        FieldKey::LinkVelocity,
        FieldKey::LinkAcceleration,
        FieldKey::LinkOrientation,
        FieldKey::LinkAngularVelocity,
        FieldKey::LinkAngularAcceleration,
        FieldKey::SensorOrientation,
        FieldKey::SensorAngularVelocity,
        FieldKey::SensorAcceleration,
        FieldKey::SensorFreeBodyAcceleration,
        FieldKey::SensorMagneticField,
        FieldKey::JointAngle,
        FieldKey::JointAngleXzy,
        FieldKey::CenterOfMass,
    ];
}

/// Per-revision lookup from logical field to literal element name.
#[derive(Debug, Clone)]
pub struct MappingTable {
    version: FormatVersion,
    entries: HashMap<FieldKey, &'static str>,
}

impl MappingTable {
    fn for_version(version: FormatVersion) -> Self {
        let mut entries: HashMap<FieldKey, &'static str> = HashMap::from([
            // Names shared by every revision
            (FieldKey::Subject, "subject"),
            (FieldKey::Comment, "comment"),
            (FieldKey::Segments, "segments"),
            (FieldKey::Segment, "segment"),
            (FieldKey::Points, "points"),
            (FieldKey::Point, "point"),
            (FieldKey::Sensors, "sensors"),
            (FieldKey::Sensor, "sensor"),
            (FieldKey::Joints, "joints"),
            (FieldKey::Joint, "joint"),
            (FieldKey::Connector1, "connector1"),
            (FieldKey::Connector2, "connector2"),
            (FieldKey::Frames, "frames"),
            (FieldKey::Frame, "frame"),
            (FieldKey::Contacts, "contacts"),
            (FieldKey::Contact, "contact"),
            (FieldKey::SensorOrientation, "sensor_orientation"),
            (FieldKey::SensorAngularVelocity, "sensor_angular_velocity"),
            (FieldKey::SensorMagneticField, "sensor_magnetic_field"),
            (FieldKey::JointAngle, "joint_angle"),
            (FieldKey::JointAngleXzy, "joint_angle_xzy"),
            (FieldKey::CenterOfMass, "center_of_mass"),
        ]);
        match version {
            FormatVersion::V3 => {
                entries.extend([
                    (FieldKey::Pos, "pos_s"),
                    (FieldKey::LinkPosition, "position"),
                    (FieldKey::LinkVelocity, "velocity"),
                    (FieldKey::LinkAcceleration, "acceleration"),
                    (FieldKey::LinkOrientation, "orientation"),
                    (FieldKey::LinkAngularVelocity, "angular_velocity"),
                    (FieldKey::LinkAngularAcceleration, "angular_acceleration"),
                    (FieldKey::SensorAcceleration, "sensor_acceleration"),
                ]);
            }
            FormatVersion::V4 => {
                entries.extend([
                    (FieldKey::Pos, "pos_b"),
                    (FieldKey::LinkPosition, "link_position"),
                    (FieldKey::LinkVelocity, "link_velocity"),
                    (FieldKey::LinkAcceleration, "link_acceleration"),
                    (FieldKey::LinkOrientation, "link_orientation"),
                    (FieldKey::LinkAngularVelocity, "link_angular_velocity"),
                    (FieldKey::LinkAngularAcceleration, "link_angular_acceleration"),
                    (
                        FieldKey::SensorFreeBodyAcceleration,
                        "sensor_free_body_acceleration",
                    ),
                ]);
            }
        }
        MappingTable { version, entries }
    }

    pub fn version(&self) -> FormatVersion {
        self.version
    }

    /// Literal element name for `key` in this revision, or `None` when the
    /// revision has no such field. Callers must treat `None` as "skip and
    /// warn", never as a valid lookup key.
    pub fn element_name(&self, key: FieldKey) -> Option<&'static str> {
        self.entries.get(&key).copied()
    }
}

static MAPPING_V3: Lazy<MappingTable> = Lazy::new(|| MappingTable::for_version(FormatVersion::V3));
static MAPPING_V4: Lazy<MappingTable> = Lazy::new(|| MappingTable::for_version(FormatVersion::V4));

/// Mapping table for a known revision.
pub fn mapping_for(version: FormatVersion) -> &'static MappingTable {
    match version {
        FormatVersion::V3 => &MAPPING_V3,
        FormatVersion::V4 => &MAPPING_V4,
    }
}

/// Read the integer `version` attribute from the tree root and select the
/// matching mapping table.
pub fn resolve_version(tree: &Tree) -> Result<&'static MappingTable, VersionError> {
    let raw = tree.attribute(tree.root(), "version");
    if raw.is_empty() {
        return Err(VersionError::MissingVersion);
    }
    match raw.parse::<u32>() {
        Ok(3) => Ok(mapping_for(FormatVersion::V3)),
        Ok(4) => Ok(mapping_for(FormatVersion::V4)),
        _ => Err(VersionError::UnknownVersion(raw.to_string())),
    }
}
