//! High-level MVNX reader
//!
//! Ties the pipeline together: adapt quick-xml pull events into the crate's
//! [`Event`] model, build the tree, resolve the document revision, extract
//! the frame sequence, and expose the metadata helpers and output writers.
//! Each reader owns one document; there is no shared state between
//! documents.

use std::fs;
use std::path::Path;

use quick_xml::events::Event as XmlEvent;
use quick_xml::Reader;

use crate::mvnx::event::Event;
use crate::mvnx::frames::{extract_frames, Frame};
use crate::mvnx::metadata::{
    document_names, joints_info, labels_of, points, DocumentNames, JointInfo, PointOffset,
};
use crate::mvnx::output::{write_calibration_log, write_calibration_roundtrip, write_table};
use crate::mvnx::output::OutputField;
use crate::mvnx::schema::{resolve_version, FieldKey, MappingTable};
use crate::mvnx::tree::{build, build_with_allow_list, Tree};
use crate::mvnx::MvnxError;

/// Translate a document into the flat event sequence the builder consumes.
///
/// Whitespace-only character runs are filtered here: they carry no meaning
/// in MVNX, and feeding them to the builder would mark element containers
/// as text leaves.
pub fn events_from_str(xml: &str) -> Result<Vec<Event>, MvnxError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut events = vec![Event::StartDocument];
    loop {
        match reader.read_event() {
            Ok(XmlEvent::Start(e)) => events.push(start_event(&e)?),
            Ok(XmlEvent::Empty(e)) => {
                // Self-closing tags become a matched start/end pair.
                let start = start_event(&e)?;
                let name = match &start {
                    Event::StartElement { name, .. } => name.clone(),
                    _ => unreachable!(),
                };
                events.push(start);
                events.push(Event::EndElement(name));
            }
            Ok(XmlEvent::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| MvnxError::Xml(e.to_string()))?
                    .into_owned();
                if !text.trim().is_empty() {
                    events.push(Event::Characters(text));
                }
            }
            Ok(XmlEvent::Comment(t)) => {
                events.push(Event::Comment(String::from_utf8_lossy(&t).into_owned()));
            }
            Ok(XmlEvent::End(e)) => {
                events.push(Event::EndElement(
                    String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                ));
            }
            Ok(XmlEvent::Eof) => {
                events.push(Event::EndDocument);
                break;
            }
            // Declarations, processing instructions, CDATA and doctypes are
            // not part of the event model.
            Ok(_) => {}
            Err(e) => return Err(MvnxError::Xml(e.to_string())),
        }
    }
    Ok(events)
}

fn start_event(e: &quick_xml::events::BytesStart<'_>) -> Result<Event, MvnxError> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| MvnxError::Xml(e.to_string()))?;
        attributes.push((
            String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            attr.unescape_value()
                .map_err(|e| MvnxError::Xml(e.to_string()))?
                .into_owned(),
        ));
    }
    Ok(Event::StartElement { name, attributes })
}

/// A fully parsed MVNX document: tree, resolved revision mapping and the
/// extracted frame sequence.
#[derive(Debug)]
pub struct MvnxReader {
    tree: Tree,
    mapping: &'static MappingTable,
    frames: Vec<Frame>,
}

impl MvnxReader {
    /// Parse a document from markup text.
    pub fn from_str(xml: &str) -> Result<Self, MvnxError> {
        Self::from_events(events_from_str(xml)?)
    }

    /// Parse a document from markup text, materializing only the listed
    /// element names.
    pub fn from_str_with_allow_list<I, S>(xml: &str, names: I) -> Result<Self, MvnxError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let events = events_from_str(xml)?;
        Self::from_tree(build_with_allow_list(events, names)?)
    }

    /// Parse a document from a file on disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MvnxError> {
        let xml = fs::read_to_string(path)?;
        Self::from_str(&xml)
    }

    /// Parse a document from a pre-recorded event sequence.
    pub fn from_events(events: Vec<Event>) -> Result<Self, MvnxError> {
        Self::from_tree(build(events)?)
    }

    fn from_tree(tree: Tree) -> Result<Self, MvnxError> {
        let mapping = resolve_version(&tree)?;
        let frames = extract_frames(&tree, mapping)?;
        Ok(MvnxReader { tree, mapping, frames })
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn mapping(&self) -> &'static MappingTable {
        self.mapping
    }

    /// All frames of the document, in document order.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn segment_names(&self) -> Vec<String> {
        labels_of(&self.tree, self.mapping, FieldKey::Segment)
    }

    pub fn sensor_names(&self) -> Vec<String> {
        labels_of(&self.tree, self.mapping, FieldKey::Sensor)
    }

    pub fn joint_names(&self) -> Vec<String> {
        labels_of(&self.tree, self.mapping, FieldKey::Joint)
    }

    pub fn point_names(&self) -> Vec<String> {
        labels_of(&self.tree, self.mapping, FieldKey::Point)
    }

    /// Point offsets grouped per segment.
    pub fn points(&self) -> Vec<PointOffset> {
        points(&self.tree, self.mapping)
    }

    /// Joint labels with their connector endpoints.
    pub fn joints_info(&self) -> Vec<JointInfo> {
        joints_info(&self.tree, self.mapping)
    }

    pub fn document_names(&self) -> DocumentNames {
        document_names(&self.tree, self.mapping)
    }

    /// Delimited table of the live-capture frames for the selected fields.
    pub fn write_table(&self, fields: &[OutputField], separator: char) -> String {
        write_table(
            &self.frames,
            fields,
            separator,
            &self.document_names(),
            self.mapping,
        )
    }

    /// Well-formed markup holding only the calibration subtree.
    pub fn write_calibration_roundtrip(&self) -> String {
        write_calibration_roundtrip(&self.tree, self.mapping)
    }

    /// Sectioned metadata log (segments, point offsets, joints, sensors).
    pub fn write_calibration_log(&self, separator: char) -> String {
        write_calibration_log(&self.tree, self.mapping, separator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<mvnx version="4">
  <!-- recorded with a synthetic rig -->
  <subject label="S01" frameRate="240">
    <comment>test take</comment>
    <segments>
      <segment label="Pelvis">
        <points>
          <point label="pHipOrigin"><pos_b>0 0 0</pos_b></point>
        </points>
      </segment>
      <segment label="L5">
        <points>
          <point label="pL5Origin"><pos_b>0 0 0.1</pos_b></point>
        </points>
      </segment>
    </segments>
    <sensors>
      <sensor label="Pelvis"/>
    </sensors>
    <joints>
      <joint label="jL5S1">
        <connector1>Pelvis/jL5S1</connector1>
        <connector2>L5/jL5S1</connector2>
      </joint>
    </joints>
    <frames segmentCount="2" sensorCount="1" jointCount="1">
      <frame type="identity" time="0"><link_orientation>1 0 0 0 1 0 0 0</link_orientation></frame>
      <frame type="normal" index="0" time="17" ms="100">
        <link_position>1 2 3 4 5 6</link_position>
      </frame>
    </frames>
  </subject>
</mvnx>
"#;

    #[test]
    fn test_end_to_end_parse() {
        let reader = MvnxReader::from_str(DOC).unwrap();
        assert_eq!(reader.mapping().version().number(), 4);
        assert_eq!(reader.frames().len(), 2);
        assert_eq!(reader.segment_names(), vec!["Pelvis", "L5"]);
        assert_eq!(reader.sensor_names(), vec!["Pelvis"]);
        assert_eq!(reader.joint_names(), vec!["jL5S1"]);
        assert_eq!(reader.point_names(), vec!["pHipOrigin", "pL5Origin"]);
    }

    #[test]
    fn test_whitespace_runs_are_filtered() {
        // Pretty-printed markup must not turn containers into text leaves.
        let events = events_from_str(DOC).unwrap();
        assert!(events.iter().all(|e| match e {
            Event::Characters(text) => !text.trim().is_empty(),
            _ => true,
        }));
    }

    #[test]
    fn test_self_closing_elements_are_matched_pairs() {
        let reader = MvnxReader::from_str(DOC).unwrap();
        // <sensor label="Pelvis"/> still lands in the tree.
        assert_eq!(reader.sensor_names(), vec!["Pelvis"]);
    }

    #[test]
    fn test_table_from_reader() {
        let reader = MvnxReader::from_str(DOC).unwrap();
        let out = reader.write_table(&[OutputField::LinkPosition], ',');
        let mut lines = out.lines();
        let header = lines.next().unwrap();
        assert!(header.contains("link_position:Pelvis.X"));
        assert!(header.contains("link_position:L5.Z"));
        assert_eq!(lines.next().unwrap(), "0,100,1,2,3,4,5,6");
    }

    #[test]
    fn test_allow_list_reader() {
        let reader =
            MvnxReader::from_str_with_allow_list(DOC, ["mvnx", "subject", "comment"]).unwrap();
        assert_eq!(reader.tree().node_count(), 3);
        assert!(reader.frames().is_empty());
    }

    #[test]
    fn test_roundtrip_output_reparses() {
        let reader = MvnxReader::from_str(DOC).unwrap();
        let roundtrip = reader.write_calibration_roundtrip();
        let events = events_from_str(&roundtrip).unwrap();
        let tree = build(events).unwrap();
        assert_eq!(tree.node(tree.root()).name(), "subject");
        assert_eq!(tree.children(tree.root(), "frames").len(), 1);
    }

    #[test]
    fn test_malformed_xml_is_rejected() {
        let err = MvnxReader::from_str("<mvnx version=\"4\"><subject></mvnx>").unwrap_err();
        match err {
            MvnxError::Xml(_) | MvnxError::Structural(_) => {}
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
