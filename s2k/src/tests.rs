use std::collections::BTreeSet;
use std::io::{self, BufReader, Cursor, Read, Write};

use nalgebra::Vector3;

use crate::prelude::*;

/// A small export: joint coordinates on line 4, frames on line 10, restraints
/// on line 15, a cable table that only shows up after the terminal marker.
const SAMPLE: &[&str] = &[
  r"File C:\models\tower.$2k was saved on 3/14/24 at 10:01:12",
  "",
  "TABLE:  \"PROGRAM CONTROL\"",
  "TABLE:  \"JOINT COORDINATES\"",
  concat!(
    "   Joint=1   CoordSys=GLOBAL   CoordType=Cartesian   XorR=0   Y=0   ",
    "Z=0   SpecialJt=No   GlobalX=0   GlobalY=0   GlobalZ=0"
  ),
  concat!(
    "   Joint=2   CoordSys=GLOBAL   CoordType=Cartesian   XorR=3,5   Y=0   ",
    "Z=4   SpecialJt=No"
  ),
  "   Joint=3   CoordSys=GLOBAL   CoordType=Cartesian   XorR=7   Y=0   Z=0",
  "",
  "TABLE:  \"FRAME SECTION ASSIGNMENTS\"",
  "TABLE:  \"CONNECTIVITY - FRAME\"",
  "   Frame=1   JointI=1   JointJ=2   IsCurved=No   Length=5,315",
  "   Frame=2   JointI=2   JointJ=3   IsCurved=No   Length=5,315",
  "   Frame=3   JointI=3   JointJ=99   IsCurved=No   Length=1",
  "",
  "TABLE:  \"JOINT RESTRAINT ASSIGNMENTS\"",
  "   Joint=1   U1=Yes   U2=Yes   U3=Yes   R1=No   R2=No   R3=No",
  "   Joint=3   U1=Yes   U2=Yes   U3=Yes   R1=No   R2=No   R3=No",
  "   Joint=2   U1=Yes   U2=Yes   U3=Yes   R1=Yes   R2=Yes   R3=Yes",
  "   Joint=9   U1=Yes   U2=Yes   U3=Yes   R1=Yes   R2=Yes   R3=Yes",
  "",
  "TABLE:  \"OPTIONS - COLORS - OUTPUT\"",
  "TABLE:  \"CONNECTIVITY - CABLE\"",
  "   Cable=1   JointI=1   JointJ=3",
  "",
  "END TABLE DATA",
];

/// An export saved under a Latin locale: CRLF endings, comma decimals and
/// bytes that aren't UTF-8 both before and inside the joints section.
const LATIN_EXPORT: &[u8] = b"File C:\\models\\A\xF1ejo.$2k was saved\r\n\
  TABLE:  \"JOINT COORDINATES\"\r\n\
  Joint=1   XorR=0   Y=0   Z=0\r\n\
  Joint=2   CoordSys=GL\xD3BAL   XorR=1,5   Y=0   Z=0\r\n\
  Joint=3   XorR=3   Y=0   Z=0\r\n\
  \r\n\
  TABLE:  \"OPTIONS - COLORS - OUTPUT\"\r\n";

/// A reader that hands out some bytes and then fails for good.
struct FailingReader<'a> {
  /// What's left to hand out.
  data: &'a [u8]
}

impl Read for FailingReader<'_> {
  fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
    if self.data.is_empty() {
      return Err(io::Error::other("device went away"));
    }
    return self.data.read(buf);
  }
}

/// Joins lines like a file would have them.
fn text(lines: &[&str]) -> String {
  return lines.join("\n");
}

/// Puts a header on top of some record lines, so they start on line 2.
fn after_header(lines: &[&str]) -> String {
  return format!("TABLE:  \"SOMETHING\"\n{}", lines.join("\n"));
}

/// A reader over some text.
fn reader(s: &str) -> Cursor<&[u8]> {
  return Cursor::new(s.as_bytes());
}

#[test]
fn locator_finds_sections() {
  let offsets = locate_sections(reader(&text(SAMPLE)));
  assert_eq!(offsets.joints, 4);
  assert_eq!(offsets.frame_sections, 9);
  assert_eq!(offsets.frames, 10);
  assert_eq!(offsets.supports, 15);
  assert_eq!(offsets.get(SectionLabel::JointCoordinates), 4);
  assert_eq!(offsets.start_of(SectionLabel::JointCoordinates), 5);
  // after the terminal marker, never seen
  assert_eq!(offsets.cables, 0);
  assert!(!offsets.has(SectionLabel::CableConnectivity));
  assert_eq!(offsets.start_of(SectionLabel::CableConnectivity), SENTINEL_START);
  assert_eq!(offsets.found().count(), 4);
}

#[test]
fn locator_without_markers() {
  let offsets = locate_sections(reader("nothing\nto see\n\nhere"));
  assert_eq!(offsets, SectionOffsets::default());
  assert!(offsets.is_empty());
  assert!(locate_sections(reader("")).is_empty());
}

#[test]
fn locator_halts_at_terminal_marker() {
  let input = text(&[
    "TABLE:  \"OPTIONS - COLORS - OUTPUT\"",
    "TABLE:  \"JOINT COORDINATES\"",
    "TABLE:  \"CONNECTIVITY - FRAME\"",
  ]);
  assert!(locate_sections(reader(&input)).is_empty());
  let input = text(&[
    "TABLE:  \"CONNECTIVITY - FRAME\"",
    "OPTIONS - COLORS - OUTPUT",
    "TABLE:  \"JOINT COORDINATES\"",
  ]);
  let offsets = locate_sections(reader(&input));
  assert_eq!(offsets.frames, 1);
  assert_eq!(offsets.joints, 0);
}

#[test]
fn offsets_are_write_once() {
  let input = text(&[
    "x",
    "TABLE:  \"JOINT COORDINATES\" (first)",
    "TABLE:  \"JOINT COORDINATES\" (again)",
  ]);
  assert_eq!(locate_sections(reader(&input)).joints, 2);
  let mut offsets = SectionOffsets::default();
  assert!(offsets.set_once(SectionLabel::AreaUniformLoads, 7));
  assert!(!offsets.set_once(SectionLabel::AreaUniformLoads, 9));
  assert_eq!(offsets.area_uniform_loads, 7);
}

#[test]
fn sentinel_start_yields_nothing() {
  // perfectly good records on line 1, but 1 means "no section"
  let nodes = "Joint=1 XorR=0 Y=0 Z=0";
  let frames = "Frame=1 JointI=1 JointJ=2";
  let restraints = "Joint=1 U1=Yes U2=Yes U3=Yes R1=No R2=No R3=No";
  assert!(extract_nodes(reader(nodes), SENTINEL_START).is_empty());
  assert!(extract_connectivity(
    reader(frames),
    SENTINEL_START,
    ConnectivityKind::Frame,
    None
  ).is_empty());
  assert!(extract_restraints(reader(restraints), SENTINEL_START).is_empty());
}

#[test]
fn node_extraction() {
  let input = after_header(&[
    "   Joint=1   XorR=1,5   Y=2   Z=3",
    "   XorR=1   Y=2   Z=3",
    "   Joint=0   XorR=1   Y=2   Z=3",
    "   Joint=abc   XorR=1   Y=2   Z=3",
    "   Joint=4   XorR=oops   Y=2   Z=3",
    "   Joint=1   XorR=9   Y=9   Z=9",
    "   Joint=5   Y=-1\r",
    "   ",
    "   Joint=6   XorR=0   Y=0   Z=0",
  ]);
  let nodes = extract_nodes(reader(&input), 2);
  // missing/zero IDs dropped, bad lines skipped, duplicates kept, stops at
  // the whitespace-only line
  let ids = nodes.iter().map(|n| n.id).collect::<Vec<_>>();
  assert_eq!(ids, vec![1, 1, 5]);
  assert_eq!(nodes[0].coords, Vector3::new(1.5, 2.0, 3.0));
  assert_eq!(nodes[1].coords, Vector3::new(9.0, 9.0, 9.0));
  assert_eq!(nodes[2].coords, Vector3::new(0.0, -1.0, 0.0));
  assert!(nodes.iter().all(|n| n.target_id.is_none()));
  assert_eq!(nodes[0].to_string(), "JOINT 1 (1.5, 2, 3)");
}

#[test]
fn node_extraction_stops_at_blank_line() {
  let input = after_header(&[
    "Joint=1 XorR=0 Y=0 Z=0",
    "",
    "Joint=2 XorR=0 Y=0 Z=0",
  ]);
  assert_eq!(extract_nodes(reader(&input), 2).len(), 1);
  // starting past the end is just an empty section
  assert!(extract_nodes(reader(&input), 40).is_empty());
}

#[test]
fn connectivity_validity_set() {
  let input = after_header(&["   Frame=7   JointI=1   JointJ=3"]);
  let known: BTreeSet<SourceId> = [1, 2].into_iter().collect();
  let kind = ConnectivityKind::Frame;
  let dropped = extract_connectivity(reader(&input), 2, kind, Some(&known));
  assert!(dropped.is_empty());
  let empty = BTreeSet::new();
  let kept = extract_connectivity(reader(&input), 2, kind, Some(&empty));
  assert_eq!(kept, vec![Connectivity::new(kind, 7, 1, 3)]);
  let kept = extract_connectivity(reader(&input), 2, kind, None);
  assert_eq!(kept.len(), 1);
}

#[test]
fn connectivity_extraction() {
  let input = after_header(&[
    "   Frame=1   JointI=1   JointJ=2   IsCurved=No",
    "   Frame=2   JointI=x   JointJ=2",
    "   Frame=3   JointI=0   JointJ=2",
    "   Frame=4   JointJ=2",
    "   Frame=5   JointI=2   JointJ=3",
    "   Area=6   JointI=2   JointJ=3",
    "   Frame=7   JointI=3   JointJ=4",
  ]);
  let frames = extract_connectivity(
    reader(&input),
    2,
    ConnectivityKind::Frame,
    None
  );
  // bad tokens skipped, zero/missing ends dropped, stops at the first line
  // without the marker
  let ids = frames.iter().map(|f| f.id).collect::<Vec<_>>();
  assert_eq!(ids, vec![1, 5]);
  assert_eq!((frames[1].start, frames[1].end), (2, 3));
}

#[test]
fn connectivity_ids_with_decimal_commas_are_skipped() {
  let input = after_header(&[
    "   Frame=1   JointI=1,0   JointJ=2",
    "   Frame=2   JointI=2   JointJ=3   Length=2,5",
  ]);
  let frames = extract_connectivity(
    reader(&input),
    2,
    ConnectivityKind::Frame,
    None
  );
  // "1,0" reads as "1.0", which isn't an id; commas elsewhere are harmless
  assert_eq!(frames.iter().map(|f| f.id).collect::<Vec<_>>(), vec![2]);
}

#[test]
fn cables_use_their_own_marker() {
  let input = after_header(&[
    "   Cable=1   JointI=1   JointJ=2",
    "   Cable=2   JointI=2   JointJ=3",
    "   Frame=3   JointI=3   JointJ=4",
  ]);
  let cables = extract_connectivity(
    reader(&input),
    2,
    ConnectivityKind::Cable,
    None
  );
  assert_eq!(cables.len(), 2);
  assert!(cables.iter().all(|c| c.kind == ConnectivityKind::Cable));
  let frames = extract_connectivity(
    reader(&input),
    2,
    ConnectivityKind::Frame,
    None
  );
  assert!(frames.is_empty());
}

#[test]
fn restraint_decoding_and_overwrite() {
  let first = "Joint=5 U1=Yes U2=No U3=Yes R1=No R2=No R3=No";
  let input = after_header(&[first]);
  let restraints = extract_restraints(reader(&input), 2);
  assert_eq!(restraints.len(), 1);
  assert_eq!(restraints[0].node, 5);
  assert_eq!(
    restraints[0].flags,
    RestraintFlags::from([true, false, true, false, false, false])
  );
  let input = after_header(&[
    first,
    "Joint=5 U1=No U2=No U3=Yes R1=No R2=No R3=No",
  ]);
  let restraints = extract_restraints(reader(&input), 2);
  assert_eq!(restraints.len(), 1);
  assert!(!restraints[0].is_restrained(Dof::try_from(1usize).unwrap()));
  assert!(restraints[0].is_restrained(Dof::try_from(3usize).unwrap()));
}

#[test]
fn restraints_are_sorted_and_deduplicated() {
  let input = after_header(&[
    "   Joint=30   U1=Yes   U2=Yes   U3=Yes   R1=Yes   R2=Yes   R3=Yes",
    "   Joint=10   U1=Yes",
    "   \t",
    "   Joint=-2   U1=Yes",
    "   Joint=zz   U1=Yes",
    "   Joint=20   U1=yes   U2=YES   U3=Yesss",
    "   Joint=10   U2=Yes",
    "",
    "   Joint=40   U1=Yes",
  ]);
  let restraints = extract_restraints(reader(&input), 2);
  // whitespace-only lines are skipped, an empty one ends it
  let ids = restraints.iter().map(|r| r.node).collect::<Vec<_>>();
  assert_eq!(ids, vec![10, 20, 30]);
  assert_eq!(
    restraints[0].flags,
    RestraintFlags::from([false, true, false, false, false, false])
  );
  assert!(restraints[1].is_free());
  assert!(restraints[2].is_fixed());
}

#[test]
fn end_to_end_from_text() {
  let model = Model::from_text(&text(SAMPLE));
  assert_eq!(model.sections.joints, 4);
  assert_eq!(model.nodes.len(), 3);
  assert_eq!(model.nodes[1].coords, Vector3::new(3.5, 0.0, 4.0));
  // frame 3 references joint 99, which doesn't exist
  assert_eq!(model.frames.len(), 2);
  assert!(model.cables.is_empty());
  assert_eq!(
    model.restraints.iter().map(|r| r.node).collect::<Vec<_>>(),
    vec![1, 2, 3, 9]
  );
  assert_eq!(model.node_ids(), BTreeSet::from([1, 2, 3]));
  assert_eq!(model.members().count(), 2);
}

#[test]
fn end_to_end_from_file() {
  let mut file = tempfile::NamedTempFile::new().unwrap();
  write!(file, "{}", text(SAMPLE)).unwrap();
  let model = Model::from_file(file.path());
  assert_eq!(model, Model {
    filename: model.filename.clone(),
    ..Model::from_text(&text(SAMPLE))
  });
  assert!(model.filename.is_some());
  // file-level helpers agree with the model
  let offsets = locate_sections_in_file(file.path());
  let frames = extract_frames_from_file(
    file.path(),
    offsets.start_of(SectionLabel::FrameConnectivity),
    None
  );
  assert_eq!(frames.len(), 3);
  let cables = extract_cables_from_file(
    file.path(),
    offsets.start_of(SectionLabel::CableConnectivity),
    None
  );
  assert!(cables.is_empty());
}

#[test]
fn unreadable_file_degrades_to_nothing() {
  let dir = tempfile::tempdir().unwrap();
  let missing = dir.path().join("missing.$2k");
  assert!(locate_sections_in_file(&missing).is_empty());
  assert!(extract_nodes_from_file(&missing, 5).is_empty());
  assert!(extract_frames_from_file(&missing, 5, None).is_empty());
  assert!(extract_restraints_from_file(&missing, 5).is_empty());
  let model = Model::from_file(&missing);
  assert!(model.is_empty());
  assert!(model.sections.is_empty());
}

#[test]
fn foreign_bytes_do_not_end_extraction() {
  let offsets = locate_sections(LATIN_EXPORT);
  assert_eq!(offsets.joints, 2);
  let start = offsets.start_of(SectionLabel::JointCoordinates);
  let nodes = extract_nodes(LATIN_EXPORT, start);
  assert_eq!(nodes.iter().map(|n| n.id).collect::<Vec<_>>(), vec![1, 2, 3]);
  assert_eq!(nodes[1].coords, Vector3::new(1.5, 0.0, 0.0));
  // same thing through a file
  let mut file = tempfile::NamedTempFile::new().unwrap();
  file.write_all(LATIN_EXPORT).unwrap();
  let model = Model::from_file(file.path());
  assert_eq!(model.sections.joints, 2);
  assert_eq!(model.nodes, nodes);
}

#[test]
fn read_errors_keep_what_came_before() {
  let data: &[u8] = concat!(
    "TABLE:  \"JOINT COORDINATES\"\n",
    "Joint=1 XorR=0 Y=0 Z=0\n",
    "Joint=2 XorR=1 Y=0 Z=0\n"
  ).as_bytes();
  let failing = || BufReader::new(FailingReader { data });
  let offsets = locate_sections(failing());
  assert_eq!(offsets.joints, 1);
  let nodes = extract_nodes(
    failing(),
    offsets.start_of(SectionLabel::JointCoordinates)
  );
  assert_eq!(nodes.iter().map(|n| n.id).collect::<Vec<_>>(), vec![1, 2]);
  // failing while still skipping to the section start yields nothing
  assert!(extract_nodes(failing(), 10).is_empty());
}

#[test]
fn transfer_into_memory_model() {
  let mut model = Model::from_text(&text(SAMPLE));
  model.frames.push(Connectivity::new(ConnectivityKind::Frame, 8, 1, 42));
  let mut target = MemoryModel::new(ModelUnits::default());
  let mut map = NodeIdMap::new();
  let report = transfer(&mut model, &mut target, &mut map);
  assert_eq!(report.nodes, 3);
  assert_eq!(report.members, 2);
  assert_eq!(report.unmapped_members, 1);
  // pinned joints 1 and 3 share a definition, joint 2 is fixed
  assert_eq!(report.support_kinds, 2);
  assert_eq!(report.supports, 3);
  assert_eq!(report.unmapped_restraints, 1);
  assert_eq!(report.failures, 0);
  // target IDs written back and mapped
  assert_eq!(map.len(), 3);
  for node in model.nodes.iter() {
    assert_eq!(node.target_id, map.get(&node.id).copied());
    let tid = node.target_id.unwrap();
    assert_eq!(target.nodes.get(&tid), Some(&node.coords));
  }
  assert!(model.frames[..2].iter().all(|f| f.target_id.is_some()));
  assert!(model.frames[2].target_id.is_none());
  let n1 = map[&1];
  let n2 = map[&2];
  let n3 = map[&3];
  assert_eq!(target.support_of(n2), Some(SupportKind::Fixed));
  assert_eq!(target.support_of(n1), target.support_of(n3));
  assert_eq!(
    target.support_of(n1),
    Some(SupportKind::FixedBut {
      releases: RestraintFlags::from([false, false, false, true, true, true])
    })
  );
}

#[test]
fn transfer_counts_builder_failures() {
  let mut model = Model::default();
  model.nodes.push(Node::new(1, 0.0, 0.0, 0.0));
  model.frames.push(Connectivity::new(ConnectivityKind::Frame, 1, 1, 1));
  let mut target = MemoryModel::default();
  let mut map = NodeIdMap::new();
  let report = transfer(&mut model, &mut target, &mut map);
  assert_eq!(report.nodes, 1);
  assert_eq!(report.members, 0);
  assert_eq!(report.failures, 1);
  assert!(target.members.is_empty());
}

#[test]
fn unit_codes() {
  assert_eq!(LengthUnit::try_from(4usize), Ok(LengthUnit::Meter));
  assert_eq!(ForceUnit::try_from(5usize), Ok(ForceUnit::KiloNewton));
  assert!(LengthUnit::try_from(8usize).is_err());
  for (i, u) in ForceUnit::all().iter().enumerate() {
    assert_eq!(usize::from(*u), i);
  }
  assert_eq!(LengthUnit::all().len(), 8);
}

#[test]
fn dof_labels() {
  let labels = Dof::all().iter().map(|d| d.label()).collect::<Vec<_>>();
  assert_eq!(labels, vec!["U1", "U2", "U3", "R1", "R2", "R3"]);
  for i in 1..=SIXDOF {
    assert_eq!(usize::from(Dof::try_from(i).unwrap()), i);
  }
  assert!(Dof::try_from(0usize).is_err());
  assert!(Dof::try_from(7usize).is_err());
  let r2 = Dof { dof_type: DofType::Rotational, axis: Axis::Y };
  assert_eq!(Dof::try_from(5usize), Ok(r2));
  assert_eq!(r2.to_string(), "R2");
  assert_eq!(Axis::try_from(3usize), Ok(Axis::Z));
  assert!(Axis::try_from(4usize).is_err());
}
