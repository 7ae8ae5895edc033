use binrw::binrw;
use serde::{Deserialize, Serialize};

/// Bytes taken by one node record: id, six floats, eight child ids, four ints.
pub const NODE_SIZE: usize = 8 + 6 * 4 + 8 * 8 + 4 * 4;

pub const CHILD_SLOTS: usize = 8;

// written by the pipeline for an unused slot
const EMPTY_SLOT: i64 = -1;

/// One octant of the LOD octree as stored in `metadata.bin`.
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OctreeNode {
  pub id: i64,
  #[serde(with = "crate::float::triple")]
  pub centre: [f32; 3],
  /// Extent along x, y and z.
  ///
  /// Older inspection scripts unpacked the sixth float of the record into
  /// the x slot again, so they never saw the z extent. The on-disk layout is
  /// the same either way; here every component lands in its own slot.
  #[serde(with = "crate::float::triple")]
  pub size: [f32; 3],
  /// Child ids in octant order. Stored ids `<= 0` mark an unused slot.
  #[br(map = |raw: [i64; CHILD_SLOTS]| decode_slots(raw))]
  #[bw(map = |slots: &[Option<i64>; CHILD_SLOTS]| encode_slots(slots))]
  pub children: [Option<i64>; CHILD_SLOTS],
  pub level: i32,
  /// Objects in this node and all of its descendants.
  pub objects_rec: i32,
  /// Objects stored directly in this node.
  pub objects: i32,
  pub child_count: i32,
}

fn decode_slots(raw: [i64; CHILD_SLOTS]) -> [Option<i64>; CHILD_SLOTS] {
  raw.map(|id| (id > 0).then_some(id))
}

fn encode_slots(slots: &[Option<i64>; CHILD_SLOTS]) -> [i64; CHILD_SLOTS] {
  slots.map(|slot| slot.unwrap_or(EMPTY_SLOT))
}

impl OctreeNode {
  /// Occupied child slots as `(slot, id)`, in slot order.
  pub fn children(&self) -> impl DoubleEndedIterator<Item = (usize, i64)> + '_ {
    self
      .children
      .iter()
      .enumerate()
      .filter_map(|(slot, id)| id.filter(|id| *id > 0).map(|id| (slot, id)))
  }
}
