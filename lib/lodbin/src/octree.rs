use std::collections::HashSet;
use std::io::{Cursor, Read, Seek, Write};

use binrw::{BinReaderExt, BinResult, BinWriterExt};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{Error, FileHeader, OctreeNode, Result};

/// The node registry decoded from a `metadata.bin` file.
///
/// Nodes are keyed by id and kept in file order. The record at file index 0
/// is the root, whatever its id. A later record with a repeated id replaces
/// the earlier node but keeps its position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "OctreeDump", into = "OctreeDump")]
pub struct Octree {
  header: FileHeader,
  nodes: IndexMap<i64, OctreeNode>,
}

#[derive(Serialize, Deserialize)]
struct OctreeDump {
  header: FileHeader,
  nodes: Vec<OctreeNode>,
}

impl From<OctreeDump> for Octree {
  fn from(dump: OctreeDump) -> Self {
    Self::from_nodes(dump.header, dump.nodes)
  }
}

impl From<Octree> for OctreeDump {
  fn from(tree: Octree) -> Self {
    Self {
      header: tree.header,
      nodes: tree.nodes.into_values().collect(),
    }
  }
}

impl Octree {
  pub fn from_nodes(header: FileHeader, nodes: impl IntoIterator<Item = OctreeNode>) -> Self {
    let mut map = IndexMap::new();
    for node in nodes {
      map.insert(node.id, node);
    }
    Self { header, nodes: map }
  }

  pub fn decode<R: Read + Seek>(reader: &mut R) -> Result<Self> {
    let header = FileHeader::read_from(reader)?;
    tracing::debug!(
      marker = header.marker,
      version = header.version,
      count = header.count,
      "read metadata header"
    );

    let nodes = (0..header.record_count())
      .map(|_| reader.read_be())
      .collect::<BinResult<Vec<OctreeNode>>>()?;

    let tree = Self::from_nodes(header, nodes);
    if tree.len() != header.record_count() {
      tracing::warn!(
        records = header.record_count(),
        unique = tree.len(),
        "metadata contains repeated node ids"
      );
    }
    Ok(tree)
  }

  pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
    let mut cursor = Cursor::new(bytes);
    let tree = Self::decode(&mut cursor)?;

    let trailing = bytes.len() as u64 - cursor.position();
    if trailing > 0 {
      tracing::warn!(trailing, "bytes left over after the last node record");
    }
    Ok(tree)
  }

  /// Writes the header, with the count taken from the registry, and every
  /// node in registry order.
  pub fn encode<W: Write + Seek>(&self, writer: &mut W) -> Result<()> {
    let header = self.header.with_count(self.nodes.len())?;
    writer.write_be(&header)?;
    for node in self.nodes.values() {
      writer.write_be(node)?;
    }

    tracing::debug!(nodes = self.nodes.len(), "encoded metadata");
    Ok(())
  }

  pub fn header(&self) -> &FileHeader {
    &self.header
  }

  pub fn root(&self) -> Option<&OctreeNode> {
    self.nodes.get_index(0).map(|(_, node)| node)
  }

  pub fn get(&self, id: i64) -> Option<&OctreeNode> {
    self.nodes.get(&id)
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  pub fn nodes(&self) -> impl Iterator<Item = &OctreeNode> {
    self.nodes.values()
  }

  /// Pre-order depth-first traversal starting at the root.
  pub fn walk(&self) -> Walk<'_> {
    let stack = self
      .root()
      .map(|root| Pending {
        parent: root.id,
        id: root.id,
        slot: 0,
        depth: 0,
      })
      .into_iter()
      .collect();

    Walk {
      tree: self,
      stack,
      path: Vec::new(),
      on_path: HashSet::new(),
    }
  }
}

/// A node reached by [`Octree::walk`], with the child slot it hangs from.
#[derive(Debug, Clone, Copy)]
pub struct Visit<'a> {
  pub slot: usize,
  pub node: &'a OctreeNode,
}

struct Pending {
  parent: i64,
  id: i64,
  slot: usize,
  depth: usize,
}

/// Iterator returned by [`Octree::walk`].
///
/// Children of a node are only followed when its child count is positive,
/// and then in slot order. The walk stops after the first error.
pub struct Walk<'a> {
  tree: &'a Octree,
  stack: Vec<Pending>,
  // ids from the root down to the parent of the next node
  path: Vec<i64>,
  on_path: HashSet<i64>,
}

impl<'a> Walk<'a> {
  fn fail(&mut self, error: Error) -> Option<Result<Visit<'a>>> {
    self.stack.clear();
    Some(Err(error))
  }
}

impl<'a> Iterator for Walk<'a> {
  type Item = Result<Visit<'a>>;

  fn next(&mut self) -> Option<Self::Item> {
    let Pending {
      parent,
      id,
      slot,
      depth,
    } = self.stack.pop()?;

    for left in self.path.drain(depth.min(self.path.len())..) {
      self.on_path.remove(&left);
    }
    if self.on_path.contains(&id) {
      return self.fail(Error::Cycle { id });
    }

    let Some(node) = self.tree.get(id) else {
      return self.fail(Error::MissingNode { parent, id });
    };

    self.path.push(id);
    self.on_path.insert(id);
    if node.child_count > 0 {
      for (slot, child) in node.children().rev() {
        self.stack.push(Pending {
          parent: id,
          id: child,
          slot,
          depth: depth + 1,
        });
      }
    }

    Some(Ok(Visit { slot, node }))
  }
}

#[cfg(test)]
mod tests {
  use crate::{Error, FileHeader, Octree, OctreeNode};

  fn node(id: i64, level: i32, children: &[(usize, i64)]) -> OctreeNode {
    let mut slots = [None; 8];
    for (slot, child) in children {
      slots[*slot] = Some(*child);
    }
    OctreeNode {
      id,
      centre: [0.0; 3],
      size: [1.0; 3],
      children: slots,
      level,
      objects_rec: 10,
      objects: 1,
      child_count: children.len() as i32,
    }
  }

  fn tree(nodes: Vec<OctreeNode>) -> Octree {
    Octree::from_nodes(FileHeader::metadata(nodes.len() as i32), nodes)
  }

  fn walk_ids(tree: &Octree) -> Vec<(usize, i64)> {
    tree
      .walk()
      .map(|visit| visit.map(|visit| (visit.slot, visit.node.id)))
      .collect::<Result<_, _>>()
      .unwrap()
  }

  #[test]
  fn walks_pre_order_by_slot() {
    let tree = tree(vec![
      node(1, 0, &[(2, 3), (0, 2)]),
      node(2, 1, &[(5, 4)]),
      node(3, 1, &[]),
      node(4, 2, &[]),
    ]);

    assert_eq!(walk_ids(&tree), vec![(0, 1), (0, 2), (5, 4), (2, 3)]);
  }

  #[test]
  fn root_is_first_record_not_smallest_id() {
    let tree = tree(vec![node(50, 0, &[(1, 7)]), node(7, 1, &[])]);

    assert_eq!(tree.root().map(|root| root.id), Some(50));
    assert_eq!(walk_ids(&tree), vec![(0, 50), (1, 7)]);
  }

  #[test]
  fn zero_child_count_skips_slots() {
    let mut root = node(1, 0, &[(0, 2)]);
    root.child_count = 0;
    let tree = tree(vec![root, node(2, 1, &[])]);

    assert_eq!(walk_ids(&tree), vec![(0, 1)]);
  }

  #[test]
  fn unreachable_nodes_are_not_visited() {
    let tree = tree(vec![node(1, 0, &[(0, 2)]), node(2, 1, &[]), node(9, 1, &[])]);
    assert_eq!(walk_ids(&tree), vec![(0, 1), (0, 2)]);
  }

  #[test]
  fn empty_tree_has_nothing_to_walk() {
    let tree = tree(vec![]);
    assert!(tree.root().is_none());
    assert_eq!(tree.walk().count(), 0);
  }

  #[test]
  fn missing_child_is_an_error() {
    let tree = tree(vec![node(1, 0, &[(0, 2), (1, 3)]), node(2, 1, &[])]);
    let visits: Vec<_> = tree.walk().collect();

    assert_eq!(visits.len(), 3);
    assert!(visits[1].is_ok());
    assert!(matches!(
      visits[2],
      Err(Error::MissingNode { parent: 1, id: 3 })
    ));
  }

  #[test]
  fn cycle_is_an_error() {
    let tree = tree(vec![node(1, 0, &[(0, 2)]), node(2, 1, &[(4, 1)])]);
    let result: Result<Vec<_>, _> = tree.walk().collect();

    assert!(matches!(result, Err(Error::Cycle { id: 1 })));
  }

  #[test]
  fn self_reference_is_an_error() {
    let tree = tree(vec![node(1, 0, &[(3, 1)])]);
    let visits: Vec<_> = tree.walk().collect();

    assert_eq!(visits.len(), 2);
    assert!(matches!(visits[1], Err(Error::Cycle { id: 1 })));
  }

  #[test]
  fn shared_child_is_visited_from_each_parent() {
    let tree = tree(vec![
      node(1, 0, &[(0, 2), (1, 3)]),
      node(2, 1, &[(0, 4)]),
      node(3, 1, &[(0, 4)]),
      node(4, 2, &[]),
    ]);

    assert_eq!(
      walk_ids(&tree),
      vec![(0, 1), (0, 2), (0, 4), (1, 3), (0, 4)]
    );
  }

  #[test]
  fn repeated_id_replaces_value_in_place() {
    let mut replacement = node(1, 0, &[]);
    replacement.objects = 99;
    let tree = tree(vec![node(1, 0, &[]), node(2, 1, &[]), replacement]);

    assert_eq!(tree.len(), 2);
    assert_eq!(tree.root().map(|root| root.objects), Some(99));
  }

  #[test]
  fn deep_chain_does_not_recurse() {
    let depth = 100_000;
    let nodes = (1..=depth).map(|id| {
      let children = if id < depth { vec![(0, id + 1)] } else { vec![] };
      node(id, 0, &children)
    });
    let tree = tree(nodes.collect());

    assert_eq!(tree.walk().filter(|visit| visit.is_ok()).count(), depth as usize);
  }
}
