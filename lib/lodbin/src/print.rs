//! Plain-text renderings of decoded files.

use std::io::Write;

use crate::{FileHeader, Octree, OctreeNode, Result, StarRecord, Visit};

const INDENT: &str = "    ";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Style {
  /// Slot index, level, id, own/recursive objects and child count per line.
  #[default]
  Tree,
  /// One short line per node.
  Brief,
}

/// Writes the header summary followed by one line per node in walk order,
/// indented by the node's level.
///
/// Lines already written stay written when the walk fails part way.
pub fn write_tree<W: Write>(tree: &Octree, style: Style, out: &mut W) -> Result<()> {
  let header = tree.header();
  match style {
    Style::Tree => {
      writeln!(
        out,
        "marker: {}, version: {}, number of nodes: {}",
        header.marker, header.version, header.count
      )?;
      writeln!(out)?;
    }
    Style::Brief => writeln!(
      out,
      "m{}, v{}, {} nodes",
      header.marker, header.version, header.count
    )?,
  }

  for visit in tree.walk() {
    writeln!(out, "{}", node_line(visit?, style))?;
  }

  Ok(())
}

pub fn node_line(visit: Visit<'_>, style: Style) -> String {
  let Visit { slot, node } = visit;
  let pad = padding(node);

  match style {
    Style::Tree => format!(
      "{pad}{slot}:L{} id:{} Obj(own/rec):({}/{}) Nchld:{}",
      node.level, node.id, node.objects, node.objects_rec, node.child_count
    ),
    Style::Brief => format!(
      "{pad}L{}: {} > {}/{} objs/rec [{} ch]",
      node.level, node.id, node.objects, node.objects_rec, node.child_count
    ),
  }
}

fn padding(node: &OctreeNode) -> String {
  INDENT.repeat(usize::try_from(node.level).unwrap_or(0))
}

pub fn header_line(file_name: &str, header: &FileHeader) -> String {
  format!(
    "{file_name} >  mk: {}, v: {}, #stars: {}",
    header.marker, header.version, header.count
  )
}

pub fn star_line(star: &StarRecord) -> String {
  format!(
    "id: {} - names: '{}' - mag: {:.6}",
    star.id, star.name, star.app_mag
  )
}
