pub use crate::error::*;
pub use crate::header::*;
pub use crate::node::*;
pub use crate::octree::*;
pub use crate::particles::*;

mod error;
mod float;
mod header;
mod node;
mod octree;
mod particles;
pub mod print;
