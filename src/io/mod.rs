//! I/O operations for loading and saving point-cloud attributes.
//!
//! This module sits in front of the core:
//! - `AttributeTable`: named per-point float columns, the core's input
//! - PLY format (read the `vertex` element, write tables back out)

mod ply;
mod table;

// Re-export public types and functions
pub use ply::{load_ply, read_ply, save_ply, write_ply, LoadError, PlyFormat};
pub use table::AttributeTable;
