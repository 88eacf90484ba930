//! On-disk store: where artifacts and links live, and how to find them again.
//!
//! The filesystem is the only database. An artifact's location is a pure
//! function of its resolved fields, so the inventory can be rebuilt by
//! walking the tree.

mod inventory;
mod layout;

pub use inventory::{LinkedAsset, list_installed, list_linked};
pub use layout::{
    LAYOUT_MARKER, LAYOUT_VERSION, StoreLayout, check_marker, decode_segment, encode_segment,
    ensure_marker,
};
