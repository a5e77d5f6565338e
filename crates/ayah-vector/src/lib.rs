//! Verse embedding indices: an exact inner-product [`FlatIndex`] held in
//! memory, persisted as a LanceDB table.

pub mod build;
pub mod flat;
pub mod schema;
pub mod table;
pub mod writer;

pub use build::build_index;
pub use flat::FlatIndex;
pub use table::open_index;
pub use writer::write_index;
