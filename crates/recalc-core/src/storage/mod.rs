//! Snapshot persistence and export formats.

pub mod md;
pub mod snapshot;

pub use md::{write_markdown, write_markdown_to};
pub use snapshot::{
    Snapshot, SnapshotCell, parse_snapshot, parse_snapshot_content, read_snapshot_version,
    write_snapshot, write_snapshot_content,
};
