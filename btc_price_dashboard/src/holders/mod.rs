pub mod price;
pub mod snapshot;

pub use price::{RollingBuffer, BUFFER_CAPACITY};
pub use snapshot::SnapshotHolder;
