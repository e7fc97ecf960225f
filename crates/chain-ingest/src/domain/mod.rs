pub mod kind;
pub mod types;

pub use kind::MessageKind;
pub use types::{SegmentRange, TablePath};
