pub mod cache;
pub mod fs_extractor;
pub mod in_memory_queue;
pub mod observability;

pub use cache::*;
pub use fs_extractor::*;
pub use in_memory_queue::*;
pub use observability::*;
