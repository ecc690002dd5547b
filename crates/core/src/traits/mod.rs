pub mod extractor;
pub mod message_queue;

pub use extractor::*;
pub use message_queue::*;
