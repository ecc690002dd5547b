//! # Extraction Testing Utils
//!
//! Shared testing utilities for the extraction scheduler workspace:
//!
//! - **Mock Extractors**: scripted success/failure/delay behaviour with call counting
//! - **Message Queue Mocks**: a recording in-memory queue with failure injection
//! - **Test Data Builders**: tasks and worker nodes with sensible defaults
//! - **Helpers**: temporary file fixtures and async wait utilities
//!
//! ## Usage
//!
//! ```toml
//! [dev-dependencies]
//! extraction-testing-utils = { path = "../testing-utils" }
//! ```
//!
//! ```rust
//! use extraction_testing_utils::{MockExtractor, TaskBuilder};
//!
//! let extractor = MockExtractor::failing_times(2);
//! let task = TaskBuilder::new("/data/a.dcm").with_priority(5).build();
//! assert_eq!(task.priority, 5);
//! assert_eq!(extractor.call_count(), 0);
//! ```

pub mod builders;
pub mod helpers;
pub mod mocks;

pub use builders::*;
pub use helpers::*;
pub use mocks::*;
