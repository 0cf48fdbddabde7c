//! Core traits for slotlog
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`RecordStore`]: Bucket persistence with atomic read-modify-write

pub mod record_store;

pub use record_store::{Mutation, RecordStore};
