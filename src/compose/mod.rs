//! Composition of nested objects from flat rows
//!
//! Rows produced by joins repeat the "one" side of every one-to-many
//! relationship. The classifier reads each column name to decide where its
//! value belongs, and the composer folds the rows back into objects, using
//! the identity column to recognise repeated parents.

pub mod classify;
pub mod composer;
pub mod writer;

pub use classify::{FieldClass, GroupInfo, RowClassifier, RowInfo};
pub use composer::{IdentityCache, ObjectComposer};
pub use writer::{NodeWriter, OutputFormat};
