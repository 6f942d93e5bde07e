//! # Recast - Nested Objects from Flat Rows
//!
//! Rebuilds nested, repeated objects from the flat rows of a joined query,
//! using column aliases to say where each value belongs.
//!
//! ## Modules
//!
//! - **compose**: classify row columns and fold rows into objects
//! - **query**: substitute parameters into hand-written query text
//! - **validate**: check composed objects for required fields
//!
//! ## Quick Start
//!
//! ```rust
//! use recast::{MapConfig, ObjectComposer, Row};
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let rows: Vec<Row> = serde_json::from_value(json!([
//!     {"@Id": 1, "Name": "Vulcan", "#Moons_Name": "Luna"},
//!     {"@Id": 1, "Name": "Vulcan", "#Moons_Name": "Phobos"}
//! ]))?;
//!
//! let composer = ObjectComposer::new(MapConfig::default());
//! let planets = composer.compose_many(&rows)?;
//!
//! // planets[0] = {"Name": "Vulcan", "Moons": [{"Name": "Luna"}, {"Name": "Phobos"}]}
//! assert_eq!(planets.len(), 1);
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use std::io::{BufRead, Write};

pub mod compose;
pub mod error;
pub mod query;
pub mod types;
pub mod validate;

// Re-export commonly used types for convenience
pub use compose::{IdentityCache, NodeWriter, ObjectComposer, OutputFormat, RowClassifier, RowInfo};
pub use error::RecastError;
pub use query::build_query;
pub use types::{Field, FieldKind, IdentityKey, MapConfig, Node, NodeValue, Row, Scalar};
pub use validate::{ValidationResult, Validator};

/// Main entry point: compose a JSON Lines stream of rows into objects.
///
/// Every line holds one row object. Returns the number of objects written.
pub fn compose_json<R: BufRead, W: Write>(
    reader: R,
    writer: &mut NodeWriter<W>,
    config: MapConfig,
) -> Result<usize> {
    let composer = ObjectComposer::new(config);
    let mut cache = IdentityCache::new();

    for (number, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read line")?;
        if line.trim().is_empty() {
            continue;
        }
        let row: Row = serde_json::from_str(&line)
            .with_context(|| format!("Failed to parse row on line {}", number + 1))?;

        composer
            .compose_row(&row, &mut cache)
            .with_context(|| format!("Failed to compose row on line {}", number + 1))?;
    }

    let nodes = cache.into_nodes();
    writer.write_nodes(&nodes)?;
    writer.flush()?;
    Ok(nodes.len())
}
