use crate::types::Node;
use anyhow::{Context, Result};
use std::io::Write;

/// How composed objects are laid out in the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Indented JSON
    #[default]
    Pretty,
    /// JSON without whitespace
    Compact,
    /// One compact JSON object per line
    Lines,
}

/// Writes composed objects as JSON
pub struct NodeWriter<W: Write> {
    writer: W,
    format: OutputFormat,
}

impl<W: Write> NodeWriter<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        NodeWriter { writer, format }
    }

    /// Write a single object
    pub fn write_node(&mut self, node: &Node) -> Result<()> {
        let json = match self.format {
            OutputFormat::Pretty => serde_json::to_string_pretty(node),
            OutputFormat::Compact | OutputFormat::Lines => serde_json::to_string(node),
        }
        .context("Failed to serialize object")?;

        writeln!(self.writer, "{}", json).context("Failed to write object")
    }

    /// Write a sequence of objects: a JSON array, or one line each in `Lines` mode
    pub fn write_nodes(&mut self, nodes: &[Node]) -> Result<()> {
        if self.format == OutputFormat::Lines {
            for node in nodes {
                self.write_node(node)?;
            }
            return Ok(());
        }

        let json = match self.format {
            OutputFormat::Pretty => serde_json::to_string_pretty(nodes),
            _ => serde_json::to_string(nodes),
        }
        .context("Failed to serialize objects")?;

        writeln!(self.writer, "{}", json).context("Failed to write objects")
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush writer")
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
