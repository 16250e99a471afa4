//! Emitters for jsonmap output
//!
//! Converts evaluated [`Value`] trees to output text. Objects are emitted
//! in declaration order.

mod json;

pub use json::JsonEmitter;

use crate::errors::JsonMapResult;
use crate::evaluator::Value;

/// Output format for emission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    JsonPretty,
}

impl OutputFormat {
    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            _ => None,
        }
    }
}

/// Trait for output emitters
pub trait Emitter {
    /// Emit a value to string
    fn emit(&self, value: &Value) -> JsonMapResult<String>;

    /// Emit a value to a writer
    fn emit_to_writer<W: std::io::Write>(&self, value: &Value, writer: &mut W) -> JsonMapResult<()> {
        let output = self.emit(value)?;
        writer
            .write_all(output.as_bytes())
            .map_err(|e| crate::errors::JsonMapError::IoError {
                message: e.to_string(),
            })
    }
}

/// Emit a value to a string in the specified format
pub fn emit(value: &Value, format: OutputFormat) -> JsonMapResult<String> {
    match format {
        OutputFormat::Json => JsonEmitter::new(false).emit(value),
        OutputFormat::JsonPretty => JsonEmitter::new(true).emit(value),
    }
}
