//! Error types, diagnostics, and result aliases for the jsonmap pipeline.
//!
//! All user-facing errors are variants of [`JsonMapError`], rendered via `miette`
//! diagnostics. Lexer and parser errors carry a source span; evaluation errors
//! additionally carry the output path that led to them (`$.items.0.store` style).

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::lexer::token::SourceLocation;

/// Main error type for jsonmap translation.
///
/// Diagnostic codes are grouped by pipeline stage:
/// lexical errors are E00xx, parse errors E01xx, evaluation errors E02xx.
#[derive(Error, Debug, Diagnostic)]
pub enum JsonMapError {
    #[error("unexpected character")]
    #[diagnostic(code(E0001), help("{help}"))]
    UnexpectedCharacter {
        #[source_code]
        src: String,
        #[label("unexpected: '{ch}'")]
        span: SourceSpan,
        ch: char,
        help: String,
    },

    #[error("unterminated string")]
    #[diagnostic(code(E0002), help("add a closing quote at the end of the string"))]
    UnterminatedString {
        #[source_code]
        src: String,
        #[label("string started here but never closed")]
        span: SourceSpan,
    },

    #[error("invalid escape sequence")]
    #[diagnostic(code(E0003), help("{help}"))]
    InvalidEscapeSequence {
        #[source_code]
        src: String,
        #[label("invalid escape: {sequence}")]
        span: SourceSpan,
        sequence: String,
        help: String,
    },

    #[error("malformed number")]
    #[diagnostic(code(E0004), help("{help}"))]
    MalformedNumber {
        #[source_code]
        src: String,
        #[label("not a valid number: {text}")]
        span: SourceSpan,
        text: String,
        help: String,
    },

    #[error("unexpected token")]
    #[diagnostic(code(E0101), help("{help}"))]
    UnexpectedToken {
        #[source_code]
        src: String,
        #[label("unexpected: {found}")]
        span: SourceSpan,
        expected: String,
        found: String,
        help: String,
    },

    #[error("mixed object body styles")]
    #[diagnostic(
        code(E0102),
        help("a body must use either 'key = value;' or '\"key\": value,' throughout")
    )]
    MixedObjectStyles {
        #[source_code]
        src: String,
        #[label("this entry switches separator styles")]
        span: SourceSpan,
    },

    #[error("duplicate binding name")]
    #[diagnostic(code(E0103), help("each name may be bound at most once per scope"))]
    DuplicateBinding {
        #[source_code]
        src: String,
        #[label("'{name}' is already bound in this scope")]
        span: SourceSpan,
        name: String,
    },

    #[error("empty list body")]
    #[diagnostic(code(E0104), help("a '[' ... ']' body needs at least one expression"))]
    EmptyListBody {
        #[source_code]
        src: String,
        #[label("this body has no expressions")]
        span: SourceSpan,
    },

    #[error("zip needs at least one source")]
    #[diagnostic(
        code(E0105),
        help("supply one or more list expressions before the body; the final '[' or '{{' group is the body")
    )]
    ZipWithoutSources {
        #[source_code]
        src: String,
        #[label("no sources before the body")]
        span: SourceSpan,
    },

    #[error("missing field '{field}' at {path}")]
    #[diagnostic(code(E0201), help("the referenced object has no key '{field}'"))]
    MissingField {
        #[source_code]
        src: String,
        #[label("'{field}' does not exist")]
        span: SourceSpan,
        field: String,
        path: String,
    },

    #[error("index {index} out of bounds at {path}")]
    #[diagnostic(code(E0202), help("the referenced list has {length} element(s)"))]
    OutOfBounds {
        #[source_code]
        src: String,
        #[label("index {index} is past the end")]
        span: SourceSpan,
        index: usize,
        length: usize,
        path: String,
    },

    #[error("type mismatch at {path}")]
    #[diagnostic(code(E0203), help("{help}"))]
    TypeMismatch {
        #[source_code]
        src: String,
        #[label("expected {expected}, found {found}")]
        span: SourceSpan,
        expected: String,
        found: String,
        path: String,
        help: String,
    },

    #[error("invalid input JSON: {message}")]
    InvalidInput { message: String },

    #[error("I/O error: {message}")]
    IoError { message: String },
}

impl JsonMapError {
    /// Create an UnexpectedCharacter error
    pub fn unexpected_character(
        src: impl Into<String>,
        location: &SourceLocation,
        ch: char,
    ) -> Self {
        let help = match ch {
            '\'' => "strings use double quotes".to_string(),
            '#' => "comments start with //".to_string(),
            _ => format!("'{}' is not valid jsonmap syntax", ch),
        };
        JsonMapError::UnexpectedCharacter {
            src: src.into(),
            span: (location.offset, location.length).into(),
            ch,
            help,
        }
    }

    /// Create an UnterminatedString error
    pub fn unterminated_string(src: impl Into<String>, location: &SourceLocation) -> Self {
        JsonMapError::UnterminatedString {
            src: src.into(),
            span: (location.offset, location.length).into(),
        }
    }

    /// Create an InvalidEscapeSequence error
    pub fn invalid_escape_sequence(
        src: impl Into<String>,
        location: &SourceLocation,
        sequence: impl Into<String>,
        help: impl Into<String>,
    ) -> Self {
        JsonMapError::InvalidEscapeSequence {
            src: src.into(),
            span: (location.offset, location.length).into(),
            sequence: sequence.into(),
            help: help.into(),
        }
    }

    /// Create a MalformedNumber error
    pub fn malformed_number(
        src: impl Into<String>,
        location: &SourceLocation,
        text: impl Into<String>,
        help: impl Into<String>,
    ) -> Self {
        JsonMapError::MalformedNumber {
            src: src.into(),
            span: (location.offset, location.length).into(),
            text: text.into(),
            help: help.into(),
        }
    }

    /// Create an UnexpectedToken error
    pub fn unexpected_token(
        src: impl Into<String>,
        location: &SourceLocation,
        expected: impl Into<String>,
        found: impl Into<String>,
        help: impl Into<String>,
    ) -> Self {
        JsonMapError::UnexpectedToken {
            src: src.into(),
            span: (location.offset, location.length).into(),
            expected: expected.into(),
            found: found.into(),
            help: help.into(),
        }
    }

    /// Create a MixedObjectStyles error
    pub fn mixed_object_styles(src: impl Into<String>, location: &SourceLocation) -> Self {
        JsonMapError::MixedObjectStyles {
            src: src.into(),
            span: (location.offset, location.length).into(),
        }
    }

    /// Create a DuplicateBinding error
    pub fn duplicate_binding(
        src: impl Into<String>,
        location: &SourceLocation,
        name: impl Into<String>,
    ) -> Self {
        JsonMapError::DuplicateBinding {
            src: src.into(),
            span: (location.offset, location.length).into(),
            name: name.into(),
        }
    }

    /// Create an EmptyListBody error
    pub fn empty_list_body(src: impl Into<String>, location: &SourceLocation) -> Self {
        JsonMapError::EmptyListBody {
            src: src.into(),
            span: (location.offset, location.length).into(),
        }
    }

    /// Create a ZipWithoutSources error
    pub fn zip_without_sources(src: impl Into<String>, location: &SourceLocation) -> Self {
        JsonMapError::ZipWithoutSources {
            src: src.into(),
            span: (location.offset, location.length).into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(
        src: impl Into<String>,
        location: &SourceLocation,
        field: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        JsonMapError::MissingField {
            src: src.into(),
            span: (location.offset, location.length).into(),
            field: field.into(),
            path: path.into(),
        }
    }

    /// Create an OutOfBounds error
    pub fn out_of_bounds(
        src: impl Into<String>,
        location: &SourceLocation,
        index: usize,
        length: usize,
        path: impl Into<String>,
    ) -> Self {
        JsonMapError::OutOfBounds {
            src: src.into(),
            span: (location.offset, location.length).into(),
            index,
            length,
            path: path.into(),
        }
    }

    /// Create a TypeMismatch error
    pub fn type_mismatch(
        src: impl Into<String>,
        location: &SourceLocation,
        expected: impl Into<String>,
        found: impl Into<String>,
        path: impl Into<String>,
        help: impl Into<String>,
    ) -> Self {
        JsonMapError::TypeMismatch {
            src: src.into(),
            span: (location.offset, location.length).into(),
            expected: expected.into(),
            found: found.into(),
            path: path.into(),
            help: help.into(),
        }
    }

    /// Create an InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        JsonMapError::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an IoError
    pub fn io_error(message: impl Into<String>) -> Self {
        JsonMapError::IoError {
            message: message.into(),
        }
    }

    /// Get the span for this error, if it has one
    pub fn span(&self) -> Option<SourceSpan> {
        match self {
            JsonMapError::UnexpectedCharacter { span, .. }
            | JsonMapError::UnterminatedString { span, .. }
            | JsonMapError::InvalidEscapeSequence { span, .. }
            | JsonMapError::MalformedNumber { span, .. }
            | JsonMapError::UnexpectedToken { span, .. }
            | JsonMapError::MixedObjectStyles { span, .. }
            | JsonMapError::DuplicateBinding { span, .. }
            | JsonMapError::EmptyListBody { span, .. }
            | JsonMapError::ZipWithoutSources { span, .. }
            | JsonMapError::MissingField { span, .. }
            | JsonMapError::OutOfBounds { span, .. }
            | JsonMapError::TypeMismatch { span, .. } => Some(*span),
            JsonMapError::InvalidInput { .. } | JsonMapError::IoError { .. } => None,
        }
    }

    /// Get the output path for this error, if it is an evaluation error
    pub fn path(&self) -> Option<&str> {
        match self {
            JsonMapError::MissingField { path, .. }
            | JsonMapError::OutOfBounds { path, .. }
            | JsonMapError::TypeMismatch { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Get a simple error message (without source context)
    pub fn message(&self) -> String {
        match self {
            JsonMapError::UnexpectedCharacter { ch, .. } => {
                format!("unexpected character: '{}'", ch)
            }
            JsonMapError::UnterminatedString { .. } => "unterminated string".to_string(),
            JsonMapError::InvalidEscapeSequence { sequence, .. } => {
                format!("invalid escape sequence: {}", sequence)
            }
            JsonMapError::MalformedNumber { text, .. } => {
                format!("malformed number: {}", text)
            }
            JsonMapError::UnexpectedToken {
                expected, found, ..
            } => {
                format!("unexpected token: expected {}, found {}", expected, found)
            }
            JsonMapError::MixedObjectStyles { .. } => "mixed object body styles".to_string(),
            JsonMapError::DuplicateBinding { name, .. } => {
                format!("duplicate binding name: '{}'", name)
            }
            JsonMapError::EmptyListBody { .. } => "empty list body".to_string(),
            JsonMapError::ZipWithoutSources { .. } => {
                "zip needs at least one source".to_string()
            }
            JsonMapError::MissingField { field, path, .. } => {
                format!("missing field '{}' at {}", field, path)
            }
            JsonMapError::OutOfBounds {
                index,
                length,
                path,
                ..
            } => {
                format!(
                    "index {} out of bounds at {} (length {})",
                    index, path, length
                )
            }
            JsonMapError::TypeMismatch {
                expected,
                found,
                path,
                ..
            } => {
                format!(
                    "type mismatch at {}: expected {}, found {}",
                    path, expected, found
                )
            }
            JsonMapError::InvalidInput { message } => {
                format!("invalid input JSON: {}", message)
            }
            JsonMapError::IoError { message } => format!("I/O error: {}", message),
        }
    }
}

/// Result type for jsonmap operations
pub type JsonMapResult<T> = Result<T, JsonMapError>;
