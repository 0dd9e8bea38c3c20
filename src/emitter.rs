//! @dose
//! purpose: Literal Emitter. Renders description records as C++ raw string literal
//!     declarations and writes them, together with the header and trailer comments, to an
//!     append-only sink.
//!
//! when-editing:
//!     - !The description text is written verbatim; raw strings have no escapes
//!     - !Opening and closing delimiters must use the same token
//!     - Each declaration is followed by one blank line
//!
//! invariants:
//!     - No two emitted declarations share an identifier (checked, not assumed)
//!     - Text containing the closing sequence is rejected instead of corrupting output
//!
//! gotchas:
//!     - C++ limits raw string delimiters to 16 chars without spaces, parens or backslashes
//!     - Path segments joined by '_' can collide ("a_b"+"c" vs "a"+"b_c")

use crate::types::{DescriptionRecord, QualifiedName};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::io::Write;
use thiserror::Error;

/// Identifier prefix of every generated declaration
pub const DEFAULT_PREFIX: &str = "DOCSTRING_";

/// Raw string delimiter token
pub const DEFAULT_DELIMITER: &str = "doc_from_python";

/// Longest delimiter a C++ raw string literal accepts
pub const MAX_DELIMITER_LEN: usize = 16;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

#[derive(Error, Debug)]
pub enum EmitError {
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid raw string delimiter {delimiter:?}: {reason}")]
    InvalidDelimiter {
        delimiter: String,
        reason: &'static str,
    },
    #[error("description of {path} contains the closing sequence {sequence:?}")]
    DelimiterCollision { path: String, sequence: String },
    #[error("{path} does not produce a valid C identifier: {identifier:?}")]
    InvalidIdentifier { path: String, identifier: String },
    #[error("identifier {identifier} produced by both {first} and {second}")]
    DuplicateIdentifier {
        identifier: String,
        first: String,
        second: String,
    },
}

/// Check a raw string delimiter against the C++ d-char-sequence rules
pub fn validate_delimiter(delimiter: &str) -> Result<(), EmitError> {
    let invalid = |reason| EmitError::InvalidDelimiter {
        delimiter: delimiter.to_string(),
        reason,
    };

    if delimiter.len() > MAX_DELIMITER_LEN {
        return Err(invalid("longer than 16 characters"));
    }
    if !delimiter.is_ascii() {
        return Err(invalid("contains non-ASCII characters"));
    }
    if delimiter
        .chars()
        .any(|c| matches!(c, ' ' | '(' | ')' | '\\') || c.is_ascii_control())
    {
        return Err(invalid("contains a space, parenthesis, backslash or control character"));
    }
    Ok(())
}

/// Writes literal declarations to `W`
pub struct Emitter<W: Write> {
    out: W,
    prefix: String,
    delimiter: String,
    close_sequence: String,
    /// identifier -> dotted path that produced it
    seen: HashMap<String, String>,
}

impl<W: Write> Emitter<W> {
    pub fn new(out: W, prefix: &str, delimiter: &str) -> Result<Self, EmitError> {
        validate_delimiter(delimiter)?;
        Ok(Self {
            out,
            prefix: prefix.to_string(),
            delimiter: delimiter.to_string(),
            close_sequence: format!("){}\"", delimiter),
            seen: HashMap::new(),
        })
    }

    /// Identifier a qualified name is emitted under
    pub fn identifier_for(&self, name: &QualifiedName) -> String {
        format!("{}{}", self.prefix, name.identifier())
    }

    pub fn write_header(
        &mut self,
        module_name: &str,
        generator: &str,
        timestamp: Option<&str>,
    ) -> Result<(), EmitError> {
        writeln!(
            self.out,
            "// Auto generated documentation strings from module {}",
            module_name
        )?;
        writeln!(self.out, "// Generated by {}", generator)?;
        if let Some(timestamp) = timestamp {
            writeln!(self.out, "// Generated on {}", timestamp)?;
        }
        writeln!(self.out)?;
        Ok(())
    }

    /// Write one declaration for `record`
    pub fn emit(&mut self, record: &DescriptionRecord) -> Result<(), EmitError> {
        let path = record.name.dotted();
        let identifier = self.identifier_for(&record.name);

        if !IDENTIFIER.is_match(&identifier) {
            return Err(EmitError::InvalidIdentifier { path, identifier });
        }
        if record.text.contains(&self.close_sequence) {
            return Err(EmitError::DelimiterCollision {
                path,
                sequence: self.close_sequence.clone(),
            });
        }
        if let Some(first) = self.seen.get(&identifier) {
            return Err(EmitError::DuplicateIdentifier {
                identifier,
                first: first.clone(),
                second: path,
            });
        }

        writeln!(
            self.out,
            "const char *{} = R\"{}({}{};",
            identifier, self.delimiter, record.text, self.close_sequence
        )?;
        writeln!(self.out)?;

        self.seen.insert(identifier, path);
        Ok(())
    }

    pub fn write_trailer(&mut self, count: usize, module_name: &str) -> Result<(), EmitError> {
        writeln!(
            self.out,
            "// Completed {} documentation strings from module {}",
            count, module_name
        )?;
        self.out.flush()?;
        Ok(())
    }

    /// Number of distinct declarations written so far
    pub fn declarations(&self) -> usize {
        self.seen.len()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
