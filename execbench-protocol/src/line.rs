//! Result Line Encoding
//!
//! An executor reports one invocation as a single JSON line on stdout. Anything
//! printed before it is ignored; only the trailing line is decoded.

use crate::messages::TestResult;
use thiserror::Error;

/// Longest excerpt of an undecodable line kept in the error
const MAX_EXCERPT_CHARS: usize = 200;

/// Errors that can occur while decoding executor output
#[derive(Debug, Error)]
pub enum LineError {
    /// No non-blank line on stdout
    #[error("executor printed nothing on stdout")]
    Empty,

    /// Stdout is not UTF-8
    #[error("executor output is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// Trailing line is not a valid result
    #[error("cannot decode result line {excerpt:?}: {source}")]
    Decode {
        /// Start of the offending line
        excerpt: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Last line of `output`, ignoring the final newline and trailing blank lines
pub fn trailing_line(output: &[u8]) -> Result<&str, LineError> {
    let text = std::str::from_utf8(output)?.trim_end();
    let line = text.rsplit('\n').next().unwrap_or_default().trim();
    if line.is_empty() {
        return Err(LineError::Empty);
    }
    Ok(line)
}

/// Decode the trailing line of an executor's stdout
pub fn decode_result_line(output: &[u8]) -> Result<TestResult, LineError> {
    let line = trailing_line(output)?;
    serde_json::from_str(line).map_err(|source| LineError::Decode {
        excerpt: line.chars().take(MAX_EXCERPT_CHARS).collect(),
        source,
    })
}

/// Encode a result as one line, without the terminating newline
pub fn encode_result_line(result: &TestResult) -> Result<String, serde_json::Error> {
    serde_json::to_string(result)
}
