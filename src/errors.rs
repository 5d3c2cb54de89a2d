//! Error types for the rdiff-core crate.
//!
//! This module defines a unified error enumeration covering every fatal
//! condition the diff engine itself can raise. It integrates with
//! `thiserror` to provide rich `Display` implementations and error source
//! chaining where applicable.
//!
//! Notes:
//! - Invocation errors (bad flag combinations) are raised by `Config`
//!   validation, not by argument parsing, which lives outside this crate.
//! - Each fatal condition maps to a conventional process exit code via
//!   [`DiffError::exit_code`]; the embedding binary decides what to do
//!   with that code.

use thiserror::Error;

#[derive(Error, Debug)]
/// Unified error enumeration for the rdiff-core library.
pub enum DiffError {
    /// Two whitespace-handling flags were set that the reference implementation
    /// treats as mutually exclusive (e.g. `-w` and `-b` would be fine since `-w`
    /// wins, but conflicting output styles are rejected).
    #[error("conflicting options: {0}")]
    ConflictingOptions(String),

    /// A numeric option (context count, tab size, horizon) failed to parse
    /// or was out of range.
    #[error("invalid numeric argument `{0}`")]
    InvalidArgument(String),

    /// I/O error reading or writing a named source.
    #[error("{name}: {source}")]
    Io {
        /// The file name or "standard input" the error is attached to.
        name: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// `-e`/`-f` output was requested but a file doesn't end in a newline;
    /// those formats cannot represent a trailing partial line.
    #[error("ed and forward-ed scripts are not robust for files with no trailing newline")]
    EdNotRobust,

    /// A `-I`/`-F`/`-p` regular expression failed to compile.
    #[error("invalid regular expression `{pattern}`: {source}")]
    BadRegex {
        /// The pattern source text that failed to compile.
        pattern: String,
        /// The underlying regex compiler error.
        #[source]
        source: regex::Error,
    },

    /// An ifdef (`-D`) group format used the numeric `%[-][W][.P]{doxX}LETTER`
    /// or `%(A=B?T:E)` ternary specifiers (spec §6 "Ifdef format
    /// specifiers"). Both are part of the documented grammar but are
    /// rejected rather than silently echoed, since the original
    /// implementation that defines their exact first/last/count/`F-1`/`L+1`
    /// semantics isn't in this repository's reference corpus.
    #[error("unsupported ifdef format specifier `{0}`: numeric and ternary group specifiers are not implemented")]
    UnsupportedFormatSpecifier(String),

    /// Generic custom error for conditions without a more specific variant.
    #[error("{0}")]
    Custom(String),
}

impl DiffError {
    /// The conventional diffutils exit status for this error: always `2`
    /// ("trouble"), since `0`/`1` are reserved for "identical"/"differs".
    pub fn exit_code(&self) -> i32 {
        2
    }

    /// Wrap an I/O error with the name of the source it was operating on.
    pub fn io(name: impl Into<String>, source: std::io::Error) -> Self {
        DiffError::Io {
            name: name.into(),
            source,
        }
    }
}
