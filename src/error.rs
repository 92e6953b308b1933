use std::error;
use std::fmt;
use std::io;
use std::result;

use bstr::BStr;

use fastcsv_core::{ConfigError, GenerateError, ParseError};

/// A type alias for `Result<T, fastcsv::Error>`.
pub type Result<T> = result::Result<T, Error>;

/// An error that can occur when reading or writing CSV data.
///
/// Engine errors are per-record: they never invalidate the configuration,
/// the reader's position in the stream, or the writer's batch beyond the
/// record that failed. There is no retry; these are deterministic text
/// transform failures, not transient faults.
#[derive(Debug)]
pub enum Error {
    /// An I/O error from the underlying byte source or sink.
    Io(io::Error),
    /// The dialect configuration was invalid. Raised once, at build time,
    /// never mid-stream.
    Config(ConfigError),
    /// A strict-grammar violation in one record.
    Parse {
        /// The index of the record in which the violation occurred,
        /// starting from 1.
        record: u64,
        /// The engine-level error with the violation kind and byte offset.
        err: ParseError,
    },
    /// The input ended while a quoted field was still open, with no
    /// further physical line available to continue it.
    UnclosedQuote {
        /// The index of the unterminated record, starting from 1.
        record: u64,
    },
    /// A record's field count differed from the expected count in a
    /// count-checked session.
    UnequalLengths {
        /// The expected number of fields, from the first record read (or
        /// the pre-seeded expectation).
        expected_len: u64,
        /// The number of fields in the offending record.
        len: u64,
        /// The index of the offending record, starting from 1.
        record: u64,
    },
    /// Quoting was required to round-trip a field, but the configuration
    /// has no quote character.
    Generate(GenerateError),
    /// A generated line was not valid UTF-8 and none of the configured
    /// fallback encodings could re-encode it.
    Encoding {
        /// The generated line that could not be re-encoded.
        line: Vec<u8>,
    },
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Error {
        Error::Config(err)
    }
}

impl From<GenerateError> for Error {
    fn from(err: GenerateError) -> Error {
        Error::Generate(err)
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            Error::Config(ref err) => Some(err),
            Error::Parse { ref err, .. } => Some(err),
            Error::Generate(ref err) => Some(err),
            Error::UnclosedQuote { .. }
            | Error::UnequalLengths { .. }
            | Error::Encoding { .. } => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Io(ref err) => err.fmt(f),
            Error::Config(ref err) => write!(f, "CSV config error: {}", err),
            Error::Parse { record, ref err } => {
                write!(f, "CSV parse error: record {}: {}", record, err)
            }
            Error::UnclosedQuote { record } => write!(
                f,
                "CSV parse error: record {}: input ended inside an \
                 open quoted field",
                record
            ),
            Error::UnequalLengths { expected_len, len, record } => write!(
                f,
                "CSV parse error: record {}: found record with {} fields, \
                 but the expected field count is {}",
                record, len, expected_len
            ),
            Error::Generate(ref err) => {
                write!(f, "CSV generate error: {}", err)
            }
            Error::Encoding { ref line } => write!(
                f,
                "CSV encoding error: no configured fallback encoding could \
                 re-encode this non-UTF-8 line: {:?}",
                <&BStr>::from(line.as_slice())
            ),
        }
    }
}
