use core::fmt;
use std::error;

use memchr::{memchr, memchr2, memchr3};

use crate::config::GrammarConfig;

/// Generation failed because a field needs quoting but the configuration
/// has no quote character.
///
/// Emitting the field unquoted would parse back differently, so the
/// generator refuses rather than produce ambiguous output.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GenerateError {
    field: usize,
}

impl GenerateError {
    fn new(field: usize) -> GenerateError {
        GenerateError { field }
    }

    /// The index of the field that required quoting.
    pub fn field(&self) -> usize {
        self.field
    }
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "field {} requires quoting, but no quote character is configured",
            self.field
        )
    }
}

impl error::Error for GenerateError {}

impl GrammarConfig {
    /// Generate one line from an ordered sequence of fields, the inverse of
    /// `parse_line`.
    ///
    /// Absent fields (`None`) render as nothing, even under `force_quotes`.
    /// Present fields are quoted when they contain the separator, the quote
    /// character, CR or LF (either half of any terminator), or, for the
    /// C-escaped variants, a backslash. A present-empty field always
    /// renders as the empty quoted pair so that the absent/present
    /// distinction survives a round trip.
    ///
    /// The output never includes a trailing terminator; appending one is
    /// the caller's job. An empty field sequence generates empty output.
    pub fn generate_line<'a, I>(&self, fields: I) -> Result<Vec<u8>, GenerateError>
    where
        I: IntoIterator<Item = Option<&'a [u8]>>,
    {
        let mut out = Vec::with_capacity(64);
        for (i, field) in fields.into_iter().enumerate() {
            if i > 0 {
                out.push(self.separator);
            }
            let field = match field {
                None => continue,
                Some(field) => field,
            };
            if self.force_quotes || self.field_needs_quotes(field) {
                match self.quote {
                    None => return Err(GenerateError::new(i)),
                    Some(q) => self.push_quoted(&mut out, q, field),
                }
            } else {
                out.extend_from_slice(field);
            }
        }
        Ok(out)
    }

    /// Whether a field must be quoted to parse back as written.
    #[inline]
    fn field_needs_quotes(&self, field: &[u8]) -> bool {
        if field.is_empty() {
            // An unquoted empty field reads back as absent.
            return true;
        }
        let mut special = match self.quote {
            Some(q) => memchr3(self.separator, q, b'\r', field),
            None => memchr2(self.separator, b'\r', field),
        };
        if special.is_none() {
            special = memchr(b'\n', field);
        }
        if special.is_none() && self.grammar.is_c_escaped() {
            special = memchr(b'\\', field);
        }
        special.is_some()
    }

    /// Append the field quoted and escaped: quote bytes double, and in the
    /// C-escaped variants backslashes double too. One forward scan, copying
    /// runs between special bytes, so nothing is ever escaped twice.
    fn push_quoted(&self, out: &mut Vec<u8>, quote: u8, field: &[u8]) {
        out.push(quote);
        let mut rest = field;
        loop {
            let special = if self.grammar.is_c_escaped() {
                memchr2(quote, b'\\', rest)
            } else {
                memchr(quote, rest)
            };
            match special {
                None => {
                    out.extend_from_slice(rest);
                    break;
                }
                Some(pos) => {
                    out.extend_from_slice(&rest[..pos]);
                    out.push(rest[pos]);
                    out.push(rest[pos]);
                    rest = &rest[pos + 1..];
                }
            }
        }
        out.push(quote);
    }
}
