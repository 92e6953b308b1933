use core::fmt;
use std::error;
use std::mem;

use memchr::{memchr, memchr2, memchr3};

use crate::config::GrammarConfig;

/// The result of parsing one physical line.
///
/// A field is `None` when it was absent (nothing between two separators)
/// and `Some` when it was present, even if empty: `a,,b` has an absent
/// middle field while `a,"",b` has a present-empty one.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseOutcome {
    /// The fields parsed so far, in order.
    pub fields: Vec<Option<Vec<u8>>>,
    /// False when the line ended inside an open quoted field. The caller
    /// must feed the next physical line with `start_in_quoted` set and
    /// merge the outcomes with `append_continuation`.
    pub complete: bool,
}

impl ParseOutcome {
    /// Merge a continuation outcome into this one.
    ///
    /// The first field of the continuation extends the field that was open
    /// across the physical line boundary; the remaining fields append in
    /// order. Completeness is taken from the continuation.
    pub fn append_continuation(&mut self, other: ParseOutcome) {
        let mut rest = other.fields.into_iter();
        if let (Some(open), Some(first)) = (self.fields.last_mut(), rest.next()) {
            if let Some(text) = first {
                open.get_or_insert_with(Vec::new).extend_from_slice(&text);
            }
        }
        self.fields.extend(rest);
        self.complete = other.complete;
    }
}

/// A grammar violation under one of the strict variants.
///
/// The relaxed variants never produce this error; they take the literal
/// interpretation and keep going.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseError {
    kind: ParseErrorKind,
    pos: usize,
}

/// The specific grammar violation behind a `ParseError`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParseErrorKind {
    /// A quote character appeared in the middle of an unquoted field.
    QuoteInUnquotedField,
    /// Content other than a separator or terminator followed a closing
    /// quote.
    ContentAfterCloseQuote,
}

impl ParseError {
    fn new(kind: ParseErrorKind, pos: usize) -> ParseError {
        ParseError { kind, pos }
    }

    /// The specific violation.
    pub fn kind(&self) -> ParseErrorKind {
        self.kind
    }

    /// The byte offset in the input line at which the violation was seen.
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            ParseErrorKind::QuoteInUnquotedField => write!(
                f,
                "quote character inside unquoted field at byte {}",
                self.pos
            ),
            ParseErrorKind::ContentAfterCloseQuote => write!(
                f,
                "unexpected content after closing quote at byte {}",
                self.pos
            ),
        }
    }
}

impl error::Error for ParseError {}

/// The per-field scanner state.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    FieldStart,
    Unquoted,
    Quoted,
    AfterQuote,
}

impl GrammarConfig {
    /// Parse one physical line into an ordered sequence of fields.
    ///
    /// The line may include the trailing terminator sequence; the first
    /// terminator found outside an open quote ends the record and the rest
    /// of the input is ignored. Terminator bytes inside an open quote are
    /// ordinary field content, which is what makes multi-line quoted
    /// fields work: when the line runs out before the quote closes, the
    /// outcome is returned with `complete: false` and the caller resumes
    /// with the next physical line and `start_in_quoted: true`.
    ///
    /// Zero-length input is the end-of-stream sentinel and yields
    /// `Ok(None)`. A lone terminator is not the sentinel: it is one record
    /// holding a single absent field.
    ///
    /// The scan is a single left-to-right pass with at most one byte of
    /// lookahead. Only the strict variants can return an error.
    pub fn parse_line(
        &self,
        line: &[u8],
        start_in_quoted: bool,
    ) -> Result<Option<ParseOutcome>, ParseError> {
        if line.is_empty() {
            return Ok(None);
        }

        let strict = self.grammar.is_strict();
        let mut fields: Vec<Option<Vec<u8>>> = Vec::with_capacity(8);
        let mut buf: Vec<u8> = Vec::new();
        let mut quoted = start_in_quoted;
        let mut state =
            if start_in_quoted { State::Quoted } else { State::FieldStart };
        let mut i = 0;

        while i < line.len() {
            match state {
                State::FieldStart => {
                    let b = line[i];
                    if self.quote == Some(b) {
                        quoted = true;
                        state = State::Quoted;
                        i += 1;
                    } else if b == self.separator {
                        fields.push(take_field(&mut buf, &mut quoted));
                        i += 1;
                    } else if self.terminator.matches_at(line, i) {
                        fields.push(take_field(&mut buf, &mut quoted));
                        return Ok(Some(ParseOutcome { fields, complete: true }));
                    } else {
                        buf.push(b);
                        state = State::Unquoted;
                        i += 1;
                    }
                }
                State::Unquoted => match self.find_special_unquoted(&line[i..]) {
                    None => {
                        buf.extend_from_slice(&line[i..]);
                        i = line.len();
                    }
                    Some(j) => {
                        buf.extend_from_slice(&line[i..i + j]);
                        i += j;
                        let b = line[i];
                        if b == self.separator {
                            fields.push(take_field(&mut buf, &mut quoted));
                            state = State::FieldStart;
                            i += 1;
                        } else if self.terminator.matches_at(line, i) {
                            fields.push(take_field(&mut buf, &mut quoted));
                            return Ok(Some(ParseOutcome {
                                fields,
                                complete: true,
                            }));
                        } else if self.quote == Some(b) {
                            if strict {
                                return Err(ParseError::new(
                                    ParseErrorKind::QuoteInUnquotedField,
                                    i,
                                ));
                            }
                            buf.push(b);
                            i += 1;
                        } else {
                            // First byte of the terminator without the rest
                            // of the sequence: ordinary content.
                            buf.push(b);
                            i += 1;
                        }
                    }
                },
                State::Quoted => match self.find_special_quoted(&line[i..]) {
                    None => {
                        buf.extend_from_slice(&line[i..]);
                        i = line.len();
                    }
                    Some(j) => {
                        buf.extend_from_slice(&line[i..i + j]);
                        i += j;
                        let b = line[i];
                        if self.quote == Some(b) {
                            state = State::AfterQuote;
                            i += 1;
                        } else if i + 1 < line.len() {
                            // Backslash escape: the next byte is literal.
                            buf.push(line[i + 1]);
                            i += 2;
                        } else {
                            // A backslash as the very last input byte has
                            // nothing to escape; keep it.
                            buf.push(b);
                            i += 1;
                        }
                    }
                },
                State::AfterQuote => {
                    let b = line[i];
                    if self.quote == Some(b) {
                        // Doubled quote: one literal quote, still inside.
                        buf.push(b);
                        state = State::Quoted;
                        i += 1;
                    } else if b == self.separator {
                        fields.push(take_field(&mut buf, &mut quoted));
                        state = State::FieldStart;
                        i += 1;
                    } else if self.terminator.matches_at(line, i) {
                        fields.push(take_field(&mut buf, &mut quoted));
                        return Ok(Some(ParseOutcome { fields, complete: true }));
                    } else if strict {
                        return Err(ParseError::new(
                            ParseErrorKind::ContentAfterCloseQuote,
                            i,
                        ));
                    } else {
                        // Relaxed: trailing content after the closing quote
                        // is literal; the field is still terminated by the
                        // next separator or terminator.
                        buf.push(b);
                        i += 1;
                    }
                }
            }
        }

        // Ran off the end of the line without seeing a terminator.
        if state == State::Quoted {
            fields.push(Some(mem::take(&mut buf)));
            Ok(Some(ParseOutcome { fields, complete: false }))
        } else {
            fields.push(take_field(&mut buf, &mut quoted));
            Ok(Some(ParseOutcome { fields, complete: true }))
        }
    }

    /// Position of the next byte that is special in an unquoted field:
    /// the separator, the quote or the first byte of the terminator.
    #[inline]
    fn find_special_unquoted(&self, slice: &[u8]) -> Option<usize> {
        let term = self.terminator.as_bytes()[0];
        match self.quote {
            Some(q) => memchr3(self.separator, term, q, slice),
            None => memchr2(self.separator, term, slice),
        }
    }

    /// Position of the next byte that is special inside a quoted field:
    /// the quote, plus the backslash for the C-escaped variants.
    #[inline]
    fn find_special_quoted(&self, slice: &[u8]) -> Option<usize> {
        match self.quote {
            Some(q) if self.grammar.is_c_escaped() => {
                memchr2(q, b'\\', slice)
            }
            Some(q) => memchr(q, slice),
            // A quoted state with no quote configured can only come from
            // `start_in_quoted`; nothing closes it.
            None => None,
        }
    }
}

#[inline]
fn take_field(buf: &mut Vec<u8>, quoted: &mut bool) -> Option<Vec<u8>> {
    let was_quoted = mem::replace(quoted, false);
    if !was_quoted && buf.is_empty() {
        None
    } else {
        Some(mem::take(buf))
    }
}
