/*!
`fastcsv-core` is the line-level CSV grammar engine underneath the
`fastcsv` crate: a character-by-character state machine that turns one
(possibly multi-physical-line) logical record into an ordered sequence of
fields, and the inverse encoder that turns fields back into a correctly
escaped line.

The engine does no I/O and keeps no state between calls. A
[`GrammarConfig`] describes one dialect (separator, quote, terminator,
grammar variant) and is validated once; [`GrammarConfig::parse_line`] and
[`GrammarConfig::generate_line`] are then pure per-call transforms, safe to
invoke from any number of threads.

Four grammar variants are supported. The strict variants reject misplaced
quote characters with a [`ParseError`]; the relaxed variants interpret them
as literal content and always find *a* parse. The C-escaped variants layer
backslash escapes on top, alongside the usual doubled-quote convention.

A quoted field may span physical lines. When `parse_line` reaches the end
of its input with the quote still open it returns an outcome with
`complete: false`; the caller fetches the next physical line, parses it
with `start_in_quoted: true`, and merges the two outcomes with
[`ParseOutcome::append_continuation`]. Quote balance, not buffering, drives
the loop, so the engine never needs lookahead beyond a single byte.

There is deliberately no cap on field size: a pathological unterminated
quote accumulates an arbitrarily large field instead of aborting early.
That trade is made for speed.
*/

#![deny(missing_docs)]

pub use crate::config::{
    ConfigError, Grammar, GrammarConfig, GrammarConfigBuilder, Terminator,
};
pub use crate::generate::GenerateError;
pub use crate::parse::{ParseError, ParseErrorKind, ParseOutcome};

mod config;
mod generate;
mod parse;
