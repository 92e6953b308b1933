use core::fmt;
use std::error;

/// A record terminator.
///
/// Unlike delimiters, the terminator may be a two byte sequence, so it gets
/// its own type. The terminator is always matched as a literal sequence:
/// with `Crlf`, a lone `\r` or `\n` is ordinary field content.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Terminator {
    /// A single `\r`.
    Cr,
    /// A single `\n`. This is the default.
    Lf,
    /// The literal two byte sequence `\r\n`.
    Crlf,
}

impl Terminator {
    /// The terminator as its literal byte sequence.
    pub fn as_bytes(&self) -> &'static [u8] {
        match *self {
            Terminator::Cr => b"\r",
            Terminator::Lf => b"\n",
            Terminator::Crlf => b"\r\n",
        }
    }

    /// The final byte of the sequence, which is what line-splitting scans
    /// for.
    pub fn last_byte(&self) -> u8 {
        match *self {
            Terminator::Cr => b'\r',
            Terminator::Lf | Terminator::Crlf => b'\n',
        }
    }

    /// Returns true if the terminator sequence starts at `pos` in `line`.
    #[inline]
    pub(crate) fn matches_at(&self, line: &[u8], pos: usize) -> bool {
        match *self {
            Terminator::Cr => line[pos] == b'\r',
            Terminator::Lf => line[pos] == b'\n',
            Terminator::Crlf => {
                line[pos] == b'\r'
                    && pos + 1 < line.len()
                    && line[pos + 1] == b'\n'
            }
        }
    }
}

impl Default for Terminator {
    fn default() -> Terminator {
        Terminator::Lf
    }
}

/// The grammar variant to parse or generate with.
///
/// The strict variants reject quote characters in positions RFC 4180 does
/// not allow; the relaxed variants interpret them as literal content and
/// always find *a* parse. The `CEscaped` variants additionally recognize
/// backslash escapes inside quoted fields, alongside doubled quotes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Grammar {
    /// Misplaced quotes are an error.
    Strict,
    /// Misplaced quotes are literal content. This is the default.
    Relaxed,
    /// Like `Strict`, plus backslash escapes inside quoted fields.
    CEscaped,
    /// Like `Relaxed`, plus backslash escapes inside quoted fields.
    CEscapedRelaxed,
}

impl Grammar {
    /// True for the variants that raise errors on misplaced quotes.
    pub fn is_strict(&self) -> bool {
        match *self {
            Grammar::Strict | Grammar::CEscaped => true,
            Grammar::Relaxed | Grammar::CEscapedRelaxed => false,
        }
    }

    /// True for the variants that recognize backslash escapes.
    pub fn is_c_escaped(&self) -> bool {
        match *self {
            Grammar::CEscaped | Grammar::CEscapedRelaxed => true,
            Grammar::Strict | Grammar::Relaxed => false,
        }
    }
}

impl Default for Grammar {
    fn default() -> Grammar {
        Grammar::Relaxed
    }
}

/// An error constructing a `GrammarConfig`.
///
/// These are caught exactly once, when the configuration is built. The
/// parsing and generation routines never re-validate.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ConfigError {
    /// The separator and quote characters are the same byte.
    QuoteEqualsSeparator,
    /// A C-escaped grammar was requested with a quote other than `"`.
    ///
    /// Backslash escaping is only defined relative to the double quote
    /// convention.
    CEscapedNeedsDoubleQuote,
    /// `force_quotes` was requested on a configuration with no quote
    /// character.
    ForceQuotesWithoutQuote,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ConfigError::QuoteEqualsSeparator => {
                write!(f, "separator and quote characters cannot be the same")
            }
            ConfigError::CEscapedNeedsDoubleQuote => {
                write!(
                    f,
                    "C-escaped grammars require the quote character \
                     to be '\"'"
                )
            }
            ConfigError::ForceQuotesWithoutQuote => {
                write!(
                    f,
                    "force_quotes requires a quote character to be configured"
                )
            }
        }
    }
}

impl error::Error for ConfigError {}

/// An immutable, validated description of one CSV dialect.
///
/// A config is built once per session and then passed to every `parse_line`
/// and `generate_line` call. It holds no mutable state, so one config may be
/// shared freely across threads.
#[derive(Clone, Copy, Debug)]
pub struct GrammarConfig {
    pub(crate) separator: u8,
    pub(crate) quote: Option<u8>,
    pub(crate) terminator: Terminator,
    pub(crate) grammar: Grammar,
    pub(crate) force_quotes: bool,
}

impl Default for GrammarConfig {
    fn default() -> GrammarConfig {
        GrammarConfig {
            separator: b',',
            quote: Some(b'"'),
            terminator: Terminator::default(),
            grammar: Grammar::default(),
            force_quotes: false,
        }
    }
}

impl GrammarConfig {
    /// A builder for the default dialect: comma separated, double quoted,
    /// LF terminated, relaxed grammar.
    pub fn builder() -> GrammarConfigBuilder {
        GrammarConfigBuilder::new()
    }

    /// The field separator.
    pub fn separator(&self) -> u8 {
        self.separator
    }

    /// The quote character, if one is configured.
    ///
    /// A configuration without a quote character can still parse (quotes
    /// become ordinary content), but generation fails whenever a field
    /// would need quoting to round-trip.
    pub fn quote(&self) -> Option<u8> {
        self.quote
    }

    /// The record terminator.
    pub fn terminator(&self) -> Terminator {
        self.terminator
    }

    /// The grammar variant.
    pub fn grammar(&self) -> Grammar {
        self.grammar
    }

    /// Whether generation quotes every present field unconditionally.
    pub fn force_quotes(&self) -> bool {
        self.force_quotes
    }
}

/// Builds a `GrammarConfig`, enforcing the dialect invariants once.
#[derive(Clone, Debug, Default)]
pub struct GrammarConfigBuilder {
    config: GrammarConfig,
}

impl GrammarConfigBuilder {
    /// Create a new builder with the default dialect.
    pub fn new() -> GrammarConfigBuilder {
        GrammarConfigBuilder::default()
    }

    /// The field separator to use. The default is `b','`.
    pub fn separator(&mut self, separator: u8) -> &mut GrammarConfigBuilder {
        self.config.separator = separator;
        self
    }

    /// The quote character to use, or `None` for a parsing-only
    /// configuration with no quoting. The default is `b'"'`.
    pub fn quote(&mut self, quote: Option<u8>) -> &mut GrammarConfigBuilder {
        self.config.quote = quote;
        self
    }

    /// The record terminator to use. The default is `Terminator::Lf`.
    pub fn terminator(&mut self, term: Terminator) -> &mut GrammarConfigBuilder {
        self.config.terminator = term;
        self
    }

    /// The grammar variant to use. The default is `Grammar::Relaxed`.
    pub fn grammar(&mut self, grammar: Grammar) -> &mut GrammarConfigBuilder {
        self.config.grammar = grammar;
        self
    }

    /// Quote every present field when generating, whether or not quoting is
    /// structurally necessary. Absent fields still render as nothing.
    pub fn force_quotes(&mut self, yes: bool) -> &mut GrammarConfigBuilder {
        self.config.force_quotes = yes;
        self
    }

    /// Validate the dialect and produce the immutable config.
    pub fn build(&self) -> Result<GrammarConfig, ConfigError> {
        let config = self.config;
        if config.quote == Some(config.separator) {
            return Err(ConfigError::QuoteEqualsSeparator);
        }
        if config.grammar.is_c_escaped() && config.quote != Some(b'"') {
            return Err(ConfigError::CEscapedNeedsDoubleQuote);
        }
        if config.force_quotes && config.quote.is_none() {
            return Err(ConfigError::ForceQuotesWithoutQuote);
        }
        Ok(config)
    }
}
