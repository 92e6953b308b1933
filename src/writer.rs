use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use fastcsv_core::{Grammar, GrammarConfig, GrammarConfigBuilder, Terminator};

use crate::encoding::{self, Encoding};
use crate::error::{Error, Result};
use crate::record::Record;

/// Number of generated lines held back before the batch is written
/// through to the underlying writer.
pub const DEFAULT_BUFFER_LINES: usize = 250_000;

/// Builds a CSV writer with various configuration knobs.
#[derive(Clone, Debug)]
pub struct WriterBuilder {
    config: GrammarConfigBuilder,
    buffer_lines: usize,
    fallbacks: Vec<Encoding>,
}

impl Default for WriterBuilder {
    fn default() -> WriterBuilder {
        WriterBuilder {
            config: GrammarConfigBuilder::default(),
            buffer_lines: DEFAULT_BUFFER_LINES,
            fallbacks: vec![Encoding::Latin1],
        }
    }
}

impl WriterBuilder {
    /// Create a new builder for the default dialect: comma separated,
    /// double quoted, LF terminated, relaxed grammar, quoting only where
    /// needed, Latin-1 as the sole re-encoding fallback.
    pub fn new() -> WriterBuilder {
        WriterBuilder::default()
    }

    /// The field separator to use. The default is `b','`.
    pub fn delimiter(&mut self, delimiter: u8) -> &mut WriterBuilder {
        self.config.separator(delimiter);
        self
    }

    /// The quote character to use, or `None` to disable quoting entirely.
    /// The default is `b'"'`.
    pub fn quote(&mut self, quote: Option<u8>) -> &mut WriterBuilder {
        self.config.quote(quote);
        self
    }

    /// The terminator appended after every generated line. The default is
    /// `Terminator::Lf`.
    pub fn terminator(&mut self, term: Terminator) -> &mut WriterBuilder {
        self.config.terminator(term);
        self
    }

    /// The grammar variant to generate for. The default is
    /// `Grammar::Relaxed`.
    pub fn grammar(&mut self, grammar: Grammar) -> &mut WriterBuilder {
        self.config.grammar(grammar);
        self
    }

    /// When enabled, every present field is quoted whether it needs it or
    /// not. Disabled by default.
    pub fn force_quotes(&mut self, yes: bool) -> &mut WriterBuilder {
        self.config.force_quotes(yes);
        self
    }

    /// How many generated lines to batch before writing through. The
    /// default is `DEFAULT_BUFFER_LINES`.
    pub fn buffer_lines(&mut self, lines: usize) -> &mut WriterBuilder {
        self.buffer_lines = lines;
        self
    }

    /// The single-byte encodings to try, in order, when a generated line
    /// is not valid UTF-8. An empty list makes any such line an error.
    /// The default is `[Encoding::Latin1]`.
    pub fn fallback_encodings(
        &mut self,
        encodings: Vec<Encoding>,
    ) -> &mut WriterBuilder {
        self.fallbacks = encodings;
        self
    }

    /// Build a writer over any `io::Write`.
    pub fn from_writer<W: Write>(&self, wtr: W) -> Result<Writer<W>> {
        Ok(Writer {
            wtr,
            config: self.config.build()?,
            buf: Vec::new(),
            buffered_lines: 0,
            buffer_lines: self.buffer_lines,
            fallbacks: self.fallbacks.clone(),
        })
    }

    /// Build a writer that creates (or truncates) the file at `path`.
    pub fn from_path<P: AsRef<Path>>(&self, path: P) -> Result<Writer<File>> {
        self.from_writer(File::create(path)?)
    }
}

/// A CSV writer over an arbitrary byte sink.
///
/// Generated lines accumulate in an internal batch and reach the sink
/// only when the batch fills, on `flush`, or on drop. The batching is a
/// throughput measure on top of whatever buffering the sink has; a large
/// export becomes a handful of big writes instead of one per record.
#[derive(Debug)]
pub struct Writer<W: io::Write> {
    wtr: W,
    config: GrammarConfig,
    buf: Vec<u8>,
    buffered_lines: usize,
    buffer_lines: usize,
    fallbacks: Vec<Encoding>,
}

impl Writer<File> {
    /// Create a writer for the file at `path` with the default dialect.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Writer<File>> {
        WriterBuilder::new().from_path(path)
    }
}

impl<W: io::Write> Writer<W> {
    /// Create a writer with the default dialect.
    pub fn from_writer(wtr: W) -> Result<Writer<W>> {
        WriterBuilder::new().from_writer(wtr)
    }

    /// Generate one line from `record` and add it, terminator appended,
    /// to the batch.
    ///
    /// A record that fails to generate or to re-encode leaves the batch
    /// untouched; everything written before it is still intact and still
    /// flushable.
    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        let line = self.config.generate_line(record.fields())?;
        let line = encoding::normalize_utf8(line, &self.fallbacks)
            .map_err(|line| Error::Encoding { line })?;
        self.buf.extend_from_slice(&line);
        self.buf.extend_from_slice(self.config.terminator().as_bytes());
        self.buffered_lines += 1;
        if self.buffered_lines >= self.buffer_lines {
            self.write_batch()?;
        }
        Ok(())
    }

    /// Write any batched lines through and flush the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.write_batch()?;
        self.wtr.flush()?;
        Ok(())
    }

    fn write_batch(&mut self) -> Result<()> {
        if !self.buf.is_empty() {
            self.wtr.write_all(&self.buf)?;
            self.buf.clear();
        }
        self.buffered_lines = 0;
        Ok(())
    }
}

impl<W: io::Write> Drop for Writer<W> {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
