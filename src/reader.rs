use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use fastcsv_core::{
    Grammar, GrammarConfig, GrammarConfigBuilder, ParseOutcome, Terminator,
};

use crate::error::{Error, Result};
use crate::record::Record;

/// Builds a CSV reader with various configuration knobs.
///
/// The dialect invariants are checked once, when the reader is built;
/// nothing is re-validated while records stream.
#[derive(Clone, Debug, Default)]
pub struct ReaderBuilder {
    config: GrammarConfigBuilder,
    has_headers: bool,
    check_field_count: bool,
    expected_field_count: Option<u64>,
}

impl ReaderBuilder {
    /// Create a new builder for the default dialect: comma separated,
    /// double quoted, LF terminated, relaxed grammar, no header skipping,
    /// no field count checking.
    pub fn new() -> ReaderBuilder {
        ReaderBuilder::default()
    }

    /// The field separator to use. The default is `b','`.
    pub fn delimiter(&mut self, delimiter: u8) -> &mut ReaderBuilder {
        self.config.separator(delimiter);
        self
    }

    /// The quote character to use, or `None` to treat quote characters as
    /// ordinary content. The default is `b'"'`.
    pub fn quote(&mut self, quote: Option<u8>) -> &mut ReaderBuilder {
        self.config.quote(quote);
        self
    }

    /// The record terminator to split physical lines on. Always matched
    /// as a literal byte sequence. The default is `Terminator::Lf`.
    pub fn terminator(&mut self, term: Terminator) -> &mut ReaderBuilder {
        self.config.terminator(term);
        self
    }

    /// The grammar variant to parse with. The default is
    /// `Grammar::Relaxed`.
    pub fn grammar(&mut self, grammar: Grammar) -> &mut ReaderBuilder {
        self.config.grammar(grammar);
        self
    }

    /// When enabled, the first record is read and discarded (after any
    /// field count check). Disabled by default.
    pub fn has_headers(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.has_headers = yes;
        self
    }

    /// When enabled, every record's field count must match the first
    /// record's count (or the count given via `expected_field_count`);
    /// a mismatch is an `UnequalLengths` error. Disabled by default.
    pub fn check_field_count(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.check_field_count = yes;
        self
    }

    /// Pre-seed the expected field count instead of taking it from the
    /// first record. Implies nothing unless `check_field_count` is on.
    pub fn expected_field_count(&mut self, count: u64) -> &mut ReaderBuilder {
        self.expected_field_count = Some(count);
        self
    }

    /// Build a reader over any `io::Read`, buffering it internally.
    pub fn from_reader<R: Read>(&self, rdr: R) -> Result<Reader<R>> {
        Ok(Reader {
            rdr: BufReader::new(rdr),
            config: self.config.build()?,
            has_headers: self.has_headers,
            header_skipped: false,
            check_field_count: self.check_field_count,
            expected_field_count: self.expected_field_count,
            record: 0,
        })
    }

    /// Build a reader over the file at `path`.
    pub fn from_path<P: AsRef<Path>>(&self, path: P) -> Result<Reader<File>> {
        self.from_reader(File::open(path)?)
    }
}

/// A CSV reader over an arbitrary byte source.
///
/// The reader splits the source into physical lines on the literal
/// terminator sequence, feeds them through the grammar engine one at a
/// time, and drives the continuation protocol whenever a quoted field
/// spans a line boundary. It owns the byte source exclusively; the engine
/// itself never sees it.
#[derive(Debug)]
pub struct Reader<R> {
    rdr: BufReader<R>,
    config: GrammarConfig,
    has_headers: bool,
    header_skipped: bool,
    check_field_count: bool,
    expected_field_count: Option<u64>,
    record: u64,
}

impl Reader<File> {
    /// Create a reader for the file at `path` with the default dialect.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Reader<File>> {
        ReaderBuilder::new().from_path(path)
    }
}

impl<R: Read> Reader<R> {
    /// Create a reader with the default dialect.
    pub fn from_reader(rdr: R) -> Result<Reader<R>> {
        ReaderBuilder::new().from_reader(rdr)
    }

    /// The expected field count, once one has been observed or seeded.
    pub fn field_count(&self) -> Option<u64> {
        self.expected_field_count
    }

    /// Read the next logical record, or `None` at end of stream.
    ///
    /// A record whose quoted field spans physical lines is reassembled
    /// here; end of stream in the middle of such a field is an
    /// `UnclosedQuote` error rather than a truncated record.
    pub fn read_record(&mut self) -> Result<Option<Record>> {
        loop {
            let outcome = match self.read_logical()? {
                None => return Ok(None),
                Some(outcome) => outcome,
            };
            let record = Record::from_outcome(outcome);
            self.check_count(record.len() as u64)?;
            if self.has_headers && !self.header_skipped {
                self.header_skipped = true;
                continue;
            }
            return Ok(Some(record));
        }
    }

    /// Read the next logical record as raw, unparsed bytes, terminator
    /// included.
    ///
    /// Quote balance is still tracked, so a record with a multi-line
    /// quoted field comes back whole. No field count check or header
    /// skipping applies on this path; it is a passthrough.
    pub fn read_raw_record(&mut self) -> Result<Option<Vec<u8>>> {
        let mut raw = match self.read_physical_line()? {
            None => return Ok(None),
            Some(line) => line,
        };
        self.record += 1;
        let mut complete = match self.parse_one(&raw, false)? {
            None => true,
            Some(outcome) => outcome.complete,
        };
        while !complete {
            let next = match self.read_physical_line()? {
                None => {
                    return Err(Error::UnclosedQuote { record: self.record })
                }
                Some(line) => line,
            };
            complete = match self.parse_one(&next, true)? {
                None => true,
                Some(outcome) => outcome.complete,
            };
            raw.extend_from_slice(&next);
        }
        Ok(Some(raw))
    }

    /// An iterator over all remaining records.
    pub fn records(&mut self) -> RecordsIter<R> {
        RecordsIter { rdr: self }
    }

    /// An iterator over all remaining raw logical records.
    pub fn raw_records(&mut self) -> RawRecordsIter<R> {
        RawRecordsIter { rdr: self }
    }

    fn read_logical(&mut self) -> Result<Option<ParseOutcome>> {
        let line = match self.read_physical_line()? {
            None => return Ok(None),
            Some(line) => line,
        };
        self.record += 1;
        let mut outcome = match self.parse_one(&line, false)? {
            None => return Ok(None),
            Some(outcome) => outcome,
        };
        while !outcome.complete {
            let next = match self.read_physical_line()? {
                None => {
                    return Err(Error::UnclosedQuote { record: self.record })
                }
                Some(line) => line,
            };
            if let Some(cont) = self.parse_one(&next, true)? {
                outcome.append_continuation(cont);
            }
        }
        Ok(Some(outcome))
    }

    fn parse_one(
        &self,
        line: &[u8],
        start_in_quoted: bool,
    ) -> Result<Option<ParseOutcome>> {
        self.config
            .parse_line(line, start_in_quoted)
            .map_err(|err| Error::Parse { record: self.record, err })
    }

    fn check_count(&mut self, len: u64) -> Result<()> {
        if !self.check_field_count {
            return Ok(());
        }
        match self.expected_field_count {
            None => {
                self.expected_field_count = Some(len);
                Ok(())
            }
            Some(expected) if expected != len => Err(Error::UnequalLengths {
                expected_len: expected,
                len,
                record: self.record,
            }),
            Some(_) => Ok(()),
        }
    }

    /// Read one physical line, including its terminator, or `None` at end
    /// of stream. For CRLF the scan continues past lone LF bytes until
    /// the literal pair (or end of stream) is seen.
    fn read_physical_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut line = Vec::new();
        match self.config.terminator() {
            Terminator::Cr | Terminator::Lf => {
                let last = self.config.terminator().last_byte();
                self.rdr.read_until(last, &mut line)?;
            }
            Terminator::Crlf => loop {
                let n = self.rdr.read_until(b'\n', &mut line)?;
                if n == 0 || line.ends_with(b"\r\n") {
                    break;
                }
            },
        }
        if line.is_empty() {
            Ok(None)
        } else {
            Ok(Some(line))
        }
    }
}

/// An iterator over records, created by `Reader::records`.
pub struct RecordsIter<'r, R> {
    rdr: &'r mut Reader<R>,
}

impl<'r, R: Read> Iterator for RecordsIter<'r, R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Result<Record>> {
        self.rdr.read_record().transpose()
    }
}

/// An iterator over raw logical records, created by `Reader::raw_records`.
pub struct RawRecordsIter<'r, R> {
    rdr: &'r mut Reader<R>,
}

impl<'r, R: Read> Iterator for RawRecordsIter<'r, R> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Result<Vec<u8>>> {
        self.rdr.read_raw_record().transpose()
    }
}
