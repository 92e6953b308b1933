/*!
A fast, line-oriented CSV reader and writer.

This crate couples the grammar engine in `fastcsv-core` with I/O: a
[`Reader`] that splits a byte source into physical lines, reassembles
records whose quoted fields span line boundaries and optionally enforces
a uniform field count, and a [`Writer`] that generates lines, batches
them in memory and re-encodes stray non-UTF-8 output before it reaches
the sink.

The engine itself never touches I/O. Everything it does is per line, so
a caller that already has lines in hand (a log shipper, a message queue
consumer) can use `fastcsv-core` directly and skip this crate's reader.

# Example

Read comma separated records from stdin, enforcing that every record has
the same number of fields as the first:

```no_run
use std::io;

use fastcsv::ReaderBuilder;

fn run() -> fastcsv::Result<()> {
    let mut rdr = ReaderBuilder::new()
        .check_field_count(true)
        .from_reader(io::stdin())?;
    for record in rdr.records() {
        let record = record?;
        println!("{:?}", record);
    }
    Ok(())
}
```

# Grammar variants

Four variants cover the dialects seen in the wild, from the RFC-shaped
`Strict` through `Relaxed` (stray quotes are content) to the
`CEscaped` pair, where a backslash inside a quoted field escapes the
next byte. See [`Grammar`].

# Absent versus empty fields

A field that is simply missing (nothing between two separators) and a
field that is explicitly present but empty (`""`) are different things,
and this crate keeps them apart: [`Record`] stores
each field as an `Option`. Generation preserves the distinction, so a
record read from one file writes back out byte-for-byte equivalent.
*/

#![deny(missing_docs)]

pub use fastcsv_core::{
    ConfigError, GenerateError, Grammar, GrammarConfig, GrammarConfigBuilder,
    ParseError, ParseErrorKind, ParseOutcome, Terminator,
};

pub use crate::encoding::Encoding;
pub use crate::error::{Error, Result};
pub use crate::reader::{RawRecordsIter, Reader, ReaderBuilder, RecordsIter};
pub use crate::record::{Record, RecordIter};
pub use crate::writer::{Writer, WriterBuilder, DEFAULT_BUFFER_LINES};

mod encoding;
mod error;
mod reader;
mod record;
mod writer;
