use std::cell::RefCell;
use std::env;
use std::fs;
use std::io;
use std::rc::Rc;

use fastcsv::{
    Encoding, Error, Grammar, ParseErrorKind, Reader, ReaderBuilder, Record,
    Terminator, Writer, WriterBuilder,
};

fn reader(data: &'static str) -> Reader<&'static [u8]> {
    Reader::from_reader(data.as_bytes()).unwrap()
}

fn records(rdr: &mut Reader<&'static [u8]>) -> Vec<Record> {
    rdr.records().collect::<Result<Vec<_>, _>>().unwrap()
}

fn record(fields: &[Option<&str>]) -> Record {
    fields.iter().cloned().collect()
}

#[test]
fn read_simple() {
    let mut rdr = reader("a,b,c\n1,2,3\n");
    let got = records(&mut rdr);
    assert_eq!(2, got.len());
    assert_eq!(got[0], vec![Some("a"), Some("b"), Some("c")]);
    assert_eq!(got[1], vec![Some("1"), Some("2"), Some("3")]);
}

#[test]
fn read_without_trailing_terminator() {
    let mut rdr = reader("a,b\nc,d");
    let got = records(&mut rdr);
    assert_eq!(got[0], vec![Some("a"), Some("b")]);
    assert_eq!(got[1], vec![Some("c"), Some("d")]);
}

#[test]
fn read_absent_versus_empty() {
    let mut rdr = reader(",\"\",x\na,,\n");
    let got = records(&mut rdr);
    assert_eq!(got[0], vec![None, Some(""), Some("x")]);
    assert_eq!(got[1], vec![Some("a"), None, None]);
}

#[test]
fn read_blank_line_is_single_absent_field() {
    let mut rdr = reader("\n1\n");
    let got = records(&mut rdr);
    assert_eq!(got[0], vec![None::<&str>]);
    assert_eq!(got[1], vec![Some("1")]);
}

#[test]
fn read_crlf() {
    let mut rdr = ReaderBuilder::new()
        .terminator(Terminator::Crlf)
        .from_reader("a,b\r\nc\nd,e\r\n".as_bytes())
        .unwrap();
    let got: Vec<Record> =
        rdr.records().collect::<Result<Vec<_>, _>>().unwrap();
    // Under a CRLF terminator a lone LF is ordinary content.
    assert_eq!(got[0], vec![Some("a"), Some("b")]);
    assert_eq!(got[1], vec![Some("c\nd"), Some("e")]);
}

#[test]
fn read_cr() {
    let mut rdr = ReaderBuilder::new()
        .terminator(Terminator::Cr)
        .from_reader("a,b\rc\r".as_bytes())
        .unwrap();
    let got: Vec<Record> =
        rdr.records().collect::<Result<Vec<_>, _>>().unwrap();
    assert_eq!(got[0], vec![Some("a"), Some("b")]);
    assert_eq!(got[1], vec![Some("c")]);
}

#[test]
fn read_multiline_quoted_field() {
    let mut rdr = reader("a,\"x\ny\",b\nc,d\n");
    let got = records(&mut rdr);
    assert_eq!(got[0], vec![Some("a"), Some("x\ny"), Some("b")]);
    assert_eq!(got[1], vec![Some("c"), Some("d")]);
}

#[test]
fn read_quoted_field_spanning_three_lines() {
    let mut rdr = reader("\"x\ny\nz\",w\n");
    let got = records(&mut rdr);
    assert_eq!(1, got.len());
    assert_eq!(got[0], vec![Some("x\ny\nz"), Some("w")]);
}

#[test]
fn read_multiline_quoted_field_crlf() {
    let mut rdr = ReaderBuilder::new()
        .terminator(Terminator::Crlf)
        .from_reader("a,\"x\r\ny\",b\r\n".as_bytes())
        .unwrap();
    let got: Vec<Record> =
        rdr.records().collect::<Result<Vec<_>, _>>().unwrap();
    assert_eq!(got[0], vec![Some("a"), Some("x\r\ny"), Some("b")]);
}

#[test]
fn read_unclosed_quote_at_eof() {
    let mut rdr = reader("a,b\nc,\"open\n");
    assert!(rdr.read_record().unwrap().is_some());
    match rdr.read_record() {
        Err(Error::UnclosedQuote { record }) => assert_eq!(2, record),
        other => panic!("expected UnclosedQuote, got {:?}", other),
    }
}

#[test]
fn read_strict_grammar_error() {
    let mut rdr = ReaderBuilder::new()
        .grammar(Grammar::Strict)
        .from_reader("ok,fine\na,\"b\"x\n".as_bytes())
        .unwrap();
    assert!(rdr.read_record().unwrap().is_some());
    match rdr.read_record() {
        Err(Error::Parse { record, err }) => {
            assert_eq!(2, record);
            assert_eq!(ParseErrorKind::ContentAfterCloseQuote, err.kind());
        }
        other => panic!("expected Parse, got {:?}", other),
    }
}

#[test]
fn read_with_field_count_check() {
    let mut rdr = ReaderBuilder::new()
        .check_field_count(true)
        .from_reader("1,2,3\n4,5,6\n7,8\n".as_bytes())
        .unwrap();
    assert!(rdr.read_record().unwrap().is_some());
    assert_eq!(Some(3), rdr.field_count());
    assert!(rdr.read_record().unwrap().is_some());
    match rdr.read_record() {
        Err(Error::UnequalLengths { expected_len, len, record }) => {
            assert_eq!(3, expected_len);
            assert_eq!(2, len);
            assert_eq!(3, record);
        }
        other => panic!("expected UnequalLengths, got {:?}", other),
    }
}

#[test]
fn read_field_count_counts_blank_line() {
    // A leading blank line is a one-field record and sets the
    // expectation for everything after it.
    let mut rdr = ReaderBuilder::new()
        .check_field_count(true)
        .from_reader("\n1,2,3\n".as_bytes())
        .unwrap();
    assert!(rdr.read_record().unwrap().is_some());
    match rdr.read_record() {
        Err(Error::UnequalLengths { expected_len, len, record }) => {
            assert_eq!(1, expected_len);
            assert_eq!(3, len);
            assert_eq!(2, record);
        }
        other => panic!("expected UnequalLengths, got {:?}", other),
    }
}

#[test]
fn read_field_count_preseeded() {
    let mut rdr = ReaderBuilder::new()
        .check_field_count(true)
        .expected_field_count(3)
        .from_reader("a,b\n".as_bytes())
        .unwrap();
    match rdr.read_record() {
        Err(Error::UnequalLengths { expected_len, len, record }) => {
            assert_eq!(3, expected_len);
            assert_eq!(2, len);
            assert_eq!(1, record);
        }
        other => panic!("expected UnequalLengths, got {:?}", other),
    }
}

#[test]
fn read_skips_headers() {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_reader("h1,h2\na,b\nc,d\n".as_bytes())
        .unwrap();
    let got: Vec<Record> =
        rdr.records().collect::<Result<Vec<_>, _>>().unwrap();
    assert_eq!(2, got.len());
    assert_eq!(got[0], vec![Some("a"), Some("b")]);
    assert_eq!(got[1], vec![Some("c"), Some("d")]);
}

#[test]
fn read_headers_counted_by_field_count_check() {
    // The skipped header still seeds and satisfies the count check.
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .check_field_count(true)
        .from_reader("h1,h2\na,b\nc\n".as_bytes())
        .unwrap();
    assert!(rdr.read_record().unwrap().is_some());
    match rdr.read_record() {
        Err(Error::UnequalLengths { expected_len, len, record }) => {
            assert_eq!(2, expected_len);
            assert_eq!(1, len);
            assert_eq!(3, record);
        }
        other => panic!("expected UnequalLengths, got {:?}", other),
    }
}

#[test]
fn read_raw_records() {
    let mut rdr = reader("a,\"x\ny\",b\nc,d\n");
    let got: Vec<Vec<u8>> =
        rdr.raw_records().collect::<Result<Vec<_>, _>>().unwrap();
    assert_eq!(2, got.len());
    assert_eq!(b"a,\"x\ny\",b\n".to_vec(), got[0]);
    assert_eq!(b"c,d\n".to_vec(), got[1]);
}

#[test]
fn read_raw_records_pass_malformed_lines_through() {
    // The raw path never enforces field counts and keeps the bytes as
    // they came, header included.
    let mut rdr = ReaderBuilder::new()
        .check_field_count(true)
        .has_headers(true)
        .from_reader("h1,h2\na,b,c\n".as_bytes())
        .unwrap();
    let got: Vec<Vec<u8>> =
        rdr.raw_records().collect::<Result<Vec<_>, _>>().unwrap();
    assert_eq!(b"h1,h2\n".to_vec(), got[0]);
    assert_eq!(b"a,b,c\n".to_vec(), got[1]);
}

#[test]
fn read_long_record() {
    let long = "x".repeat(2800);
    let data = format!("{},y\n", long);
    let mut rdr = Reader::from_reader(data.as_bytes()).unwrap();
    let got = rdr.read_record().unwrap().unwrap();
    assert_eq!(got, vec![Some(long.as_str()), Some("y")]);
    assert!(rdr.read_record().unwrap().is_none());
}

#[test]
fn write_simple() {
    let mut buf = Vec::new();
    {
        let mut wtr = Writer::from_writer(&mut buf).unwrap();
        wtr.write_record(&record(&[Some("a"), Some("b")])).unwrap();
        wtr.write_record(&record(&[Some("1"), Some("2")])).unwrap();
        wtr.flush().unwrap();
    }
    assert_eq!(b"a,b\n1,2\n".to_vec(), buf);
}

#[test]
fn write_quotes_only_where_needed() {
    let mut buf = Vec::new();
    {
        let mut wtr = Writer::from_writer(&mut buf).unwrap();
        wtr.write_record(&record(&[
            Some("plain"),
            Some("has,comma"),
            Some("has\"quote"),
            Some("has\nnewline"),
            Some(""),
            None,
        ]))
        .unwrap();
        wtr.flush().unwrap();
    }
    assert_eq!(
        b"plain,\"has,comma\",\"has\"\"quote\",\"has\nnewline\",\"\",\n"
            .to_vec(),
        buf
    );
}

#[test]
fn write_force_quotes() {
    let mut buf = Vec::new();
    {
        let mut wtr = WriterBuilder::new()
            .force_quotes(true)
            .from_writer(&mut buf)
            .unwrap();
        wtr.write_record(&record(&[Some("a"), None, Some("")])).unwrap();
        wtr.flush().unwrap();
    }
    // Absent fields stay absent even when quoting is forced.
    assert_eq!(b"\"a\",,\"\"\n".to_vec(), buf);
}

#[test]
fn write_crlf_terminator() {
    let mut buf = Vec::new();
    {
        let mut wtr = WriterBuilder::new()
            .terminator(Terminator::Crlf)
            .from_writer(&mut buf)
            .unwrap();
        wtr.write_record(&record(&[Some("a"), Some("b")])).unwrap();
        wtr.flush().unwrap();
    }
    assert_eq!(b"a,b\r\n".to_vec(), buf);
}

#[test]
fn write_c_escaped_backslash_doubling() {
    let mut buf = Vec::new();
    {
        let mut wtr = WriterBuilder::new()
            .grammar(Grammar::CEscaped)
            .from_writer(&mut buf)
            .unwrap();
        wtr.write_record(&record(&[Some("a\\b"), Some("c\"d")])).unwrap();
        wtr.flush().unwrap();
    }
    assert_eq!(b"\"a\\\\b\",\"c\"\"d\"\n".to_vec(), buf);
}

/// A sink whose contents can be observed while a writer still owns it.
#[derive(Clone, Default)]
struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl SharedBuf {
    fn contents(&self) -> Vec<u8> {
        self.0.borrow().clone()
    }
}

impl io::Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn write_batches_until_threshold() {
    let sink = SharedBuf::default();
    let mut wtr = WriterBuilder::new()
        .buffer_lines(2)
        .from_writer(sink.clone())
        .unwrap();

    wtr.write_record(&record(&[Some("1")])).unwrap();
    assert!(sink.contents().is_empty());

    wtr.write_record(&record(&[Some("2")])).unwrap();
    assert_eq!(b"1\n2\n".to_vec(), sink.contents());

    wtr.write_record(&record(&[Some("3")])).unwrap();
    assert_eq!(b"1\n2\n".to_vec(), sink.contents());

    drop(wtr);
    assert_eq!(b"1\n2\n3\n".to_vec(), sink.contents());
}

#[test]
fn write_flushes_on_drop() {
    let sink = SharedBuf::default();
    {
        let mut wtr = Writer::from_writer(sink.clone()).unwrap();
        wtr.write_record(&record(&[Some("a"), Some("b")])).unwrap();
        assert!(sink.contents().is_empty());
    }
    assert_eq!(b"a,b\n".to_vec(), sink.contents());
}

#[test]
fn write_latin1_fallback_by_default() {
    let mut field = Record::new();
    field.push_field(&b"stra\xDFe"[..]);
    let mut buf = Vec::new();
    {
        let mut wtr = Writer::from_writer(&mut buf).unwrap();
        wtr.write_record(&field).unwrap();
        wtr.flush().unwrap();
    }
    // 0xDF is U+00DF under ISO-8859-1.
    assert_eq!("stra\u{df}e\n".as_bytes().to_vec(), buf);
}

#[test]
fn write_windows_1251_fallback() {
    let mut field = Record::new();
    field.push_field(&[0xDF][..]);
    let mut buf = Vec::new();
    {
        let mut wtr = WriterBuilder::new()
            .fallback_encodings(vec![Encoding::Windows1251])
            .from_writer(&mut buf)
            .unwrap();
        wtr.write_record(&field).unwrap();
        wtr.flush().unwrap();
    }
    // 0xDF is U+042F under Windows-1251.
    assert_eq!("\u{42f}\n".as_bytes().to_vec(), buf);
}

#[test]
fn write_no_fallbacks_is_an_error() {
    let mut field = Record::new();
    field.push_field(&[0xDF][..]);
    let mut buf = Vec::new();
    let mut wtr = WriterBuilder::new()
        .fallback_encodings(vec![])
        .from_writer(&mut buf)
        .unwrap();
    match wtr.write_record(&field) {
        Err(Error::Encoding { line }) => assert_eq!(vec![0xDF], line),
        other => panic!("expected Encoding, got {:?}", other),
    }
    // The failed record left nothing behind.
    wtr.write_record(&record(&[Some("ok")])).unwrap();
    wtr.flush().unwrap();
    drop(wtr);
    assert_eq!(b"ok\n".to_vec(), buf);
}

#[test]
fn round_trip_preserves_bytes() {
    let data = "a,,\"\"\nx,\"y,z\",w\nm,\"p\nq\",r\n";
    let mut rdr = Reader::from_reader(data.as_bytes()).unwrap();
    let mut buf = Vec::new();
    {
        let mut wtr = Writer::from_writer(&mut buf).unwrap();
        for rec in rdr.records() {
            wtr.write_record(&rec.unwrap()).unwrap();
        }
        wtr.flush().unwrap();
    }
    assert_eq!(data.as_bytes().to_vec(), buf);
}

#[test]
fn round_trip_through_a_file() {
    let path = env::temp_dir().join("fastcsv-roundtrip-test.csv");
    {
        let mut wtr = Writer::from_path(&path).unwrap();
        wtr.write_record(&record(&[Some("a"), Some("b,c"), None])).unwrap();
        wtr.write_record(&record(&[Some("1"), Some("2"), Some("3")])).unwrap();
        wtr.flush().unwrap();
    }
    let mut rdr = Reader::from_path(&path).unwrap();
    let got: Vec<Record> =
        rdr.records().collect::<Result<Vec<_>, _>>().unwrap();
    fs::remove_file(&path).unwrap();
    assert_eq!(got[0], vec![Some("a"), Some("b,c"), None]);
    assert_eq!(got[1], vec![Some("1"), Some("2"), Some("3")]);
}

#[test]
fn builder_rejects_quote_equal_to_separator() {
    assert!(ReaderBuilder::new()
        .delimiter(b'"')
        .from_reader("a".as_bytes())
        .is_err());
}
