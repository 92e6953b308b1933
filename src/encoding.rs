use std::char;
use std::str;

/// A fallback codec for the write path.
///
/// When a generated line is not valid UTF-8, the writer re-interprets its
/// bytes under each configured fallback in order and re-encodes to UTF-8
/// on the first success. Exhausting the list is an error; nothing is
/// silently passed through.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Encoding {
    /// ISO-8859-1. Every byte maps to the code point of the same value,
    /// so this codec never fails; putting it anywhere in the fallback
    /// list makes the list total.
    Latin1,
    /// Windows code page 1252. Fails on the five bytes the code page
    /// leaves undefined.
    Windows1252,
    /// Windows code page 1251 (Cyrillic). Fails on the one undefined
    /// byte.
    Windows1251,
}

// 0x80..=0x9F of code page 1252; 0 marks an undefined byte. The rest of
// the upper half coincides with Latin-1.
const WINDOWS_1252_HIGH: [u16; 32] = [
    0x20AC, 0, 0x201A, 0x0192, 0x201E, 0x2026, 0x2020, 0x2021, 0x02C6,
    0x2030, 0x0160, 0x2039, 0x0152, 0, 0x017D, 0, 0, 0x2018, 0x2019,
    0x201C, 0x201D, 0x2022, 0x2013, 0x2014, 0x02DC, 0x2122, 0x0161,
    0x203A, 0x0153, 0, 0x017E, 0x0178,
];

// 0x80..=0xBF of code page 1251; 0xC0..=0xFF is the contiguous Cyrillic
// block starting at U+0410.
const WINDOWS_1251_HIGH: [u16; 64] = [
    0x0402, 0x0403, 0x201A, 0x0453, 0x201E, 0x2026, 0x2020, 0x2021,
    0x20AC, 0x2030, 0x0409, 0x2039, 0x040A, 0x040C, 0x040B, 0x040F,
    0x0452, 0x2018, 0x2019, 0x201C, 0x201D, 0x2022, 0x2013, 0x2014,
    0, 0x2122, 0x0459, 0x203A, 0x045A, 0x045C, 0x045B, 0x045F,
    0x00A0, 0x040E, 0x045E, 0x0408, 0x00A4, 0x0490, 0x00A6, 0x00A7,
    0x0401, 0x00A9, 0x0404, 0x00AB, 0x00AC, 0x00AD, 0x00AE, 0x0407,
    0x00B0, 0x00B1, 0x0406, 0x0456, 0x0491, 0x00B5, 0x00B6, 0x00B7,
    0x0451, 0x2116, 0x0454, 0x00BB, 0x0458, 0x0405, 0x0455, 0x0457,
];

impl Encoding {
    /// Decode `bytes` under this codec, or `None` if any byte is
    /// undefined in the code page.
    pub(crate) fn decode(&self, bytes: &[u8]) -> Option<String> {
        let mut out = String::with_capacity(bytes.len());
        for &b in bytes {
            let cp = match *self {
                Encoding::Latin1 => u32::from(b),
                Encoding::Windows1252 => {
                    if b < 0x80 || b >= 0xA0 {
                        u32::from(b)
                    } else {
                        match WINDOWS_1252_HIGH[usize::from(b - 0x80)] {
                            0 => return None,
                            cp => u32::from(cp),
                        }
                    }
                }
                Encoding::Windows1251 => {
                    if b < 0x80 {
                        u32::from(b)
                    } else if b >= 0xC0 {
                        0x0410 + u32::from(b - 0xC0)
                    } else {
                        match WINDOWS_1251_HIGH[usize::from(b - 0x80)] {
                            0 => return None,
                            cp => u32::from(cp),
                        }
                    }
                }
            };
            out.push(char::from_u32(cp)?);
        }
        Some(out)
    }
}

/// Re-encode `line` as UTF-8 if it is not already valid, trying each
/// fallback in order. `Err` hands the line back for error reporting.
pub(crate) fn normalize_utf8(
    line: Vec<u8>,
    fallbacks: &[Encoding],
) -> Result<Vec<u8>, Vec<u8>> {
    if str::from_utf8(&line).is_ok() {
        return Ok(line);
    }
    for fallback in fallbacks {
        if let Some(decoded) = fallback.decode(&line) {
            return Ok(decoded.into_bytes());
        }
    }
    Err(line)
}
