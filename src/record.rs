use std::fmt;
use std::iter::FromIterator;

use bstr::BStr;

use fastcsv_core::ParseOutcome;

/// A single CSV record: an ordered sequence of fields.
///
/// Each field is a byte string that may be *absent* (`None`: nothing
/// between two separators) rather than merely empty (`Some` of length
/// zero: an explicitly quoted `""`). The distinction survives a
/// parse/generate round trip.
///
/// Field data is raw bytes; the reader does not force UTF-8 on the way in.
#[derive(Clone, Default, Eq, PartialEq)]
pub struct Record {
    fields: Vec<Option<Vec<u8>>>,
}

impl Record {
    /// Create a new empty record.
    pub fn new() -> Record {
        Record { fields: Vec::new() }
    }

    /// Create a new empty record with room for `fields` fields.
    pub fn with_capacity(fields: usize) -> Record {
        Record { fields: Vec::with_capacity(fields) }
    }

    /// Append a present field.
    pub fn push_field<T: AsRef<[u8]>>(&mut self, field: T) {
        self.fields.push(Some(field.as_ref().to_vec()));
    }

    /// Append an absent field.
    pub fn push_absent(&mut self) {
        self.fields.push(None);
    }

    /// The field at index `i`, or `None` if out of bounds.
    ///
    /// A present field comes back as `Some(Some(bytes))`; an absent field
    /// as `Some(None)`.
    pub fn get(&self, i: usize) -> Option<Option<&[u8]>> {
        self.fields.get(i).map(|f| f.as_deref())
    }

    /// The number of fields in this record.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether this record has no fields at all.
    ///
    /// Note that a record parsed from a lone terminator is *not* empty: it
    /// has one absent field.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Remove all fields, keeping the allocation.
    pub fn clear(&mut self) {
        self.fields.clear();
    }

    /// Iterate over the fields in order.
    pub fn iter(&self) -> RecordIter {
        RecordIter(self.fields.iter())
    }

    pub(crate) fn from_outcome(outcome: ParseOutcome) -> Record {
        Record { fields: outcome.fields }
    }

    pub(crate) fn fields(&self) -> impl Iterator<Item = Option<&[u8]>> {
        self.fields.iter().map(|f| f.as_deref())
    }
}

/// An iterator over the fields of a `Record`, yielding `None` for absent
/// fields and `Some(bytes)` for present ones.
pub struct RecordIter<'r>(std::slice::Iter<'r, Option<Vec<u8>>>);

impl<'r> Iterator for RecordIter<'r> {
    type Item = Option<&'r [u8]>;

    fn next(&mut self) -> Option<Option<&'r [u8]>> {
        self.0.next().map(|f| f.as_deref())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<'r> ExactSizeIterator for RecordIter<'r> {}

impl<'r> IntoIterator for &'r Record {
    type IntoIter = RecordIter<'r>;
    type Item = Option<&'r [u8]>;

    fn into_iter(self) -> RecordIter<'r> {
        self.iter()
    }
}

impl<T: AsRef<[u8]>> FromIterator<Option<T>> for Record {
    fn from_iter<I: IntoIterator<Item = Option<T>>>(iter: I) -> Record {
        Record {
            fields: iter
                .into_iter()
                .map(|f| f.map(|x| x.as_ref().to_vec()))
                .collect(),
        }
    }
}

impl<T: AsRef<[u8]>> PartialEq<Vec<Option<T>>> for Record {
    fn eq(&self, other: &Vec<Option<T>>) -> bool {
        self == &**other
    }
}

impl<T: AsRef<[u8]>> PartialEq<[Option<T>]> for Record {
    fn eq(&self, other: &[Option<T>]) -> bool {
        self.fields.len() == other.len()
            && self.fields.iter().zip(other).all(|(a, b)| {
                match (a, b) {
                    (None, None) => true,
                    (Some(a), Some(b)) => a.as_slice() == b.as_ref(),
                    _ => false,
                }
            })
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut list = f.debug_list();
        for field in &self.fields {
            match field {
                None => {
                    list.entry(&"<absent>");
                }
                Some(bytes) => {
                    list.entry(&<&BStr>::from(bytes.as_slice()));
                }
            }
        }
        list.finish()
    }
}
