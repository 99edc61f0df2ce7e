use std::{fmt, str::FromStr};

use super::Error;

/// An inclusive, zero-based window of rows, sent as a `Range` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    /// The first row to return.
    pub start: u64,
    /// The last row to return.
    pub end: u64,
}

impl RowRange {
    /// Create a range from the first and last row index.
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// The value of the `Range` header.
    pub fn header_value(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RowRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl From<(u64, u64)> for RowRange {
    fn from((start, end): (u64, u64)) -> Self {
        Self { start, end }
    }
}

impl TryFrom<&[u64]> for RowRange {
    type Error = Error;

    fn try_from(value: &[u64]) -> Result<Self, Self::Error> {
        match value {
            [start, end] => Ok(Self::new(*start, *end)),
            _ => Err(Error::InvalidRange(value.len())),
        }
    }
}

impl TryFrom<Vec<u64>> for RowRange {
    type Error = Error;

    fn try_from(value: Vec<u64>) -> Result<Self, Self::Error> {
        RowRange::try_from(value.as_slice())
    }
}

impl FromStr for RowRange {
    type Err = Error;

    /// Parse `start-end`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s.split('-').collect::<Vec<_>>();
        let bounds = parts
            .iter()
            .map(|p| p.trim().parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| Error::InvalidRange(parts.len()))?;

        RowRange::try_from(bounds)
    }
}

struct Pager<F, T>
where
    F: FnMut(RowRange) -> Result<Vec<T>, Error>,
{
    fetch_page: F,
    batch: <Vec<T> as IntoIterator>::IntoIter,
    page_size: u64,
    next_start: Option<u64>,
    off: usize,
    limit: Option<usize>,
}

impl<F, T> Iterator for Pager<F, T>
where
    F: FnMut(RowRange) -> Result<Vec<T>, Error>,
{
    type Item = Result<T, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.limit.is_some_and(|l| self.off >= l) {
            return None;
        }

        if let Some(v) = self.batch.next() {
            self.off += 1;
            return Some(Ok(v));
        }

        let start = self.next_start.take()?;
        let page = match (self.fetch_page)(RowRange::new(start, start + self.page_size - 1)) {
            Ok(v) => v,
            Err(e) => return Some(Err(e)),
        };

        // A short page means the table is exhausted.
        if page.len() as u64 == self.page_size {
            self.next_start = Some(start + self.page_size);
        }

        self.batch = page.into_iter();
        if let Some(v) = self.batch.next() {
            self.off += 1;
            Some(Ok(v))
        } else {
            None
        }
    }
}

/// Walk a table one window of `page_size` rows at a time, by repeatedly
/// calling `fetch_page`. Stops after `limit` rows, or when the server returns
/// a short page.
///
/// A `page_size` of zero is treated as one.
pub fn paginate<F, T>(
    page_size: u64,
    limit: Option<usize>,
    fetch_page: F,
) -> impl Iterator<Item = Result<T, Error>>
where
    F: FnMut(RowRange) -> Result<Vec<T>, Error>,
{
    Pager {
        fetch_page,
        batch: Vec::new().into_iter(),
        page_size: page_size.max(1),
        next_start: Some(0),
        off: 0,
        limit,
    }
}
