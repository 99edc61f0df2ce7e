//! Operations on the rows of the bound table.

use http::header::{HeaderMap, HeaderName, HeaderValue, RANGE};
use serde::Serialize;

use crate::api::{Error, Filter, Query, QueryParams, RowRange, TableRequest};

/// A single record, mapping field names to values.
pub type Row = serde_json::Map<String, serde_json::Value>;

const PREFER: HeaderName = HeaderName::from_static("prefer");
const MERGE_DUPLICATES: &str = "resolution=merge-duplicates";
const RETURN_REPRESENTATION: &str = "return=representation";

/// One or many records to insert.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Rows {
    /// A single record.
    One(Row),
    /// A list of records, inserted together.
    Many(Vec<Row>),
}

impl From<Row> for Rows {
    fn from(row: Row) -> Self {
        Rows::One(row)
    }
}

impl From<Vec<Row>> for Rows {
    fn from(rows: Vec<Row>) -> Self {
        Rows::Many(rows)
    }
}

/// Read rows, or columns of rows.
#[derive(Debug, Clone)]
pub struct Select {
    /// What to select.
    pub query: Query,

    /// The window of rows to return. If unset, the server's default applies.
    pub range: Option<RowRange>,
}

impl TableRequest for Select {
    type Response = serde_json::Value;

    fn query(&self) -> Result<QueryParams, Error> {
        self.query.params()
    }

    fn headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        if let Some(range) = &self.range {
            headers.insert(RANGE, HeaderValue::from_str(&range.header_value())?);
        }

        Ok(headers)
    }
}

/// Insert one or more rows, optionally merging with existing rows on
/// conflict.
#[derive(Debug, Clone)]
pub struct Insert {
    /// The rows to insert.
    pub rows: Rows,

    /// Filters scoping the insert. May be empty.
    pub filters: Vec<Filter>,

    /// If set, rows that conflict with existing ones update them instead of
    /// failing.
    pub upsert: bool,
}

impl TableRequest for Insert {
    // Left undecoded; the shape depends on the preference.
    type Response = String;

    fn method(&self) -> http::Method {
        http::Method::POST
    }

    fn query(&self) -> Result<QueryParams, Error> {
        QueryParams::from_filters(self.filters.iter().cloned())
    }

    fn headers(&self) -> Result<HeaderMap, Error> {
        let prefer = if self.upsert {
            MERGE_DUPLICATES
        } else {
            RETURN_REPRESENTATION
        };

        let mut headers = HeaderMap::new();
        headers.insert(PREFER, HeaderValue::from_static(prefer));
        Ok(headers)
    }

    fn body(&self) -> Option<impl Serialize> {
        Some(&self.rows)
    }
}

/// Overwrite fields of the rows matching the filters.
#[derive(Debug, Clone)]
pub struct Update {
    /// The fields to overwrite.
    pub values: Row,

    /// Which rows to update. Must not be empty.
    pub filters: Vec<Filter>,
}

impl TableRequest for Update {
    type Response = serde_json::Value;

    fn method(&self) -> http::Method {
        http::Method::PATCH
    }

    fn query(&self) -> Result<QueryParams, Error> {
        required_filters(&self.filters)
    }

    fn headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(PREFER, HeaderValue::from_static(RETURN_REPRESENTATION));
        Ok(headers)
    }

    fn body(&self) -> Option<impl Serialize> {
        Some(&self.values)
    }
}

/// Delete the rows matching the filters.
#[derive(Debug, Clone)]
pub struct Delete {
    /// Which rows to delete. Must not be empty.
    pub filters: Vec<Filter>,
}

impl TableRequest for Delete {
    type Response = ();

    fn method(&self) -> http::Method {
        http::Method::DELETE
    }

    fn query(&self) -> Result<QueryParams, Error> {
        required_filters(&self.filters)
    }
}

/// Merge the filters of a write that must not touch every row. Filters that
/// merge to nothing count as missing.
fn required_filters(filters: &[Filter]) -> Result<QueryParams, Error> {
    let params = QueryParams::from_filters(filters.iter().cloned())?;
    if params.is_empty() {
        return Err(Error::MissingFilters);
    }

    Ok(params)
}
