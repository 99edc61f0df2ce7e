//! The shapes a read can take, and how each becomes query parameters.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use super::{Error, Filter, Parameters};

// PostgREST punctuation ('.', ',', '(', ')', '*', ':') stays readable.
const QUERY_COMPONENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b';')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

// Raw fragments keep their own separators.
const RAW_FRAGMENT: &AsciiSet = &QUERY_COMPONENT.remove(b'&').remove(b'=').remove(b'%');

/// What to read from a table.
///
/// Strings convert to [`Query::SelectAll`] (for `"*"` and `"all"`) or
/// [`Query::Column`]; lists of strings to [`Query::Columns`]; filters and
/// lists of filters to [`Query::Filter`] and [`Query::Filters`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Every column of every row.
    SelectAll,
    /// A single column.
    Column(String),
    /// A list of columns.
    Columns(Vec<String>),
    /// Rows matching a filter.
    Filter(Filter),
    /// Rows matching all of the filters, merged together.
    Filters(Vec<Filter>),
}

/// One element of a heterogeneous query list, checked by
/// [`Query::from_parts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryPart {
    /// A column name.
    Column(String),
    /// A filter.
    Filter(Filter),
}

impl Query {
    /// Infer the query shape from a list of parts. The parts must be either
    /// all columns or all filters.
    pub fn from_parts(parts: impl IntoIterator<Item = QueryPart>) -> Result<Self, Error> {
        let parts: Vec<QueryPart> = parts.into_iter().collect();
        if parts.is_empty() {
            return Err(Error::InvalidQuery("query list is empty".to_string()));
        }

        if parts.iter().all(|p| matches!(p, QueryPart::Column(_))) {
            let columns = parts
                .into_iter()
                .filter_map(|p| match p {
                    QueryPart::Column(c) => Some(c),
                    QueryPart::Filter(_) => None,
                })
                .collect();
            Ok(Query::Columns(columns))
        } else if parts.iter().all(|p| matches!(p, QueryPart::Filter(_))) {
            let filters = parts
                .into_iter()
                .filter_map(|p| match p {
                    QueryPart::Filter(f) => Some(f),
                    QueryPart::Column(_) => None,
                })
                .collect();
            Ok(Query::Filters(filters))
        } else {
            Err(Error::InvalidQuery(
                "query must be a list of column names or a list of filters".to_string(),
            ))
        }
    }

    /// Flatten the query into the parameters sent to the server.
    pub fn params(&self) -> Result<QueryParams, Error> {
        Ok(match self {
            Query::SelectAll => QueryParams::select("*"),
            Query::Column(column) => QueryParams::select(column),
            Query::Columns(columns) => QueryParams::select(columns.join(",")),
            Query::Filter(filter) => filter.clone().into(),
            Query::Filters(filters) => match Filter::merge_all(filters.iter().cloned())? {
                Some(filter) => filter.into(),
                None => return Err(Error::InvalidQuery("query list is empty".to_string())),
            },
        })
    }
}

impl From<&str> for Query {
    fn from(s: &str) -> Self {
        match s {
            "*" | "all" => Query::SelectAll,
            _ => Query::Column(s.to_string()),
        }
    }
}

impl From<String> for Query {
    fn from(s: String) -> Self {
        Query::from(s.as_str())
    }
}

impl From<Vec<String>> for Query {
    fn from(columns: Vec<String>) -> Self {
        Query::Columns(columns)
    }
}

impl From<Vec<&str>> for Query {
    fn from(columns: Vec<&str>) -> Self {
        Query::Columns(columns.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Query {
    fn from(columns: [&str; N]) -> Self {
        Query::Columns(columns.into_iter().map(str::to_string).collect())
    }
}

impl From<Filter> for Query {
    fn from(filter: Filter) -> Self {
        Query::Filter(filter)
    }
}

impl From<Vec<Filter>> for Query {
    fn from(filters: Vec<Filter>) -> Self {
        Query::Filters(filters)
    }
}

impl<const N: usize> From<[Filter; N]> for Query {
    fn from(filters: [Filter; N]) -> Self {
        Query::Filters(filters.into())
    }
}

impl From<&str> for QueryPart {
    fn from(s: &str) -> Self {
        QueryPart::Column(s.to_string())
    }
}

impl From<String> for QueryPart {
    fn from(s: String) -> Self {
        QueryPart::Column(s)
    }
}

impl From<Filter> for QueryPart {
    fn from(filter: Filter) -> Self {
        QueryPart::Filter(filter)
    }
}

/// The query string of a single request: structured parameters, plus an
/// optional raw fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    /// Parameters keyed by column or selector name.
    pub pairs: Parameters,
    /// A raw fragment, appended after the structured parameters.
    pub raw: Option<String>,
}

impl QueryParams {
    fn select(columns: impl Into<String>) -> Self {
        let mut pairs = Parameters::new();
        pairs.insert("select".to_string(), columns.into());
        Self { pairs, raw: None }
    }

    /// Build the parameters for a list of filters, which may be empty.
    pub fn from_filters(filters: impl IntoIterator<Item = Filter>) -> Result<Self, Error> {
        Ok(Filter::merge_all(filters)?
            .map(QueryParams::from)
            .unwrap_or_default())
    }

    /// Whether there is nothing to send.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty() && self.raw.as_deref().is_none_or(str::is_empty)
    }

    /// Encode the parameters as a query string, without the leading `?`.
    pub fn to_query_string(&self) -> String {
        let mut qs = self
            .pairs
            .iter()
            .map(|(k, v)| {
                format!(
                    "{}={}",
                    utf8_percent_encode(k, QUERY_COMPONENT),
                    utf8_percent_encode(v, QUERY_COMPONENT)
                )
            })
            .collect::<Vec<_>>()
            .join("&");

        if let Some(raw) = self.raw.as_deref().filter(|r| !r.is_empty()) {
            if !qs.is_empty() {
                qs.push('&');
            }

            qs.extend(utf8_percent_encode(raw, RAW_FRAGMENT));
        }

        qs
    }
}

impl From<Filter> for QueryParams {
    fn from(filter: Filter) -> Self {
        match filter {
            Filter::Columns(pairs) => Self { pairs, raw: None },
            Filter::Raw(raw) => Self {
                pairs: Parameters::new(),
                raw: Some(raw),
            },
        }
    }
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;

    use super::*;

    fn pairs(params: &QueryParams) -> Vec<(&str, &str)> {
        params
            .pairs
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    #[test]
    fn select_all() -> anyhow::Result<()> {
        for s in ["*", "all"] {
            let query = Query::from(s);
            assert_eq!(query, Query::SelectAll);
            assert_eq!(pairs(&query.params()?), [("select", "*")]);
        }

        Ok(())
    }

    #[test]
    fn columns() -> anyhow::Result<()> {
        let params = Query::from(["a", "b", "c"]).params()?;
        assert_eq!(pairs(&params), [("select", "a,b,c")]);

        let params = Query::from("name").params()?;
        assert_eq!(pairs(&params), [("select", "name")]);

        Ok(())
    }

    #[test]
    fn filters() -> anyhow::Result<()> {
        let f1 = Filter::new("age", "gte", 18)?;
        let f2 = Filter::new("name", "eq", "John")?;

        let params = Query::from(f1.clone()).params()?;
        assert_eq!(pairs(&params), [("age", "gte.18")]);

        let params = Query::from([f1, f2]).params()?;
        assert_eq!(pairs(&params), [("age", "gte.18"), ("name", "eq.John")]);

        Ok(())
    }

    #[test]
    fn from_parts() -> anyhow::Result<()> {
        let f1 = Filter::new("age", "gte", 18)?;

        let query = Query::from_parts([QueryPart::from("a"), QueryPart::from("b")])?;
        assert_eq!(query, Query::from(["a", "b"]));

        let query = Query::from_parts([QueryPart::from(f1.clone())])?;
        assert_eq!(query, Query::Filters(vec![f1.clone()]));

        assert_matches!(
            Query::from_parts([QueryPart::from("a"), QueryPart::from(f1)]),
            Err(Error::InvalidQuery(_))
        );
        assert_matches!(
            Query::from_parts(Vec::new()),
            Err(Error::InvalidQuery(_))
        );

        Ok(())
    }

    #[test]
    fn raw_in_filter_list() -> anyhow::Result<()> {
        let raw = Filter::raw("body=fts(english).cat");

        let params = Query::from(vec![raw.clone()]).params()?;
        assert_eq!(params.raw.as_deref(), Some("body=fts(english).cat"));

        assert_matches!(
            Query::from([raw, Filter::new("a", "eq", 1)?]).params(),
            Err(Error::RawMerge)
        );
        assert_matches!(
            Query::Filters(Vec::new()).params(),
            Err(Error::InvalidQuery(_))
        );

        Ok(())
    }

    #[test]
    fn query_string_encoding() -> anyhow::Result<()> {
        let params = QueryParams::from_filters([
            Filter::new("name", "eq", "John Smith")?,
            Filter::new("id", "in", "(1,2,3)")?,
            Filter::new("note", "eq", "a&b=c")?,
        ])?;
        assert_eq!(
            params.to_query_string(),
            "id=in.(1,2,3)&name=eq.John%20Smith&note=eq.a%26b%3Dc"
        );

        let params = Query::from(["a", "b"]).params()?;
        assert_eq!(params.to_query_string(), "select=a,b");

        let params = QueryParams::from(Filter::raw("body=fts(english).fat cat&id=gt.1"));
        assert_eq!(
            params.to_query_string(),
            "body=fts(english).fat%20cat&id=gt.1"
        );

        assert!(QueryParams::from_filters(Vec::new())?.is_empty());

        Ok(())
    }
}
