//! Row filters, and the algebra for combining them.

use std::{collections::BTreeMap, fmt, str::FromStr};

use super::Error;

/// A mapping from column (or selector) name to filter string, serialized as
/// query parameters.
pub type Parameters = BTreeMap<String, String>;

macro_rules! operators {
    ($($name:literal => $variant:ident),* $(,)?) => {
        /// A comparison operator understood by the server.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Operator {
            $(
                #[doc = $name]
                $variant,
            )*
        }

        impl Operator {
            /// Every supported operator.
            pub const ALL: &'static [Operator] = &[$(Operator::$variant,)*];

            /// The operator as it appears on the wire.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Operator::$variant => $name,)*
                }
            }
        }

        impl FromStr for Operator {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(match s {
                    $($name => Operator::$variant,)*
                    _ => return Err(Error::UnsupportedOperator(s.to_string())),
                })
            }
        }
    };
}

operators! {
    "eq" => Eq,
    "gt" => Gt,
    "gte" => Gte,
    "lt" => Lt,
    "lte" => Lte,
    "neq" => Neq,
    "in" => In,
    "is" => Is,
    "fts" => Fts,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A filter over the rows of a table.
///
/// Structured filters can be merged together. Raw filters carry a fragment
/// of query syntax that is sent as-is, and can't be merged with anything.
///
/// ```
/// use supatable::{Filter, Operator};
///
/// # fn main() -> Result<(), supatable::Error> {
/// let adults = Filter::new("age", "gte", "18")?;
/// let named = Filter::with("name", Operator::Eq, "John");
///
/// let both = adults.merge(named)?;
/// assert_eq!(both.parameters().unwrap().len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Column predicates, keyed by column name.
    Columns(Parameters),
    /// An opaque fragment of query syntax.
    Raw(String),
}

impl Filter {
    /// Build a filter from a column, an operator name and an operand. Fails
    /// if the operator isn't supported.
    pub fn new(
        column: impl Into<String>,
        operator: &str,
        operand: impl fmt::Display,
    ) -> Result<Self, Error> {
        let operator = operator.parse()?;
        Ok(Self::with(column, operator, operand))
    }

    /// Build a filter from a column, an operator and an operand.
    pub fn with(column: impl Into<String>, operator: Operator, operand: impl fmt::Display) -> Self {
        let mut params = Parameters::new();
        params.insert(column.into(), format!("{operator}.{operand}"));
        Filter::Columns(params)
    }

    /// Build a filter from a column and an already-assembled value, like
    /// `gte.18`. The value must have the form `operator.operand`.
    pub fn pair(column: impl Into<String>, value: impl Into<String>) -> Result<Self, Error> {
        let value = value.into();
        let Some((operator, _)) = value.split_once('.') else {
            return Err(Error::InvalidQuery(format!(
                "expected operator.operand: {value}"
            )));
        };
        Operator::from_str(operator)?;

        let mut params = Parameters::new();
        params.insert(column.into(), value);
        Ok(Filter::Columns(params))
    }

    /// Build a raw filter. The fragment is sent verbatim in the query string,
    /// for syntax the structured form can't express, like
    /// `body=fts(english).cat`.
    pub fn raw(fragment: impl Into<String>) -> Self {
        Filter::Raw(fragment.into())
    }

    /// Whether this is a raw filter.
    pub fn is_raw(&self) -> bool {
        matches!(self, Filter::Raw(_))
    }

    /// The column predicates, or `None` for a raw filter.
    pub fn parameters(&self) -> Option<&Parameters> {
        match self {
            Filter::Columns(params) => Some(params),
            Filter::Raw(_) => None,
        }
    }

    /// Combine two filters. Where both constrain the same column, `other`
    /// wins.
    pub fn merge(self, other: Filter) -> Result<Self, Error> {
        match (self, other) {
            (Filter::Columns(mut params), Filter::Columns(other)) => {
                params.extend(other);
                Ok(Filter::Columns(params))
            }
            _ => Err(Error::RawMerge),
        }
    }

    /// Merge a sequence of filters, left to right. Returns `None` for an empty
    /// sequence. A single filter is returned as-is, even if it is raw.
    pub fn merge_all(filters: impl IntoIterator<Item = Filter>) -> Result<Option<Self>, Error> {
        let mut iter = filters.into_iter();
        let Some(first) = iter.next() else {
            return Ok(None);
        };

        iter.try_fold(first, Filter::merge).map(Some)
    }
}

impl FromStr for Filter {
    type Err = Error;

    /// Parse a `column=value` string, splitting on the first `=`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((column, value)) = s.split_once('=') else {
            return Err(Error::InvalidQuery(format!(
                "expected column=operator.value: {s}"
            )));
        };

        Filter::pair(column, value)
    }
}

impl From<Filter> for Vec<Filter> {
    fn from(filter: Filter) -> Self {
        vec![filter]
    }
}
