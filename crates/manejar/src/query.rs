//! Query-string builders for page addresses.
//!
//! A [`QueryParams`] is an order-preserving list of name/value pairs rendered
//! as an `application/x-www-form-urlencoded` query string (spaces become
//! `+`). Built standalone and handed to
//! [`BrowserHarness::open_with`](crate::BrowserHarness::open_with) alongside
//! any positional URL format args.

use std::fmt;

use url::form_urlencoded;

/// Order-preserving query-string builder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Start a query string with one pair
    #[must_use]
    pub fn query(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::default().and(name, value)
    }

    /// Append a pair
    #[must_use]
    pub fn and(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.pairs.push((name.into(), value.into()));
        self
    }

    /// Append every pair of another builder, in its order
    #[must_use]
    pub fn and_params(mut self, other: Self) -> Self {
        self.pairs.extend(other.pairs);
        self
    }

    /// Whether no pairs have been added
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (name, value) in &self.pairs {
            serializer.append_pair(name, value);
        }
        f.write_str(&serializer.finish())
    }
}
