//! Flat query-string building for list endpoints.

use url::form_urlencoded;

/// A single query parameter value.
///
/// Lists and absent values are never serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Str(String),
    Int(i64),
    Bool(bool),
    List(Vec<String>),
    Absent,
}

impl QueryValue {
    fn render(&self) -> Option<String> {
        match self {
            QueryValue::Str(s) => Some(s.clone()),
            QueryValue::Int(n) => Some(n.to_string()),
            QueryValue::Bool(b) => Some(b.to_string()),
            QueryValue::List(_) | QueryValue::Absent => None,
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Str(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Str(value)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        QueryValue::Int(value)
    }
}

impl From<u32> for QueryValue {
    fn from(value: u32) -> Self {
        QueryValue::Int(i64::from(value))
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        QueryValue::Bool(value)
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(value: Vec<String>) -> Self {
        QueryValue::List(value)
    }
}

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(QueryValue::Absent)
    }
}

/// Ordered key-value parameters; setting a key twice replaces the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, QueryValue)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<QueryValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<QueryValue>) {
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.pairs.push((key.to_string(), value)),
        }
    }

    /// Encode as `a=1&b=two`, without a leading `?`
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.pairs {
            if let Some(rendered) = value.render() {
                serializer.append_pair(key, &rendered);
            }
        }
        serializer.finish()
    }

    /// Append the encoded parameters to `path`, if there are any
    pub fn apply(&self, path: &str) -> String {
        let query = self.to_query_string();
        if query.is_empty() {
            path.to_string()
        } else {
            format!("{}?{}", path, query)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_and_list_values_omitted() {
        let params = QueryParams::new()
            .with("severity", "high")
            .with("status", None::<String>)
            .with("tags", vec!["a".to_string(), "b".to_string()])
            .with("page", 2u32)
            .with("acknowledged", false);
        assert_eq!(params.to_query_string(), "severity=high&page=2&acknowledged=false");
    }

    #[test]
    fn test_replace_and_encode() {
        let mut params = QueryParams::new().with("q", "a b&c");
        params.insert("q", "x y");
        assert_eq!(params.to_query_string(), "q=x+y");
    }

    #[test]
    fn test_apply() {
        assert_eq!(QueryParams::new().apply("/alerts/"), "/alerts/");
        assert_eq!(
            QueryParams::new().with("status", None::<&str>).apply("/alerts/"),
            "/alerts/"
        );
        assert_eq!(
            QueryParams::new().with("per_page", 10i64).apply("/alerts/"),
            "/alerts/?per_page=10"
        );
    }
}
