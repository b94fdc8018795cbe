//! RSQL query parameters and filter expressions.
//!
//! The Jamf Pro API accepts a small, fixed set of query parameters
//! (`filter`, `sort`, `page`, `page-size`); [`RsqlQuery`] enforces that set
//! so typos surface as configuration errors instead of silently ignored
//! parameters. [`RsqlFilter`] builds the `filter` expression itself.

use std::collections::BTreeMap;

use crate::errors::{JamfError, Result};

/// Recognized query-parameter keys.
pub const KEY_FILTER: &str = "filter";
/// Sort key, e.g. `name:asc`.
pub const KEY_SORT: &str = "sort";
/// Zero-based page index.
pub const KEY_PAGE: &str = "page";
/// Page size.
pub const KEY_PAGE_SIZE: &str = "page-size";

const KNOWN_KEYS: [&str; 4] = [KEY_FILTER, KEY_SORT, KEY_PAGE, KEY_PAGE_SIZE];

/// Validated query-parameter map for RSQL-capable endpoints.
#[derive(Debug, Default, Clone)]
pub struct RsqlQuery {
    params: BTreeMap<String, String>,
}

impl RsqlQuery {
    /// An empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `filter` expression (usually from [`RsqlFilter::build`]).
    #[must_use]
    pub fn filter(mut self, expression: impl Into<String>) -> Self {
        self.params.insert(KEY_FILTER.into(), expression.into());
        self
    }

    /// Set the `sort` specification, e.g. `"name:asc"`.
    #[must_use]
    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.params.insert(KEY_SORT.into(), sort.into());
        self
    }

    /// Set the zero-based page index.
    #[must_use]
    pub fn page(mut self, page: u32) -> Self {
        self.params.insert(KEY_PAGE.into(), page.to_string());
        self
    }

    /// Set the page size.
    #[must_use]
    pub fn page_size(mut self, size: u32) -> Self {
        self.params.insert(KEY_PAGE_SIZE.into(), size.to_string());
        self
    }

    /// Insert a raw key/value pair, rejecting keys the API does not accept.
    pub fn try_insert(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        if !KNOWN_KEYS.contains(&key) {
            return Err(JamfError::Config(format!(
                "unsupported query parameter '{key}' (expected one of: {})",
                KNOWN_KEYS.join(", ")
            )));
        }
        self.params.insert(key.to_owned(), value.into());
        Ok(())
    }

    /// Look up a parameter value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// True when no parameters are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterate parameters in deterministic (sorted) order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Fluent builder for RSQL filter expressions.
///
/// ```
/// use jamfpro_domain::RsqlFilter;
///
/// let filter = RsqlFilter::new()
///     .equal_to("general.name", "MacBook Pro")
///     .and()
///     .is_in("general.siteId", &["1", "2"])
///     .build();
/// assert_eq!(filter, r#"general.name=="MacBook Pro";general.siteId=in=("1","2")"#);
/// ```
#[derive(Debug, Default, Clone)]
pub struct RsqlFilter {
    expr: String,
}

impl RsqlFilter {
    /// An empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `field=="value"`
    #[must_use]
    pub fn equal_to(self, field: &str, value: &str) -> Self {
        self.comparison(field, "==", quote(value))
    }

    /// `field!="value"`
    #[must_use]
    pub fn not_equal_to(self, field: &str, value: &str) -> Self {
        self.comparison(field, "!=", quote(value))
    }

    /// `field=lt="value"`
    #[must_use]
    pub fn less_than(self, field: &str, value: &str) -> Self {
        self.comparison(field, "=lt=", quote(value))
    }

    /// `field=le="value"`
    #[must_use]
    pub fn less_than_or_equal(self, field: &str, value: &str) -> Self {
        self.comparison(field, "=le=", quote(value))
    }

    /// `field=gt="value"`
    #[must_use]
    pub fn greater_than(self, field: &str, value: &str) -> Self {
        self.comparison(field, "=gt=", quote(value))
    }

    /// `field=ge="value"`
    #[must_use]
    pub fn greater_than_or_equal(self, field: &str, value: &str) -> Self {
        self.comparison(field, "=ge=", quote(value))
    }

    /// `field=in=("a","b")`
    #[must_use]
    pub fn is_in(self, field: &str, values: &[&str]) -> Self {
        let list = values.iter().map(|v| quote(v)).collect::<Vec<_>>().join(",");
        self.comparison(field, "=in=", format!("({list})"))
    }

    /// `field=out=("a","b")`
    #[must_use]
    pub fn not_in(self, field: &str, values: &[&str]) -> Self {
        let list = values.iter().map(|v| quote(v)).collect::<Vec<_>>().join(",");
        self.comparison(field, "=out=", format!("({list})"))
    }

    /// `field=="*value*"`; literal wildcards in `value` are escaped.
    #[must_use]
    pub fn contains(self, field: &str, value: &str) -> Self {
        let escaped = escape_literal_wildcards(value);
        self.comparison(field, "==", format!("\"*{escaped}*\""))
    }

    /// `field=="value*"`; literal wildcards in `value` are escaped.
    #[must_use]
    pub fn starts_with(self, field: &str, value: &str) -> Self {
        let escaped = escape_literal_wildcards(value);
        self.comparison(field, "==", format!("\"{escaped}*\""))
    }

    /// `field=="*value"`; literal wildcards in `value` are escaped.
    #[must_use]
    pub fn ends_with(self, field: &str, value: &str) -> Self {
        let escaped = escape_literal_wildcards(value);
        self.comparison(field, "==", format!("\"*{escaped}\""))
    }

    /// Logical AND (`;`).
    #[must_use]
    pub fn and(mut self) -> Self {
        self.expr.push(';');
        self
    }

    /// Logical OR (`,`).
    #[must_use]
    pub fn or(mut self) -> Self {
        self.expr.push(',');
        self
    }

    /// Open a grouping parenthesis.
    #[must_use]
    pub fn open_group(mut self) -> Self {
        self.expr.push('(');
        self
    }

    /// Close a grouping parenthesis.
    #[must_use]
    pub fn close_group(mut self) -> Self {
        self.expr.push(')');
        self
    }

    /// True when nothing has been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expr.is_empty()
    }

    /// Finish and return the expression string.
    #[must_use]
    pub fn build(self) -> String {
        self.expr
    }

    fn comparison(mut self, field: &str, op: &str, rhs: String) -> Self {
        self.expr.push_str(field);
        self.expr.push_str(op);
        self.expr.push_str(&rhs);
        self
    }
}

/// Quote a value, escaping embedded quotes. Wildcards pass through, so
/// callers of the equality operators can match patterns deliberately.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        if ch == '"' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

/// Escape characters that would otherwise act as RSQL pattern syntax, for
/// the substring operators where the value is literal text.
fn escape_literal_wildcards(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' | '*' | '"' => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_accepts_known_keys_only() {
        let mut query = RsqlQuery::new();
        query.try_insert("filter", "name==\"x\"").unwrap();
        query.try_insert("page-size", "50").unwrap();

        let err = query.try_insert("pageSize", "50").unwrap_err();
        assert!(matches!(err, JamfError::Config(msg) if msg.contains("pageSize")));
    }

    #[test]
    fn query_builders_set_expected_keys() {
        let query = RsqlQuery::new().filter("id==\"1\"").sort("name:asc").page(2).page_size(25);
        assert_eq!(query.get("filter"), Some("id==\"1\""));
        assert_eq!(query.get("sort"), Some("name:asc"));
        assert_eq!(query.get("page"), Some("2"));
        assert_eq!(query.get("page-size"), Some("25"));
        assert!(!query.is_empty());
    }

    #[test]
    fn comparison_operators() {
        assert_eq!(RsqlFilter::new().equal_to("name", "mac").build(), r#"name=="mac""#);
        assert_eq!(RsqlFilter::new().not_equal_to("name", "mac").build(), r#"name!="mac""#);
        assert_eq!(RsqlFilter::new().less_than("osVersion", "14").build(), r#"osVersion=lt="14""#);
        assert_eq!(
            RsqlFilter::new().greater_than_or_equal("osVersion", "13").build(),
            r#"osVersion=ge="13""#
        );
    }

    #[test]
    fn set_operators() {
        assert_eq!(
            RsqlFilter::new().is_in("siteId", &["1", "2", "3"]).build(),
            r#"siteId=in=("1","2","3")"#
        );
        assert_eq!(RsqlFilter::new().not_in("siteId", &["-1"]).build(), r#"siteId=out=("-1")"#);
    }

    #[test]
    fn substring_operators_escape_literal_wildcards() {
        assert_eq!(RsqlFilter::new().contains("name", "lab").build(), r#"name=="*lab*""#);
        assert_eq!(RsqlFilter::new().contains("name", "a*b").build(), r#"name=="*a\*b*""#);
        assert_eq!(RsqlFilter::new().starts_with("name", "mac").build(), r#"name=="mac*""#);
        assert_eq!(RsqlFilter::new().ends_with("name", "pro").build(), r#"name=="*pro""#);
    }

    #[test]
    fn equality_preserves_deliberate_wildcards() {
        // Callers of equal_to may pattern-match on purpose.
        assert_eq!(RsqlFilter::new().equal_to("name", "mac*").build(), r#"name=="mac*""#);
    }

    #[test]
    fn quotes_inside_values_are_escaped() {
        assert_eq!(
            RsqlFilter::new().equal_to("name", r#"the "one""#).build(),
            r#"name=="the \"one\"""#
        );
    }

    #[test]
    fn connectors_and_groups() {
        let expr = RsqlFilter::new()
            .open_group()
            .equal_to("a", "1")
            .or()
            .equal_to("b", "2")
            .close_group()
            .and()
            .not_equal_to("c", "3")
            .build();
        assert_eq!(expr, r#"(a=="1",b=="2");c!="3""#);
    }

    #[test]
    fn empty_filter_builds_empty_string() {
        let filter = RsqlFilter::new();
        assert!(filter.is_empty());
        assert_eq!(filter.build(), "");
    }
}
