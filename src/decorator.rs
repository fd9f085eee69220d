//! Fluent accumulator for the clause suffix of a statement.
//!
//! A [`Decorator`] collects `WHERE`, `GROUP BY`, `ORDER BY` and `LIMIT`
//! fragments in call order together with the positional parameters they
//! bind. It is consumed by exactly one statement operation:
//!
//! ```rust
//! use db_engine::prelude::*;
//!
//! let deco = Decorator::new()
//!     .where_clause("id = ? AND name = ?", [RowValues::Int(1), "bob".into()])
//!     .order_by("id", false)
//!     .limit(10, 20);
//! assert_eq!(deco.text(), " WHERE id = ? AND name = ?  ORDER BY id DESC  LIMIT 10, 20");
//! assert_eq!(deco.params().len(), 2);
//! ```

use crate::types::{Dialect, RowValues};

#[derive(Debug, Clone, PartialEq)]
enum Clause {
    Where(String),
    GroupBy(String),
    OrderBy { column: String, ascending: bool },
    Limit { count: u64, offset: u64 },
}

/// Ordered clause list plus the parameters bound by those clauses.
///
/// The Nth placeholder of the rendered text binds to the Nth entry of
/// [`Decorator::params`]. Builder methods take `self` by value, so one
/// decorator cannot be shared between statements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decorator {
    clauses: Vec<Clause>,
    params: Vec<RowValues>,
}

impl Decorator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `WHERE <cond>`. `cond` is not validated; use `?` placeholders
    /// and pass one parameter per placeholder.
    #[must_use]
    pub fn where_clause<I>(mut self, cond: &str, params: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<RowValues>,
    {
        self.clauses.push(Clause::Where(cond.to_string()));
        self.params.extend(params.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn group_by(mut self, column: &str) -> Self {
        self.clauses.push(Clause::GroupBy(column.to_string()));
        self
    }

    #[must_use]
    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.clauses.push(Clause::OrderBy {
            column: column.to_string(),
            ascending,
        });
        self
    }

    /// Append `LIMIT count` or, when `offset > 0`, the two-argument
    /// `LIMIT count, offset`. Engines read `LIMIT a, b` as "skip `a`, return
    /// `b`"; [`Dialect::Standard`] renders those same rows as `LIMIT b OFFSET a`.
    #[must_use]
    pub fn limit(mut self, count: u64, offset: u64) -> Self {
        self.clauses.push(Clause::Limit { count, offset });
        self
    }

    /// Clause text in the native two-argument `LIMIT` form.
    #[must_use]
    pub fn text(&self) -> String {
        self.render(Dialect::Native)
    }

    /// Clause text for the given dialect.
    #[must_use]
    pub fn render(&self, dialect: Dialect) -> String {
        let mut out = String::new();
        for clause in &self.clauses {
            match clause {
                Clause::Where(cond) => out.push_str(&format!(" WHERE {cond} ")),
                Clause::GroupBy(column) => out.push_str(&format!(" GROUP BY {column} ")),
                Clause::OrderBy { column, ascending } => {
                    let dir = if *ascending { "ASC" } else { "DESC" };
                    out.push_str(&format!(" ORDER BY {column} {dir} "));
                }
                Clause::Limit { count, offset } => {
                    let limit = match (dialect, *offset) {
                        (_, 0) => format!(" LIMIT {count}"),
                        (Dialect::Native, offset) => format!(" LIMIT {count}, {offset}"),
                        (Dialect::Standard, offset) => format!(" LIMIT {offset} OFFSET {count}"),
                    };
                    out.push_str(&limit);
                }
            }
        }
        out
    }

    #[must_use]
    pub fn params(&self) -> &[RowValues] {
        &self.params
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty() && self.params.is_empty()
    }

    /// Consume the decorator, returning the rendered text and its parameters.
    #[must_use]
    pub fn into_parts(self, dialect: Dialect) -> (String, Vec<RowValues>) {
        let text = self.render(dialect);
        (text, self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placeholder_count(text: &str) -> usize {
        text.matches('?').count()
    }

    #[test]
    fn where_then_limit_matches_native_form() {
        let deco = Decorator::new().where_clause("id = ?", [1]).limit(10, 0);
        assert_eq!(deco.text(), " WHERE id = ?  LIMIT 10");
        assert_eq!(deco.params(), &[RowValues::Int(1)]);
    }

    #[test]
    fn order_by_direction() {
        assert_eq!(Decorator::new().order_by("name", true).text(), " ORDER BY name ASC ");
        assert_eq!(Decorator::new().order_by("name", false).text(), " ORDER BY name DESC ");
    }

    #[test]
    fn group_by_has_no_params() {
        let deco = Decorator::new().group_by("kind");
        assert_eq!(deco.text(), " GROUP BY kind ");
        assert!(deco.params().is_empty());
    }

    #[test]
    fn limit_with_offset_per_dialect() {
        let deco = Decorator::new().limit(5, 15);
        assert_eq!(deco.render(Dialect::Native), " LIMIT 5, 15");
        assert_eq!(deco.render(Dialect::Standard), " LIMIT 15 OFFSET 5");
        assert_eq!(Decorator::new().limit(5, 0).render(Dialect::Standard), " LIMIT 5");
    }

    #[test]
    fn placeholders_stay_aligned_across_clauses() {
        let deco = Decorator::new()
            .where_clause("a = ? AND b = ?", [RowValues::Int(1), "two".into()])
            .group_by("a")
            .order_by("b", true)
            .where_clause("c > ?", [3.5])
            .limit(1, 2);
        let text = deco.text();
        assert_eq!(placeholder_count(&text), deco.params().len());
        assert_eq!(
            deco.params(),
            &[
                RowValues::Int(1),
                RowValues::Text("two".into()),
                RowValues::Float(3.5)
            ]
        );
        let first = text.find("a = ?").unwrap();
        let last = text.find("c > ?").unwrap();
        assert!(first < last);
    }

    #[test]
    fn placeholder_count_matches_params_for_clause_orderings() {
        let cases = [
            Decorator::new().where_clause("a = ?", [1]),
            Decorator::new().where_clause("a = ? OR b = ?", [1, 2]).limit(3, 0),
            Decorator::new().group_by("a").where_clause("b IN (?, ?, ?)", [1, 2, 3]),
            Decorator::new()
                .order_by("a", false)
                .limit(10, 5)
                .where_clause("c = ?", ["x"]),
            Decorator::new()
                .where_clause("a > ?", [1])
                .where_clause("b < ?", [2])
                .group_by("c")
                .order_by("d", true),
            Decorator::new().order_by("a", true).group_by("b").limit(1, 1),
            Decorator::new().where_clause("1 = 1", Vec::<RowValues>::new()),
        ];
        for deco in cases {
            for dialect in [Dialect::Native, Dialect::Standard] {
                let text = deco.render(dialect);
                assert_eq!(placeholder_count(&text), deco.params().len(), "{text}");
            }
        }
    }

    #[test]
    fn params_follow_where_call_order() {
        let deco = Decorator::new()
            .limit(2, 0)
            .where_clause("b = ?", ["second"])
            .order_by("a", true)
            .where_clause("a = ?", ["third"]);
        assert_eq!(
            deco.params(),
            &[RowValues::Text("second".into()), RowValues::Text("third".into())]
        );
        let text = deco.text();
        assert!(text.find("b = ?").unwrap() < text.find("a = ?").unwrap());
    }

    #[test]
    fn empty_decorator_renders_nothing() {
        let deco = Decorator::new();
        assert!(deco.is_empty());
        assert_eq!(deco.text(), "");
        let (text, params) = deco.into_parts(Dialect::Standard);
        assert!(text.is_empty());
        assert!(params.is_empty());
    }
}
