//! Query builder shared by all store backends
//!
//! A [`Query`] is a conjunction of filters plus sort keys and an optional range. Backends
//! translate it (REST) or evaluate it directly against rows (in-memory).

use serde_json::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column = value`
    Eq { column: String, value: Value },
    /// `column IN (values)`; the batch-lookup primitive
    In { column: String, values: Vec<Value> },
    /// Case-insensitive substring match on any of `columns`
    Search { columns: Vec<String>, term: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

/// Offset-addressed slice; covers rows `offset..=offset + limit - 1`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub offset: u64,
    pub limit: u64,
}

impl Range {
    /// Inclusive last row index, as used by `range(from, to)` style APIs
    pub fn last(&self) -> u64 {
        (self.offset + self.limit).saturating_sub(1)
    }
}

/// Conflict handling for inserts
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OnConflict {
    /// Duplicates are reported by the backend as an error
    #[default]
    Error,
    /// Skip rows whose values for these columns already exist
    Ignore(Vec<String>),
    /// Overwrite the stored row whose values for these columns match; `id` and
    /// `created_at` of the stored row are kept
    Update(Vec<String>),
}

impl OnConflict {
    pub fn ignore(columns: &[&str]) -> Self {
        OnConflict::Ignore(columns.iter().map(|c| c.to_string()).collect())
    }

    pub fn update(columns: &[&str]) -> Self {
        OnConflict::Update(columns.iter().map(|c| c.to_string()).collect())
    }

    /// Conflict columns, empty for [`OnConflict::Error`]
    pub fn columns(&self) -> &[String] {
        match self {
            OnConflict::Error => &[],
            OnConflict::Ignore(columns) | OnConflict::Update(columns) => columns,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    /// Sort keys, most significant first
    pub order: Vec<Order>,
    pub range: Option<Range>,
}

/// Column names must be plain identifiers; they end up in URLs.
pub fn is_valid_column(column: &str) -> bool {
    let mut chars = column.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq {
            column: column.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn is_in<I, V>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.filters.push(Filter::In {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Substring search across `columns`. A blank term adds no filter.
    pub fn search(mut self, columns: &[&str], term: &str) -> Self {
        let term = term.trim();
        if !term.is_empty() && !columns.is_empty() {
            self.filters.push(Filter::Search {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                term: term.to_string(),
            });
        }
        self
    }

    /// Append a sort key; earlier keys take precedence
    pub fn order(mut self, column: &str, direction: Direction) -> Self {
        self.order.push(Order {
            column: column.to_string(),
            direction,
        });
        self
    }

    pub fn range(mut self, offset: u64, limit: u64) -> Self {
        self.range = Some(Range { offset, limit });
        self
    }

    /// Same filters, no order or range; what a count needs
    pub fn filters_only(&self) -> Self {
        Self {
            filters: self.filters.clone(),
            order: Vec::new(),
            range: None,
        }
    }

    /// Every column referenced by this query
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.filters
            .iter()
            .flat_map(|f| match f {
                Filter::Eq { column, .. } | Filter::In { column, .. } => {
                    vec![column.as_str()]
                }
                Filter::Search { columns, .. } => columns.iter().map(String::as_str).collect(),
            })
            .chain(self.order.iter().map(|o| o.column.as_str()))
    }

    /// First column that is not a plain identifier, if any
    pub fn invalid_column(&self) -> Option<&str> {
        self.columns().find(|c| !is_valid_column(c))
    }

    /// Compare two rows by the sort keys
    pub fn compare_rows(&self, a: &Value, b: &Value) -> Ordering {
        self.order
            .iter()
            .map(|order| {
                let ord = compare_values(a.get(&order.column), b.get(&order.column));
                match order.direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                }
            })
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }

    /// Evaluate the filters against one row
    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|filter| match filter {
            Filter::Eq { column, value } => row
                .get(column)
                .map(|v| values_equal(v, value))
                .unwrap_or(false),
            Filter::In { column, values } => row
                .get(column)
                .map(|v| values.iter().any(|candidate| values_equal(v, candidate)))
                .unwrap_or(false),
            Filter::Search { columns, term } => {
                let needle = term.to_lowercase();
                columns.iter().any(|column| {
                    row.get(column)
                        .and_then(Value::as_str)
                        .map(|hay| hay.to_lowercase().contains(&needle))
                        .unwrap_or(false)
                })
            }
        })
    }
}

/// Equality with text coercion: filter values travel as text over REST, so a number
/// stored in the row equals its string form.
pub fn values_equal(row_value: &Value, filter_value: &Value) -> bool {
    if row_value == filter_value {
        return true;
    }
    match (row_value, filter_value) {
        (Value::String(s), other) | (other, Value::String(s)) => match other {
            Value::Number(n) => n.to_string() == *s,
            Value::Bool(b) => b.to_string() == *s,
            _ => false,
        },
        _ => false,
    }
}

/// Ordering used for `order` evaluation. Nulls sort after every value, which gives
/// Postgres' default `NULLS LAST` ascending and `NULLS FIRST` descending.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => match (a, b) {
            (Value::Number(x), Value::Number(y)) => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
            (Value::String(x), Value::String(y)) => x.cmp(y),
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            (x, y) => x.to_string().cmp(&y.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_search_adds_no_filter() {
        let query = Query::new().search(&["full_name"], "   ");
        assert!(query.filters.is_empty());
        assert_eq!(query, Query::new());
    }

    #[test]
    fn matches_combines_filters() {
        let row = json!({"client_id": "c1", "full_name": "Ada Lovelace", "age": 36});
        assert!(Query::new().eq("client_id", "c1").matches(&row));
        assert!(!Query::new().eq("client_id", "c2").matches(&row));
        assert!(Query::new().eq("age", "36").matches(&row));
        assert!(Query::new()
            .eq("client_id", "c1")
            .search(&["employee_id", "full_name"], "LOVE")
            .matches(&row));
        assert!(!Query::new().is_in("client_id", Vec::<String>::new()).matches(&row));
        assert!(Query::new().is_in("client_id", ["c0", "c1"]).matches(&row));
    }

    #[test]
    fn nulls_sort_last_ascending() {
        let a = json!("2024-01-01");
        assert_eq!(compare_values(Some(&a), None), Ordering::Less);
        assert_eq!(
            compare_values(Some(&Value::Null), Some(&a)),
            Ordering::Greater
        );
        assert_eq!(
            compare_values(Some(&json!(2)), Some(&json!(10))),
            Ordering::Less
        );
    }

    #[test]
    fn validates_columns() {
        assert!(is_valid_column("employment_status"));
        assert!(!is_valid_column("Name"));
        assert!(!is_valid_column("name;drop"));
        assert!(!is_valid_column(""));
        let query = Query::new().eq("department", "x").order("created at", Direction::Desc);
        assert_eq!(query.invalid_column(), Some("created at"));
    }

    #[test]
    fn later_sort_keys_break_ties() {
        let query = Query::new()
            .order("created_at", Direction::Desc)
            .order("employee_id", Direction::Asc);
        let a = json!({"created_at": "2024-01-01", "employee_id": "A-1"});
        let b = json!({"created_at": "2024-01-01", "employee_id": "A-2"});
        let c = json!({"created_at": "2024-02-01", "employee_id": "A-0"});
        assert_eq!(query.compare_rows(&a, &b), Ordering::Less);
        assert_eq!(query.compare_rows(&c, &a), Ordering::Less);
    }

    #[test]
    fn range_last_is_inclusive() {
        assert_eq!(Range { offset: 25, limit: 25 }.last(), 49);
        assert_eq!(Range { offset: 0, limit: 0 }.last(), 0);
    }
}
