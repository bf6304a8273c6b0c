use chrono::NaiveDate;
use sqlx::mysql::MySqlArguments;
use sqlx::{MySql, MySqlConnection};
use sqlx::query::{QueryAs, QueryScalar};

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    U64(u64),
    Str(String),
    Date(NaiveDate),
}

/// ===============================
/// Dynamic WHERE clause
/// ===============================
#[derive(Debug, Default)]
pub struct Conditions {
    clauses: Vec<String>,
    values: Vec<SqlValue>,
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, clause: &str, values: impl IntoIterator<Item = SqlValue>) {
        self.clauses.push(clause.to_string());
        self.values.extend(values);
    }

    /// `column IN (?, ?, ...)`; callers skip the query when `ids` is empty.
    pub fn push_in(&mut self, column: &str, ids: &[u64]) {
        let marks = vec!["?"; ids.len()].join(", ");
        self.push(
            &format!("{column} IN ({marks})"),
            ids.iter().map(|id| SqlValue::U64(*id)),
        );
    }

    /// Empty string or ` WHERE a AND b`.
    pub fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }
}

/// ===============================
/// Bind helpers
/// ===============================
pub fn bind_as<'q, O>(
    mut query: QueryAs<'q, MySql, O, MySqlArguments>,
    values: &[SqlValue],
) -> QueryAs<'q, MySql, O, MySqlArguments> {
    for value in values {
        query = match value {
            SqlValue::U64(v) => query.bind(*v),
            SqlValue::Str(v) => query.bind(v.clone()),
            SqlValue::Date(v) => query.bind(*v),
        };
    }
    query
}

pub fn bind_scalar<'q, O>(
    mut query: QueryScalar<'q, MySql, O, MySqlArguments>,
    values: &[SqlValue],
) -> QueryScalar<'q, MySql, O, MySqlArguments> {
    for value in values {
        query = match value {
            SqlValue::U64(v) => query.bind(*v),
            SqlValue::Str(v) => query.bind(v.clone()),
            SqlValue::Date(v) => query.bind(*v),
        };
    }
    query
}

/// Serializes writes per employee inside a transaction. Returns false when the
/// employee row is missing.
pub async fn lock_employee(
    conn: &mut MySqlConnection,
    employee_id: u64,
) -> Result<bool, sqlx::Error> {
    let locked = sqlx::query_scalar::<_, u64>("SELECT id FROM employees WHERE id = ? FOR UPDATE")
        .bind(employee_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(locked.is_some())
}
