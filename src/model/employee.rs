use serde::Serialize;

/// Directory entry for an employee. Only what the workflows need to scope queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct EmployeeRef {
    pub id: u64,
    pub department_id: Option<u64>,
}
