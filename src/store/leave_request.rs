use chrono::{NaiveDate, NaiveDateTime};
use sqlx::{FromRow, MySqlConnection, MySqlPool};
use tracing::debug;

use crate::error::{HrError, HrResult};
use crate::model::leave_request::LeaveRequest;
use crate::store::{LeaveQuery, LeaveSearch, LeaveStore, Page};
use crate::utils::db_utils::{Conditions, SqlValue, bind_as, bind_scalar, lock_employee};

const COLUMNS: &str = "l.id, l.employee_id, l.leave_type, l.start_date, l.end_date, \
    l.number_of_days, l.reason, l.status, l.approved_by, l.approved_at, l.comments, \
    l.created_at, l.updated_at";

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    employee_id: u64,
    leave_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    number_of_days: u32,
    reason: Option<String>,
    status: String,
    approved_by: Option<u64>,
    approved_at: Option<NaiveDateTime>,
    comments: Option<String>,
    created_at: NaiveDateTime,
    updated_at: Option<NaiveDateTime>,
}

impl TryFrom<LeaveRow> for LeaveRequest {
    type Error = HrError;

    fn try_from(row: LeaveRow) -> HrResult<Self> {
        let leave_type = row.leave_type.parse().map_err(|_| {
            HrError::Internal(format!(
                "leave {} has unknown type {:?}",
                row.id, row.leave_type
            ))
        })?;
        let status = row.status.parse().map_err(|_| {
            HrError::Internal(format!(
                "leave {} has unknown status {:?}",
                row.id, row.status
            ))
        })?;

        Ok(LeaveRequest {
            id: row.id,
            employee_id: row.employee_id,
            leave_type,
            start_date: row.start_date,
            end_date: row.end_date,
            number_of_days: row.number_of_days,
            reason: row.reason,
            status,
            approved_by: row.approved_by,
            approved_at: row.approved_at,
            comments: row.comments,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn conditions(query: &LeaveQuery) -> Conditions {
    let mut c = Conditions::new();
    if let Some(ids) = &query.employee_ids {
        c.push_in("l.employee_id", ids);
    }
    if let Some(status) = query.status {
        c.push("l.status = ?", [SqlValue::Str(status.to_string())]);
    }
    if let Some(range) = query.within {
        c.push(
            "l.start_date >= ? AND l.end_date <= ?",
            [SqlValue::Date(range.start), SqlValue::Date(range.end)],
        );
    }
    c
}

fn search_conditions(search: &LeaveSearch) -> Conditions {
    let mut c = Conditions::new();
    if let Some(employee_id) = search.employee_id {
        c.push("l.employee_id = ?", [SqlValue::U64(employee_id)]);
    }
    if let Some(status) = search.status {
        c.push("l.status = ?", [SqlValue::Str(status.to_string())]);
    }
    c
}

async fn employee_leaves(
    conn: &mut MySqlConnection,
    employee_id: u64,
) -> HrResult<Vec<LeaveRequest>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM leaves l WHERE l.employee_id = ? ORDER BY l.start_date, l.id FOR UPDATE"
    );
    let rows = sqlx::query_as::<_, LeaveRow>(&sql)
        .bind(employee_id)
        .fetch_all(&mut *conn)
        .await?;
    rows.into_iter().map(LeaveRequest::try_from).collect()
}

#[derive(Clone)]
pub struct MySqlLeaveStore {
    pool: MySqlPool,
}

impl MySqlLeaveStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

impl LeaveStore for MySqlLeaveStore {
    async fn get(&self, id: u64) -> HrResult<Option<LeaveRequest>> {
        let sql = format!("SELECT {COLUMNS} FROM leaves l WHERE l.id = ?");
        sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(LeaveRequest::try_from)
            .transpose()
    }

    async fn list(&self, query: &LeaveQuery) -> HrResult<Vec<LeaveRequest>> {
        if query.selects_nothing() {
            return Ok(Vec::new());
        }

        let c = conditions(query);
        let sql = format!(
            "SELECT {COLUMNS} FROM leaves l{} ORDER BY l.start_date, l.id",
            c.where_sql()
        );
        debug!(sql = %sql, bindings = ?c.values(), "Listing leave");

        let rows = bind_as(sqlx::query_as::<_, LeaveRow>(&sql), c.values())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(LeaveRequest::try_from).collect()
    }

    async fn count(&self, query: &LeaveQuery) -> HrResult<i64> {
        if query.selects_nothing() {
            return Ok(0);
        }

        let c = conditions(query);
        let sql = format!("SELECT COUNT(*) FROM leaves l{}", c.where_sql());
        let total = bind_scalar(sqlx::query_scalar::<_, i64>(&sql), c.values())
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn search(&self, search: &LeaveSearch) -> HrResult<Page<LeaveRequest>> {
        let (page, per_page, offset) = search.window();
        let c = search_conditions(search);

        // -------------------------
        // COUNT query
        // -------------------------
        let count_sql = format!("SELECT COUNT(*) FROM leaves l{}", c.where_sql());
        let total = bind_scalar(sqlx::query_scalar::<_, i64>(&count_sql), c.values())
            .fetch_one(&self.pool)
            .await?;

        // -------------------------
        // DATA query
        // -------------------------
        let data_sql = format!(
            r#"
            SELECT {COLUMNS}
            FROM leaves l
            {}
            ORDER BY l.created_at DESC, l.id DESC
            LIMIT ? OFFSET ?
            "#,
            c.where_sql()
        );
        debug!(sql = %data_sql, bindings = ?c.values(), page, per_page, "Searching leave");

        let rows = bind_as(sqlx::query_as::<_, LeaveRow>(&data_sql), c.values())
            .bind(per_page)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        let data = rows
            .into_iter()
            .map(LeaveRequest::try_from)
            .collect::<HrResult<Vec<_>>>()?;

        Ok(Page {
            data,
            page,
            per_page,
            total,
        })
    }

    async fn insert_for_employee<F>(&self, employee_id: u64, build: F) -> HrResult<LeaveRequest>
    where
        F: FnOnce(&[LeaveRequest]) -> HrResult<LeaveRequest>,
    {
        let mut tx = self.pool.begin().await?;

        if !lock_employee(&mut *tx, employee_id).await? {
            return Err(HrError::not_found("Employee", employee_id));
        }
        let existing = employee_leaves(&mut *tx, employee_id).await?;

        let mut leave = build(&existing)?;

        let result = sqlx::query(
            r#"
            INSERT INTO leaves
                (employee_id, leave_type, start_date, end_date, number_of_days, reason,
                 status, approved_by, approved_at, comments, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(leave.employee_id)
        .bind(leave.leave_type.to_string())
        .bind(leave.start_date)
        .bind(leave.end_date)
        .bind(leave.number_of_days)
        .bind(leave.reason.as_deref())
        .bind(leave.status.to_string())
        .bind(leave.approved_by)
        .bind(leave.approved_at)
        .bind(leave.comments.as_deref())
        .bind(leave.created_at)
        .bind(leave.updated_at)
        .execute(&mut *tx)
        .await?;
        leave.id = result.last_insert_id();

        tx.commit().await?;
        Ok(leave)
    }

    async fn modify<F>(&self, id: u64, apply: F) -> HrResult<LeaveRequest>
    where
        F: FnOnce(&mut LeaveRequest, &[LeaveRequest]) -> HrResult<()>,
    {
        // owner first so the lock order is always employee, then leave
        let employee_id = sqlx::query_scalar::<_, u64>("SELECT employee_id FROM leaves WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| HrError::not_found("Leave", id))?;

        let mut tx = self.pool.begin().await?;
        lock_employee(&mut *tx, employee_id).await?;

        let siblings = employee_leaves(&mut *tx, employee_id).await?;
        let mut leave = siblings
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .ok_or_else(|| HrError::not_found("Leave", id))?;

        apply(&mut leave, &siblings)?;

        sqlx::query(
            r#"
            UPDATE leaves
            SET leave_type = ?, start_date = ?, end_date = ?, number_of_days = ?,
                reason = ?, status = ?, approved_by = ?, approved_at = ?,
                comments = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(leave.leave_type.to_string())
        .bind(leave.start_date)
        .bind(leave.end_date)
        .bind(leave.number_of_days)
        .bind(leave.reason.as_deref())
        .bind(leave.status.to_string())
        .bind(leave.approved_by)
        .bind(leave.approved_at)
        .bind(leave.comments.as_deref())
        .bind(leave.updated_at)
        .bind(leave.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(leave)
    }

    async fn delete(&self, id: u64) -> HrResult<bool> {
        let result = sqlx::query("DELETE FROM leaves WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
