use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::{FromRow, MySqlConnection, MySqlPool};
use tracing::debug;

use crate::error::{HrError, HrResult, is_duplicate_key};
use crate::model::attendance::Attendance;
use crate::store::{AttendanceQuery, AttendanceStore};
use crate::utils::db_utils::{Conditions, SqlValue, bind_as, bind_scalar, lock_employee};

const COLUMNS: &str = "a.id, a.employee_id, a.date, a.check_in_time, a.check_out_time, \
    a.break_start_time, a.break_end_time, a.work_hours, a.status, a.notes, \
    a.ip_address, a.location, a.created_at, a.updated_at";

#[derive(FromRow)]
struct AttendanceRow {
    id: u64,
    employee_id: u64,
    date: NaiveDate,
    check_in_time: Option<NaiveTime>,
    check_out_time: Option<NaiveTime>,
    break_start_time: Option<NaiveTime>,
    break_end_time: Option<NaiveTime>,
    work_hours: f64,
    status: String,
    notes: Option<String>,
    ip_address: Option<String>,
    location: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl TryFrom<AttendanceRow> for Attendance {
    type Error = HrError;

    fn try_from(row: AttendanceRow) -> HrResult<Self> {
        let status = row.status.parse().map_err(|_| {
            HrError::Internal(format!(
                "attendance {} has unknown status {:?}",
                row.id, row.status
            ))
        })?;

        Ok(Attendance {
            id: row.id,
            employee_id: row.employee_id,
            date: row.date,
            check_in_time: row.check_in_time,
            check_out_time: row.check_out_time,
            break_start_time: row.break_start_time,
            break_end_time: row.break_end_time,
            work_hours: row.work_hours,
            status,
            notes: row.notes,
            ip_address: row.ip_address,
            location: row.location,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn conditions(query: &AttendanceQuery) -> Conditions {
    let mut c = Conditions::new();
    if let Some(ids) = &query.employee_ids {
        c.push_in("a.employee_id", ids);
    }
    if let Some(status) = query.status {
        c.push("a.status = ?", [SqlValue::Str(status.to_string())]);
    }
    if let Some(range) = query.range {
        c.push(
            "a.date BETWEEN ? AND ?",
            [SqlValue::Date(range.start), SqlValue::Date(range.end)],
        );
    }
    c
}

async fn insert_row(conn: &mut MySqlConnection, r: &Attendance) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO attendances
            (employee_id, date, check_in_time, check_out_time, break_start_time,
             break_end_time, work_hours, status, notes, ip_address, location,
             created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(r.employee_id)
    .bind(r.date)
    .bind(r.check_in_time)
    .bind(r.check_out_time)
    .bind(r.break_start_time)
    .bind(r.break_end_time)
    .bind(r.work_hours)
    .bind(r.status.to_string())
    .bind(r.notes.as_deref())
    .bind(r.ip_address.as_deref())
    .bind(r.location.as_deref())
    .bind(r.created_at)
    .bind(r.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_id())
}

async fn update_row(conn: &mut MySqlConnection, r: &Attendance) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE attendances
        SET check_in_time = ?, check_out_time = ?, break_start_time = ?,
            break_end_time = ?, work_hours = ?, status = ?, notes = ?,
            ip_address = ?, location = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(r.check_in_time)
    .bind(r.check_out_time)
    .bind(r.break_start_time)
    .bind(r.break_end_time)
    .bind(r.work_hours)
    .bind(r.status.to_string())
    .bind(r.notes.as_deref())
    .bind(r.ip_address.as_deref())
    .bind(r.location.as_deref())
    .bind(r.updated_at)
    .bind(r.id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

#[derive(Clone)]
pub struct MySqlAttendanceStore {
    pool: MySqlPool,
}

impl MySqlAttendanceStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

impl AttendanceStore for MySqlAttendanceStore {
    async fn get(&self, id: u64) -> HrResult<Option<Attendance>> {
        let sql = format!("SELECT {COLUMNS} FROM attendances a WHERE a.id = ?");
        sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Attendance::try_from)
            .transpose()
    }

    async fn get_for_day(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> HrResult<Option<Attendance>> {
        let sql = format!("SELECT {COLUMNS} FROM attendances a WHERE a.employee_id = ? AND a.date = ?");
        sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(employee_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?
            .map(Attendance::try_from)
            .transpose()
    }

    async fn list(&self, query: &AttendanceQuery) -> HrResult<Vec<Attendance>> {
        if query.selects_nothing() {
            return Ok(Vec::new());
        }

        let c = conditions(query);
        let sql = format!(
            "SELECT {COLUMNS} FROM attendances a{} ORDER BY a.date, a.employee_id",
            c.where_sql()
        );
        debug!(sql = %sql, bindings = ?c.values(), "Listing attendance");

        let rows = bind_as(sqlx::query_as::<_, AttendanceRow>(&sql), c.values())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Attendance::try_from).collect()
    }

    async fn count(&self, query: &AttendanceQuery) -> HrResult<i64> {
        if query.selects_nothing() {
            return Ok(0);
        }

        let c = conditions(query);
        let sql = format!("SELECT COUNT(*) FROM attendances a{}", c.where_sql());
        debug!(sql = %sql, bindings = ?c.values(), "Counting attendance");

        let total = bind_scalar(sqlx::query_scalar::<_, i64>(&sql), c.values())
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn save_for_day<F>(
        &self,
        employee_id: u64,
        date: NaiveDate,
        apply: F,
    ) -> HrResult<Attendance>
    where
        F: FnOnce(Option<Attendance>) -> HrResult<Attendance>,
    {
        let mut tx = self.pool.begin().await?;

        // first check-ins of the day serialize on the employee row
        if !lock_employee(&mut *tx, employee_id).await? {
            return Err(HrError::not_found("Employee", employee_id));
        }

        let sql = format!(
            "SELECT {COLUMNS} FROM attendances a WHERE a.employee_id = ? AND a.date = ? FOR UPDATE"
        );
        let current = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(employee_id)
            .bind(date)
            .fetch_optional(&mut *tx)
            .await?
            .map(Attendance::try_from)
            .transpose()?;

        // dropping `tx` on an early return rolls back
        let mut record = apply(current)?;

        if record.is_persisted() {
            update_row(&mut *tx, &record).await?;
        } else {
            match insert_row(&mut *tx, &record).await {
                Ok(id) => record.id = id,
                Err(e) if is_duplicate_key(&e) => {
                    return Err(HrError::conflict(
                        "Attendance already recorded for this employee and date",
                    ));
                }
                Err(e) => return Err(e.into()),
            }
        }

        tx.commit().await?;
        Ok(record)
    }

    async fn modify<F>(&self, id: u64, apply: F) -> HrResult<Attendance>
    where
        F: FnOnce(&mut Attendance) -> HrResult<()>,
    {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {COLUMNS} FROM attendances a WHERE a.id = ? FOR UPDATE");
        let mut record = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .map(Attendance::try_from)
            .transpose()?
            .ok_or_else(|| HrError::not_found("Attendance", id))?;

        apply(&mut record)?;
        update_row(&mut *tx, &record).await?;

        tx.commit().await?;
        Ok(record)
    }

    async fn delete(&self, id: u64) -> HrResult<bool> {
        let result = sqlx::query("DELETE FROM attendances WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, FixedClock};
    use crate::db::{init_db, run_migrations};
    use crate::model::attendance::Origin;
    use crate::service::attendance::AttendanceService;
    use crate::store::memory::MemoryDirectory;

    /// Pool on `TEST_DATABASE_URL`, migrated. `None` skips the test.
    async fn test_pool() -> Option<MySqlPool> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let pool = init_db(&url, 5).await.ok()?;
        run_migrations(&pool).await.ok()?;
        Some(pool)
    }

    async fn hire(pool: &MySqlPool) -> u64 {
        sqlx::query("INSERT INTO employees (department_id) VALUES (NULL)")
            .execute(pool)
            .await
            .unwrap()
            .last_insert_id()
    }

    #[actix_web::test]
    async fn concurrent_first_check_ins_keep_one_record() {
        let Some(pool) = test_pool().await else {
            return;
        };
        let employee_id = hire(&pool).await;
        let service = AttendanceService::new(
            MySqlAttendanceStore::new(pool.clone()),
            MemoryDirectory::with(&[(employee_id, None)]),
            FixedClock::at("2024-03-04 09:00"),
        );

        let (a, b) = futures::future::join(
            service.check_in(employee_id, Origin::default()),
            service.check_in(employee_id, Origin::default()),
        )
        .await;

        let (ok, err) = match (a, b) {
            (Ok(r), Err(e)) | (Err(e), Ok(r)) => (r, e),
            other => panic!("expected one check-in to win, got {other:?}"),
        };
        assert_eq!(ok.employee_id, employee_id);
        assert!(matches!(err, HrError::Conflict(_)));

        let rows = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM attendances WHERE employee_id = ?",
        )
        .bind(employee_id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(rows, 1);
    }

    #[actix_web::test]
    async fn missing_employee_row_is_not_found() {
        let Some(pool) = test_pool().await else {
            return;
        };
        let ghost = hire(&pool).await + 1_000_000;
        let store = MySqlAttendanceStore::new(pool);
        let now = FixedClock::at("2024-03-04 09:00").now();

        let err = store
            .save_for_day(ghost, now.date(), |_| {
                Ok(Attendance::new_for_day(ghost, now.date(), now))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, HrError::NotFound { entity: "Employee", .. }));
    }
}
