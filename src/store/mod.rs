//! Persistence seams for the workflows.
//!
//! Mutating calls take a closure that receives the current state and runs inside
//! the store's critical section (a transaction with row locks for MySQL). A closure
//! error aborts the write and is returned unchanged.

pub mod attendance;
pub mod directory;
pub mod leave_request;
#[cfg(test)]
pub mod memory;

use chrono::NaiveDate;

use crate::error::HrResult;
use crate::model::DateRange;
use crate::model::attendance::{Attendance, AttendanceStatus};
use crate::model::employee::EmployeeRef;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};

/// Attendance filter. `employee_ids: Some(vec![])` matches nothing.
#[derive(Debug, Clone, Default)]
pub struct AttendanceQuery {
    pub employee_ids: Option<Vec<u64>>,
    pub status: Option<AttendanceStatus>,
    pub range: Option<DateRange>,
}

impl AttendanceQuery {
    pub fn matches(&self, record: &Attendance) -> bool {
        self.employee_ids
            .as_ref()
            .is_none_or(|ids| ids.contains(&record.employee_id))
            && self.status.is_none_or(|s| s == record.status)
            && self.range.is_none_or(|r| r.contains(record.date))
    }

    pub fn selects_nothing(&self) -> bool {
        matches!(&self.employee_ids, Some(ids) if ids.is_empty())
    }
}

/// Leave filter. `within` keeps leaves lying entirely inside the range.
#[derive(Debug, Clone, Default)]
pub struct LeaveQuery {
    pub employee_ids: Option<Vec<u64>>,
    pub status: Option<LeaveStatus>,
    pub within: Option<DateRange>,
}

impl LeaveQuery {
    pub fn matches(&self, leave: &LeaveRequest) -> bool {
        self.employee_ids
            .as_ref()
            .is_none_or(|ids| ids.contains(&leave.employee_id))
            && self.status.is_none_or(|s| s == leave.status)
            && self
                .within
                .is_none_or(|r| r.covers(leave.start_date, leave.end_date))
    }

    pub fn selects_nothing(&self) -> bool {
        matches!(&self.employee_ids, Some(ids) if ids.is_empty())
    }
}

/// Paginated leave listing, newest first.
#[derive(Debug, Clone, Default)]
pub struct LeaveSearch {
    pub employee_id: Option<u64>,
    pub status: Option<LeaveStatus>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl LeaveSearch {
    /// (page, per_page, offset) with page >= 1 and 1 <= per_page <= 100.
    pub fn window(&self) -> (u64, u64, u64) {
        let per_page = self.per_page.unwrap_or(10).clamp(1, 100);
        let page = self.page.unwrap_or(1).max(1);
        (page, per_page, (page - 1) * per_page)
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total: i64,
}

pub trait AttendanceStore: Send + Sync {
    async fn get(&self, id: u64) -> HrResult<Option<Attendance>>;

    async fn get_for_day(&self, employee_id: u64, date: NaiveDate)
    -> HrResult<Option<Attendance>>;

    /// Ordered by date, then employee.
    async fn list(&self, query: &AttendanceQuery) -> HrResult<Vec<Attendance>>;

    async fn count(&self, query: &AttendanceQuery) -> HrResult<i64>;

    /// Find-or-create for one `(employee, date)` pair. `apply` gets the current
    /// record, if any, and returns the record to persist; an unsaved record
    /// (id 0) is inserted.
    async fn save_for_day<F>(&self, employee_id: u64, date: NaiveDate, apply: F)
    -> HrResult<Attendance>
    where
        F: FnOnce(Option<Attendance>) -> HrResult<Attendance>;

    async fn modify<F>(&self, id: u64, apply: F) -> HrResult<Attendance>
    where
        F: FnOnce(&mut Attendance) -> HrResult<()>;

    /// Returns false when nothing was deleted.
    async fn delete(&self, id: u64) -> HrResult<bool>;
}

pub trait LeaveStore: Send + Sync {
    async fn get(&self, id: u64) -> HrResult<Option<LeaveRequest>>;

    /// Ordered by start date, then id.
    async fn list(&self, query: &LeaveQuery) -> HrResult<Vec<LeaveRequest>>;

    async fn count(&self, query: &LeaveQuery) -> HrResult<i64>;

    async fn search(&self, search: &LeaveSearch) -> HrResult<Page<LeaveRequest>>;

    /// `build` sees every leave the employee holds and returns the new request.
    async fn insert_for_employee<F>(&self, employee_id: u64, build: F) -> HrResult<LeaveRequest>
    where
        F: FnOnce(&[LeaveRequest]) -> HrResult<LeaveRequest>;

    /// `apply` gets the leave and all leaves of the same employee (itself included).
    async fn modify<F>(&self, id: u64, apply: F) -> HrResult<LeaveRequest>
    where
        F: FnOnce(&mut LeaveRequest, &[LeaveRequest]) -> HrResult<()>;

    async fn delete(&self, id: u64) -> HrResult<bool>;
}

/// Read-only view of the employee records owned elsewhere.
pub trait EmployeeDirectory: Send + Sync {
    async fn find(&self, employee_id: u64) -> HrResult<Option<EmployeeRef>>;

    async fn department_members(&self, department_id: u64) -> HrResult<Vec<u64>>;
}
