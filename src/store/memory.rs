//! In-memory stores for service tests. One mutex per store stands in for the
//! row locks of the MySQL implementation.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::error::{HrError, HrResult};
use crate::model::attendance::Attendance;
use crate::model::employee::EmployeeRef;
use crate::model::leave_request::LeaveRequest;
use crate::store::{
    AttendanceQuery, AttendanceStore, EmployeeDirectory, LeaveQuery, LeaveSearch, LeaveStore,
    Page,
};

struct Table<T> {
    next_id: u64,
    rows: BTreeMap<u64, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            rows: BTreeMap::new(),
        }
    }
}

impl<T> Table<T> {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone, Default)]
pub struct MemoryAttendanceStore {
    table: Arc<Mutex<Table<Attendance>>>,
}

impl MemoryAttendanceStore {
    pub fn len(&self) -> usize {
        self.table.lock().unwrap().rows.len()
    }
}

impl AttendanceStore for MemoryAttendanceStore {
    async fn get(&self, id: u64) -> HrResult<Option<Attendance>> {
        Ok(self.table.lock().unwrap().rows.get(&id).cloned())
    }

    async fn get_for_day(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> HrResult<Option<Attendance>> {
        let table = self.table.lock().unwrap();
        Ok(table
            .rows
            .values()
            .find(|r| r.employee_id == employee_id && r.date == date)
            .cloned())
    }

    async fn list(&self, query: &AttendanceQuery) -> HrResult<Vec<Attendance>> {
        let table = self.table.lock().unwrap();
        let mut found: Vec<_> = table
            .rows
            .values()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();
        found.sort_by_key(|r| (r.date, r.employee_id));
        Ok(found)
    }

    async fn count(&self, query: &AttendanceQuery) -> HrResult<i64> {
        let table = self.table.lock().unwrap();
        Ok(table.rows.values().filter(|r| query.matches(r)).count() as i64)
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
        let mut table = self.table.lock().unwrap();
        let current = table
            .rows
            .values()
            .find(|r| r.employee_id == employee_id && r.date == date)
            .cloned();

        let mut record = apply(current)?;
        if !record.is_persisted() {
            record.id = table.allocate();
        }
        table.rows.insert(record.id, record.clone());
        Ok(record)
    }

    async fn modify<F>(&self, id: u64, apply: F) -> HrResult<Attendance>
    where
        F: FnOnce(&mut Attendance) -> HrResult<()>,
    {
        let mut table = self.table.lock().unwrap();
        let mut record = table
            .rows
            .get(&id)
            .cloned()
            .ok_or_else(|| HrError::not_found("Attendance", id))?;

        apply(&mut record)?;
        table.rows.insert(id, record.clone());
        Ok(record)
    }

    async fn delete(&self, id: u64) -> HrResult<bool> {
        Ok(self.table.lock().unwrap().rows.remove(&id).is_some())
    }
}

#[derive(Clone, Default)]
pub struct MemoryLeaveStore {
    table: Arc<Mutex<Table<LeaveRequest>>>,
}

impl MemoryLeaveStore {
    pub fn len(&self) -> usize {
        self.table.lock().unwrap().rows.len()
    }
}

fn employee_leaves(table: &Table<LeaveRequest>, employee_id: u64) -> Vec<LeaveRequest> {
    let mut leaves: Vec<_> = table
        .rows
        .values()
        .filter(|l| l.employee_id == employee_id)
        .cloned()
        .collect();
    leaves.sort_by_key(|l| (l.start_date, l.id));
    leaves
}

impl LeaveStore for MemoryLeaveStore {
    async fn get(&self, id: u64) -> HrResult<Option<LeaveRequest>> {
        Ok(self.table.lock().unwrap().rows.get(&id).cloned())
    }

    async fn list(&self, query: &LeaveQuery) -> HrResult<Vec<LeaveRequest>> {
        let table = self.table.lock().unwrap();
        let mut found: Vec<_> = table
            .rows
            .values()
            .filter(|l| query.matches(l))
            .cloned()
            .collect();
        found.sort_by_key(|l| (l.start_date, l.id));
        Ok(found)
    }

    async fn count(&self, query: &LeaveQuery) -> HrResult<i64> {
        let table = self.table.lock().unwrap();
        Ok(table.rows.values().filter(|l| query.matches(l)).count() as i64)
    }

    async fn search(&self, search: &LeaveSearch) -> HrResult<Page<LeaveRequest>> {
        let (page, per_page, offset) = search.window();
        let table = self.table.lock().unwrap();
        let mut found: Vec<_> = table
            .rows
            .values()
            .filter(|l| search.employee_id.is_none_or(|id| id == l.employee_id))
            .filter(|l| search.status.is_none_or(|s| s == l.status))
            .cloned()
            .collect();
        found.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        let total = found.len() as i64;
        let data = found
            .into_iter()
            .skip(offset as usize)
            .take(per_page as usize)
            .collect();
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
        let mut table = self.table.lock().unwrap();
        let existing = employee_leaves(&table, employee_id);

        let mut leave = build(&existing)?;
        leave.id = table.allocate();
        table.rows.insert(leave.id, leave.clone());
        Ok(leave)
    }

    async fn modify<F>(&self, id: u64, apply: F) -> HrResult<LeaveRequest>
    where
        F: FnOnce(&mut LeaveRequest, &[LeaveRequest]) -> HrResult<()>,
    {
        let mut table = self.table.lock().unwrap();
        let mut leave = table
            .rows
            .get(&id)
            .cloned()
            .ok_or_else(|| HrError::not_found("Leave", id))?;
        let siblings = employee_leaves(&table, leave.employee_id);

        apply(&mut leave, &siblings)?;
        table.rows.insert(id, leave.clone());
        Ok(leave)
    }

    async fn delete(&self, id: u64) -> HrResult<bool> {
        Ok(self.table.lock().unwrap().rows.remove(&id).is_some())
    }
}

#[derive(Clone, Default)]
pub struct MemoryDirectory {
    employees: Arc<Mutex<BTreeMap<u64, EmployeeRef>>>,
}

impl MemoryDirectory {
    pub fn with(employees: &[(u64, Option<u64>)]) -> Self {
        let directory = Self::default();
        for &(id, department_id) in employees {
            directory.hire(id, department_id);
        }
        directory
    }

    pub fn hire(&self, id: u64, department_id: Option<u64>) {
        self.employees
            .lock()
            .unwrap()
            .insert(id, EmployeeRef { id, department_id });
    }
}

impl EmployeeDirectory for MemoryDirectory {
    async fn find(&self, employee_id: u64) -> HrResult<Option<EmployeeRef>> {
        Ok(self.employees.lock().unwrap().get(&employee_id).copied())
    }

    async fn department_members(&self, department_id: u64) -> HrResult<Vec<u64>> {
        Ok(self
            .employees
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.department_id == Some(department_id))
            .map(|e| e.id)
            .collect())
    }
}
