use chrono::NaiveDate;
use tracing::{info, instrument};

use crate::clock::Clock;
use crate::error::{HrError, HrResult};
use crate::model::DateRange;
use crate::model::attendance::{Attendance, AttendanceCorrection, AttendanceStatus, Origin};
use crate::service::require_employee;
use crate::store::{AttendanceQuery, AttendanceStore, EmployeeDirectory};

/// Check-in, check-out and break tracking for the current day, plus the
/// administrative corrections and reads around it.
pub struct AttendanceService<S, D, C> {
    store: S,
    directory: D,
    clock: C,
}

impl<S, D, C> AttendanceService<S, D, C>
where
    S: AttendanceStore,
    D: EmployeeDirectory,
    C: Clock,
{
    pub fn new(store: S, directory: D, clock: C) -> Self {
        Self {
            store,
            directory,
            clock,
        }
    }

    #[instrument(skip(self, origin))]
    pub async fn check_in(&self, employee_id: u64, origin: Origin) -> HrResult<Attendance> {
        require_employee(&self.directory, employee_id).await?;
        let now = self.clock.now();

        let record = self
            .store
            .save_for_day(employee_id, now.date(), |current| {
                let mut record = current
                    .unwrap_or_else(|| Attendance::new_for_day(employee_id, now.date(), now));
                record.check_in(now, &origin)?;
                Ok(record)
            })
            .await?;

        info!(attendance_id = record.id, "Checked in");
        Ok(record)
    }

    #[instrument(skip(self, origin))]
    pub async fn check_out(&self, employee_id: u64, origin: Origin) -> HrResult<Attendance> {
        require_employee(&self.directory, employee_id).await?;
        let now = self.clock.now();

        let record = self
            .store
            .save_for_day(employee_id, now.date(), |current| {
                let mut record = current
                    .ok_or_else(|| HrError::state("No check-in record found for today"))?;
                record.check_out(now, &origin)?;
                Ok(record)
            })
            .await?;

        info!(attendance_id = record.id, work_hours = record.work_hours, "Checked out");
        Ok(record)
    }

    /// Check-out against an explicit record rather than today's.
    #[instrument(skip(self, origin))]
    pub async fn check_out_record(&self, id: u64, origin: Origin) -> HrResult<Attendance> {
        let now = self.clock.now();
        let record = self
            .store
            .modify(id, |record| record.check_out(now, &origin))
            .await?;

        info!(work_hours = record.work_hours, "Checked out");
        Ok(record)
    }

    #[instrument(skip(self))]
    pub async fn start_break(&self, employee_id: u64) -> HrResult<Attendance> {
        require_employee(&self.directory, employee_id).await?;
        let now = self.clock.now();

        let record = self
            .store
            .save_for_day(employee_id, now.date(), |current| {
                let mut record =
                    current.ok_or_else(|| HrError::state("Employee has not checked in today"))?;
                record.start_break(now)?;
                Ok(record)
            })
            .await?;

        info!(attendance_id = record.id, "Break started");
        Ok(record)
    }

    #[instrument(skip(self))]
    pub async fn end_break(&self, employee_id: u64) -> HrResult<Attendance> {
        require_employee(&self.directory, employee_id).await?;
        let now = self.clock.now();

        let record = self
            .store
            .save_for_day(employee_id, now.date(), |current| {
                let mut record =
                    current.ok_or_else(|| HrError::state("Employee has not started a break"))?;
                record.end_break(now)?;
                Ok(record)
            })
            .await?;

        info!(attendance_id = record.id, "Break ended");
        Ok(record)
    }

    #[instrument(skip(self, correction))]
    pub async fn update_attendance(
        &self,
        id: u64,
        correction: AttendanceCorrection,
    ) -> HrResult<Attendance> {
        let now = self.clock.now();
        let record = self
            .store
            .modify(id, |record| record.apply_correction(correction, now))
            .await?;

        info!(status = %record.status, "Attendance corrected");
        Ok(record)
    }

    #[instrument(skip(self))]
    pub async fn delete_attendance(&self, id: u64) -> HrResult<()> {
        if !self.store.delete(id).await? {
            return Err(HrError::not_found("Attendance", id));
        }
        info!("Attendance deleted");
        Ok(())
    }

    pub async fn get_attendance(&self, id: u64) -> HrResult<Attendance> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| HrError::not_found("Attendance", id))
    }

    pub async fn attendance_for_day(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> HrResult<Option<Attendance>> {
        require_employee(&self.directory, employee_id).await?;
        self.store.get_for_day(employee_id, date).await
    }

    pub async fn attendance_for_employee(
        &self,
        employee_id: u64,
        range: Option<DateRange>,
    ) -> HrResult<Vec<Attendance>> {
        require_employee(&self.directory, employee_id).await?;
        let query = AttendanceQuery {
            employee_ids: Some(vec![employee_id]),
            range,
            ..Default::default()
        };
        self.store.list(&query).await
    }

    pub async fn attendance_between(&self, range: DateRange) -> HrResult<Vec<Attendance>> {
        let query = AttendanceQuery {
            range: Some(range),
            ..Default::default()
        };
        self.store.list(&query).await
    }

    pub async fn department_attendance(
        &self,
        department_id: u64,
        range: DateRange,
    ) -> HrResult<Vec<Attendance>> {
        let members = self.directory.department_members(department_id).await?;
        let query = AttendanceQuery {
            employee_ids: Some(members),
            range: Some(range),
            ..Default::default()
        };
        self.store.list(&query).await
    }

    pub async fn count_by_employee_status_and_date_range(
        &self,
        employee_id: u64,
        status: AttendanceStatus,
        range: DateRange,
    ) -> HrResult<i64> {
        require_employee(&self.directory, employee_id).await?;
        let query = AttendanceQuery {
            employee_ids: Some(vec![employee_id]),
            status: Some(status),
            range: Some(range),
        };
        self.store.count(&query).await
    }
}
