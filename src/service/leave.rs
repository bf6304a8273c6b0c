use tracing::{info, instrument};

use crate::clock::Clock;
use crate::error::{HrError, HrResult};
use crate::model::DateRange;
use crate::model::leave_request::{LeaveDraft, LeaveRequest, LeaveStatus};
use crate::service::require_employee;
use crate::store::{EmployeeDirectory, LeaveQuery, LeaveSearch, LeaveStore, Page};

pub struct LeaveService<S, D, C> {
    store: S,
    directory: D,
    clock: C,
}

impl<S, D, C> LeaveService<S, D, C>
where
    S: LeaveStore,
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

    /// Submits a PENDING request. The overlap check and the insert share one
    /// critical section per employee.
    #[instrument(skip(self, draft), fields(leave_type = %draft.leave_type))]
    pub async fn create_leave(&self, employee_id: u64, draft: LeaveDraft) -> HrResult<LeaveRequest> {
        require_employee(&self.directory, employee_id).await?;
        let now = self.clock.now();

        let leave = self
            .store
            .insert_for_employee(employee_id, |existing| {
                LeaveRequest::submit(employee_id, draft, existing, now)
            })
            .await?;

        info!(leave_id = leave.id, days = leave.number_of_days, "Leave requested");
        Ok(leave)
    }

    #[instrument(skip(self, draft))]
    pub async fn update_leave(&self, id: u64, draft: LeaveDraft) -> HrResult<LeaveRequest> {
        let now = self.clock.now();
        let leave = self
            .store
            .modify(id, |leave, siblings| leave.reschedule(draft, siblings, now))
            .await?;

        info!(days = leave.number_of_days, "Leave rescheduled");
        Ok(leave)
    }

    #[instrument(skip(self, comments))]
    pub async fn approve_leave(
        &self,
        id: u64,
        approver_id: u64,
        comments: Option<String>,
    ) -> HrResult<LeaveRequest> {
        require_employee(&self.directory, approver_id).await?;
        let now = self.clock.now();

        let leave = self
            .store
            .modify(id, |leave, _| leave.approve(approver_id, comments, now))
            .await?;

        info!(employee_id = leave.employee_id, "Leave approved");
        Ok(leave)
    }

    #[instrument(skip(self, comments))]
    pub async fn reject_leave(
        &self,
        id: u64,
        approver_id: u64,
        comments: Option<String>,
    ) -> HrResult<LeaveRequest> {
        require_employee(&self.directory, approver_id).await?;
        let now = self.clock.now();

        let leave = self
            .store
            .modify(id, |leave, _| leave.reject(approver_id, comments, now))
            .await?;

        info!(employee_id = leave.employee_id, "Leave rejected");
        Ok(leave)
    }

    #[instrument(skip(self))]
    pub async fn cancel_leave(&self, id: u64) -> HrResult<LeaveRequest> {
        let now = self.clock.now();
        let leave = self
            .store
            .modify(id, |leave, _| leave.cancel(now))
            .await?;

        info!(employee_id = leave.employee_id, "Leave cancelled");
        Ok(leave)
    }

    #[instrument(skip(self))]
    pub async fn mark_taken(&self, id: u64) -> HrResult<LeaveRequest> {
        let now = self.clock.now();
        let leave = self
            .store
            .modify(id, |leave, _| leave.mark_taken(now))
            .await?;

        info!(employee_id = leave.employee_id, "Leave marked as taken");
        Ok(leave)
    }

    #[instrument(skip(self))]
    pub async fn delete_leave(&self, id: u64) -> HrResult<()> {
        if !self.store.delete(id).await? {
            return Err(HrError::not_found("Leave", id));
        }
        info!("Leave deleted");
        Ok(())
    }

    pub async fn get_leave(&self, id: u64) -> HrResult<LeaveRequest> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| HrError::not_found("Leave", id))
    }

    pub async fn leaves_for_employee(
        &self,
        employee_id: u64,
        status: Option<LeaveStatus>,
    ) -> HrResult<Vec<LeaveRequest>> {
        require_employee(&self.directory, employee_id).await?;
        let query = LeaveQuery {
            employee_ids: Some(vec![employee_id]),
            status,
            ..Default::default()
        };
        self.store.list(&query).await
    }

    pub async fn leaves_by_status(&self, status: LeaveStatus) -> HrResult<Vec<LeaveRequest>> {
        let query = LeaveQuery {
            status: Some(status),
            ..Default::default()
        };
        self.store.list(&query).await
    }

    /// Leaves lying entirely inside `range`.
    pub async fn leaves_within(&self, range: DateRange) -> HrResult<Vec<LeaveRequest>> {
        let query = LeaveQuery {
            within: Some(range),
            ..Default::default()
        };
        self.store.list(&query).await
    }

    pub async fn department_leaves(
        &self,
        department_id: u64,
        status: Option<LeaveStatus>,
    ) -> HrResult<Vec<LeaveRequest>> {
        let members = self.directory.department_members(department_id).await?;
        let query = LeaveQuery {
            employee_ids: Some(members),
            status,
            ..Default::default()
        };
        self.store.list(&query).await
    }

    pub async fn count_by_employee_status_and_date_range(
        &self,
        employee_id: u64,
        status: LeaveStatus,
        range: DateRange,
    ) -> HrResult<i64> {
        require_employee(&self.directory, employee_id).await?;
        let query = LeaveQuery {
            employee_ids: Some(vec![employee_id]),
            status: Some(status),
            within: Some(range),
        };
        self.store.count(&query).await
    }

    pub async fn search_leaves(&self, search: &LeaveSearch) -> HrResult<Page<LeaveRequest>> {
        self.store.search(search).await
    }
}
