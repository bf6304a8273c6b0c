use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

use crate::error::{HrError, HrResult};
use crate::model::{DateRange, check_text};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum LeaveType {
    Annual,
    Sick,
    Personal,
    Maternity,
    Paternity,
    Bereavement,
    Unpaid,
    Other,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
    Taken,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    /// leave application id
    pub id: u64,
    #[schema(example = 1000)]
    /// employee id for whom the leave is applied
    pub employee_id: u64,
    pub leave_type: LeaveType,
    #[schema(example = "2026-01-10", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    /// last day of leave, inclusive
    #[schema(example = "2026-01-12", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = 3)]
    pub number_of_days: u32,
    #[schema(example = "Family event")]
    pub reason: Option<String>,
    pub status: LeaveStatus,
    /// employee id of whoever approved or rejected the request
    #[schema(example = 12)]
    pub approved_by: Option<u64>,
    #[schema(example = "2026-01-02T10:00:00", format = "date-time", value_type = Option<String>)]
    pub approved_at: Option<NaiveDateTime>,
    pub comments: Option<String>,
    #[schema(example = "2026-01-01T09:00:00", format = "date-time", value_type = String)]
    pub created_at: NaiveDateTime,
    #[schema(example = "2026-01-02T10:00:00", format = "date-time", value_type = Option<String>)]
    pub updated_at: Option<NaiveDateTime>,
}

/// The employee-editable part of a leave request.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LeaveDraft {
    #[schema(example = "SICK")]
    pub leave_type: LeaveType,
    #[schema(example = "2026-01-10", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-12", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Family event")]
    pub reason: Option<String>,
}

impl LeaveDraft {
    fn range(&self) -> HrResult<DateRange> {
        check_text("reason", self.reason.as_deref())?;
        DateRange::new(self.start_date, self.end_date)
    }
}

/// Rejects the request when a sibling lies entirely inside `requested` or
/// `requested` lies entirely inside a sibling.
///
/// Partial overlaps pass. Leaves of every status take part, cancelled and
/// rejected ones included.
fn ensure_not_covered<'a>(
    requested: &DateRange,
    siblings: impl IntoIterator<Item = &'a LeaveRequest>,
) -> HrResult<()> {
    let clash = siblings.into_iter().any(|l| {
        requested.covers(l.start_date, l.end_date)
            || (l.start_date <= requested.start && requested.end <= l.end_date)
    });
    if clash {
        return Err(HrError::conflict(
            "Employee already has leave scheduled during this period",
        ));
    }
    Ok(())
}

impl LeaveRequest {
    /// Builds a new PENDING request; `existing` are the employee's current leaves.
    pub fn submit(
        employee_id: u64,
        draft: LeaveDraft,
        existing: &[LeaveRequest],
        now: NaiveDateTime,
    ) -> HrResult<Self> {
        let range = draft.range()?;
        ensure_not_covered(&range, existing)?;

        Ok(Self {
            id: 0,
            employee_id,
            leave_type: draft.leave_type,
            start_date: range.start,
            end_date: range.end,
            number_of_days: range.days(),
            reason: draft.reason,
            status: LeaveStatus::Pending,
            approved_by: None,
            approved_at: None,
            comments: None,
            created_at: now,
            updated_at: None,
        })
    }

    pub fn reschedule(
        &mut self,
        draft: LeaveDraft,
        siblings: &[LeaveRequest],
        now: NaiveDateTime,
    ) -> HrResult<()> {
        if self.status != LeaveStatus::Pending {
            return Err(HrError::state(
                "Cannot update leave that is not in PENDING status",
            ));
        }
        let range = draft.range()?;
        ensure_not_covered(&range, siblings.iter().filter(|l| l.id != self.id))?;

        self.leave_type = draft.leave_type;
        self.start_date = range.start;
        self.end_date = range.end;
        self.number_of_days = range.days();
        self.reason = draft.reason;
        self.updated_at = Some(now);
        Ok(())
    }

    pub fn approve(
        &mut self,
        approver_id: u64,
        comments: Option<String>,
        now: NaiveDateTime,
    ) -> HrResult<()> {
        self.review(LeaveStatus::Approved, approver_id, comments, now)
    }

    pub fn reject(
        &mut self,
        approver_id: u64,
        comments: Option<String>,
        now: NaiveDateTime,
    ) -> HrResult<()> {
        self.review(LeaveStatus::Rejected, approver_id, comments, now)
    }

    fn review(
        &mut self,
        outcome: LeaveStatus,
        approver_id: u64,
        comments: Option<String>,
        now: NaiveDateTime,
    ) -> HrResult<()> {
        if self.status != LeaveStatus::Pending {
            let verb = match outcome {
                LeaveStatus::Approved => "approve",
                _ => "reject",
            };
            return Err(HrError::state(format!(
                "Cannot {verb} leave that is not in PENDING status"
            )));
        }
        check_text("comments", comments.as_deref())?;

        self.status = outcome;
        self.approved_by = Some(approver_id);
        self.approved_at = Some(now);
        self.comments = comments;
        self.updated_at = Some(now);
        Ok(())
    }

    pub fn cancel(&mut self, now: NaiveDateTime) -> HrResult<()> {
        if matches!(self.status, LeaveStatus::Cancelled | LeaveStatus::Taken) {
            return Err(HrError::state(
                "Cannot cancel leave that is already cancelled or taken",
            ));
        }
        self.status = LeaveStatus::Cancelled;
        self.updated_at = Some(now);
        Ok(())
    }

    pub fn mark_taken(&mut self, now: NaiveDateTime) -> HrResult<()> {
        if self.status != LeaveStatus::Approved {
            return Err(HrError::state("Only APPROVED leave can be marked as taken"));
        }
        self.status = LeaveStatus::Taken;
        self.updated_at = Some(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::date;

    fn now() -> NaiveDateTime {
        date("2024-01-01").and_hms_opt(9, 0, 0).unwrap()
    }

    fn draft(start: &str, end: &str) -> LeaveDraft {
        LeaveDraft {
            leave_type: LeaveType::Annual,
            start_date: date(start),
            end_date: date(end),
            reason: Some("trip".into()),
        }
    }

    fn existing(id: u64, start: &str, end: &str, status: LeaveStatus) -> LeaveRequest {
        let mut leave = LeaveRequest::submit(7, draft(start, end), &[], now()).unwrap();
        leave.id = id;
        leave.status = status;
        leave
    }

    #[test]
    fn submit_counts_days_and_starts_pending() {
        let leave = LeaveRequest::submit(7, draft("2024-01-10", "2024-01-12"), &[], now()).unwrap();
        assert_eq!(leave.number_of_days, 3);
        assert_eq!(leave.status, LeaveStatus::Pending);
        assert_eq!(leave.created_at, now());
        assert!(leave.approved_by.is_none());
    }

    #[test]
    fn submit_rejects_inverted_dates() {
        let err = LeaveRequest::submit(7, draft("2024-01-12", "2024-01-10"), &[], now()).unwrap_err();
        assert!(matches!(err, HrError::Validation { .. }));
    }

    #[test]
    fn containment_either_way_conflicts() {
        let held = [existing(1, "2024-01-12", "2024-01-13", LeaveStatus::Pending)];
        // request encloses the existing leave
        let err = LeaveRequest::submit(7, draft("2024-01-10", "2024-01-15"), &held, now()).unwrap_err();
        assert!(matches!(err, HrError::Conflict(_)));

        // request sits inside the existing leave
        let wide = [existing(1, "2024-01-10", "2024-01-15", LeaveStatus::Pending)];
        let err = LeaveRequest::submit(7, draft("2024-01-12", "2024-01-13"), &wide, now()).unwrap_err();
        assert!(matches!(err, HrError::Conflict(_)));

        // disjoint
        assert!(LeaveRequest::submit(7, draft("2024-01-05", "2024-01-09"), &wide, now()).is_ok());
    }

    #[test]
    fn partial_overlap_is_not_a_conflict() {
        let held = [existing(1, "2024-01-10", "2024-01-15", LeaveStatus::Approved)];
        assert!(LeaveRequest::submit(7, draft("2024-01-14", "2024-01-20"), &held, now()).is_ok());
        assert!(LeaveRequest::submit(7, draft("2024-01-01", "2024-01-10"), &held, now()).is_ok());
    }

    #[test]
    fn cancelled_leaves_still_count_for_overlap() {
        let held = [existing(1, "2024-02-01", "2024-02-02", LeaveStatus::Cancelled)];
        let err = LeaveRequest::submit(7, draft("2024-02-01", "2024-02-05"), &held, now()).unwrap_err();
        assert!(matches!(err, HrError::Conflict(_)));
    }

    #[test]
    fn reschedule_ignores_itself() {
        let mut leave = existing(1, "2024-01-10", "2024-01-12", LeaveStatus::Pending);
        let siblings = [leave.clone()];
        leave.reschedule(draft("2024-01-09", "2024-01-12"), &siblings, now()).unwrap();
        assert_eq!(leave.number_of_days, 4);
        assert_eq!(leave.updated_at, Some(now()));
    }

    #[test]
    fn reschedule_only_while_pending() {
        let mut leave = existing(1, "2024-01-10", "2024-01-12", LeaveStatus::Approved);
        let err = leave.reschedule(draft("2024-01-10", "2024-01-11"), &[], now()).unwrap_err();
        assert!(matches!(err, HrError::State(_)));
    }

    #[test]
    fn approve_once() {
        let mut leave = existing(1, "2024-01-10", "2024-01-12", LeaveStatus::Pending);
        leave.approve(12, Some("enjoy".into()), now()).unwrap();
        assert_eq!(leave.status, LeaveStatus::Approved);
        assert_eq!(leave.approved_by, Some(12));
        assert_eq!(leave.approved_at, Some(now()));

        let err = leave.approve(12, None, now()).unwrap_err();
        assert!(matches!(err, HrError::State(_)));
        let err = leave.reject(12, None, now()).unwrap_err();
        assert!(matches!(err, HrError::State(_)));
    }

    #[test]
    fn cancel_transitions() {
        for status in [LeaveStatus::Pending, LeaveStatus::Approved, LeaveStatus::Rejected] {
            let mut leave = existing(1, "2024-01-10", "2024-01-12", status);
            leave.cancel(now()).unwrap();
            assert_eq!(leave.status, LeaveStatus::Cancelled);
        }
        for status in [LeaveStatus::Cancelled, LeaveStatus::Taken] {
            let mut leave = existing(1, "2024-01-10", "2024-01-12", status);
            assert!(matches!(leave.cancel(now()), Err(HrError::State(_))));
        }
    }

    #[test]
    fn only_approved_becomes_taken() {
        let mut leave = existing(1, "2024-01-10", "2024-01-12", LeaveStatus::Pending);
        assert!(leave.mark_taken(now()).is_err());
        leave.approve(3, None, now()).unwrap();
        leave.mark_taken(now()).unwrap();
        assert_eq!(leave.status, LeaveStatus::Taken);
    }
}
