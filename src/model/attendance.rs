use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

use crate::error::{HrError, HrResult};
use crate::model::check_text;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum AttendanceStatus {
    Present,
    Absent,
    HalfDay,
    Late,
    Leave,
    Holiday,
    Weekend,
}

/// One employee's attendance for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Attendance {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "09:00:00", value_type = Option<String>)]
    pub check_in_time: Option<NaiveTime>,
    #[schema(example = "17:00:00", value_type = Option<String>)]
    pub check_out_time: Option<NaiveTime>,
    #[schema(example = "12:00:00", value_type = Option<String>)]
    pub break_start_time: Option<NaiveTime>,
    #[schema(example = "12:30:00", value_type = Option<String>)]
    pub break_end_time: Option<NaiveTime>,
    #[schema(example = 7.5)]
    pub work_hours: f64,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
    #[schema(example = "10.0.0.12")]
    pub ip_address: Option<String>,
    #[schema(example = "HQ, floor 3")]
    pub location: Option<String>,
    #[schema(example = "2026-01-05T09:00:00", format = "date-time", value_type = String)]
    pub created_at: NaiveDateTime,
    #[schema(example = "2026-01-05T17:00:00", format = "date-time", value_type = String)]
    pub updated_at: NaiveDateTime,
}

/// Where a check-in or check-out came from.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct Origin {
    #[schema(example = "10.0.0.12")]
    pub ip_address: Option<String>,
    #[schema(example = "HQ, floor 3")]
    pub location: Option<String>,
}

impl Origin {
    fn apply(&self, record: &mut Attendance) {
        if let Some(ip) = &self.ip_address {
            record.ip_address = Some(ip.clone());
        }
        if let Some(location) = &self.location {
            record.location = Some(location.clone());
        }
    }
}

/// Administrative correction; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct AttendanceCorrection {
    pub status: Option<AttendanceStatus>,
    #[schema(example = "09:00:00", value_type = Option<String>)]
    pub check_in_time: Option<NaiveTime>,
    #[schema(example = "17:00:00", value_type = Option<String>)]
    pub check_out_time: Option<NaiveTime>,
    #[schema(example = "12:00:00", value_type = Option<String>)]
    pub break_start_time: Option<NaiveTime>,
    #[schema(example = "12:30:00", value_type = Option<String>)]
    pub break_end_time: Option<NaiveTime>,
    #[schema(example = "Badge reader was down")]
    pub notes: Option<String>,
}

/// Hours worked between check-in and check-out, minus the break window when both
/// ends of it are known. Whole minutes, clamped at zero.
pub fn work_hours(
    check_in: NaiveTime,
    check_out: NaiveTime,
    break_start: Option<NaiveTime>,
    break_end: Option<NaiveTime>,
) -> f64 {
    let mut minutes = check_out.signed_duration_since(check_in).num_minutes();
    if let (Some(start), Some(end)) = (break_start, break_end) {
        minutes -= end.signed_duration_since(start).num_minutes();
    }
    minutes.max(0) as f64 / 60.0
}

impl Attendance {
    /// Unsaved record for `date`; the store assigns the id.
    pub fn new_for_day(employee_id: u64, date: NaiveDate, now: NaiveDateTime) -> Self {
        Self {
            id: 0,
            employee_id,
            date,
            check_in_time: None,
            check_out_time: None,
            break_start_time: None,
            break_end_time: None,
            work_hours: 0.0,
            status: AttendanceStatus::Absent,
            notes: None,
            ip_address: None,
            location: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }

    pub fn on_break(&self) -> bool {
        self.break_start_time.is_some() && self.break_end_time.is_none()
    }

    pub fn check_in(&mut self, now: NaiveDateTime, origin: &Origin) -> HrResult<()> {
        if self.check_in_time.is_some() {
            return Err(HrError::conflict("Employee has already checked in today"));
        }

        self.check_in_time = Some(now.time());
        self.status = AttendanceStatus::Present;
        origin.apply(self);
        self.updated_at = now;
        Ok(())
    }

    pub fn check_out(&mut self, now: NaiveDateTime, origin: &Origin) -> HrResult<()> {
        if self.check_out_time.is_some() {
            return Err(HrError::conflict("Employee has already checked out today"));
        }
        if self.check_in_time.is_none() {
            return Err(HrError::state("Employee has not checked in today"));
        }

        self.check_out_time = Some(now.time());
        origin.apply(self);
        self.recompute_work_hours();
        self.updated_at = now;
        Ok(())
    }

    /// Only one break window is kept; a new break after a finished one replaces it.
    pub fn start_break(&mut self, now: NaiveDateTime) -> HrResult<()> {
        if self.check_in_time.is_none() {
            return Err(HrError::state("Employee has not checked in today"));
        }
        if self.check_out_time.is_some() {
            return Err(HrError::state("Employee has already checked out today"));
        }
        if self.on_break() {
            return Err(HrError::state("Employee is already on break"));
        }

        self.break_start_time = Some(now.time());
        self.break_end_time = None;
        self.updated_at = now;
        Ok(())
    }

    pub fn end_break(&mut self, now: NaiveDateTime) -> HrResult<()> {
        if self.break_start_time.is_none() {
            return Err(HrError::state("Employee has not started a break"));
        }
        if self.break_end_time.is_some() {
            return Err(HrError::state("Employee's break has already ended"));
        }

        self.break_end_time = Some(now.time());
        self.updated_at = now;
        Ok(())
    }

    pub fn apply_correction(
        &mut self,
        correction: AttendanceCorrection,
        now: NaiveDateTime,
    ) -> HrResult<()> {
        check_text("notes", correction.notes.as_deref())?;

        if let Some(status) = correction.status {
            self.status = status;
        }
        if let Some(t) = correction.check_in_time {
            self.check_in_time = Some(t);
        }
        if let Some(t) = correction.check_out_time {
            self.check_out_time = Some(t);
        }
        if let Some(t) = correction.break_start_time {
            self.break_start_time = Some(t);
        }
        if let Some(t) = correction.break_end_time {
            self.break_end_time = Some(t);
        }
        if correction.notes.is_some() {
            self.notes = correction.notes;
        }

        self.recompute_work_hours();
        self.updated_at = now;
        Ok(())
    }

    fn recompute_work_hours(&mut self) {
        if let (Some(check_in), Some(check_out)) = (self.check_in_time, self.check_out_time) {
            self.work_hours = work_hours(
                check_in,
                check_out,
                self.break_start_time,
                self.break_end_time,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::date;

    fn t(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("2024-01-10 {s}"), "%Y-%m-%d %H:%M").unwrap()
    }

    fn fresh() -> Attendance {
        Attendance::new_for_day(1000, date("2024-01-10"), at("08:00"))
    }

    #[test]
    fn work_hours_subtracts_the_break() {
        let hours = work_hours(t("09:00"), t("17:00"), Some(t("12:00")), Some(t("12:30")));
        assert_eq!(hours, 7.5);
    }

    #[test]
    fn work_hours_ignores_half_a_break() {
        assert_eq!(work_hours(t("09:00"), t("17:00"), Some(t("12:00")), None), 8.0);
        assert_eq!(work_hours(t("09:00"), t("17:00"), None, None), 8.0);
    }

    #[test]
    fn work_hours_never_goes_negative() {
        assert_eq!(work_hours(t("17:00"), t("09:00"), None, None), 0.0);
    }

    #[test]
    fn full_day_with_break() {
        let mut rec = fresh();
        rec.check_in(at("09:00"), &Origin::default()).unwrap();
        assert_eq!(rec.status, AttendanceStatus::Present);
        rec.start_break(at("12:00")).unwrap();
        assert!(rec.on_break());
        rec.end_break(at("12:30")).unwrap();
        rec.check_out(at("17:00"), &Origin::default()).unwrap();
        assert_eq!(rec.work_hours, 7.5);
    }

    #[test]
    fn second_check_in_conflicts() {
        let mut rec = fresh();
        rec.check_in(at("09:00"), &Origin::default()).unwrap();
        let err = rec.check_in(at("09:05"), &Origin::default()).unwrap_err();
        assert!(matches!(err, HrError::Conflict(_)));
        assert_eq!(rec.check_in_time, Some(t("09:00")));
    }

    #[test]
    fn check_out_guards() {
        let mut rec = fresh();
        let err = rec.check_out(at("17:00"), &Origin::default()).unwrap_err();
        assert!(matches!(err, HrError::State(_)));

        rec.check_in(at("09:00"), &Origin::default()).unwrap();
        rec.check_out(at("17:00"), &Origin::default()).unwrap();
        let err = rec.check_out(at("18:00"), &Origin::default()).unwrap_err();
        assert!(matches!(err, HrError::Conflict(_)));
        assert_eq!(rec.check_out_time, Some(t("17:00")));
    }

    #[test]
    fn break_guards() {
        let mut rec = fresh();
        assert!(matches!(rec.start_break(at("10:00")), Err(HrError::State(_))));
        assert!(matches!(rec.end_break(at("10:00")), Err(HrError::State(_))));

        rec.check_in(at("09:00"), &Origin::default()).unwrap();
        rec.start_break(at("10:00")).unwrap();
        assert!(matches!(rec.start_break(at("10:05")), Err(HrError::State(_))));
        rec.end_break(at("10:15")).unwrap();
        assert!(matches!(rec.end_break(at("10:20")), Err(HrError::State(_))));

        rec.check_out(at("17:00"), &Origin::default()).unwrap();
        assert!(matches!(rec.start_break(at("17:05")), Err(HrError::State(_))));
    }

    #[test]
    fn new_break_replaces_finished_one() {
        let mut rec = fresh();
        rec.check_in(at("09:00"), &Origin::default()).unwrap();
        rec.start_break(at("10:00")).unwrap();
        rec.end_break(at("10:15")).unwrap();
        rec.start_break(at("13:00")).unwrap();
        assert_eq!(rec.break_start_time, Some(t("13:00")));
        assert_eq!(rec.break_end_time, None);
    }

    #[test]
    fn origin_only_overwrites_supplied_fields() {
        let mut rec = fresh();
        let origin = Origin {
            ip_address: Some("10.0.0.1".into()),
            location: Some("HQ".into()),
        };
        rec.check_in(at("09:00"), &origin).unwrap();
        let out = Origin {
            ip_address: Some("10.0.0.2".into()),
            location: None,
        };
        rec.check_out(at("17:00"), &out).unwrap();
        assert_eq!(rec.ip_address.as_deref(), Some("10.0.0.2"));
        assert_eq!(rec.location.as_deref(), Some("HQ"));
    }

    #[test]
    fn correction_recomputes_when_both_ends_known() {
        let mut rec = fresh();
        rec.apply_correction(
            AttendanceCorrection {
                check_in_time: Some(t("09:00")),
                ..Default::default()
            },
            at("18:00"),
        )
        .unwrap();
        assert_eq!(rec.work_hours, 0.0);

        rec.apply_correction(
            AttendanceCorrection {
                status: Some(AttendanceStatus::Late),
                check_out_time: Some(t("16:00")),
                break_start_time: Some(t("12:00")),
                break_end_time: Some(t("13:00")),
                notes: Some("manual fix".into()),
                ..Default::default()
            },
            at("18:00"),
        )
        .unwrap();
        assert_eq!(rec.work_hours, 6.0);
        assert_eq!(rec.status, AttendanceStatus::Late);
        assert_eq!(rec.notes.as_deref(), Some("manual fix"));
    }

    #[test]
    fn corrected_check_out_without_check_in_reports_checked_out() {
        let mut rec = fresh();
        rec.apply_correction(
            AttendanceCorrection {
                check_out_time: Some(t("17:00")),
                ..Default::default()
            },
            at("18:00"),
        )
        .unwrap();
        let err = rec.check_out(at("18:30"), &Origin::default()).unwrap_err();
        assert!(matches!(err, HrError::Conflict(_)));
    }

    #[test]
    fn status_strings_round_trip_through_strum() {
        assert_eq!(AttendanceStatus::HalfDay.to_string(), "HALF_DAY");
        assert_eq!("half_day".parse::<AttendanceStatus>().unwrap(), AttendanceStatus::HalfDay);
        assert_eq!(
            "sometimes".parse::<AttendanceStatus>(),
            Err(strum::ParseError::VariantNotFound)
        );
    }
}
