pub mod attendance;
pub mod leave_request;

use actix_web::HttpRequest;
use chrono::NaiveDate;

use crate::clock::SystemClock;
use crate::error::{HrError, HrResult};
use crate::model::DateRange;
use crate::service::attendance::AttendanceService;
use crate::service::leave::LeaveService;
use crate::store::attendance::MySqlAttendanceStore;
use crate::store::directory::{CachedDirectory, MySqlEmployeeDirectory};
use crate::store::leave_request::MySqlLeaveStore;

pub type Directory = CachedDirectory<MySqlEmployeeDirectory>;
pub type Attendances = AttendanceService<MySqlAttendanceStore, Directory, SystemClock>;
pub type Leaves = LeaveService<MySqlLeaveStore, Directory, SystemClock>;

/// Both bounds or neither.
fn optional_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> HrResult<Option<DateRange>> {
    match (start, end) {
        (Some(start), Some(end)) => DateRange::new(start, end).map(Some),
        (None, None) => Ok(None),
        (None, Some(_)) => Err(HrError::validation(
            "start_date",
            "start_date is required with end_date",
        )),
        (Some(_), None) => Err(HrError::validation(
            "end_date",
            "end_date is required with start_date",
        )),
    }
}

/// Caller address as seen by the server, used when the client sends none.
fn peer_ip(req: &HttpRequest) -> Option<String> {
    req.connection_info()
        .realip_remote_addr()
        .map(str::to_owned)
}

/// Enum query and path values parsed through the strum `FromStr`, which ignores
/// ASCII case (`pending` and `PENDING` both work).
mod any_case {
    use serde::{Deserialize, Deserializer, de};
    use std::fmt::Display;
    use std::str::FromStr;

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr,
        T::Err: Display,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse()
            .map_err(|e| de::Error::custom(format!("`{raw}`: {e}")))
    }

    pub mod option {
        use super::*;

        pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
        where
            D: Deserializer<'de>,
            T: FromStr,
            T::Err: Display,
        {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => raw
                    .parse()
                    .map(Some)
                    .map_err(|e| de::Error::custom(format!("`{raw}`: {e}"))),
                None => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::date;
    use crate::model::leave_request::LeaveStatus;
    use actix_web::web::Query;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Params {
        #[serde(deserialize_with = "any_case::deserialize")]
        status: LeaveStatus,
        #[serde(default, deserialize_with = "any_case::option::deserialize")]
        other: Option<LeaveStatus>,
    }

    #[test]
    fn enum_params_ignore_case() {
        let p = Query::<Params>::from_query("status=pending&other=Approved").unwrap();
        assert_eq!(p.status, LeaveStatus::Pending);
        assert_eq!(p.other, Some(LeaveStatus::Approved));

        let p = Query::<Params>::from_query("status=TAKEN").unwrap();
        assert_eq!(p.other, None);

        assert!(Query::<Params>::from_query("status=later").is_err());
    }

    #[test]
    fn optional_range_needs_both_ends() {
        assert_eq!(optional_range(None, None).unwrap(), None);
        assert!(optional_range(Some(date("2024-01-01")), None).is_err());
        assert!(optional_range(None, Some(date("2024-01-01"))).is_err());
        let range = optional_range(Some(date("2024-01-01")), Some(date("2024-01-31")))
            .unwrap()
            .unwrap();
        assert_eq!(range.days(), 31);
    }
}
