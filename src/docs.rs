use crate::api::attendance::AttendanceAction;
use crate::api::leave_request::{CreateLeave, LeaveFilter, LeaveListResponse, ReviewLeave};
use crate::model::attendance::{Attendance, AttendanceCorrection, AttendanceStatus, Origin};
use crate::model::leave_request::{LeaveDraft, LeaveRequest, LeaveStatus, LeaveType};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Attendance & Leave API",
        version = "1.0.0",
        description = r#"
## Attendance & Leave

Daily attendance tracking and the leave approval workflow of the HRM system.

### 🔹 Key Features
- **Attendance**
  - Check-in, check-out and break tracking for the current day
  - Administrative corrections with automatic work-hour recomputation
  - Range, employee and department views
- **Leave**
  - Apply for leave, reschedule pending requests
  - Approve/reject, cancel, and mark approved leave as taken
  - Paginated, status, range and department views

### 🔐 Security
All endpoints are protected using **JWT Bearer authentication**.
Corrections and deletions require **HR** or **Admin**; reviews accept **Managers** as well.

### 📦 Errors
Failures return `{"message", "code"}` with codes `NOT_FOUND`, `CONFLICT`,
`INVALID_STATE`, `VALIDATION_ERROR` and `INTERNAL`.
"#,
    ),
    paths(
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::update_leave,
        crate::api::leave_request::delete_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::cancel_leave,
        crate::api::leave_request::mark_taken,
        crate::api::leave_request::leaves_in_range,
        crate::api::leave_request::leaves_by_status,
        crate::api::leave_request::department_leaves,
        crate::api::leave_request::employee_leaves,
        crate::api::leave_request::count_leaves,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::check_out_record,
        crate::api::attendance::start_break,
        crate::api::attendance::end_break,
        crate::api::attendance::get_attendance,
        crate::api::attendance::update_attendance,
        crate::api::attendance::delete_attendance,
        crate::api::attendance::list_attendance,
        crate::api::attendance::employee_attendance,
        crate::api::attendance::attendance_for_day,
        crate::api::attendance::count_attendance
    ),
    components(
        schemas(
            LeaveFilter,
            LeaveListResponse,
            LeaveRequest,
            LeaveDraft,
            LeaveType,
            LeaveStatus,
            CreateLeave,
            ReviewLeave,
            Attendance,
            AttendanceStatus,
            AttendanceCorrection,
            AttendanceAction,
            Origin
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Leave management APIs"),
        (name = "Attendance", description = "Attendance management APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
