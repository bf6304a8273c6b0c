use crate::api::{Attendances, optional_range, peer_ip};
use crate::auth::auth::AuthUser;
use crate::model::DateRange;
use crate::model::attendance::{Attendance, AttendanceCorrection, AttendanceStatus, Origin};
use actix_web::{HttpRequest, HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct AttendanceAction {
    /// Defaults to the caller's own employee record
    #[schema(example = 1000)]
    pub employee_id: Option<u64>,
    #[schema(example = "10.0.0.12")]
    pub ip_address: Option<String>,
    #[schema(example = "HQ, floor 3")]
    pub location: Option<String>,
}

impl AttendanceAction {
    fn origin(&self, req: &HttpRequest) -> Origin {
        Origin {
            ip_address: self.ip_address.clone().or_else(|| peer_ip(req)),
            location: self.location.clone(),
        }
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AttendanceRangeQuery {
    /// First day, inclusive
    #[param(value_type = String, format = Date, example = "2026-01-01")]
    pub start_date: NaiveDate,
    /// Last day, inclusive
    #[param(value_type = String, format = Date, example = "2026-01-31")]
    pub end_date: NaiveDate,
    /// Restrict to members of one department
    #[param(example = 2)]
    pub department_id: Option<u64>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmployeeAttendanceQuery {
    #[param(value_type = Option<String>, format = Date, example = "2026-01-01")]
    pub start_date: Option<NaiveDate>,
    #[param(value_type = Option<String>, format = Date, example = "2026-01-31")]
    pub end_date: Option<NaiveDate>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AttendanceCountQuery {
    #[param(value_type = String, example = "PRESENT")]
    #[serde(deserialize_with = "crate::api::any_case::deserialize")]
    pub status: AttendanceStatus,
    #[param(value_type = String, format = Date, example = "2026-01-01")]
    pub start_date: NaiveDate,
    #[param(value_type = String, format = Date, example = "2026-01-31")]
    pub end_date: NaiveDate,
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body(content = AttendanceAction, content_type = "application/json"),
    responses(
        (status = 201, description = "Checked in successfully", body = Attendance),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Already checked in today", body = Object, example = json!({
            "message": "Employee has already checked in today",
            "code": "CONFLICT"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    req: HttpRequest,
    service: web::Data<Attendances>,
    payload: web::Json<AttendanceAction>,
) -> actix_web::Result<HttpResponse> {
    let employee_id = match payload.employee_id {
        Some(id) => id,
        None => auth.require_employee_id()?,
    };
    auth.require_self_or_hr(employee_id)?;

    let record = service
        .check_in(employee_id, payload.origin(&req))
        .await?;
    Ok(HttpResponse::Created().json(record))
}

/// Check-out endpoint for today's record
#[utoipa::path(
    put,
    path = "/api/attendance",
    request_body(content = AttendanceAction, content_type = "application/json"),
    responses(
        (status = 200, description = "Checked out successfully", body = Attendance),
        (status = 400, description = "Not checked in today", body = Object, example = json!({
            "message": "No check-in record found for today",
            "code": "INVALID_STATE"
        })),
        (status = 409, description = "Already checked out today"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    req: HttpRequest,
    service: web::Data<Attendances>,
    payload: web::Json<AttendanceAction>,
) -> actix_web::Result<HttpResponse> {
    let employee_id = match payload.employee_id {
        Some(id) => id,
        None => auth.require_employee_id()?,
    };
    auth.require_self_or_hr(employee_id)?;

    let record = service
        .check_out(employee_id, payload.origin(&req))
        .await?;
    Ok(HttpResponse::Ok().json(record))
}

#[utoipa::path(
    put,
    path = "/api/attendance/{id}/check-out",
    params(
        ("id" = u64, Path, description = "Attendance record id")
    ),
    request_body(content = Origin, content_type = "application/json"),
    responses(
        (status = 200, description = "Checked out successfully", body = Attendance),
        (status = 400, description = "Not checked in"),
        (status = 404, description = "Attendance not found"),
        (status = 409, description = "Already checked out")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out_record(
    auth: AuthUser,
    req: HttpRequest,
    service: web::Data<Attendances>,
    path: web::Path<u64>,
    payload: web::Json<Origin>,
) -> actix_web::Result<HttpResponse> {
    let id = path.into_inner();
    let current = service.get_attendance(id).await?;
    auth.require_self_or_hr(current.employee_id)?;

    let mut origin = payload.into_inner();
    if origin.ip_address.is_none() {
        origin.ip_address = peer_ip(&req);
    }

    let record = service.check_out_record(id, origin).await?;
    Ok(HttpResponse::Ok().json(record))
}

#[utoipa::path(
    put,
    path = "/api/attendance/employee/{employee_id}/start-break",
    params(
        ("employee_id" = u64, Path, description = "Employee id")
    ),
    responses(
        (status = 200, description = "Break started", body = Attendance),
        (status = 400, description = "Not checked in, already checked out or already on break")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn start_break(
    auth: AuthUser,
    service: web::Data<Attendances>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    let employee_id = path.into_inner();
    auth.require_self_or_hr(employee_id)?;

    let record = service.start_break(employee_id).await?;
    Ok(HttpResponse::Ok().json(record))
}

#[utoipa::path(
    put,
    path = "/api/attendance/employee/{employee_id}/end-break",
    params(
        ("employee_id" = u64, Path, description = "Employee id")
    ),
    responses(
        (status = 200, description = "Break ended", body = Attendance),
        (status = 400, description = "No open break")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn end_break(
    auth: AuthUser,
    service: web::Data<Attendances>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    let employee_id = path.into_inner();
    auth.require_self_or_hr(employee_id)?;

    let record = service.end_break(employee_id).await?;
    Ok(HttpResponse::Ok().json(record))
}

#[utoipa::path(
    get,
    path = "/api/attendance/{id}",
    params(
        ("id" = u64, Path, description = "Attendance record id")
    ),
    responses(
        (status = 200, description = "Attendance found", body = Attendance),
        (status = 404, description = "Attendance not found", body = Object, example = json!({
            "message": "Attendance not found with id: 7",
            "code": "NOT_FOUND"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn get_attendance(
    auth: AuthUser,
    service: web::Data<Attendances>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    let record = service.get_attendance(path.into_inner()).await?;
    auth.require_self_or_manager(record.employee_id)?;
    Ok(HttpResponse::Ok().json(record))
}

/// Administrative correction (HR/Admin)
#[utoipa::path(
    put,
    path = "/api/attendance/{id}",
    params(
        ("id" = u64, Path, description = "Attendance record id")
    ),
    request_body(content = AttendanceCorrection, content_type = "application/json"),
    responses(
        (status = 200, description = "Attendance updated", body = Attendance),
        (status = 400, description = "Invalid correction"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Attendance not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn update_attendance(
    auth: AuthUser,
    service: web::Data<Attendances>,
    path: web::Path<u64>,
    payload: web::Json<AttendanceCorrection>,
) -> actix_web::Result<HttpResponse> {
    auth.require_hr_or_admin()?;

    let record = service
        .update_attendance(path.into_inner(), payload.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(record))
}

#[utoipa::path(
    delete,
    path = "/api/attendance/{id}",
    params(
        ("id" = u64, Path, description = "Attendance record id")
    ),
    responses(
        (status = 204, description = "Attendance deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Attendance not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn delete_attendance(
    auth: AuthUser,
    service: web::Data<Attendances>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    auth.require_admin()?;

    service.delete_attendance(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Attendance between two dates, optionally for one department
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceRangeQuery),
    responses(
        (status = 200, description = "Attendance records ordered by date", body = [Attendance]),
        (status = 400, description = "Invalid date range"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    auth: AuthUser,
    service: web::Data<Attendances>,
    query: web::Query<AttendanceRangeQuery>,
) -> actix_web::Result<HttpResponse> {
    auth.require_manager_or_above()?;

    let range = DateRange::new(query.start_date, query.end_date)?;
    let records = match query.department_id {
        Some(department_id) => service.department_attendance(department_id, range).await?,
        None => service.attendance_between(range).await?,
    };
    Ok(HttpResponse::Ok().json(records))
}

#[utoipa::path(
    get,
    path = "/api/attendance/employee/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee id"),
        EmployeeAttendanceQuery
    ),
    responses(
        (status = 200, description = "The employee's attendance", body = [Attendance]),
        (status = 400, description = "Invalid date range")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn employee_attendance(
    auth: AuthUser,
    service: web::Data<Attendances>,
    path: web::Path<u64>,
    query: web::Query<EmployeeAttendanceQuery>,
) -> actix_web::Result<HttpResponse> {
    let employee_id = path.into_inner();
    auth.require_self_or_manager(employee_id)?;

    let range = optional_range(query.start_date, query.end_date)?;
    let records = service.attendance_for_employee(employee_id, range).await?;
    Ok(HttpResponse::Ok().json(records))
}

#[utoipa::path(
    get,
    path = "/api/attendance/employee/{employee_id}/date/{date}",
    params(
        ("employee_id" = u64, Path, description = "Employee id"),
        ("date" = String, Path, description = "Calendar day, YYYY-MM-DD")
    ),
    responses(
        (status = 200, description = "Attendance for that day", body = Attendance),
        (status = 404, description = "No attendance recorded that day")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn attendance_for_day(
    auth: AuthUser,
    service: web::Data<Attendances>,
    path: web::Path<(u64, NaiveDate)>,
) -> actix_web::Result<HttpResponse> {
    let (employee_id, date) = path.into_inner();
    auth.require_self_or_manager(employee_id)?;

    match service.attendance_for_day(employee_id, date).await? {
        Some(record) => Ok(HttpResponse::Ok().json(record)),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "No attendance recorded for this employee and date",
            "code": "NOT_FOUND"
        }))),
    }
}

#[utoipa::path(
    get,
    path = "/api/attendance/employee/{employee_id}/count",
    params(
        ("employee_id" = u64, Path, description = "Employee id"),
        AttendanceCountQuery
    ),
    responses(
        (status = 200, description = "Matching record count", body = Object, example = json!({
            "count": 18
        })),
        (status = 400, description = "Invalid date range")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn count_attendance(
    auth: AuthUser,
    service: web::Data<Attendances>,
    path: web::Path<u64>,
    query: web::Query<AttendanceCountQuery>,
) -> actix_web::Result<HttpResponse> {
    let employee_id = path.into_inner();
    auth.require_self_or_manager(employee_id)?;

    let range = DateRange::new(query.start_date, query.end_date)?;
    let count = service
        .count_by_employee_status_and_date_range(employee_id, query.status, range)
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "count": count })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_query_accepts_any_case_status() {
        let query = web::Query::<AttendanceCountQuery>::from_query(
            "status=half_day&start_date=2024-03-01&end_date=2024-03-31",
        )
        .unwrap();
        assert_eq!(query.status, AttendanceStatus::HalfDay);

        assert!(
            web::Query::<AttendanceCountQuery>::from_query(
                "status=napping&start_date=2024-03-01&end_date=2024-03-31",
            )
            .is_err()
        );
    }
}
