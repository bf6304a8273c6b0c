use crate::api::Leaves;
use crate::auth::auth::AuthUser;
use crate::model::DateRange;
use crate::model::leave_request::{LeaveDraft, LeaveRequest, LeaveStatus};
use crate::store::LeaveSearch;
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Serialize, ToSchema)]
#[schema(example = json!({
    "data": [
        {
            "id": 1,
            "employee_id": 1000,
            "leave_type": "SICK",
            "start_date": "2026-01-01",
            "end_date": "2026-01-03",
            "number_of_days": 3,
            "reason": "Flu",
            "status": "PENDING",
            "approved_by": null,
            "approved_at": null,
            "comments": null,
            "created_at": "2026-01-01T00:00:00",
            "updated_at": null
        }
    ],
    "page": 1,
    "per_page": 10,
    "total": 1
}))]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: i64,
}

#[derive(Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct LeaveFilter {
    #[schema(example = 123)]
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    #[schema(example = "PENDING", value_type = Option<String>)]
    /// Filter by leave status
    #[serde(default, deserialize_with = "crate::api::any_case::option::deserialize")]
    pub status: Option<LeaveStatus>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>, // 1-based
    #[schema(example = 10)]
    /// Pagination per page number, at most 100
    pub per_page: Option<u64>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    /// Defaults to the caller's own employee record
    #[schema(example = 1000)]
    pub employee_id: Option<u64>,
    #[serde(flatten)]
    pub draft: LeaveDraft,
}

#[derive(Deserialize, ToSchema)]
pub struct ReviewLeave {
    #[schema(example = "Enjoy the trip")]
    pub comments: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaveRangeQuery {
    #[param(value_type = String, format = Date, example = "2026-01-01")]
    pub start_date: NaiveDate,
    #[param(value_type = String, format = Date, example = "2026-01-31")]
    pub end_date: NaiveDate,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaveStatusQuery {
    #[param(value_type = Option<String>, example = "APPROVED")]
    #[serde(default, deserialize_with = "crate::api::any_case::option::deserialize")]
    pub status: Option<LeaveStatus>,
}

#[derive(Deserialize)]
pub struct StatusPath {
    #[serde(deserialize_with = "crate::api::any_case::deserialize")]
    status: LeaveStatus,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaveCountQuery {
    #[param(value_type = String, example = "APPROVED")]
    #[serde(deserialize_with = "crate::api::any_case::deserialize")]
    pub status: LeaveStatus,
    #[param(value_type = String, format = Date, example = "2026-01-01")]
    pub start_date: NaiveDate,
    #[param(value_type = String, format = Date, example = "2026-12-31")]
    pub end_date: NaiveDate,
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveRequest),
        (status = 400, description = "Bad request", body = Object, example = json!({
            "message": "start date cannot be after end date",
            "field": "start_date",
            "code": "VALIDATION_ERROR"
        })),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Overlapping leave", body = Object, example = json!({
            "message": "Employee already has leave scheduled during this period",
            "code": "CONFLICT"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    service: web::Data<Leaves>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<HttpResponse> {
    let CreateLeave { employee_id, draft } = payload.into_inner();
    let employee_id = match employee_id {
        Some(id) => id,
        None => auth.require_employee_id()?,
    };
    auth.require_self_or_hr(employee_id)?;

    let leave = service.create_leave(employee_id, draft).await?;
    Ok(HttpResponse::Created().json(leave))
}

/* =========================
Reschedule a pending request
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to update")
    ),
    request_body(content = LeaveDraft, content_type = "application/json"),
    responses(
        (status = 200, description = "Leave updated", body = LeaveRequest),
        (status = 400, description = "Not pending or invalid dates"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Overlapping leave")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn update_leave(
    auth: AuthUser,
    service: web::Data<Leaves>,
    path: web::Path<u64>,
    payload: web::Json<LeaveDraft>,
) -> actix_web::Result<HttpResponse> {
    let leave_id = path.into_inner();
    let current = service.get_leave(leave_id).await?;
    auth.require_self_or_hr(current.employee_id)?;

    let leave = service.update_leave(leave_id, payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(leave))
}

/* =========================
Approve leave (Manager/HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    request_body(content = ReviewLeave, content_type = "application/json"),
    responses(
        (status = 200, description = "Leave approved successfully", body = LeaveRequest),
        (status = 400, description = "Leave request already processed", body = Object, example = json!({
            "message": "Cannot approve leave that is not in PENDING status",
            "code": "INVALID_STATE"
        })),
        (status = 404, description = "Leave request or approver not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    service: web::Data<Leaves>,
    path: web::Path<u64>,
    payload: web::Json<ReviewLeave>,
) -> actix_web::Result<HttpResponse> {
    auth.require_manager_or_above()?;
    let approver_id = auth.require_employee_id()?;

    let leave = service
        .approve_leave(path.into_inner(), approver_id, payload.into_inner().comments)
        .await?;
    Ok(HttpResponse::Ok().json(leave))
}

/* =========================
Reject leave (Manager/HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    request_body(content = ReviewLeave, content_type = "application/json"),
    responses(
        (status = 200, description = "Leave rejected successfully", body = LeaveRequest),
        (status = 400, description = "Leave request already processed", body = Object, example = json!({
            "message": "Cannot reject leave that is not in PENDING status",
            "code": "INVALID_STATE"
        })),
        (status = 404, description = "Leave request or approver not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    service: web::Data<Leaves>,
    path: web::Path<u64>,
    payload: web::Json<ReviewLeave>,
) -> actix_web::Result<HttpResponse> {
    auth.require_manager_or_above()?;
    let approver_id = auth.require_employee_id()?;

    let leave = service
        .reject_leave(path.into_inner(), approver_id, payload.into_inner().comments)
        .await?;
    Ok(HttpResponse::Ok().json(leave))
}

#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/cancel",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to cancel")
    ),
    responses(
        (status = 200, description = "Leave cancelled", body = LeaveRequest),
        (status = 400, description = "Already cancelled or taken"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    service: web::Data<Leaves>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    let leave_id = path.into_inner();
    let current = service.get_leave(leave_id).await?;
    auth.require_self_or_hr(current.employee_id)?;

    let leave = service.cancel_leave(leave_id).await?;
    Ok(HttpResponse::Ok().json(leave))
}

#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/taken",
    params(
        ("leave_id" = u64, Path, description = "ID of the approved leave request")
    ),
    responses(
        (status = 200, description = "Leave marked as taken", body = LeaveRequest),
        (status = 400, description = "Leave is not approved"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn mark_taken(
    auth: AuthUser,
    service: web::Data<Leaves>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    auth.require_hr_or_admin()?;

    let leave = service.mark_taken(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(leave))
}

#[utoipa::path(
    delete,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to delete")
    ),
    responses(
        (status = 204, description = "Leave deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn delete_leave(
    auth: AuthUser,
    service: web::Data<Leaves>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    auth.require_admin()?;

    service.delete_leave(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "Leave not found with id: 7",
            "code": "NOT_FOUND"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    service: web::Data<Leaves>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    let leave = service.get_leave(path.into_inner()).await?;
    auth.require_self_or_manager(leave.employee_id)?;
    Ok(HttpResponse::Ok().json(leave))
}

/// for getting leave applications endpoint
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    service: web::Data<Leaves>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<HttpResponse> {
    // employees page through their own requests only
    let employee_id = match auth.require_manager_or_above() {
        Ok(()) => query.employee_id,
        Err(_) => Some(auth.require_employee_id()?),
    };

    let search = LeaveSearch {
        employee_id,
        status: query.status,
        page: query.page,
        per_page: query.per_page,
    };
    let page = service.search_leaves(&search).await?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data: page.data,
        page: page.page,
        per_page: page.per_page,
        total: page.total,
    }))
}

/// Leaves lying entirely inside the range
#[utoipa::path(
    get,
    path = "/api/leave/range",
    params(LeaveRangeQuery),
    responses(
        (status = 200, description = "Leaves within the range", body = [LeaveRequest]),
        (status = 400, description = "Invalid date range"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leaves_in_range(
    auth: AuthUser,
    service: web::Data<Leaves>,
    query: web::Query<LeaveRangeQuery>,
) -> actix_web::Result<HttpResponse> {
    auth.require_manager_or_above()?;

    let range = DateRange::new(query.start_date, query.end_date)?;
    let leaves = service.leaves_within(range).await?;
    Ok(HttpResponse::Ok().json(leaves))
}

#[utoipa::path(
    get,
    path = "/api/leave/status/{status}",
    params(
        ("status" = String, Path, description = "PENDING, APPROVED, REJECTED, CANCELLED or TAKEN, any case")
    ),
    responses(
        (status = 200, description = "Leaves with that status", body = [LeaveRequest]),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Unknown status")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leaves_by_status(
    auth: AuthUser,
    service: web::Data<Leaves>,
    path: web::Path<StatusPath>,
) -> actix_web::Result<HttpResponse> {
    auth.require_manager_or_above()?;

    let leaves = service.leaves_by_status(path.status).await?;
    Ok(HttpResponse::Ok().json(leaves))
}

#[utoipa::path(
    get,
    path = "/api/leave/department/{department_id}",
    params(
        ("department_id" = u64, Path, description = "Department id"),
        LeaveStatusQuery
    ),
    responses(
        (status = 200, description = "Leaves of the department's members", body = [LeaveRequest]),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn department_leaves(
    auth: AuthUser,
    service: web::Data<Leaves>,
    path: web::Path<u64>,
    query: web::Query<LeaveStatusQuery>,
) -> actix_web::Result<HttpResponse> {
    auth.require_manager_or_above()?;

    let leaves = service
        .department_leaves(path.into_inner(), query.status)
        .await?;
    Ok(HttpResponse::Ok().json(leaves))
}

#[utoipa::path(
    get,
    path = "/api/leave/employee/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee id"),
        LeaveStatusQuery
    ),
    responses(
        (status = 200, description = "The employee's leaves", body = [LeaveRequest]),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn employee_leaves(
    auth: AuthUser,
    service: web::Data<Leaves>,
    path: web::Path<u64>,
    query: web::Query<LeaveStatusQuery>,
) -> actix_web::Result<HttpResponse> {
    let employee_id = path.into_inner();
    auth.require_self_or_manager(employee_id)?;

    let leaves = service.leaves_for_employee(employee_id, query.status).await?;
    Ok(HttpResponse::Ok().json(leaves))
}

#[utoipa::path(
    get,
    path = "/api/leave/employee/{employee_id}/count",
    params(
        ("employee_id" = u64, Path, description = "Employee id"),
        LeaveCountQuery
    ),
    responses(
        (status = 200, description = "Number of matching leaves", body = Object, example = json!({
            "count": 2
        })),
        (status = 400, description = "Invalid date range")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn count_leaves(
    auth: AuthUser,
    service: web::Data<Leaves>,
    path: web::Path<u64>,
    query: web::Query<LeaveCountQuery>,
) -> actix_web::Result<HttpResponse> {
    let employee_id = path.into_inner();
    auth.require_self_or_manager(employee_id)?;

    let range = DateRange::new(query.start_date, query.end_date)?;
    let count = service
        .count_by_employee_status_and_date_range(employee_id, query.status, range)
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "count": count })))
}
