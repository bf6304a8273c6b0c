pub mod attendance;
pub mod leave;

use crate::error::{HrError, HrResult};
use crate::model::employee::EmployeeRef;
use crate::store::EmployeeDirectory;

async fn require_employee<D: EmployeeDirectory>(
    directory: &D,
    employee_id: u64,
) -> HrResult<EmployeeRef> {
    directory
        .find(employee_id)
        .await?
        .ok_or_else(|| HrError::not_found("Employee", employee_id))
}
