// Utility modules for the PetsQRCode backend

pub mod action_failure;
pub mod api_response;
pub mod due_date;
pub mod service_error;
pub mod validation;

pub use action_failure::ActionFailure;
pub use api_response::ApiResponse;
pub use due_date::{months_for_label, next_due_date};
pub use service_error::{ErrorDetail, ServiceError, ServiceResult, PET_ACCESS_DENIED};
pub use validation::{
    is_plausible_email, missing_fields, require_fields, require_id, trim_and_validate_field,
    trim_optional_field,
};
