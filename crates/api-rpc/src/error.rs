//! RPC Error Types
//!
//! Maps application errors to JSON-RPC error codes.

use jsonrpsee::types::ErrorObjectOwned;
use sendq_core::application::AdmissionError;
use sendq_core::error::AppError;

/// RPC Error Codes
pub mod code {
    pub const VALIDATION_ERROR: i32 = 4000;
    pub const CAPACITY_EXCEEDED: i32 = 4004;
    pub const CONFIRMATION_REQUIRED: i32 = 4005;
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const STORAGE_ERROR: i32 = 5001;
}

/// Convert AppError to JSON-RPC ErrorObject
pub fn to_rpc_error(err: AppError) -> ErrorObjectOwned {
    let code = match &err {
        AppError::Admission(AdmissionError::CapacityExceeded { .. }) => code::CAPACITY_EXCEEDED,
        AppError::Admission(_)
        | AppError::Validation(_)
        | AppError::Domain(_)
        | AppError::Serialization(_) => code::VALIDATION_ERROR,
        AppError::Storage(_) => code::STORAGE_ERROR,
        AppError::Config(_) => code::INTERNAL_ERROR,
    };

    let message = match err {
        // Operator-facing text, without the error-kind prefix
        AppError::Admission(e) => e.to_string(),
        AppError::Domain(e) => e.to_string(),
        other => other.to_string(),
    };

    ErrorObjectOwned::owned(code, message, None::<()>)
}

/// Error for a destructive call made without `confirm: true`
pub fn confirmation_required(what: &str) -> ErrorObjectOwned {
    ErrorObjectOwned::owned(
        code::CONFIRMATION_REQUIRED,
        format!("{} requires confirm: true", what),
        None::<()>,
    )
}
