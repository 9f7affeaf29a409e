// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid item status transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Unknown setting: {0}")]
    UnknownSetting(String),

    #[error("Invalid value for setting '{key}': {reason}")]
    InvalidSettingValue { key: String, reason: String },
}

pub type Result<T> = std::result::Result<T, DomainError>;
