//! 입력 형태 오류와 원격 호출 오류 분류.

use thiserror::Error;

use crate::domain::value::{OutOfRange, TypeTag};

pub type Result<T> = std::result::Result<T, CimError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CimError {
    #[error("malformed object path `{input}`: {reason}")]
    MalformedObjectPath { input: String, reason: String },
    #[error("malformed parameter `{token}`: {reason}")]
    MalformedParameter { token: String, reason: String },
    #[error("parameter `{token}`: {reason}")]
    ParameterType { token: String, reason: String },
    #[error("parameter `{token}`: {tag} value {range}")]
    ParameterRange {
        token: String,
        tag: TypeTag,
        range: OutOfRange,
    },
    #[error("operation `{operation}` does not accept `{argument}`")]
    UnexpectedArgument { operation: String, argument: String },
    #[error("{operation} failed: {message}")]
    RemoteOperation { operation: String, message: String },
}

impl CimError {
    pub fn malformed_path(input: &str, reason: impl Into<String>) -> Self {
        CimError::MalformedObjectPath {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    /// 원격 호출 전에 잡히는 입력 형태 오류인지 여부.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, CimError::RemoteOperation { .. })
    }
}
