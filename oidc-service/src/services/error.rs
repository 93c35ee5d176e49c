use service_core::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Token error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Session not found")]
    SessionNotFound,

    #[error("Session expired")]
    SessionExpired,

    #[error("Invalid session state")]
    InvalidSessionState,

    #[error("Tenant mismatch")]
    TenantMismatch,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid code challenge method")]
    InvalidCodeChallengeMethod,

    #[error("Code verifier mismatch")]
    CodeVerifierMismatch,

    #[error("{0}")]
    Upstream(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Redis(e) => AppError::RedisError(e),
            ServiceError::Jwt(e) => AppError::InvalidToken(e),
            ServiceError::Internal(e) => AppError::InternalError(e),
            ServiceError::SessionNotFound => {
                AppError::BadRequest(anyhow::anyhow!("Session not found"))
            }
            ServiceError::SessionExpired => {
                AppError::BadRequest(anyhow::anyhow!("Session expired"))
            }
            ServiceError::InvalidSessionState => {
                AppError::BadRequest(anyhow::anyhow!("Invalid session state"))
            }
            ServiceError::TenantMismatch => AppError::TenantMismatch,
            ServiceError::InvalidCredentials => {
                AppError::Unauthorized(anyhow::anyhow!("Invalid credentials"))
            }
            ServiceError::InvalidCodeChallengeMethod => {
                AppError::BadRequest(anyhow::anyhow!("Invalid code challenge method"))
            }
            ServiceError::CodeVerifierMismatch => {
                AppError::BadRequest(anyhow::anyhow!("Code verifier mismatch"))
            }
            ServiceError::Upstream(msg) => AppError::BadGateway(msg),
        }
    }
}
