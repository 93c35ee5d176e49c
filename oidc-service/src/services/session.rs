use crate::models::{AUTH_STATE_VERSION, AuthState, AuthStatePatch};
use crate::services::error::ServiceError;
use crate::services::redis::SessionBackend;
use std::sync::Arc;
use uuid::Uuid;

pub const SESSION_KEY_PREFIX: &str = "session:";
pub const CODE_KEY_PREFIX: &str = "oidc:session_snapshot_by_code:";

fn session_key(session_id: &str) -> String {
    format!("{}{}", SESSION_KEY_PREFIX, session_id)
}

fn code_key(code: &str) -> String {
    format!("{}{}", CODE_KEY_PREFIX, code)
}

/// Tenant-scoped session state persistence.
///
/// Writes are read-merge-write without compare-and-swap: two concurrent
/// writers on one session id race and the later write wins. Accepted for
/// the single-browser-session usage pattern.
#[derive(Clone)]
pub struct SessionService {
    backend: Arc<dyn SessionBackend>,
}

impl SessionService {
    pub fn new(backend: Arc<dyn SessionBackend>) -> Self {
        Self { backend }
    }

    /// Load the session's auth state. Absent sessions read as a fresh
    /// idle envelope. A stored state owned by another tenant fails
    /// closed and leaks nothing.
    #[tracing::instrument(skip(self), fields(session_id = %session_id, tenant_id = %tenant_id))]
    pub async fn get(&self, session_id: &str, tenant_id: &str) -> Result<AuthState, ServiceError> {
        let key = session_key(session_id);
        match self.backend.get(&key).await? {
            None => Ok(AuthState::idle()),
            Some(raw) => {
                let state = decode_state(&raw)?;
                ensure_tenant(&state, tenant_id)?;
                Ok(state)
            }
        }
    }

    /// As `get`, but an absent session is persisted as idle with the
    /// given TTL before returning.
    #[tracing::instrument(skip(self), fields(session_id = %session_id, tenant_id = %tenant_id))]
    pub async fn get_or_create(
        &self,
        session_id: &str,
        tenant_id: &str,
        ttl_seconds: u64,
    ) -> Result<AuthState, ServiceError> {
        let key = session_key(session_id);
        match self.backend.get(&key).await? {
            Some(raw) => {
                let state = decode_state(&raw)?;
                ensure_tenant(&state, tenant_id)?;
                Ok(state)
            }
            None => {
                let state = AuthState::idle();
                let raw = encode_state(&state)?;
                self.backend.set_ex(&key, &raw, ttl_seconds).await?;
                Ok(state)
            }
        }
    }

    /// Shallow-merge a patch over the stored state and persist. Without
    /// an explicit TTL the record's remaining TTL is reused; a record
    /// with none left is expired. Returns the merged state.
    #[tracing::instrument(skip(self, patch), fields(session_id = %session_id))]
    pub async fn set(
        &self,
        session_id: &str,
        patch: AuthStatePatch,
        ttl_seconds: Option<u64>,
    ) -> Result<AuthState, ServiceError> {
        let key = session_key(session_id);
        let existing = match self.backend.get(&key).await? {
            Some(raw) => decode_state(&raw)?,
            None => AuthState::idle(),
        };

        let ttl = match ttl_seconds {
            Some(ttl) => ttl,
            None => {
                let remaining = self.backend.ttl(&key).await?;
                if remaining <= 0 {
                    return Err(ServiceError::SessionExpired);
                }
                remaining as u64
            }
        };

        let merged = existing.merged(patch);
        let raw = encode_state(&merged)?;
        self.backend.set_ex(&key, &raw, ttl).await?;
        Ok(merged)
    }

    /// Snapshot the given state under a fresh authorization code.
    #[tracing::instrument(skip(self, state))]
    pub async fn create_code(
        &self,
        state: &AuthState,
        ttl_seconds: u64,
    ) -> Result<String, ServiceError> {
        let code = Uuid::new_v4().to_string();
        let raw = encode_state(state)?;
        self.backend.set_ex(&code_key(&code), &raw, ttl_seconds).await?;
        tracing::debug!(code = %code, "authorization code issued");
        Ok(code)
    }

    /// Resolve an authorization code to its state snapshot. Redeemed
    /// codes are not deleted; they lapse with their TTL.
    #[tracing::instrument(skip(self, code))]
    pub async fn resolve_code(&self, code: &str) -> Result<AuthState, ServiceError> {
        match self.backend.get(&code_key(code)).await? {
            None => Err(ServiceError::SessionNotFound),
            Some(raw) => decode_state(&raw),
        }
    }

    pub async fn health_check(&self) -> Result<(), anyhow::Error> {
        self.backend.health_check().await
    }
}

fn encode_state(state: &AuthState) -> Result<String, ServiceError> {
    serde_json::to_string(state).map_err(|e| ServiceError::Internal(e.into()))
}

fn decode_state(raw: &str) -> Result<AuthState, ServiceError> {
    let state: AuthState = serde_json::from_str(raw).map_err(|e| {
        tracing::warn!(error = %e, "stored session state failed to parse");
        ServiceError::InvalidSessionState
    })?;
    if state.version != AUTH_STATE_VERSION {
        tracing::warn!(version = state.version, "unknown session state version");
        return Err(ServiceError::InvalidSessionState);
    }
    Ok(state)
}

fn ensure_tenant(state: &AuthState, tenant_id: &str) -> Result<(), ServiceError> {
    match state.auth.tenant_id() {
        Some(owner) if owner != tenant_id => {
            tracing::warn!(
                stored_tenant = %owner,
                requested_tenant = %tenant_id,
                "session presented to a different tenant"
            );
            Err(ServiceError::TenantMismatch)
        }
        _ => Ok(()),
    }
}
