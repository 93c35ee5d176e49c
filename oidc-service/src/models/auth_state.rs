//! Session auth state machine.
//!
//! The state is persisted as a versioned envelope so the wire shape can
//! evolve without breaking live sessions:
//!
//! ```json
//! { "version": 1, "auth": { "step": "initiate_login", "state": { ... } } }
//! ```
//!
//! Transitions are methods on the step payloads, so a step can only be
//! built from a legal predecessor.

use crate::models::user::User;
use serde::{Deserialize, Serialize};

pub const AUTH_STATE_VERSION: u8 = 1;

/// The only PKCE challenge method this service accepts.
pub const CODE_CHALLENGE_METHOD_S256: &str = "S256";

/// Versioned envelope around the auth state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthState {
    pub version: u8,
    pub auth: AuthStateV1,
}

impl AuthState {
    pub fn idle() -> Self {
        Self {
            version: AUTH_STATE_VERSION,
            auth: AuthStateV1::Idle,
        }
    }

    pub fn new(auth: impl Into<AuthStateV1>) -> Self {
        Self {
            version: AUTH_STATE_VERSION,
            auth: auth.into(),
        }
    }

    /// Shallow merge: a patch field that is present replaces the whole
    /// corresponding field of `self`.
    pub fn merged(mut self, patch: AuthStatePatch) -> Self {
        if let Some(version) = patch.version {
            self.version = version;
        }
        if let Some(auth) = patch.auth {
            self.auth = auth;
        }
        self
    }
}

/// Partial envelope used for read-merge-write updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthStatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthStateV1>,
}

impl AuthStatePatch {
    /// Patch that replaces the auth step and pins the current version.
    pub fn step(auth: impl Into<AuthStateV1>) -> Self {
        Self {
            version: Some(AUTH_STATE_VERSION),
            auth: Some(auth.into()),
        }
    }
}

impl From<AuthState> for AuthStatePatch {
    fn from(state: AuthState) -> Self {
        Self {
            version: Some(state.version),
            auth: Some(state.auth),
        }
    }
}

/// Version 1 auth state, tagged by `step` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", content = "state", rename_all = "snake_case")]
pub enum AuthStateV1 {
    Idle,
    InitiateLogin(InitiateLoginState),
    UserIdentified(UserIdentifiedState),
    UserCredsMatch(UserCredsMatchState),
    UserAuthenticated(UserAuthenticatedState),
}

impl AuthStateV1 {
    pub fn is_idle(&self) -> bool {
        matches!(self, AuthStateV1::Idle)
    }

    /// The tenant that owns this state. Idle state belongs to no tenant.
    pub fn tenant_id(&self) -> Option<&str> {
        match self {
            AuthStateV1::Idle => None,
            AuthStateV1::InitiateLogin(s) => Some(&s.tenant_id),
            AuthStateV1::UserIdentified(s) => Some(&s.tenant_id),
            AuthStateV1::UserCredsMatch(s) => Some(&s.tenant_id),
            AuthStateV1::UserAuthenticated(s) => Some(&s.tenant_id),
        }
    }

    pub fn authorize_params(&self) -> Option<&AuthorizeParams> {
        match self {
            AuthStateV1::Idle => None,
            AuthStateV1::InitiateLogin(s) => Some(&s.authorize_params),
            AuthStateV1::UserIdentified(s) => Some(&s.authorize_params),
            AuthStateV1::UserCredsMatch(s) => Some(&s.authorize_params),
            AuthStateV1::UserAuthenticated(s) => Some(&s.authorize_params),
        }
    }

    pub fn step_name(&self) -> &'static str {
        match self {
            AuthStateV1::Idle => "idle",
            AuthStateV1::InitiateLogin(_) => "initiate_login",
            AuthStateV1::UserIdentified(_) => "user_identified",
            AuthStateV1::UserCredsMatch(_) => "user_creds_match",
            AuthStateV1::UserAuthenticated(_) => "user_authenticated",
        }
    }

    /// Replace the authorize params while keeping the current step.
    /// Idle carries no params, so there is nothing to replace there.
    pub fn with_authorize_params(self, params: AuthorizeParams) -> Option<AuthStateV1> {
        match self {
            AuthStateV1::Idle => None,
            AuthStateV1::InitiateLogin(mut s) => {
                s.authorize_params = params;
                Some(AuthStateV1::InitiateLogin(s))
            }
            AuthStateV1::UserIdentified(mut s) => {
                s.authorize_params = params;
                Some(AuthStateV1::UserIdentified(s))
            }
            AuthStateV1::UserCredsMatch(mut s) => {
                s.authorize_params = params;
                Some(AuthStateV1::UserCredsMatch(s))
            }
            AuthStateV1::UserAuthenticated(mut s) => {
                s.authorize_params = params;
                Some(AuthStateV1::UserAuthenticated(s))
            }
        }
    }
}

impl From<InitiateLoginState> for AuthStateV1 {
    fn from(s: InitiateLoginState) -> Self {
        AuthStateV1::InitiateLogin(s)
    }
}

impl From<UserIdentifiedState> for AuthStateV1 {
    fn from(s: UserIdentifiedState) -> Self {
        AuthStateV1::UserIdentified(s)
    }
}

impl From<UserCredsMatchState> for AuthStateV1 {
    fn from(s: UserCredsMatchState) -> Self {
        AuthStateV1::UserCredsMatch(s)
    }
}

impl From<UserAuthenticatedState> for AuthStateV1 {
    fn from(s: UserAuthenticatedState) -> Self {
        AuthStateV1::UserAuthenticated(s)
    }
}

/// Query parameters captured at the authorize endpoint. Keys keep their
/// OAuth wire names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizeParams {
    pub redirect_uri: String,
    pub scope: String,
    pub client_id: String,
    pub code_challenge: String,
    pub code_challenge_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<Prompt>,
}

/// OIDC prompt values the authorize endpoint understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Prompt {
    None,
    Login,
    Consent,
    SelectAccount,
}

impl std::fmt::Display for Prompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // wire names, matching the serde representation
        let name = match self {
            Prompt::None => "none",
            Prompt::Login => "login",
            Prompt::Consent => "consent",
            Prompt::SelectAccount => "select_account",
        };
        f.write_str(name)
    }
}

/// MFA posture attached to a session after credential verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mfa {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub mfa_type: String,
}

impl Mfa {
    pub fn none() -> Self {
        Self {
            enabled: false,
            mfa_type: "none".to_string(),
        }
    }
}

/// Artifacts returned by an upstream provider, kept for audit and
/// debugging. Never surfaced to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum ExternalAuth {
    OauthPasswordGrant { tokens: serde_json::Value },
    Cognito { result: serde_json::Value },
}

// ============ Step payloads ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateLoginState {
    pub authorize_params: AuthorizeParams,
    pub tenant_id: String,
}

impl InitiateLoginState {
    /// Entry point of the login flow. Reachable from idle, from a
    /// restarted flow and from a re-authentication (`prompt=login`).
    pub fn new(authorize_params: AuthorizeParams, tenant_id: impl Into<String>) -> Self {
        Self {
            authorize_params,
            tenant_id: tenant_id.into(),
        }
    }

    /// The user told us who they are, credentials still unverified.
    pub fn user_identified(self, user: User) -> UserIdentifiedState {
        UserIdentifiedState {
            authorize_params: self.authorize_params,
            tenant_id: self.tenant_id,
            user,
        }
    }

    /// Identification and credential verification happened in one step.
    pub fn creds_matched(
        self,
        user: User,
        mfa: Mfa,
        external_auth: Option<ExternalAuth>,
    ) -> UserCredsMatchState {
        UserCredsMatchState {
            authorize_params: self.authorize_params,
            tenant_id: self.tenant_id,
            user,
            mfa,
            external_auth,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentifiedState {
    pub authorize_params: AuthorizeParams,
    pub tenant_id: String,
    pub user: User,
}

impl UserIdentifiedState {
    pub fn creds_matched(
        self,
        mfa: Mfa,
        external_auth: Option<ExternalAuth>,
    ) -> UserCredsMatchState {
        UserCredsMatchState {
            authorize_params: self.authorize_params,
            tenant_id: self.tenant_id,
            user: self.user,
            mfa,
            external_auth,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCredsMatchState {
    pub authorize_params: AuthorizeParams,
    pub tenant_id: String,
    pub user: User,
    pub mfa: Mfa,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_auth: Option<ExternalAuth>,
}

impl UserCredsMatchState {
    /// Promote to the terminal step. The MFA stub reports "not enabled",
    /// so this currently follows a credential match unconditionally.
    pub fn authenticated(self) -> UserAuthenticatedState {
        UserAuthenticatedState {
            authorize_params: self.authorize_params,
            tenant_id: self.tenant_id,
            user: self.user,
            mfa: self.mfa,
            external_auth: self.external_auth,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAuthenticatedState {
    pub authorize_params: AuthorizeParams,
    pub tenant_id: String,
    pub user: User,
    pub mfa: Mfa,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_auth: Option<ExternalAuth>,
}
