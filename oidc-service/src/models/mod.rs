pub mod auth_state;
pub mod tenant;
pub mod user;

pub use auth_state::{
    AUTH_STATE_VERSION, AuthState, AuthStatePatch, AuthStateV1, AuthorizeParams,
    CODE_CHALLENGE_METHOD_S256, ExternalAuth, InitiateLoginState, Mfa, Prompt,
    UserAuthenticatedState, UserCredsMatchState, UserIdentifiedState,
};
pub use tenant::{AuthProviderConfig, OidcClient, Tenant, TenantOidcConfig, TenantRegistry, TestUser};
pub use user::User;
