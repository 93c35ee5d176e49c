//! Services layer for the OIDC authorization service.
//!
//! Session persistence, the auth state machine's storage contract,
//! credential providers and token issuance.

pub mod error;
pub mod providers;
pub mod redis;
pub mod session;
pub mod token;

pub use error::ServiceError;
pub use providers::{CredentialCheck, CredentialProvider, ProviderRegistry};
pub use redis::{MockSessionBackend, RedisService, SessionBackend};
pub use session::SessionService;
pub use token::{IssuedTokens, TokenService};
