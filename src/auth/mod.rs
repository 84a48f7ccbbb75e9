//! OAuth2 PKCE authorization, token lifecycle and token storage.

pub mod authenticator;
pub mod pkce;
pub mod session;
pub mod store;
pub mod token;

pub use authenticator::{AuthorizationRequest, PkceAuthenticator};
pub use pkce::PkceChallenge;
pub use session::AuthSession;
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use token::TokenInfo;
