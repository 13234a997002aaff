pub mod google;
pub mod jwt;

pub use google::{GoogleIdentity, GoogleTokenVerifier, JwksGoogleVerifier};
pub use jwt::{
    Claims, TokenKind, TokenService, TokenUser, DEFAULT_ACCESS_TOKEN_VALIDITY_SECS,
    DEFAULT_REFRESH_TOKEN_VALIDITY_SECS,
};
