//! Who is calling: credentials, tokens and account lifecycle.

mod identity_manager;
mod password;
mod tokens;

pub use identity_manager::{IdentityManager, Registration};
pub use password::CredentialHasher;
pub use tokens::{TokenIssuer, TokenKind, TokenPair};
