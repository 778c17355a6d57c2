//! Authentication: token issuance and the bearer gate.

pub mod gate;
pub mod token;

pub use gate::{AuthErrorBody, AuthRejection, AuthenticatedUser};
pub use token::{Claims, TOKEN_LIFETIME_SECONDS, TokenError, TokenService};
