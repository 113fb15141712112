pub mod claims;
pub mod token;

pub use claims::{AuthContext, AuthFailure, TokenError};
pub use token::TokenAuthenticator;
