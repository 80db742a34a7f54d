//! `dentiva-auth` — JWT validation for the HTTP surface.
//!
//! Claims validation is deterministic (explicit `now`), signature
//! verification is HS256 via `jsonwebtoken`.

pub mod claims;
pub mod validator;

pub use claims::{JwtClaims, Principal, TokenValidationError, validate_claims};
pub use validator::{Hs256JwtValidator, JwtValidator};
