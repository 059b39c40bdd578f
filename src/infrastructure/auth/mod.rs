//! Authentication infrastructure module
//!
//! Session tokens issued after an external sign-in.

mod jwt;

pub use jwt::{JwtClaims, JwtConfig, JwtGenerator, JwtService};
