//! Authentication: argon2 password hashing, HS256 JWTs and the `AuthUser` extractor.

pub mod extractor;
pub mod handlers;
pub mod password;
pub mod token;

pub use extractor::AuthUser;
