//! Token value types: the shared application token, user tokens, and the redacting secret.

pub mod app;
pub mod secret;
pub mod user;
