//! Infrastructure layer: repository implementations, services and platform
//! concerns (hashing, tokens, logging, migrations).

pub mod auth;
pub mod logging;
pub mod migrations;
pub mod user;
