//! certdesk server - certificate issuance, course catalogue and public
//! validation over HTTP.

pub mod assets;
pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod extract;
pub mod identity;
pub mod issuance;
pub mod models;
pub mod routes;
pub mod state;
pub mod storage;

pub use error::AppError;
pub use routes::create_router;
pub use state::AppState;
