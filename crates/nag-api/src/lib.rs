pub mod auth;
pub mod credentials;
pub mod error;
pub mod groups;
pub mod middleware;
pub mod policy;
pub mod reminders;
pub mod router;
pub mod token;
mod views;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;
pub use router::router;
