//! HTTP API over the submission pipeline
//!
//! - GET /actions - The user's actions, newest first
//! - POST /actions - Log an action (text and/or base64 photo/audio)
//! - POST /actions/refresh - Reload the list from the record store
//! - GET /stats - Points and progress
//! - GET|POST /assistant - Scripted assistant thread
//! - GET /media/* - Uploaded attachments
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
