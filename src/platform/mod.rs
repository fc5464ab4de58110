//! Process plumbing shared by the HTTP surface and the relay: configuration,
//! database pool, error envelope, auth middleware and start-up helpers.

pub mod app_error;
pub mod app_state;
pub mod bootstrap;
pub mod config;
pub mod db;
pub mod extract;
pub mod middleware;
pub mod outbox;
pub mod swagger;
