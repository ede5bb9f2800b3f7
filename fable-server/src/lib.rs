// Library exports for fable-server
// This allows integration tests to exercise the server modules directly

pub mod ai;
pub mod api;
pub mod config;
pub mod db;
pub mod notify;
pub mod password;
pub mod session;
pub mod state;
