pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod embedded;
pub mod errors;
pub mod filter;
pub mod models;
pub mod server;
pub mod session;
pub mod stats;
pub mod store;
pub mod ws;
