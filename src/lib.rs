pub mod app;
pub mod backend;
pub mod breadcrumbs;
pub mod cli;
pub mod client;
pub mod config;
pub mod cookies;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod middleware;
pub mod progress;
pub mod schema;
pub mod session;

#[cfg(test)]
pub mod testing;
