//! Marketplace Auth Server Library
//!
//! Wallet-based challenge-response authentication for the marketplace API.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod time_source;
