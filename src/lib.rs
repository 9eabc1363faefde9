pub mod config;
pub mod database;
mod header_tools;
mod ip_pattern;
pub mod loader;
pub mod lookup;
pub mod non_zero_duration;
pub mod service;
