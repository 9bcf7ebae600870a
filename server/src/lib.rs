pub mod cache;
pub mod config;
pub mod db;
pub mod http;
pub mod source;
pub mod store;

pub mod error;
pub mod time;
