pub mod client;
pub mod config;
pub mod error;
pub mod future;
pub mod sorted_set;
