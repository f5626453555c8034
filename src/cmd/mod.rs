pub mod command;
pub mod conn;
pub mod error;
pub mod reply;
pub mod request;
pub mod zset;
