pub mod connection;
pub mod server;
mod shutdown;
mod test;
