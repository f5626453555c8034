use crate::cmd::reply::Reply;
use crate::cmd::request::Request;
use tokio::sync::{mpsc, oneshot};

pub mod client;
pub mod cmd;
pub mod config;
pub mod db;
pub mod parser;
pub mod server;

pub use client::sorted_set::ScoredSortedSet;
pub use db::error::ZSetError;
pub use db::skiplist::RangeSpec;
pub use db::zset::{Aggregate, Limit, ScoredEntry, ZSet};

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Result<T> = std::result::Result<T, Error>;
pub type MpscSender = mpsc::UnboundedSender<(oneshot::Sender<Result<Reply>>, Request)>;
pub type MpscReceiver = mpsc::UnboundedReceiver<(oneshot::Sender<Result<Reply>>, Request)>;

pub const DEFAULT_PORT: u16 = 8000;
pub const DB_SIZE: usize = 16;
