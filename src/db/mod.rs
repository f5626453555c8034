pub mod db;
pub mod db_engine;
pub mod error;
pub mod skiplist;
pub mod zset;
mod test;
