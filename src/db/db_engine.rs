use crate::client::sorted_set::ScoredSortedSet;
use crate::db::db::RedisDb;
use tokio::sync::mpsc;

/// Owns the request channels of the running databases. Each database is
/// driven by its own task, spawned on creation.
#[derive(Debug, Clone)]
pub struct DbHandler {
    sender: Vec<crate::MpscSender>,
}

impl DbHandler {
    /// Must be called from within a tokio runtime.
    pub fn new(db_num: usize) -> Self {
        let mut sender_list = Vec::with_capacity(db_num);
        for i in 0..db_num {
            let (sender, receiver) = mpsc::unbounded_channel();
            let db = RedisDb::create(i);
            tokio::spawn(db.run(receiver));
            sender_list.push(sender);
        }

        Self {
            sender: sender_list,
        }
    }

    pub fn get_sender(&self, idx: usize) -> Option<crate::MpscSender> {
        self.sender.get(idx).cloned()
    }

    pub fn get_size(&self) -> usize {
        self.sender.len()
    }

    /// Facade over the sorted set `name` in database `idx`.
    pub fn sorted_set(&self, idx: usize, name: impl Into<String>) -> Option<ScoredSortedSet> {
        self.get_sender(idx).map(|sender| ScoredSortedSet::new(name, sender))
    }
}
