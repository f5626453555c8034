use crate::db::zset::ZSet;
use crate::MpscReceiver;
use std::collections::HashMap;
use tracing::{debug, info};

/// One numbered keyspace of sorted sets. It is owned by a single task
/// (see `run`) so every command against it executes atomically.
#[derive(Default)]
pub struct RedisDb {
    /// The keyspace for this DB
    keys: HashMap<String, ZSet>,
    /// Database ID
    id: usize,
}

impl RedisDb {
    pub fn create(id: usize) -> Self {
        Self {
            keys: HashMap::new(),
            id,
        }
    }

    pub fn find(&self, key: &str) -> Option<&ZSet> {
        self.keys.get(key)
    }

    /// Runs `f` on the set stored at `key`, creating it on demand. A set
    /// left empty afterwards is removed from the keyspace.
    pub fn modify<R>(&mut self, key: &str, f: impl FnOnce(&mut ZSet) -> R) -> R {
        let zset = self.keys.entry(key.to_string()).or_default();
        let result = f(zset);
        if zset.is_empty() {
            self.keys.remove(key);
        }
        result
    }

    /// Stores `zset` at `key`, overwriting what was there. Returns the new
    /// cardinality; an empty set deletes the key.
    pub fn replace(&mut self, key: String, zset: ZSet) -> usize {
        let len = zset.len();
        if zset.is_empty() {
            self.keys.remove(&key);
        } else {
            self.keys.insert(key, zset);
        }
        len
    }

    pub fn delete(&mut self, key: &str) -> bool {
        self.keys.remove(key).is_some()
    }

    pub fn db_size(&self) -> usize {
        self.keys.len()
    }

    /// Serves requests until every sender is dropped. Cancelled requests
    /// are skipped without touching the keyspace.
    pub async fn run(mut self, mut receiver: MpscReceiver) {
        info!(db = self.id, "db started");
        while let Some((reply, request)) = receiver.recv().await {
            if !request.ticket.start() {
                debug!(db = self.id, cmd = request.cmd.name(), "request cancelled");
                continue;
            }
            debug!(db = self.id, cmd = request.cmd.name(), "apply");
            let result = request.cmd.apply(&mut self).map_err(Into::into);
            // the caller may have gone away; the command has still run
            let _ = reply.send(result);
        }
        info!(db = self.id, keys = self.db_size(), "db stopped");
    }
}
