use crate::client::future::RFuture;
use crate::cmd::reply::Reply;
use crate::cmd::request::Request;
use crate::cmd::zset::SortedCmd;
use crate::db::skiplist::RangeSpec;
use crate::db::zset::{Aggregate, Limit, ScoredEntry};
use bytes::Bytes;

/// Asynchronous handle to one named sorted set.
///
/// Every method queues its command before returning and hands back an
/// [`RFuture`]. Commands sent through the same handle (or any clone of it)
/// are executed in submission order. The handle works the same over a
/// local [`DbHandler`](crate::db::db_engine::DbHandler) or a remote
/// [`Client`](crate::client::client::Client) dispatcher.
#[derive(Debug, Clone)]
pub struct ScoredSortedSet {
    name: String,
    sender: crate::MpscSender,
}

fn members<I, M>(members: I) -> Vec<Bytes>
where
    I: IntoIterator<Item = M>,
    M: Into<Bytes>,
{
    members.into_iter().map(Into::into).collect()
}

fn as_usize(reply: Reply) -> crate::Result<usize> {
    Ok(reply.into_int()?.max(0) as usize)
}

fn as_opt_usize(reply: Reply) -> crate::Result<Option<usize>> {
    Ok(reply.into_opt_int()?.map(|n| n.max(0) as usize))
}

impl ScoredSortedSet {
    pub fn new(name: impl Into<String>, sender: crate::MpscSender) -> Self {
        Self {
            name: name.into(),
            sender,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn key(&self) -> String {
        self.name.clone()
    }

    fn submit<T>(&self, cmd: SortedCmd, decode: fn(Reply) -> crate::Result<T>) -> RFuture<T> {
        RFuture::submit(&self.sender, Request::new(cmd), decode)
    }

    /// Adds or updates `member`; resolves to true when it was new.
    pub fn add(&self, score: f64, member: impl Into<Bytes>) -> RFuture<bool> {
        let entries = vec![ScoredEntry::new(member, score)];
        self.submit(SortedCmd::ZAdd { key: self.key(), nx: false, entries }, |r| Ok(r.into_int()? == 1))
    }

    /// Adds `member` only if absent; resolves to true when it was added.
    pub fn try_add(&self, score: f64, member: impl Into<Bytes>) -> RFuture<bool> {
        let entries = vec![ScoredEntry::new(member, score)];
        self.submit(SortedCmd::ZAdd { key: self.key(), nx: true, entries }, |r| Ok(r.into_int()? == 1))
    }

    /// Adds or updates every pair; resolves to the number of new members.
    pub fn add_all<I, M>(&self, entries: I) -> RFuture<usize>
    where
        I: IntoIterator<Item = (M, f64)>,
        M: Into<Bytes>,
    {
        let entries: Vec<ScoredEntry> = entries
            .into_iter()
            .map(|(member, score)| ScoredEntry::new(member, score))
            .collect();
        if entries.is_empty() {
            return RFuture::ready(Reply::Integer(0), as_usize);
        }
        self.submit(SortedCmd::ZAdd { key: self.key(), nx: false, entries }, as_usize)
    }

    /// Adds `delta` to the score of `member` and resolves to the new score.
    pub fn add_score(&self, member: impl Into<Bytes>, delta: f64) -> RFuture<f64> {
        let cmd = SortedCmd::ZIncrBy {
            key: self.key(),
            delta,
            member: member.into(),
        };
        self.submit(cmd, Reply::into_double)
    }

    pub fn remove(&self, member: impl Into<Bytes>) -> RFuture<bool> {
        let cmd = SortedCmd::ZRem {
            key: self.key(),
            members: vec![member.into()],
        };
        self.submit(cmd, |r| Ok(r.into_int()? > 0))
    }

    /// Resolves to true when at least one member was removed.
    pub fn remove_all<I, M>(&self, values: I) -> RFuture<bool>
    where
        I: IntoIterator<Item = M>,
        M: Into<Bytes>,
    {
        let cmd = SortedCmd::ZRem {
            key: self.key(),
            members: members(values),
        };
        self.submit(cmd, |r| Ok(r.into_int()? > 0))
    }

    /// Keeps only the given members; resolves to true when the set changed.
    pub fn retain_all<I, M>(&self, values: I) -> RFuture<bool>
    where
        I: IntoIterator<Item = M>,
        M: Into<Bytes>,
    {
        let cmd = SortedCmd::ZRetain {
            key: self.key(),
            members: members(values),
        };
        self.submit(cmd, Reply::into_bool)
    }

    pub fn remove_range_by_rank(&self, start_index: i64, end_index: i64) -> RFuture<usize> {
        let cmd = SortedCmd::ZRemRangeByRank {
            key: self.key(),
            start: start_index,
            stop: end_index,
        };
        self.submit(cmd, as_usize)
    }

    pub fn remove_range_by_score(
        &self,
        start_score: f64,
        start_inclusive: bool,
        end_score: f64,
        end_inclusive: bool,
    ) -> RFuture<usize> {
        let cmd = SortedCmd::ZRemRangeByScore {
            key: self.key(),
            range: RangeSpec::new(start_score, start_inclusive, end_score, end_inclusive),
        };
        self.submit(cmd, as_usize)
    }

    pub fn rank(&self, member: impl Into<Bytes>) -> RFuture<Option<usize>> {
        let cmd = SortedCmd::ZRank {
            key: self.key(),
            member: member.into(),
        };
        self.submit(cmd, as_opt_usize)
    }

    pub fn rev_rank(&self, member: impl Into<Bytes>) -> RFuture<Option<usize>> {
        let cmd = SortedCmd::ZRevRank {
            key: self.key(),
            member: member.into(),
        };
        self.submit(cmd, as_opt_usize)
    }

    pub fn get_score(&self, member: impl Into<Bytes>) -> RFuture<Option<f64>> {
        let cmd = SortedCmd::ZScore {
            key: self.key(),
            member: member.into(),
        };
        self.submit(cmd, Reply::into_opt_double)
    }

    pub fn first(&self) -> RFuture<Option<Bytes>> {
        self.submit(SortedCmd::ZFirst { key: self.key() }, Reply::into_opt_member)
    }

    pub fn last(&self) -> RFuture<Option<Bytes>> {
        self.submit(SortedCmd::ZLast { key: self.key() }, Reply::into_opt_member)
    }

    pub fn poll_first(&self) -> RFuture<Option<Bytes>> {
        self.submit(SortedCmd::ZPopMin { key: self.key() }, Reply::into_opt_member)
    }

    pub fn poll_last(&self) -> RFuture<Option<Bytes>> {
        self.submit(SortedCmd::ZPopMax { key: self.key() }, Reply::into_opt_member)
    }

    pub fn size(&self) -> RFuture<usize> {
        self.submit(SortedCmd::ZCard { key: self.key() }, as_usize)
    }

    pub fn contains(&self, member: impl Into<Bytes>) -> RFuture<bool> {
        let cmd = SortedCmd::ZScore {
            key: self.key(),
            member: member.into(),
        };
        self.submit(cmd, |r| Ok(r.into_opt_double()?.is_some()))
    }

    pub fn contains_all<I, M>(&self, values: I) -> RFuture<bool>
    where
        I: IntoIterator<Item = M>,
        M: Into<Bytes>,
    {
        let cmd = SortedCmd::ZMScore {
            key: self.key(),
            members: members(values),
        };
        self.submit(cmd, |r| Ok(r.into_scores()?.iter().all(Option::is_some)))
    }

    fn rank_range(&self, start: i64, stop: i64, reverse: bool, with_scores: bool) -> SortedCmd {
        SortedCmd::ZRange {
            key: self.key(),
            start,
            stop,
            reverse,
            with_scores,
        }
    }

    /// Members ranked in `[start_index, end_index]`; negative indexes count
    /// from the end.
    pub fn value_range(&self, start_index: i64, end_index: i64) -> RFuture<Vec<Bytes>> {
        self.submit(self.rank_range(start_index, end_index, false, false), Reply::into_members)
    }

    pub fn value_range_reversed(&self, start_index: i64, end_index: i64) -> RFuture<Vec<Bytes>> {
        self.submit(self.rank_range(start_index, end_index, true, false), Reply::into_members)
    }

    pub fn entry_range(&self, start_index: i64, end_index: i64) -> RFuture<Vec<ScoredEntry>> {
        self.submit(self.rank_range(start_index, end_index, false, true), Reply::into_entries)
    }

    pub fn entry_range_reversed(&self, start_index: i64, end_index: i64) -> RFuture<Vec<ScoredEntry>> {
        self.submit(self.rank_range(start_index, end_index, true, true), Reply::into_entries)
    }

    fn score_range(&self, range: RangeSpec, reverse: bool, with_scores: bool, limit: Option<Limit>) -> SortedCmd {
        SortedCmd::ZRangeByScore {
            key: self.key(),
            range,
            reverse,
            with_scores,
            limit,
        }
    }

    pub fn value_range_by_score(
        &self,
        start_score: f64,
        start_inclusive: bool,
        end_score: f64,
        end_inclusive: bool,
    ) -> RFuture<Vec<Bytes>> {
        let range = RangeSpec::new(start_score, start_inclusive, end_score, end_inclusive);
        self.submit(self.score_range(range, false, false, None), Reply::into_members)
    }

    pub fn value_range_by_score_reversed(
        &self,
        start_score: f64,
        start_inclusive: bool,
        end_score: f64,
        end_inclusive: bool,
    ) -> RFuture<Vec<Bytes>> {
        let range = RangeSpec::new(start_score, start_inclusive, end_score, end_inclusive);
        self.submit(self.score_range(range, true, false, None), Reply::into_members)
    }

    pub fn entry_range_by_score(
        &self,
        start_score: f64,
        start_inclusive: bool,
        end_score: f64,
        end_inclusive: bool,
    ) -> RFuture<Vec<ScoredEntry>> {
        let range = RangeSpec::new(start_score, start_inclusive, end_score, end_inclusive);
        self.submit(self.score_range(range, false, true, None), Reply::into_entries)
    }

    pub fn entry_range_by_score_reversed(
        &self,
        start_score: f64,
        start_inclusive: bool,
        end_score: f64,
        end_inclusive: bool,
    ) -> RFuture<Vec<ScoredEntry>> {
        let range = RangeSpec::new(start_score, start_inclusive, end_score, end_inclusive);
        self.submit(self.score_range(range, true, true, None), Reply::into_entries)
    }

    /// Score range query paginated after filtering: skips `offset` matches
    /// and returns at most `count` (`-1` for no limit).
    pub fn value_range_by_score_limit(
        &self,
        start_score: f64,
        start_inclusive: bool,
        end_score: f64,
        end_inclusive: bool,
        offset: i64,
        count: i64,
    ) -> RFuture<Vec<Bytes>> {
        let range = RangeSpec::new(start_score, start_inclusive, end_score, end_inclusive);
        let limit = Some(Limit::new(offset, count));
        self.submit(self.score_range(range, false, false, limit), Reply::into_members)
    }

    pub fn value_range_by_score_reversed_limit(
        &self,
        start_score: f64,
        start_inclusive: bool,
        end_score: f64,
        end_inclusive: bool,
        offset: i64,
        count: i64,
    ) -> RFuture<Vec<Bytes>> {
        let range = RangeSpec::new(start_score, start_inclusive, end_score, end_inclusive);
        let limit = Some(Limit::new(offset, count));
        self.submit(self.score_range(range, true, false, limit), Reply::into_members)
    }

    pub fn entry_range_by_score_limit(
        &self,
        start_score: f64,
        start_inclusive: bool,
        end_score: f64,
        end_inclusive: bool,
        offset: i64,
        count: i64,
    ) -> RFuture<Vec<ScoredEntry>> {
        let range = RangeSpec::new(start_score, start_inclusive, end_score, end_inclusive);
        let limit = Some(Limit::new(offset, count));
        self.submit(self.score_range(range, false, true, limit), Reply::into_entries)
    }

    pub fn entry_range_by_score_reversed_limit(
        &self,
        start_score: f64,
        start_inclusive: bool,
        end_score: f64,
        end_inclusive: bool,
        offset: i64,
        count: i64,
    ) -> RFuture<Vec<ScoredEntry>> {
        let range = RangeSpec::new(start_score, start_inclusive, end_score, end_inclusive);
        let limit = Some(Limit::new(offset, count));
        self.submit(self.score_range(range, true, true, limit), Reply::into_entries)
    }

    /// Number of members with a score inside the bounds.
    pub fn count(
        &self,
        start_score: f64,
        start_inclusive: bool,
        end_score: f64,
        end_inclusive: bool,
    ) -> RFuture<usize> {
        let cmd = SortedCmd::ZCount {
            key: self.key(),
            range: RangeSpec::new(start_score, start_inclusive, end_score, end_inclusive),
        };
        self.submit(cmd, as_usize)
    }

    /// Every member, in no particular order.
    pub fn read_all(&self) -> RFuture<Vec<Bytes>> {
        self.submit(SortedCmd::ZMembers { key: self.key() }, Reply::into_members)
    }

    /// Replaces this set with the intersection of `names`, each weighted 1.
    pub fn intersection<I, S>(&self, names: I) -> RFuture<usize>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.intersection_with(Aggregate::Sum, names.into_iter().map(|name| (name, 1.0)))
    }

    /// Replaces this set with the weighted intersection of the named sets.
    /// Resolves to the size of the result.
    pub fn intersection_with<I, S>(&self, aggregate: Aggregate, names_with_weight: I) -> RFuture<usize>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let cmd = SortedCmd::ZInterStore {
            dest: self.key(),
            inputs: names_with_weight.into_iter().map(|(name, w)| (name.into(), w)).collect(),
            aggregate,
        };
        self.submit(cmd, as_usize)
    }

    /// Replaces this set with the union of `names`, each weighted 1.
    pub fn union<I, S>(&self, names: I) -> RFuture<usize>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.union_with(Aggregate::Sum, names.into_iter().map(|name| (name, 1.0)))
    }

    /// Replaces this set with the weighted union of the named sets.
    /// Resolves to the size of the result.
    pub fn union_with<I, S>(&self, aggregate: Aggregate, names_with_weight: I) -> RFuture<usize>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let cmd = SortedCmd::ZUnionStore {
            dest: self.key(),
            inputs: names_with_weight.into_iter().map(|(name, w)| (name.into(), w)).collect(),
            aggregate,
        };
        self.submit(cmd, as_usize)
    }

    /// Drops the whole set; resolves to true when it existed.
    pub fn delete(&self) -> RFuture<bool> {
        self.submit(SortedCmd::Del { key: self.key() }, Reply::into_bool)
    }
}
