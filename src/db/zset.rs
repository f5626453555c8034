use crate::db::error::ZSetError;
use crate::db::skiplist::{Node, RangeSpec, SkipList};
use bytes::Bytes;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;

/// A member together with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredEntry {
    pub member: Bytes,
    pub score: f64,
}

impl ScoredEntry {
    pub fn new(member: impl Into<Bytes>, score: f64) -> Self {
        Self {
            member: member.into(),
            score,
        }
    }
}

impl From<&Node> for ScoredEntry {
    fn from(node: &Node) -> Self {
        Self {
            member: node.elem().clone(),
            score: node.score(),
        }
    }
}

/// How scores of the same member are combined by union and intersection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Aggregate {
    #[default]
    Sum,
    Min,
    Max,
}

impl Aggregate {
    pub fn apply(self, acc: f64, score: f64) -> f64 {
        match self {
            Aggregate::Sum => {
                let sum = acc + score;
                // +inf + -inf
                if sum.is_nan() { 0.0 } else { sum }
            }
            Aggregate::Min => acc.min(score),
            Aggregate::Max => acc.max(score),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregate::Sum => "SUM",
            Aggregate::Min => "MIN",
            Aggregate::Max => "MAX",
        }
    }
}

impl FromStr for Aggregate {
    type Err = ZSetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match &s.to_lowercase()[..] {
            "sum" => Ok(Aggregate::Sum),
            "min" => Ok(Aggregate::Min),
            "max" => Ok(Aggregate::Max),
            _ => Err(ZSetError::InvalidArgument(format!("unknown aggregate '{}'", s))),
        }
    }
}

/// Pagination over a filtered score range. `count == -1` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    pub offset: i64,
    pub count: i64,
}

impl Limit {
    pub fn new(offset: i64, count: i64) -> Self {
        Self { offset, count }
    }

    pub fn validate(&self) -> Result<(), ZSetError> {
        if self.offset < 0 {
            return Err(ZSetError::InvalidArgument(format!("negative offset {}", self.offset)));
        }
        if self.count < -1 {
            return Err(ZSetError::InvalidArgument(format!("negative count {}", self.count)));
        }
        Ok(())
    }

    fn take(&self) -> usize {
        if self.count < 0 {
            usize::MAX
        } else {
            self.count as usize
        }
    }
}

/// Resolves a Redis style inclusive index pair against `len`. Negative
/// indexes count from the end; the result is clamped, and `None` means the
/// range selects nothing.
pub fn normalize_rank_range(start: i64, end: i64, len: usize) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let end = if end < 0 { len + end } else { end.min(len - 1) };
    if start > end || start >= len {
        return None;
    }
    Some((start as usize, end as usize))
}

fn check_score(score: f64) -> Result<f64, ZSetError> {
    if score.is_nan() {
        return Err(ZSetError::InvalidArgument("score is not a valid float".to_string()));
    }
    Ok(score)
}

/// A NaN bound is rejected; every other interval, even an inverted one, is
/// valid and may simply match nothing.
pub fn check_range(range: &RangeSpec) -> Result<(), ZSetError> {
    if range.min.is_nan() || range.max.is_nan() {
        return Err(ZSetError::InvalidArgument("min or max is not a float".to_string()));
    }
    Ok(())
}

fn weighted(score: f64, weight: f64) -> f64 {
    let value = score * weight;
    // 0 * inf
    if value.is_nan() { 0.0 } else { value }
}

/// Sorted set: a member -> score dict for point lookups plus a skiplist
/// ordered by `(score, member)` for rank and range queries. Every mutation
/// keeps both in lockstep.
#[derive(Clone, Default)]
pub struct ZSet {
    dict: HashMap<Bytes, f64>,
    zsl: SkipList,
}

impl ZSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.dict.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dict.is_empty()
    }

    pub fn contains(&self, member: &[u8]) -> bool {
        self.dict.contains_key(member)
    }

    pub fn contains_all(&self, members: &[Bytes]) -> bool {
        members.iter().all(|m| self.dict.contains_key(m))
    }

    pub fn score(&self, member: &[u8]) -> Option<f64> {
        self.dict.get(member).copied()
    }

    /// Inserts or overwrites. Returns true when `member` is new.
    pub fn add(&mut self, score: f64, member: Bytes) -> Result<bool, ZSetError> {
        let score = check_score(score)?;
        Ok(self.upsert(score, member))
    }

    /// Inserts only when `member` is absent.
    pub fn try_add(&mut self, score: f64, member: Bytes) -> Result<bool, ZSetError> {
        self.try_add_all([ScoredEntry { member, score }]).map(|n| n == 1)
    }

    /// Adds every pair; returns how many members were new. All scores are
    /// checked before anything is written.
    pub fn add_all<I>(&mut self, entries: I) -> Result<usize, ZSetError>
    where
        I: IntoIterator<Item = ScoredEntry>,
    {
        self.insert_all(entries, false)
    }

    /// Like `add_all`, but members already present keep their score.
    pub fn try_add_all<I>(&mut self, entries: I) -> Result<usize, ZSetError>
    where
        I: IntoIterator<Item = ScoredEntry>,
    {
        self.insert_all(entries, true)
    }

    fn insert_all<I>(&mut self, entries: I, nx: bool) -> Result<usize, ZSetError>
    where
        I: IntoIterator<Item = ScoredEntry>,
    {
        let entries: Vec<ScoredEntry> = entries.into_iter().collect();
        for entry in &entries {
            check_score(entry.score)?;
        }
        let mut added = 0;
        for entry in entries {
            if nx && self.dict.contains_key(&entry.member) {
                continue;
            }
            if self.upsert(entry.score, entry.member) {
                added += 1;
            }
        }
        Ok(added)
    }

    fn upsert(&mut self, score: f64, member: Bytes) -> bool {
        match self.dict.get_mut(&member) {
            Some(cur) => {
                // bitwise, so -0.0 replaces 0.0 (in place, the order is equal)
                if cur.to_bits() != score.to_bits() {
                    self.zsl.update_score(*cur, &member, score);
                    *cur = score;
                }
                false
            }
            None => {
                self.zsl.insert(score, member.clone());
                self.dict.insert(member, score);
                true
            }
        }
    }

    /// Adds `delta` to the member's score, an absent member counting as 0.
    pub fn add_score(&mut self, member: Bytes, delta: f64) -> Result<f64, ZSetError> {
        let delta = check_score(delta)?;
        let score = self.score(&member).unwrap_or(0.0) + delta;
        if score.is_nan() {
            return Err(ZSetError::NotANumber);
        }
        self.upsert(score, member);
        Ok(score)
    }

    pub fn remove(&mut self, member: &[u8]) -> bool {
        match self.dict.remove(member) {
            Some(score) => {
                self.zsl.delete(score, member);
                true
            }
            None => false,
        }
    }

    /// True when at least one member was removed.
    pub fn remove_all(&mut self, members: &[Bytes]) -> bool {
        members
            .iter()
            .fold(false, |changed, member| self.remove(member) || changed)
    }

    /// Keeps only `members`; true when the set changed.
    pub fn retain_all(&mut self, members: &[Bytes]) -> bool {
        let keep: HashSet<&[u8]> = members.iter().map(|m| &m[..]).collect();
        let doomed: Vec<Bytes> = self
            .dict
            .keys()
            .filter(|member| !keep.contains(&member[..]))
            .cloned()
            .collect();
        self.remove_all(&doomed)
    }

    pub fn remove_range_by_rank(&mut self, start: i64, end: i64) -> usize {
        let Some((start, end)) = normalize_rank_range(start, end, self.len()) else {
            return 0;
        };
        let removed = self.zsl.delete_range_by_rank(start, end);
        for member in &removed {
            self.dict.remove(member);
        }
        removed.len()
    }

    pub fn remove_range_by_score(&mut self, range: &RangeSpec) -> Result<usize, ZSetError> {
        check_range(range)?;
        let removed = self.zsl.delete_range_by_score(range);
        for member in &removed {
            self.dict.remove(member);
        }
        Ok(removed.len())
    }

    /// 0-based ascending position.
    pub fn rank(&self, member: &[u8]) -> Option<usize> {
        let score = self.score(member)?;
        self.zsl.get_rank(score, member)
    }

    /// 0-based descending position, 0 being the highest score.
    pub fn rev_rank(&self, member: &[u8]) -> Option<usize> {
        self.rank(member).map(|rank| self.len() - 1 - rank)
    }

    pub fn first(&self) -> Option<Bytes> {
        self.zsl.first().map(|node| node.elem().clone())
    }

    pub fn last(&self) -> Option<Bytes> {
        self.zsl.last().map(|node| node.elem().clone())
    }

    pub fn pop_first(&mut self) -> Option<Bytes> {
        let member = self.first()?;
        self.remove(&member);
        Some(member)
    }

    pub fn pop_last(&mut self) -> Option<Bytes> {
        let member = self.last()?;
        self.remove(&member);
        Some(member)
    }

    /// Entries with rank in `[start, end]`. With `reverse` ranks are counted
    /// from the highest score and output is in descending order.
    pub fn range_by_rank(&self, start: i64, end: i64, reverse: bool) -> Vec<ScoredEntry> {
        let len = self.len();
        let Some((start, end)) = normalize_rank_range(start, end, len) else {
            return vec![];
        };
        let first_rank = if reverse { len - 1 - start } else { start };
        match self.zsl.get_elem_by_rank(first_rank) {
            Some(node) => self
                .zsl
                .iter_from(node, reverse)
                .take(end - start + 1)
                .map(ScoredEntry::from)
                .collect(),
            None => vec![],
        }
    }

    /// Entries whose score is inside `range`, ordered ascending (or
    /// descending with `reverse`), then paginated by `limit`.
    pub fn range_by_score(
        &self,
        range: &RangeSpec,
        reverse: bool,
        limit: Option<Limit>,
    ) -> Result<Vec<ScoredEntry>, ZSetError> {
        check_range(range)?;
        let limit = limit.unwrap_or(Limit::new(0, -1));
        limit.validate()?;
        let boundary = if reverse {
            self.zsl.last_in_range(range)
        } else {
            self.zsl.first_in_range(range)
        };
        let Some(boundary) = boundary else {
            return Ok(vec![]);
        };

        let offset = limit.offset as usize;
        let start = if offset == 0 {
            Some(boundary)
        } else {
            let rank = self.zsl.get_rank(boundary.score(), boundary.elem()).unwrap_or(0);
            if reverse {
                rank.checked_sub(offset).and_then(|r| self.zsl.get_elem_by_rank(r))
            } else {
                self.zsl.get_elem_by_rank(rank.saturating_add(offset))
            }
        };
        let Some(start) = start else {
            return Ok(vec![]);
        };

        Ok(self
            .zsl
            .iter_from(start, reverse)
            .take_while(|node| range.contains(node.score()))
            .take(limit.take())
            .map(ScoredEntry::from)
            .collect())
    }

    /// Number of entries inside `range`, computed from ranks.
    pub fn count(&self, range: &RangeSpec) -> Result<usize, ZSetError> {
        check_range(range)?;
        let (Some(first), Some(last)) = (self.zsl.first_in_range(range), self.zsl.last_in_range(range)) else {
            return Ok(0);
        };
        let count = match (
            self.zsl.get_rank(first.score(), first.elem()),
            self.zsl.get_rank(last.score(), last.elem()),
        ) {
            (Some(lo), Some(hi)) if hi >= lo => hi - lo + 1,
            _ => 0,
        };
        Ok(count)
    }

    /// Every member, in no particular order.
    pub fn read_all(&self) -> Vec<Bytes> {
        self.dict.keys().cloned().collect()
    }

    /// Every entry in rank order.
    pub fn entries(&self) -> Vec<ScoredEntry> {
        self.zsl.iter().map(ScoredEntry::from).collect()
    }

    fn from_dict(dict: HashMap<Bytes, f64>) -> Self {
        let mut zsl = SkipList::new();
        for (member, score) in &dict {
            zsl.insert(*score, member.clone());
        }
        Self { dict, zsl }
    }

    /// Union of weighted inputs; `None` inputs are missing sets and count as
    /// empty. Inputs are visited in order, each in rank order, so the
    /// floating point accumulation is reproducible.
    pub fn union(inputs: &[(Option<&ZSet>, f64)], aggregate: Aggregate) -> ZSet {
        let mut dict: HashMap<Bytes, f64> = HashMap::new();
        for (set, weight) in inputs {
            let Some(set) = set else { continue };
            for node in set.zsl.iter() {
                let score = weighted(node.score(), *weight);
                dict.entry(node.elem().clone())
                    .and_modify(|acc| *acc = aggregate.apply(*acc, score))
                    .or_insert(score);
            }
        }
        Self::from_dict(dict)
    }

    /// Intersection of weighted inputs; any missing or empty input yields
    /// an empty result.
    pub fn intersection(inputs: &[(Option<&ZSet>, f64)], aggregate: Aggregate) -> ZSet {
        let mut dict: HashMap<Bytes, f64> = HashMap::new();
        let Some(((Some(head), head_weight), rest)) = inputs.split_first() else {
            return ZSet::new();
        };
        if rest.iter().any(|(set, _)| set.map_or(true, |s| s.is_empty())) {
            return ZSet::new();
        }
        'member: for node in head.zsl.iter() {
            let mut score = weighted(node.score(), *head_weight);
            for (set, weight) in rest {
                match set.and_then(|s| s.score(node.elem())) {
                    Some(other) => score = aggregate.apply(score, weighted(other, *weight)),
                    None => continue 'member,
                }
            }
            dict.insert(node.elem().clone(), score);
        }
        Self::from_dict(dict)
    }
}

impl Serialize for ZSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.zsl.iter().map(ScoredEntry::from))
    }
}

impl<'de> Deserialize<'de> for ZSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<ScoredEntry>::deserialize(deserializer)?;
        let mut zset = ZSet::new();
        zset.add_all(entries).map_err(D::Error::custom)?;
        Ok(zset)
    }
}
