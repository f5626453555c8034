use crate::cmd::command::{CommandStrategy, RedisCommand};
use crate::cmd::error::CommandError;
use crate::cmd::reply::{format_score, Reply, ReplyKind};
use crate::db::db::RedisDb;
use crate::db::error::ZSetError;
use crate::db::skiplist::RangeSpec;
use crate::db::zset::{check_range, Aggregate, Limit, ScoredEntry, ZSet};
use crate::parser::frame::Frame;
use crate::parser::parse::Parse;
use bytes::Bytes;

#[derive(Debug, Clone, PartialEq)]
pub enum SortedCmd {
    /// Adds one or more members to a sorted set, or updates their scores.
    /// With `nx` existing members are left untouched.
    ZAdd { key: String, nx: bool, entries: Vec<ScoredEntry> },
    /// Increments the score of a member in a sorted set
    ZIncrBy { key: String, delta: f64, member: Bytes },
    /// Removes one or more members from a sorted set
    ZRem { key: String, members: Vec<Bytes> },
    /// Removes every member not listed
    ZRetain { key: String, members: Vec<Bytes> },
    /// Removes members in a sorted set within a range of indexes
    ZRemRangeByRank { key: String, start: i64, stop: i64 },
    /// Removes members in a sorted set within a range of scores
    ZRemRangeByScore { key: String, range: RangeSpec },
    /// Returns the index of a member in a sorted set ordered by ascending scores
    ZRank { key: String, member: Bytes },
    /// Returns the index of a member in a sorted set ordered by descending scores
    ZRevRank { key: String, member: Bytes },
    /// Returns the score of a member in a sorted set
    ZScore { key: String, member: Bytes },
    /// Returns the score of one or more members in a sorted set
    ZMScore { key: String, members: Vec<Bytes> },
    /// Returns the lowest ranked member
    ZFirst { key: String },
    /// Returns the highest ranked member
    ZLast { key: String },
    /// Removes and returns the lowest ranked member
    ZPopMin { key: String },
    /// Removes and returns the highest ranked member
    ZPopMax { key: String },
    /// Returns the number of members in a sorted set
    ZCard { key: String },
    /// Returns every member, unordered
    ZMembers { key: String },
    /// Returns members in a range of indexes
    ZRange { key: String, start: i64, stop: i64, reverse: bool, with_scores: bool },
    /// Returns members in a range of scores
    ZRangeByScore {
        key: String,
        range: RangeSpec,
        reverse: bool,
        with_scores: bool,
        limit: Option<Limit>,
    },
    /// Returns the count of members in a sorted set that have scores within a range
    ZCount { key: String, range: RangeSpec },
    /// Stores the union of multiple sorted sets in a key
    ZUnionStore { dest: String, inputs: Vec<(String, f64)>, aggregate: Aggregate },
    /// Stores the intersect of multiple sorted sets in a key
    ZInterStore { dest: String, inputs: Vec<(String, f64)>, aggregate: Aggregate },
    /// Deletes the whole sorted set
    Del { key: String },
}

fn push_key(frame: &mut Frame, name: &str, key: String) {
    frame.push_str(name);
    frame.push_bulk(Bytes::from(key));
}

fn format_bound(value: f64, exclusive: bool) -> String {
    if exclusive {
        format!("({}", format_score(value))
    } else {
        format_score(value)
    }
}

/// Numeric argument of a command. `nan` parses so the engine can reject it
/// with the same error a local caller gets.
fn parse_arg(s: &str) -> Result<f64, CommandError> {
    s.parse::<f64>()
        .map_err(|_| CommandError::ParseError(format!("value '{}' is not a valid float", s)))
}

/// `1.5` is inclusive, `(1.5` exclusive; `-inf`/`+inf` are accepted.
fn parse_bound(s: &str) -> Result<(f64, bool), CommandError> {
    let bound = match s.strip_prefix('(') {
        Some(rest) => (parse_arg(rest)?, true),
        None => (parse_arg(s)?, false),
    };
    Ok(bound)
}

fn parse_range(parse: &mut Parse, reverse: bool) -> crate::Result<RangeSpec> {
    let (first, first_ex) = parse_bound(&parse.next_string()?)?;
    let (second, second_ex) = parse_bound(&parse.next_string()?)?;
    let (min, min_ex, max, max_ex) = if reverse {
        (second, second_ex, first, first_ex)
    } else {
        (first, first_ex, second, second_ex)
    };
    Ok(RangeSpec::new(min, !min_ex, max, !max_ex))
}

fn push_range(frame: &mut Frame, range: &RangeSpec, reverse: bool) {
    let min = format_bound(range.min, range.min_ex);
    let max = format_bound(range.max, range.max_ex);
    if reverse {
        frame.push_str(&max);
        frame.push_str(&min);
    } else {
        frame.push_str(&min);
        frame.push_str(&max);
    }
}

fn rest_bytes(parse: &mut Parse) -> crate::Result<Vec<Bytes>> {
    let mut members = Vec::with_capacity(parse.remaining());
    while parse.remaining() > 0 {
        members.push(parse.next_bytes()?);
    }
    Ok(members)
}

fn parse_store(parse: &mut Parse) -> crate::Result<(String, Vec<(String, f64)>, Aggregate)> {
    let dest = parse.next_string()?;
    let numkeys = parse.next_int()?;
    if numkeys <= 0 {
        return Err(CommandError::ParseError("at least 1 input key is needed".to_string()).into());
    }
    let mut inputs = Vec::with_capacity(numkeys as usize);
    for _ in 0..numkeys {
        inputs.push((parse.next_string()?, 1.0));
    }
    let mut aggregate = Aggregate::default();
    while parse.remaining() > 0 {
        let option = parse.next_string()?.to_lowercase();
        match &option[..] {
            "weights" => {
                for input in inputs.iter_mut() {
                    input.1 = parse_arg(&parse.next_string()?)?;
                }
            }
            "aggregate" => aggregate = parse.next_string()?.parse()?,
            _ => return Err(CommandError::ParseError(format!("unknown option '{}'", option)).into()),
        }
    }
    Ok((dest, inputs, aggregate))
}

fn push_store(frame: &mut Frame, name: &str, dest: String, inputs: Vec<(String, f64)>, aggregate: Aggregate) {
    push_key(frame, name, dest);
    frame.push_str(&inputs.len().to_string());
    let weights: Vec<f64> = inputs.iter().map(|(_, weight)| *weight).collect();
    for (key, _) in inputs {
        frame.push_bulk(Bytes::from(key));
    }
    frame.push_str("weights");
    for weight in weights {
        frame.push_str(&format_score(weight));
    }
    frame.push_str("aggregate");
    frame.push_str(aggregate.as_str());
}

fn check_inputs(inputs: &[(String, f64)]) -> Result<(), ZSetError> {
    if inputs.is_empty() {
        return Err(ZSetError::InvalidArgument("at least 1 input key is needed".to_string()));
    }
    if inputs.iter().any(|(_, weight)| weight.is_nan()) {
        return Err(ZSetError::InvalidArgument("weight value is not a float".to_string()));
    }
    Ok(())
}

fn entries_reply(entries: Vec<ScoredEntry>, with_scores: bool) -> Reply {
    if with_scores {
        Reply::Entries(entries)
    } else {
        Reply::Members(entries.into_iter().map(|entry| entry.member).collect())
    }
}

fn optional(value: Option<usize>) -> Reply {
    value.map_or(Reply::Nil, |v| Reply::Integer(v as i64))
}

fn optional_member(member: Option<Bytes>) -> Reply {
    member.map_or(Reply::Nil, Reply::Member)
}

impl SortedCmd {
    pub fn name(&self) -> &'static str {
        match self {
            SortedCmd::ZAdd { .. } => "zadd",
            SortedCmd::ZIncrBy { .. } => "zincrby",
            SortedCmd::ZRem { .. } => "zrem",
            SortedCmd::ZRetain { .. } => "zretain",
            SortedCmd::ZRemRangeByRank { .. } => "zremrangebyrank",
            SortedCmd::ZRemRangeByScore { .. } => "zremrangebyscore",
            SortedCmd::ZRank { .. } => "zrank",
            SortedCmd::ZRevRank { .. } => "zrevrank",
            SortedCmd::ZScore { .. } => "zscore",
            SortedCmd::ZMScore { .. } => "zmscore",
            SortedCmd::ZFirst { .. } => "zfirst",
            SortedCmd::ZLast { .. } => "zlast",
            SortedCmd::ZPopMin { .. } => "zpopmin",
            SortedCmd::ZPopMax { .. } => "zpopmax",
            SortedCmd::ZCard { .. } => "zcard",
            SortedCmd::ZMembers { .. } => "zmembers",
            SortedCmd::ZRange { reverse: false, .. } => "zrange",
            SortedCmd::ZRange { reverse: true, .. } => "zrevrange",
            SortedCmd::ZRangeByScore { reverse: false, .. } => "zrangebyscore",
            SortedCmd::ZRangeByScore { reverse: true, .. } => "zrevrangebyscore",
            SortedCmd::ZCount { .. } => "zcount",
            SortedCmd::ZUnionStore { .. } => "zunionstore",
            SortedCmd::ZInterStore { .. } => "zinterstore",
            SortedCmd::Del { .. } => "del",
        }
    }

    pub fn reply_kind(&self) -> ReplyKind {
        match self {
            SortedCmd::ZAdd { .. }
            | SortedCmd::ZRem { .. }
            | SortedCmd::ZRemRangeByRank { .. }
            | SortedCmd::ZRemRangeByScore { .. }
            | SortedCmd::ZCard { .. }
            | SortedCmd::ZCount { .. }
            | SortedCmd::ZUnionStore { .. }
            | SortedCmd::ZInterStore { .. } => ReplyKind::Integer,
            SortedCmd::ZRetain { .. } | SortedCmd::Del { .. } => ReplyKind::Bool,
            SortedCmd::ZIncrBy { .. } => ReplyKind::Double,
            SortedCmd::ZRank { .. } | SortedCmd::ZRevRank { .. } => ReplyKind::OptInteger,
            SortedCmd::ZScore { .. } => ReplyKind::OptDouble,
            SortedCmd::ZMScore { .. } => ReplyKind::Scores,
            SortedCmd::ZFirst { .. }
            | SortedCmd::ZLast { .. }
            | SortedCmd::ZPopMin { .. }
            | SortedCmd::ZPopMax { .. } => ReplyKind::OptMember,
            SortedCmd::ZMembers { .. } => ReplyKind::Members,
            SortedCmd::ZRange { with_scores, .. } | SortedCmd::ZRangeByScore { with_scores, .. } => {
                if *with_scores {
                    ReplyKind::Entries
                } else {
                    ReplyKind::Members
                }
            }
        }
    }

    /// Executes the command. Either the whole command takes effect or, on
    /// error, nothing does.
    pub fn apply(self, db: &mut RedisDb) -> Result<Reply, ZSetError> {
        let reply = match self {
            SortedCmd::ZAdd { key, nx, entries } => {
                let added = db.modify(&key, |zs| {
                    if nx {
                        zs.try_add_all(entries)
                    } else {
                        zs.add_all(entries)
                    }
                })?;
                Reply::Integer(added as i64)
            }
            SortedCmd::ZIncrBy { key, delta, member } => {
                Reply::Double(db.modify(&key, |zs| zs.add_score(member, delta))?)
            }
            SortedCmd::ZRem { key, members } => {
                let removed = db.modify(&key, |zs| members.iter().filter(|m| zs.remove(m)).count());
                Reply::Integer(removed as i64)
            }
            SortedCmd::ZRetain { key, members } => {
                Reply::Bool(db.modify(&key, |zs| zs.retain_all(&members)))
            }
            SortedCmd::ZRemRangeByRank { key, start, stop } => {
                Reply::Integer(db.modify(&key, |zs| zs.remove_range_by_rank(start, stop)) as i64)
            }
            SortedCmd::ZRemRangeByScore { key, range } => {
                check_range(&range)?;
                Reply::Integer(db.modify(&key, |zs| zs.remove_range_by_score(&range))? as i64)
            }
            SortedCmd::ZRank { key, member } => optional(db.find(&key).and_then(|zs| zs.rank(&member))),
            SortedCmd::ZRevRank { key, member } => {
                optional(db.find(&key).and_then(|zs| zs.rev_rank(&member)))
            }
            SortedCmd::ZScore { key, member } => db
                .find(&key)
                .and_then(|zs| zs.score(&member))
                .map_or(Reply::Nil, Reply::Double),
            SortedCmd::ZMScore { key, members } => {
                let zs = db.find(&key);
                Reply::Scores(members.iter().map(|m| zs.and_then(|zs| zs.score(m))).collect())
            }
            SortedCmd::ZFirst { key } => optional_member(db.find(&key).and_then(ZSet::first)),
            SortedCmd::ZLast { key } => optional_member(db.find(&key).and_then(ZSet::last)),
            SortedCmd::ZPopMin { key } => optional_member(db.modify(&key, ZSet::pop_first)),
            SortedCmd::ZPopMax { key } => optional_member(db.modify(&key, ZSet::pop_last)),
            SortedCmd::ZCard { key } => Reply::Integer(db.find(&key).map_or(0, ZSet::len) as i64),
            SortedCmd::ZMembers { key } => {
                Reply::Members(db.find(&key).map(ZSet::read_all).unwrap_or_default())
            }
            SortedCmd::ZRange { key, start, stop, reverse, with_scores } => {
                let entries = db
                    .find(&key)
                    .map(|zs| zs.range_by_rank(start, stop, reverse))
                    .unwrap_or_default();
                entries_reply(entries, with_scores)
            }
            SortedCmd::ZRangeByScore { key, range, reverse, with_scores, limit } => {
                check_range(&range)?;
                if let Some(limit) = &limit {
                    limit.validate()?;
                }
                let entries = match db.find(&key) {
                    Some(zs) => zs.range_by_score(&range, reverse, limit)?,
                    None => vec![],
                };
                entries_reply(entries, with_scores)
            }
            SortedCmd::ZCount { key, range } => {
                check_range(&range)?;
                let count = match db.find(&key) {
                    Some(zs) => zs.count(&range)?,
                    None => 0,
                };
                Reply::Integer(count as i64)
            }
            SortedCmd::ZUnionStore { dest, inputs, aggregate } => {
                check_inputs(&inputs)?;
                let result = {
                    let sets: Vec<(Option<&ZSet>, f64)> =
                        inputs.iter().map(|(name, weight)| (db.find(name), *weight)).collect();
                    ZSet::union(&sets, aggregate)
                };
                Reply::Integer(db.replace(dest, result) as i64)
            }
            SortedCmd::ZInterStore { dest, inputs, aggregate } => {
                check_inputs(&inputs)?;
                let result = {
                    let sets: Vec<(Option<&ZSet>, f64)> =
                        inputs.iter().map(|(name, weight)| (db.find(name), *weight)).collect();
                    ZSet::intersection(&sets, aggregate)
                };
                Reply::Integer(db.replace(dest, result) as i64)
            }
            SortedCmd::Del { key } => Reply::Bool(db.delete(&key)),
        };
        Ok(reply)
    }
}

impl CommandStrategy for SortedCmd {
    fn into_frame(self) -> Frame {
        let name = self.name();
        let mut frame = Frame::array();
        match self {
            SortedCmd::ZAdd { key, nx, entries } => {
                push_key(&mut frame, name, key);
                if nx {
                    frame.push_str("nx");
                }
                for entry in entries {
                    frame.push_str(&format_score(entry.score));
                    frame.push_bulk(entry.member);
                }
            }
            SortedCmd::ZIncrBy { key, delta, member } => {
                push_key(&mut frame, name, key);
                frame.push_str(&format_score(delta));
                frame.push_bulk(member);
            }
            SortedCmd::ZRem { key, members } => {
                push_key(&mut frame, name, key);
                for member in members {
                    frame.push_bulk(member);
                }
            }
            SortedCmd::ZRetain { key, members } => {
                push_key(&mut frame, name, key);
                for member in members {
                    frame.push_bulk(member);
                }
            }
            SortedCmd::ZMScore { key, members } => {
                push_key(&mut frame, name, key);
                for member in members {
                    frame.push_bulk(member);
                }
            }
            SortedCmd::ZRemRangeByRank { key, start, stop } => {
                push_key(&mut frame, name, key);
                frame.push_str(&start.to_string());
                frame.push_str(&stop.to_string());
            }
            SortedCmd::ZRemRangeByScore { key, range } => {
                push_key(&mut frame, name, key);
                push_range(&mut frame, &range, false);
            }
            SortedCmd::ZCount { key, range } => {
                push_key(&mut frame, name, key);
                push_range(&mut frame, &range, false);
            }
            SortedCmd::ZRank { key, member } => {
                push_key(&mut frame, name, key);
                frame.push_bulk(member);
            }
            SortedCmd::ZRevRank { key, member } => {
                push_key(&mut frame, name, key);
                frame.push_bulk(member);
            }
            SortedCmd::ZScore { key, member } => {
                push_key(&mut frame, name, key);
                frame.push_bulk(member);
            }
            SortedCmd::ZFirst { key } => push_key(&mut frame, name, key),
            SortedCmd::ZLast { key } => push_key(&mut frame, name, key),
            SortedCmd::ZPopMin { key } => push_key(&mut frame, name, key),
            SortedCmd::ZPopMax { key } => push_key(&mut frame, name, key),
            SortedCmd::ZCard { key } => push_key(&mut frame, name, key),
            SortedCmd::ZMembers { key } => push_key(&mut frame, name, key),
            SortedCmd::Del { key } => push_key(&mut frame, name, key),
            SortedCmd::ZRange { key, start, stop, with_scores, .. } => {
                push_key(&mut frame, name, key);
                frame.push_str(&start.to_string());
                frame.push_str(&stop.to_string());
                if with_scores {
                    frame.push_str("withscores");
                }
            }
            SortedCmd::ZRangeByScore { key, range, reverse, with_scores, limit } => {
                push_key(&mut frame, name, key);
                push_range(&mut frame, &range, reverse);
                if with_scores {
                    frame.push_str("withscores");
                }
                if let Some(limit) = limit {
                    frame.push_str("limit");
                    frame.push_str(&limit.offset.to_string());
                    frame.push_str(&limit.count.to_string());
                }
            }
            SortedCmd::ZUnionStore { dest, inputs, aggregate } => {
                push_store(&mut frame, name, dest, inputs, aggregate);
            }
            SortedCmd::ZInterStore { dest, inputs, aggregate } => {
                push_store(&mut frame, name, dest, inputs, aggregate);
            }
        }
        frame
    }

    fn from_frame(name: &str, parse: &mut Parse) -> crate::Result<RedisCommand> {
        let cmd = match name {
            "zadd" => {
                let key = parse.next_string()?;
                let mut token = parse.next_string()?;
                let nx = token.eq_ignore_ascii_case("nx");
                if nx {
                    token = parse.next_string()?;
                }
                let mut entries = vec![];
                loop {
                    let score = parse_arg(&token)?;
                    let member = parse.next_bytes()?;
                    entries.push(ScoredEntry { member, score });
                    if parse.remaining() == 0 {
                        break;
                    }
                    token = parse.next_string()?;
                }
                SortedCmd::ZAdd { key, nx, entries }
            }
            "zincrby" => {
                let key = parse.next_string()?;
                let delta = parse_arg(&parse.next_string()?)?;
                let member = parse.next_bytes()?;
                SortedCmd::ZIncrBy { key, delta, member }
            }
            "zrem" => SortedCmd::ZRem {
                key: parse.next_string()?,
                members: rest_bytes(parse)?,
            },
            "zretain" => SortedCmd::ZRetain {
                key: parse.next_string()?,
                members: rest_bytes(parse)?,
            },
            "zmscore" => SortedCmd::ZMScore {
                key: parse.next_string()?,
                members: rest_bytes(parse)?,
            },
            "zremrangebyrank" => SortedCmd::ZRemRangeByRank {
                key: parse.next_string()?,
                start: parse.next_int()?,
                stop: parse.next_int()?,
            },
            "zremrangebyscore" => SortedCmd::ZRemRangeByScore {
                key: parse.next_string()?,
                range: parse_range(parse, false)?,
            },
            "zcount" => SortedCmd::ZCount {
                key: parse.next_string()?,
                range: parse_range(parse, false)?,
            },
            "zrank" => SortedCmd::ZRank {
                key: parse.next_string()?,
                member: parse.next_bytes()?,
            },
            "zrevrank" => SortedCmd::ZRevRank {
                key: parse.next_string()?,
                member: parse.next_bytes()?,
            },
            "zscore" => SortedCmd::ZScore {
                key: parse.next_string()?,
                member: parse.next_bytes()?,
            },
            "zfirst" => SortedCmd::ZFirst { key: parse.next_string()? },
            "zlast" => SortedCmd::ZLast { key: parse.next_string()? },
            "zpopmin" => SortedCmd::ZPopMin { key: parse.next_string()? },
            "zpopmax" => SortedCmd::ZPopMax { key: parse.next_string()? },
            "zcard" => SortedCmd::ZCard { key: parse.next_string()? },
            "zmembers" => SortedCmd::ZMembers { key: parse.next_string()? },
            "del" => SortedCmd::Del { key: parse.next_string()? },
            "zrange" | "zrevrange" => {
                let key = parse.next_string()?;
                let start = parse.next_int()?;
                let stop = parse.next_int()?;
                let with_scores = if parse.remaining() > 0 {
                    let option = parse.next_string()?;
                    if !option.eq_ignore_ascii_case("withscores") {
                        return Err(CommandError::ParseError(format!("unknown option '{}'", option)).into());
                    }
                    true
                } else {
                    false
                };
                SortedCmd::ZRange { key, start, stop, reverse: name == "zrevrange", with_scores }
            }
            "zrangebyscore" | "zrevrangebyscore" => {
                let reverse = name == "zrevrangebyscore";
                let key = parse.next_string()?;
                let range = parse_range(parse, reverse)?;
                let mut with_scores = false;
                let mut limit = None;
                while parse.remaining() > 0 {
                    let option = parse.next_string()?.to_lowercase();
                    match &option[..] {
                        "withscores" => with_scores = true,
                        "limit" => limit = Some(Limit::new(parse.next_int()?, parse.next_int()?)),
                        _ => {
                            return Err(CommandError::ParseError(format!("unknown option '{}'", option)).into())
                        }
                    }
                }
                SortedCmd::ZRangeByScore { key, range, reverse, with_scores, limit }
            }
            "zunionstore" => {
                let (dest, inputs, aggregate) = parse_store(parse)?;
                SortedCmd::ZUnionStore { dest, inputs, aggregate }
            }
            "zinterstore" => {
                let (dest, inputs, aggregate) = parse_store(parse)?;
                SortedCmd::ZInterStore { dest, inputs, aggregate }
            }
            _ => return Err(CommandError::NotSupport(name.to_string()).into()),
        };
        Ok(RedisCommand::SortSet(cmd))
    }
}
