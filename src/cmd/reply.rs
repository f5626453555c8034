use crate::cmd::error::CommandError;
use crate::db::error::ZSetError;
use crate::db::zset::ScoredEntry;
use crate::parser::frame::Frame;
use bytes::Bytes;

/// Result value of a sorted set command.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Nil,
    Bool(bool),
    Integer(i64),
    Double(f64),
    Member(Bytes),
    Members(Vec<Bytes>),
    Entries(Vec<ScoredEntry>),
    Scores(Vec<Option<f64>>),
}

/// Shape of the reply a command produces, needed to decode it from RESP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Bool,
    Integer,
    OptInteger,
    Double,
    OptDouble,
    OptMember,
    Members,
    Entries,
    Scores,
}

/// Shortest representation that parses back to the same bits.
pub fn format_score(score: f64) -> String {
    score.to_string()
}

fn parse_score(s: &str) -> Result<f64, CommandError> {
    match s.parse::<f64>() {
        Ok(score) if !score.is_nan() => Ok(score),
        _ => Err(CommandError::ParseError(format!("value '{}' is not a valid float", s))),
    }
}

fn score_from_bytes(data: &[u8]) -> crate::Result<f64> {
    let s = std::str::from_utf8(data)?;
    Ok(parse_score(s)?)
}

fn unexpected(frame: &Frame) -> crate::Error {
    CommandError::UnexpectedReply(format!("{:?}", frame)).into()
}

impl Reply {
    pub fn into_frame(self) -> Frame {
        match self {
            Reply::Nil => Frame::Null,
            Reply::Bool(b) => Frame::Integer(b as i64),
            Reply::Integer(n) => Frame::Integer(n),
            Reply::Double(score) => Frame::Bulk(Bytes::from(format_score(score))),
            Reply::Member(member) => Frame::Bulk(member),
            Reply::Members(members) => Frame::Array(members.into_iter().map(Frame::Bulk).collect()),
            Reply::Entries(entries) => {
                let mut frame = Frame::array();
                for entry in entries {
                    frame.push_bulk(entry.member);
                    frame.push_bulk(Bytes::from(format_score(entry.score)));
                }
                frame
            }
            Reply::Scores(scores) => Frame::Array(
                scores
                    .into_iter()
                    .map(|score| match score {
                        Some(score) => Frame::Bulk(Bytes::from(format_score(score))),
                        None => Frame::Null,
                    })
                    .collect(),
            ),
        }
    }

    /// Decodes a server reply. Error frames come back as the error they were
    /// encoded from, when it is known.
    pub fn from_frame(kind: ReplyKind, frame: Frame) -> crate::Result<Reply> {
        if let Frame::Error(msg) = frame {
            return Err(match ZSetError::from_wire(&msg) {
                Some(err) => err.into(),
                None => CommandError::Server(msg).into(),
            });
        }
        let reply = match (kind, frame) {
            (ReplyKind::Bool, Frame::Integer(n)) => Reply::Bool(n != 0),
            (ReplyKind::Integer | ReplyKind::OptInteger, Frame::Integer(n)) => Reply::Integer(n),
            (ReplyKind::Double | ReplyKind::OptDouble, Frame::Bulk(data)) => {
                Reply::Double(score_from_bytes(&data)?)
            }
            (ReplyKind::OptMember, Frame::Bulk(data)) => Reply::Member(data),
            (ReplyKind::OptInteger | ReplyKind::OptDouble | ReplyKind::OptMember, Frame::Null) => Reply::Nil,
            (ReplyKind::Members, Frame::Array(items)) => {
                let mut members = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Frame::Bulk(data) => members.push(data),
                        other => return Err(unexpected(&other)),
                    }
                }
                Reply::Members(members)
            }
            (ReplyKind::Entries, Frame::Array(items)) => {
                if items.len() % 2 != 0 {
                    return Err(CommandError::UnexpectedReply("odd member/score array".to_string()).into());
                }
                let mut entries = Vec::with_capacity(items.len() / 2);
                let mut iter = items.into_iter();
                while let (Some(member), Some(score)) = (iter.next(), iter.next()) {
                    match (member, score) {
                        (Frame::Bulk(member), Frame::Bulk(score)) => {
                            entries.push(ScoredEntry {
                                member,
                                score: score_from_bytes(&score)?,
                            });
                        }
                        (other, _) => return Err(unexpected(&other)),
                    }
                }
                Reply::Entries(entries)
            }
            (ReplyKind::Scores, Frame::Array(items)) => {
                let mut scores = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Frame::Bulk(data) => scores.push(Some(score_from_bytes(&data)?)),
                        Frame::Null => scores.push(None),
                        other => return Err(unexpected(&other)),
                    }
                }
                Reply::Scores(scores)
            }
            (_, frame) => return Err(unexpected(&frame)),
        };
        Ok(reply)
    }

    pub fn into_bool(self) -> crate::Result<bool> {
        match self {
            Reply::Bool(b) => Ok(b),
            Reply::Integer(n) => Ok(n != 0),
            other => Err(other.mismatch("bool")),
        }
    }

    pub fn into_int(self) -> crate::Result<i64> {
        match self {
            Reply::Integer(n) => Ok(n),
            other => Err(other.mismatch("integer")),
        }
    }

    pub fn into_opt_int(self) -> crate::Result<Option<i64>> {
        match self {
            Reply::Integer(n) => Ok(Some(n)),
            Reply::Nil => Ok(None),
            other => Err(other.mismatch("integer or nil")),
        }
    }

    pub fn into_double(self) -> crate::Result<f64> {
        match self {
            Reply::Double(score) => Ok(score),
            other => Err(other.mismatch("double")),
        }
    }

    pub fn into_opt_double(self) -> crate::Result<Option<f64>> {
        match self {
            Reply::Double(score) => Ok(Some(score)),
            Reply::Nil => Ok(None),
            other => Err(other.mismatch("double or nil")),
        }
    }

    pub fn into_opt_member(self) -> crate::Result<Option<Bytes>> {
        match self {
            Reply::Member(member) => Ok(Some(member)),
            Reply::Nil => Ok(None),
            other => Err(other.mismatch("member or nil")),
        }
    }

    pub fn into_members(self) -> crate::Result<Vec<Bytes>> {
        match self {
            Reply::Members(members) => Ok(members),
            Reply::Entries(entries) => Ok(entries.into_iter().map(|e| e.member).collect()),
            other => Err(other.mismatch("members")),
        }
    }

    pub fn into_entries(self) -> crate::Result<Vec<ScoredEntry>> {
        match self {
            Reply::Entries(entries) => Ok(entries),
            other => Err(other.mismatch("entries")),
        }
    }

    pub fn into_scores(self) -> crate::Result<Vec<Option<f64>>> {
        match self {
            Reply::Scores(scores) => Ok(scores),
            other => Err(other.mismatch("scores")),
        }
    }

    fn mismatch(&self, expected: &str) -> crate::Error {
        CommandError::UnexpectedReply(format!("expected {}, got {:?}", expected, self)).into()
    }
}
