use crate::cmd::conn::ConnCmd;
use crate::cmd::error::CommandError;
use crate::cmd::zset::SortedCmd;
use crate::parser::frame::Frame;
use crate::parser::parse::{Parse, ParseError};

pub trait CommandStrategy {
    fn into_frame(self) -> Frame;
    fn from_frame(name: &str, parse: &mut Parse) -> crate::Result<RedisCommand>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum RedisCommand {
    Connection(ConnCmd),
    SortSet(SortedCmd),
}

impl RedisCommand {
    pub fn into_frame(self) -> Frame {
        match self {
            RedisCommand::Connection(cmd) => cmd.into_frame(),
            RedisCommand::SortSet(cmd) => cmd.into_frame(),
        }
    }

    pub fn from_frame(frame: Frame) -> crate::Result<RedisCommand> {
        let mut parse = Parse::new(frame)?;
        let cmd_name = parse.next_string()?.to_lowercase();

        let command = match &cmd_name[..] {
            "ping" | "echo" | "select" => ConnCmd::from_frame(&cmd_name, &mut parse),
            "zadd" | "zincrby" | "zrem" | "zretain" | "zremrangebyrank" | "zremrangebyscore"
            | "zrank" | "zrevrank" | "zscore" | "zmscore" | "zfirst" | "zlast" | "zpopmin"
            | "zpopmax" | "zcard" | "zmembers" | "zrange" | "zrevrange" | "zrangebyscore"
            | "zrevrangebyscore" | "zcount" | "zunionstore" | "zinterstore" | "del" => {
                SortedCmd::from_frame(&cmd_name, &mut parse)
            }
            _ => return Err(CommandError::NotSupport(cmd_name).into()),
        };
        let command = command.map_err(|err| match err.downcast_ref::<ParseError>() {
            Some(ParseError::EndOfStream) => CommandError::WrongArgs(cmd_name.clone()).into(),
            _ => err,
        })?;
        parse
            .finish()
            .map_err(|_| CommandError::WrongArgs(cmd_name.clone()))?;
        Ok(command)
    }
}

pub fn get_command_name(frame: &Frame) -> crate::Result<String> {
    match frame.get_frame_by_index(0).ok_or("frame is empty")? {
        Frame::Simple(s) => Ok(s.to_lowercase()),
        Frame::Bulk(bytes) => {
            let str = std::str::from_utf8(&bytes[..])?;
            Ok(str.to_lowercase())
        }
        _ => Err("frame is error type".into()),
    }
}
