use crate::cmd::command::{CommandStrategy, RedisCommand};
use crate::cmd::error::CommandError;
use crate::parser::frame::Frame;
use crate::parser::parse::Parse;
use bytes::Bytes;

#[derive(Debug, Clone, PartialEq)]
pub enum ConnCmd {
    /// Returns the server's liveliness response
    Ping { msg: Option<Bytes> },
    /// Returns the given string
    Echo { msg: Bytes },
    /// Changes the selected database
    Select { index: usize },
}

impl ConnCmd {
    /// Reply for the commands that do not touch connection state.
    pub fn reply(&self) -> Option<Frame> {
        match self {
            ConnCmd::Ping { msg: None } => Some(Frame::Simple("PONG".to_string())),
            ConnCmd::Ping { msg: Some(msg) } => Some(Frame::Bulk(msg.clone())),
            ConnCmd::Echo { msg } => Some(Frame::Bulk(msg.clone())),
            ConnCmd::Select { .. } => None,
        }
    }
}

impl CommandStrategy for ConnCmd {
    fn into_frame(self) -> Frame {
        let mut frame = Frame::array();
        match self {
            ConnCmd::Ping { msg } => {
                frame.push_str("ping");
                if let Some(msg) = msg {
                    frame.push_bulk(msg);
                }
            }
            ConnCmd::Echo { msg } => {
                frame.push_str("echo");
                frame.push_bulk(msg);
            }
            ConnCmd::Select { index } => {
                frame.push_str("select");
                frame.push_str(&index.to_string());
            }
        }
        frame
    }

    fn from_frame(name: &str, parse: &mut Parse) -> crate::Result<RedisCommand> {
        let cmd = match name {
            "ping" => {
                let msg = if parse.remaining() > 0 {
                    Some(parse.next_bytes()?)
                } else {
                    None
                };
                ConnCmd::Ping { msg }
            }
            "echo" => ConnCmd::Echo {
                msg: parse.next_bytes()?,
            },
            "select" => {
                let index = parse.next_int()?;
                let index = usize::try_from(index).map_err(|_| "ERR DB index is out of range")?;
                ConnCmd::Select { index }
            }
            _ => return Err(CommandError::NotSupport(name.to_string()).into()),
        };
        Ok(RedisCommand::Connection(cmd))
    }
}
