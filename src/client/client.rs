use crate::client::error::ClientError;
use crate::client::sorted_set::ScoredSortedSet;
use crate::cmd::command::{CommandStrategy, RedisCommand};
use crate::cmd::conn::ConnCmd;
use crate::cmd::error::CommandError;
use crate::cmd::reply::Reply;
use crate::parser::frame::Frame;
use crate::server::connection::Connection;
use bytes::Bytes;
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;
use tracing::{debug, info};

pub struct Client {
    conn: Connection,
}

impl Client {
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> crate::Result<Client> {
        let socket = TcpStream::connect(addr).await?;
        info!(peer = ?socket.peer_addr().ok(), "connected");
        let connection = Connection::new(socket);

        Ok(Client { conn: connection })
    }

    /// Writes one frame and waits for the matching reply frame.
    pub async fn execute(&mut self, frame: &Frame) -> crate::Result<Frame> {
        self.conn.write_frame(frame).await?;
        match self.conn.read_frame().await? {
            Some(frame) => Ok(frame),
            None => Err(ClientError::ChannelFailure("connection closed by server".to_string()).into()),
        }
    }

    pub async fn ping(&mut self) -> crate::Result<()> {
        let frame = RedisCommand::Connection(ConnCmd::Ping { msg: None }).into_frame();
        match self.execute(&frame).await? {
            Frame::Simple(s) if s == "PONG" => Ok(()),
            other => Err(CommandError::UnexpectedReply(other.to_string()).into()),
        }
    }

    pub async fn select(&mut self, index: usize) -> crate::Result<()> {
        let frame = ConnCmd::Select { index }.into_frame();
        match self.execute(&frame).await? {
            Frame::Simple(_) => Ok(()),
            Frame::Error(msg) => Err(CommandError::Server(msg).into()),
            other => Err(CommandError::UnexpectedReply(other.to_string()).into()),
        }
    }

    /// Hands the connection to a background task and returns the channel
    /// that feeds it. Requests are written one at a time, in the order they
    /// were queued. An I/O failure fails the request in flight and closes
    /// the channel, so later requests fail with `ChannelFailure`.
    pub fn dispatcher(self) -> crate::MpscSender {
        let (sender, mut receiver): (crate::MpscSender, crate::MpscReceiver) = mpsc::unbounded_channel();
        let mut client = self;
        tokio::spawn(async move {
            while let Some((reply, request)) = receiver.recv().await {
                if !request.ticket.start() {
                    continue;
                }
                let kind = request.cmd.reply_kind();
                let frame = request.cmd.into_frame();
                let result = match client.execute(&frame).await {
                    Ok(frame) => Reply::from_frame(kind, frame),
                    Err(err) => {
                        let _ = reply.send(Err(ClientError::ChannelFailure(err.to_string()).into()));
                        break;
                    }
                };
                let _ = reply.send(result);
            }
            debug!("dispatcher stopped");
        });
        sender
    }

    /// Facade over the remote sorted set `name`, consuming the connection.
    pub fn sorted_set(self, name: impl Into<String>) -> ScoredSortedSet {
        ScoredSortedSet::new(name, self.dispatcher())
    }
}

/// Splits a command line typed in the cli into words. Double quotes group
/// words, `\"` is a literal quote.
pub struct Tokens {
    token: Vec<String>,
}

impl Tokens {
    pub fn from(line: &str) -> Self {
        let mut is_str = false;
        let mut token = vec![];
        let mut temp = String::new();
        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                ' ' | '\t' | '\n' | '\r' if !is_str => {
                    if !temp.is_empty() {
                        token.push(std::mem::take(&mut temp));
                    }
                }
                '\\' if chars.peek() == Some(&'"') => {
                    chars.next();
                    temp.push('"');
                }
                '"' => {
                    if is_str {
                        token.push(std::mem::take(&mut temp));
                    }
                    is_str = !is_str;
                }
                c => temp.push(c),
            }
        }
        if !temp.is_empty() {
            token.push(temp);
        }
        Self { token }
    }

    pub fn is_empty(&self) -> bool {
        self.token.is_empty()
    }

    pub fn get_cmd(&self, index: usize) -> Option<&String> {
        self.token.get(index)
    }

    /// Validates the words as a command and returns it.
    pub fn to_command(self) -> crate::Result<RedisCommand> {
        if self.token.is_empty() {
            return Err("empty command".into());
        }
        let mut frame = Frame::array();
        for word in self.token {
            frame.push_bulk(Bytes::from(word));
        }
        RedisCommand::from_frame(frame)
    }
}
