use crate::cmd::command::{get_command_name, RedisCommand};
use crate::cmd::conn::ConnCmd;
use crate::cmd::request::Request;
use crate::cmd::zset::SortedCmd;
use crate::config::ServerConfig;
use crate::db::db_engine::DbHandler;
use crate::db::error::ZSetError;
use crate::parser::frame::Frame;
use crate::server::connection::Connection;
use crate::server::shutdown::Shutdown;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, oneshot, OwnedSemaphorePermit, Semaphore};
use tokio::time;
use tracing::{debug, error, info};

#[derive(Debug)]
struct Listener {
    listener: TcpListener,
    notify_shutdown: broadcast::Sender<()>,
    limit_connections: Arc<Semaphore>,
    db_handler: DbHandler,
    shutdown_complete_tx: mpsc::Sender<()>,
}

impl Listener {
    async fn run(&mut self) -> crate::Result<()> {
        loop {
            let permit = self.limit_connections.clone().acquire_owned().await?;
            let socket = self.accept().await?;
            info!(peer = ?socket.peer_addr().ok(), "accept new connection");
            let db_sender = self
                .db_handler
                .get_sender(0)
                .ok_or("server started without databases")?;
            let mut handler = Handler {
                connection: Connection::new(socket),
                shutdown: Shutdown::new(self.notify_shutdown.subscribe()),
                _shutdown_complete: self.shutdown_complete_tx.clone(),
                _permit: permit,
                db_index: 0,
                db_sender,
                db_handler: self.db_handler.clone(),
            };
            tokio::spawn(async move {
                if let Err(err) = handler.run().await {
                    error!(cause = ?err, "handler error");
                }
            });
        }
    }

    async fn accept(&mut self) -> crate::Result<TcpStream> {
        let mut backoff = 1;
        loop {
            match self.listener.accept().await {
                Ok((socket, _)) => return Ok(socket),
                Err(err) => {
                    if backoff > 64 {
                        return Err(err.into());
                    }
                }
            }
            time::sleep(Duration::from_secs(backoff)).await;
            backoff *= 2;
        }
    }
}

/// Serves one client connection. Commands are handled strictly in the order
/// they arrive; each sorted set command waits for its reply before the next
/// frame is read.
struct Handler {
    connection: Connection,
    shutdown: Shutdown,
    _shutdown_complete: mpsc::Sender<()>,
    _permit: OwnedSemaphorePermit,
    db_index: usize,
    db_sender: crate::MpscSender,
    db_handler: DbHandler,
}

impl Handler {
    async fn run(&mut self) -> crate::Result<()> {
        while !self.shutdown.is_shutdown() {
            let frame = tokio::select! {
                res = self.connection.read_frame() => res?,
                _ = self.shutdown.recv() => return Ok(()),
            };
            let Some(frame) = frame else {
                debug!(db = self.db_index, "peer closed connection");
                return Ok(());
            };
            if let Ok(name) = get_command_name(&frame) {
                debug!(db = self.db_index, cmd = %name, "received");
            }

            let reply = match RedisCommand::from_frame(frame) {
                Ok(RedisCommand::Connection(cmd)) => self.connection_cmd(cmd),
                Ok(RedisCommand::SortSet(cmd)) => self.sorted_cmd(cmd).await,
                Err(err) => error_frame(err),
            };
            self.connection.write_frame(&reply).await?;
        }
        Ok(())
    }

    fn connection_cmd(&mut self, cmd: ConnCmd) -> Frame {
        if let Some(frame) = cmd.reply() {
            return frame;
        }
        match cmd {
            ConnCmd::Select { index } => match self.db_handler.get_sender(index) {
                Some(sender) => {
                    self.db_index = index;
                    self.db_sender = sender;
                    Frame::Simple("OK".to_string())
                }
                None => Frame::Error("ERR DB index is out of range".to_string()),
            },
            _ => Frame::Error("ERR unsupported connection command".to_string()),
        }
    }

    async fn sorted_cmd(&mut self, cmd: SortedCmd) -> Frame {
        let (sender, receiver) = oneshot::channel();
        if self.db_sender.send((sender, Request::new(cmd))).is_err() {
            return Frame::Error(format!("ERR db {} is not running", self.db_index));
        }
        match receiver.await {
            Ok(Ok(reply)) => reply.into_frame(),
            Ok(Err(err)) => error_frame(err),
            Err(_) => Frame::Error(format!("ERR db {} dropped the request", self.db_index)),
        }
    }
}

fn error_frame(err: crate::Error) -> Frame {
    match err.downcast_ref::<ZSetError>() {
        Some(err) => Frame::Error(err.to_wire()),
        None => {
            let msg = err.to_string();
            if msg.starts_with("ERR") {
                Frame::Error(msg)
            } else {
                Frame::Error(format!("ERR {}", msg))
            }
        }
    }
}

/// Accepts connections on `listener` until `shutdown` completes, then waits
/// for every open connection to finish its current command.
pub async fn run(listener: TcpListener, shutdown: impl Future, config: &ServerConfig) {
    let (shutdown_complete_tx, mut shutdown_complete_rx) = mpsc::channel(1);
    let (notify_shutdown, _) = broadcast::channel(1);
    let mut server = Listener {
        listener,
        notify_shutdown,
        limit_connections: Arc::new(Semaphore::new(config.max_connections.max(1))),
        db_handler: DbHandler::new(config.db_num.max(1)),
        shutdown_complete_tx,
    };
    info!(
        addr = ?server.listener.local_addr().ok(),
        dbs = server.db_handler.get_size(),
        "server started"
    );
    tokio::select! {
        res = server.run() => {
            if let Err(err) = res {
                error!(cause = %err, "failed to accept");
            }
        },
        _ = shutdown => {
            info!("server shutting down");
        }
    }
    let Listener {
        shutdown_complete_tx,
        notify_shutdown,
        ..
    } = server;
    drop(notify_shutdown);
    drop(shutdown_complete_tx);
    let _ = shutdown_complete_rx.recv().await;
}
