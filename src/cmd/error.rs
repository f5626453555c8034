#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("ERR syntax error, {0}")]
    ParseError(String),
    #[error("ERR unknown command '{0}'")]
    NotSupport(String),
    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongArgs(String),
    #[error("ERR unexpected reply {0}")]
    UnexpectedReply(String),
    /// Error string returned by a server that does not map to a local error.
    #[error("{0}")]
    Server(String),
}
