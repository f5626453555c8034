#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    /// The request or its reply could not be delivered
    #[error("channel failure: {0}")]
    ChannelFailure(String),
    /// The request was cancelled before it started
    #[error("request cancelled")]
    Cancelled,
}
