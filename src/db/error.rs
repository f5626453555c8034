#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ZSetError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("resulting score is not a number (NaN)")]
    NotANumber,
}

impl ZSetError {
    /// Prefix used when the error travels as a RESP error string.
    pub fn code(&self) -> &'static str {
        match self {
            ZSetError::InvalidArgument(_) => "INVALIDARG",
            ZSetError::NotANumber => "NAN",
        }
    }

    pub fn to_wire(&self) -> String {
        match self {
            ZSetError::InvalidArgument(msg) => format!("{} {}", self.code(), msg),
            ZSetError::NotANumber => self.code().to_string(),
        }
    }

    pub fn from_wire(line: &str) -> Option<Self> {
        let (code, msg) = line.split_once(' ').unwrap_or((line, ""));
        match code {
            "INVALIDARG" => Some(ZSetError::InvalidArgument(msg.to_string())),
            "NAN" => Some(ZSetError::NotANumber),
            _ => None,
        }
    }
}
