use bytes::{Buf, Bytes};
use std::fmt;
use std::io::Cursor;
use std::num::TryFromIntError;
use std::string::FromUtf8Error;

/// A frame in the Redis serialization protocol (RESP2).
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(Bytes),
    Null,
    Array(Vec<Frame>),
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Not enough data is available to parse a message
    #[error("stream ended early")]
    Incomplete,
    /// Invalid message encoding
    #[error("{0}")]
    Other(crate::Error),
}

impl Frame {
    pub fn array() -> Frame {
        Frame::Array(vec![])
    }

    /// Push a bulk frame into the array. `self` must be an Array frame.
    pub fn push_bulk(&mut self, bytes: Bytes) {
        if let Frame::Array(vec) = self {
            vec.push(Frame::Bulk(bytes));
        }
    }

    pub fn push_str(&mut self, s: &str) {
        self.push_bulk(Bytes::copy_from_slice(s.as_bytes()));
    }

    pub fn get_frame_by_index(&self, idx: usize) -> Option<&Frame> {
        match self {
            Frame::Array(vec) => vec.get(idx),
            _ => None,
        }
    }

    /// Checks if an entire message can be decoded from `src`
    pub fn check(src: &mut Cursor<&[u8]>) -> Result<(), Error> {
        match get_u8(src)? {
            b'+' | b'-' | b':' => {
                get_line(src)?;
                Ok(())
            }
            b'$' => {
                let len = get_decimal(src)?;
                if len >= 0 {
                    // skip that number of bytes + 2 (\r\n).
                    skip(src, len as usize + 2)
                } else {
                    Ok(())
                }
            }
            b'*' => {
                let len = get_decimal(src)?;
                for _ in 0..len.max(0) {
                    Frame::check(src)?;
                }
                Ok(())
            }
            actual => Err(format!("protocol error; invalid frame type byte `{}`", actual).into()),
        }
    }

    /// The message has already been validated with `check`.
    pub fn parse(src: &mut Cursor<&[u8]>) -> Result<Frame, Error> {
        match get_u8(src)? {
            b'+' => {
                let line = get_line(src)?.to_vec();
                Ok(Frame::Simple(String::from_utf8(line)?))
            }
            b'-' => {
                let line = get_line(src)?.to_vec();
                Ok(Frame::Error(String::from_utf8(line)?))
            }
            b':' => Ok(Frame::Integer(get_decimal(src)?)),
            b'$' => {
                let len = get_decimal(src)?;
                if len < 0 {
                    return Ok(Frame::Null);
                }
                let len: usize = len.try_into()?;
                let n = len + 2;
                if src.remaining() < n {
                    return Err(Error::Incomplete);
                }
                let data = Bytes::copy_from_slice(&src.chunk()[..len]);
                skip(src, n)?;
                Ok(Frame::Bulk(data))
            }
            b'*' => {
                let len = get_decimal(src)?;
                if len < 0 {
                    return Ok(Frame::Null);
                }
                let mut out = Vec::with_capacity(len as usize);
                for _ in 0..len {
                    out.push(Frame::parse(src)?);
                }
                Ok(Frame::Array(out))
            }
            _ => Err("protocol error; invalid frame type byte".into()),
        }
    }

    /// Serializes the frame onto `bytes`.
    pub fn write_to(&self, bytes: &mut Vec<u8>) {
        match self {
            Frame::Simple(data) => {
                bytes.extend_from_slice(b"+");
                bytes.extend_from_slice(data.as_bytes());
                bytes.extend_from_slice(b"\r\n");
            }
            Frame::Error(data) => {
                bytes.extend_from_slice(b"-");
                bytes.extend_from_slice(data.as_bytes());
                bytes.extend_from_slice(b"\r\n");
            }
            Frame::Integer(data) => {
                bytes.extend_from_slice(b":");
                bytes.extend_from_slice(data.to_string().as_bytes());
                bytes.extend_from_slice(b"\r\n");
            }
            Frame::Bulk(data) => {
                bytes.extend_from_slice(b"$");
                bytes.extend_from_slice(data.len().to_string().as_bytes());
                bytes.extend_from_slice(b"\r\n");
                bytes.extend_from_slice(data);
                bytes.extend_from_slice(b"\r\n");
            }
            Frame::Null => {
                bytes.extend_from_slice(b"$-1\r\n");
            }
            Frame::Array(data) => {
                bytes.extend_from_slice(b"*");
                bytes.extend_from_slice(data.len().to_string().as_bytes());
                bytes.extend_from_slice(b"\r\n");
                for item in data {
                    item.write_to(bytes);
                }
            }
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Frame::Simple(response) => response.fmt(fmt),
            Frame::Error(msg) => write!(fmt, "(error) {}", msg),
            Frame::Integer(num) => write!(fmt, "(integer) {}", num),
            Frame::Bulk(msg) => write!(fmt, "\"{}\"", String::from_utf8_lossy(msg)),
            Frame::Null => "(nil)".fmt(fmt),
            Frame::Array(parts) => {
                if parts.is_empty() {
                    return "(empty array)".fmt(fmt);
                }
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        writeln!(fmt)?;
                    }
                    write!(fmt, "{}) {}", i + 1, part)?;
                }
                Ok(())
            }
        }
    }
}

fn get_u8(src: &mut Cursor<&[u8]>) -> Result<u8, Error> {
    if !src.has_remaining() {
        return Err(Error::Incomplete);
    }
    Ok(src.get_u8())
}

fn skip(src: &mut Cursor<&[u8]>, n: usize) -> Result<(), Error> {
    if src.remaining() < n {
        return Err(Error::Incomplete);
    }
    src.advance(n);
    Ok(())
}

fn get_decimal(src: &mut Cursor<&[u8]>) -> Result<i64, Error> {
    let line = get_line(src)?;
    std::str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| "protocol error; invalid frame format".into())
}

/// Find a line terminated by `\r\n`, returning it without the terminator.
fn get_line<'a>(src: &mut Cursor<&'a [u8]>) -> Result<&'a [u8], Error> {
    let start = src.position() as usize;
    let end = src.get_ref().len().saturating_sub(1);

    for i in start..end {
        if src.get_ref()[i] == b'\r' && src.get_ref()[i + 1] == b'\n' {
            src.set_position((i + 2) as u64);
            return Ok(&src.get_ref()[start..i]);
        }
    }
    Err(Error::Incomplete)
}

impl From<String> for Error {
    fn from(src: String) -> Error {
        Error::Other(src.into())
    }
}

impl From<&str> for Error {
    fn from(src: &str) -> Error {
        src.to_string().into()
    }
}

impl From<FromUtf8Error> for Error {
    fn from(_src: FromUtf8Error) -> Error {
        "protocol error; invalid frame format".into()
    }
}

impl From<TryFromIntError> for Error {
    fn from(_src: TryFromIntError) -> Error {
        "protocol error; invalid frame format".into()
    }
}
