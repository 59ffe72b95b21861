use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;
pub type TokenReaderResult<T> = std::result::Result<T, TokenReaderError>;

/// Code the service uses for "file is larger than the remaining quota".
pub const QUOTA_EXCEEDED_CODE: &str = "707";
/// Code the service uses for "file exceeds maximum allowed size".
pub const SIZE_EXCEEDED_CODE: &str = "710";

#[derive(Error, Debug)]
pub enum Error {
    #[error("API error calling method {method}: {code} {msg}")]
    Api {
        method: String,
        code: String,
        msg: String,
    },
    #[error("transport failed : {0}")]
    Transport(#[from] TransportError),
    #[error("the file is larger than the user's remaining quota ({size} > {free} bytes)")]
    QuotaExceeded { free: u64, size: u64 },
    #[error("file exceeds maximum allowed size ({size} > {max} bytes)")]
    SizeExceeded { max: u64, size: u64 },
    #[error("token acquisition failed : {0}")]
    TokenReader(#[from] TokenReaderError),
    #[error("malformed response for {method}: missing or invalid {field}")]
    MalformedResponse { method: String, field: &'static str },
    #[error("no oauth token is set on this client")]
    NoToken,
    #[error("response is not valid json : {0}")]
    Decode(#[from] serde_json::Error),
    #[error("i/o failed : {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Server-style error code, if this error has one.
    pub fn code(&self) -> Option<&str> {
        match self {
            Error::Api { code, .. } => Some(code),
            Error::QuotaExceeded { .. } => Some(QUOTA_EXCEEDED_CODE),
            Error::SizeExceeded { .. } => Some(SIZE_EXCEEDED_CODE),
            _ => None,
        }
    }

    /// Whether the failure happened below the API layer (network, timeout,
    /// unexpected HTTP status). Those are the only errors worth retrying.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request failed : {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected http status {status} : {body}")]
    Status { status: u16, body: String },
    #[error("invalid url : {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("invalid header : {0}")]
    InvalidHeader(String),
    #[error("parameters cannot be url-encoded : {0}")]
    Encode(#[from] serde_urlencoded::ser::Error),
}

#[derive(Error, Debug, Clone)]
pub enum TokenReaderError {
    #[error("response has malformed format: not found {0} in {1}")]
    TokenKeyNotFound(&'static str, String),
}

/// Size mismatch between what the server saw for a chunk and what was sent.
///
/// Mismatches never abort an upload; they are collected and handed back
/// with the video id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityError {
    pub chunk_id: String,
    pub reported: u64,
    pub uploaded: u64,
}

impl fmt::Display for IntegrityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "File chunk id {} is {} bytes but {} were uploaded",
            self.chunk_id, self.reported, self.uploaded
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_message() {
        let err = Error::Api {
            method: "vimeo.videos.upload.complete".to_string(),
            code: "701".to_string(),
            msg: "Invalid ticket".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "API error calling method vimeo.videos.upload.complete: 701 Invalid ticket"
        );
        assert_eq!(err.code(), Some("701"));
        assert!(!err.is_transport());
    }

    #[test]
    fn encoding_failure_is_transport() {
        let err: Error = TransportError::from(serde_urlencoded::ser::Error::Custom(
            "unsupported value".into(),
        ))
        .into();
        assert!(err.is_transport());
        assert_eq!(err.code(), None);
    }

    #[test]
    fn preflight_codes() {
        assert_eq!(Error::QuotaExceeded { free: 1, size: 2 }.code(), Some("707"));
        assert_eq!(Error::SizeExceeded { max: 1, size: 2 }.code(), Some("710"));
        assert_eq!(Error::NoToken.code(), None);
    }

    #[test]
    fn integrity_message() {
        let err = IntegrityError {
            chunk_id: "3".to_string(),
            reported: 10,
            uploaded: 12,
        };
        assert_eq!(err.to_string(), "File chunk id 3 is 10 bytes but 12 were uploaded");
    }
}
