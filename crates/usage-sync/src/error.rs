use alloc::borrow::Cow;
use alloc::format;

/// All possible error kinds of a synchronization attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Another attempt is already in flight.
    AttemptInProgress,
    /// The minimum interval between two attempts has not elapsed yet.
    RateLimited,
    /// The network link is down.
    NotReady,
    /// A request body could not be built.
    Encode,
    /// A response body is malformed.
    Parse,
    /// The connection failed or timed out.
    Connection,
    /// The document store answered with an unexpected status code.
    Status(u16),
}

impl ErrorKind {
    /// Whether the attempt was rejected before performing any network I/O.
    ///
    /// A rejected attempt leaves no trace on the remote document, so the
    /// caller can simply try again later.
    #[must_use]
    pub const fn is_guard(&self) -> bool {
        matches!(
            self,
            Self::AttemptInProgress | Self::RateLimited | Self::NotReady
        )
    }

    const fn as_str(&self) -> &'static str {
        match self {
            Self::AttemptInProgress => "Attempt in progress",
            Self::RateLimited => "Rate limited",
            Self::NotReady => "Not ready",
            Self::Encode => "Encode error",
            Self::Parse => "Parse error",
            Self::Connection => "Connection failed",
            Self::Status(_) => "HTTP error",
        }
    }
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Status(code) => write!(f, "{} {code}", self.as_str()),
            _ => f.write_str(self.as_str()),
        }
    }
}

/// A synchronization error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    /// Error kind.
    pub kind: ErrorKind,
    /// Error description.
    pub description: Cow<'static, str>,
}

impl Error {
    /// Creates an [`Error`] from an [`ErrorKind`] and a description.
    pub fn new(kind: ErrorKind, description: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            description: description.into(),
        }
    }

    /// Creates an [`ErrorKind::Status`] error for the given status code.
    #[must_use]
    pub fn status(code: u16) -> Self {
        Self::new(
            ErrorKind::Status(code),
            format!("Unexpected response status {code}"),
        )
    }

    pub(crate) const fn attempt_in_progress() -> Self {
        Self {
            kind: ErrorKind::AttemptInProgress,
            description: Cow::Borrowed("Send already in progress"),
        }
    }

    pub(crate) const fn rate_limited() -> Self {
        Self {
            kind: ErrorKind::RateLimited,
            description: Cow::Borrowed("Too soon since the last send"),
        }
    }

    pub(crate) const fn not_ready() -> Self {
        Self {
            kind: ErrorKind::NotReady,
            description: Cow::Borrowed("Network link is down"),
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.kind, self.description)
    }
}

impl core::error::Error for Error {}

/// A specialized [`Result`] type for synchronization operations.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::{Error, ErrorKind};

    #[test]
    fn guard_kinds() {
        assert!(ErrorKind::AttemptInProgress.is_guard());
        assert!(ErrorKind::RateLimited.is_guard());
        assert!(ErrorKind::NotReady.is_guard());

        assert!(!ErrorKind::Parse.is_guard());
        assert!(!ErrorKind::Connection.is_guard());
        assert!(!ErrorKind::Status(500).is_guard());
    }

    #[test]
    fn display() {
        assert_eq!(
            Error::status(503).to_string(),
            "HTTP error 503: Unexpected response status 503"
        );
        assert_eq!(
            Error::rate_limited().to_string(),
            "Rate limited: Too soon since the last send"
        );
    }
}
