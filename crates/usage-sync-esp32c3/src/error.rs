use alloc::borrow::Cow;
use alloc::format;

use embassy_executor::SpawnError;

use esp_radio::InitializationError;
use esp_radio::wifi::WifiError;

/// All possible firmware error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The radio or the `Wi-Fi` controller failed.
    Wifi,
    /// The network stack failed.
    Network,
    /// A task could not be spawned.
    Spawn,
    /// The wall-clock could not be synchronized.
    Time,
}

impl ErrorKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Wifi => "Wi-Fi error",
            Self::Network => "Network error",
            Self::Spawn => "Spawn error",
            Self::Time => "Time error",
        }
    }
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A firmware error.
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
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.kind, self.description)
    }
}

impl core::error::Error for Error {}

impl From<SpawnError> for Error {
    fn from(e: SpawnError) -> Self {
        Self::new(ErrorKind::Spawn, format!("{e:?}"))
    }
}

impl From<InitializationError> for Error {
    fn from(e: InitializationError) -> Self {
        Self::new(ErrorKind::Wifi, format!("Radio initialization failed: {e:?}"))
    }
}

impl From<WifiError> for Error {
    fn from(e: WifiError) -> Self {
        Self::new(ErrorKind::Wifi, format!("{e:?}"))
    }
}

impl From<embassy_net::dns::Error> for Error {
    fn from(e: embassy_net::dns::Error) -> Self {
        Self::new(ErrorKind::Network, format!("DNS query failed: {e:?}"))
    }
}

impl From<embassy_net::udp::BindError> for Error {
    fn from(e: embassy_net::udp::BindError) -> Self {
        Self::new(ErrorKind::Network, format!("UDP bind failed: {e:?}"))
    }
}

/// A specialized [`Result`] type for [`Error`].
pub type Result<T> = core::result::Result<T, Error>;
