use std::fmt;

use crate::bridge::CallbackToken;

/// Errors raised by the bridge, the watcher or one of the platform integrations.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// `getifaddrs(3)` failed
    Getifaddrs(String),
    /// An interface name could not be resolved to an index
    InterfaceName(String),
    /// Interface enumeration is not available on this target
    Unsupported,
    /// No callback is registered under this token
    UnknownCallback(CallbackToken),
    /// A registered callback panicked while being invoked
    CallbackPanicked,
    /// Neither an explicit nor an NDK-provided Android context is available
    NoAndroidContext,
    Jni(String),
    Config(String),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Getifaddrs(msg) => write!(f, "getifaddrs failed: {}", msg),
            Self::InterfaceName(name) => write!(f, "Cannot resolve interface index for '{}'", name),
            Self::Unsupported => write!(f, "Interface listing is not supported on this platform"),
            Self::UnknownCallback(token) => write!(f, "No callback registered for token {}", token),
            Self::CallbackPanicked => write!(f, "Callback panicked during invocation"),
            Self::NoAndroidContext => write!(f, "Android context not available"),
            Self::Jni(msg) => write!(f, "JNI error: {}", msg),
            Self::Config(msg) => write!(f, "Invalid configuration: {}", msg),
            Self::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<jni::errors::Error> for Error {
    fn from(err: jni::errors::Error) -> Self {
        Error::Jni(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            Error::InterfaceName("wlan0".to_string()).to_string(),
            "Cannot resolve interface index for 'wlan0'"
        );
        assert_eq!(Error::NoAndroidContext.to_string(), "Android context not available");
    }

    #[test]
    fn test_io_source_is_preserved() {
        use std::error::Error as _;

        let err = Error::from(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        assert!(err.source().is_some());
        assert!(Error::Unsupported.source().is_none());
    }
}
