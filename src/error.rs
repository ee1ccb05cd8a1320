//! Error types for the disk sanitizer

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while sanitizing storage devices
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to enumerate storage units for a backend kind
    #[error("failed to enumerate {backend} storage units: {reason}")]
    Discovery { backend: String, reason: String },

    /// Failed to resolve an encrypted device to its backing device
    #[error("failed to resolve backing device for {device}: {reason}")]
    Resolution { device: String, reason: String },

    /// Failed to tear down an encrypted device mapping
    #[error("failed to remove encrypted mapping {device}: {reason}")]
    Teardown { device: String, reason: String },

    /// An invoked utility exited non-zero
    #[error("command '{program}' exited with status {status}: {output}")]
    CommandFailed {
        program: String,
        status: i32,
        output: String,
    },

    /// An invoked utility could not be started
    #[error("failed to spawn command '{program}': {source}")]
    CommandSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Output of an invoked utility could not be parsed
    #[error("failed to parse {tool} output: {reason}")]
    OutputParse { tool: String, reason: String },

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Captured process output attached to this error, if any.
    ///
    /// Command failures keep whatever the utility wrote so callers can log it
    /// alongside the device path.
    pub fn command_output(&self) -> Option<&str> {
        match self {
            Error::CommandFailed { output, .. } => Some(output),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failed_keeps_output() {
        let err = Error::CommandFailed {
            program: "shred".to_string(),
            status: 1,
            output: "shred: /dev/sdz: failed to open".to_string(),
        };

        assert_eq!(
            err.command_output(),
            Some("shred: /dev/sdz: failed to open")
        );
        assert!(err.to_string().contains("shred"));
        assert!(err.to_string().contains("status 1"));
    }

    #[test]
    fn test_non_command_errors_have_no_output() {
        let err = Error::Resolution {
            device: "/dev/mapper/unit-0".to_string(),
            reason: "no mapping".to_string(),
        };

        assert_eq!(err.command_output(), None);
    }
}
