//! Error types for the Orchard client.
//!
//! Each variant is one class of failure the session reacts to differently:
//! an auth loss stops every tick, a rejection is shown to the player, and
//! transport or decode failures are logged and retried on the next tick.

/// Errors surfaced by the transport and the session.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server no longer recognises the session cookie.
    #[error("not authenticated")]
    Unauthenticated,

    /// The server refused the request on business rules.
    #[error("rejected: {message}")]
    Rejected {
        /// Server-supplied reason, shown to the player as-is.
        message: String,
    },

    /// The request did not complete at the transport level.
    #[error("transport error: {0}")]
    Transport(String),

    /// The reply could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),
}

impl ClientError {
    /// Whether this error ends the session.
    pub const fn is_auth_lost(&self) -> bool {
        matches!(self, Self::Unauthenticated)
    }

    /// Whether the next tick may simply try again.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Decode(_))
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

impl From<orchard_core::ConfigError> for ClientError {
    fn from(e: orchard_core::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(ClientError::Unauthenticated.is_auth_lost());
        assert!(!ClientError::Unauthenticated.is_transient());
        assert!(ClientError::Transport("reset".to_owned()).is_transient());
        assert!(
            !ClientError::Rejected {
                message: "Not enough money".to_owned()
            }
            .is_transient()
        );
    }

    #[test]
    fn rejection_shows_server_message() {
        let err = ClientError::Rejected {
            message: "Plot already owned".to_owned(),
        };
        assert_eq!(err.to_string(), "rejected: Plot already owned");
    }
}
