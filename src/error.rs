//! Pricing error taxonomy.
//!
//! Business outcomes (invalid arguments, unknown codes or partners) travel
//! over the wire as the `err` field of a response, so their `Display` text is
//! the canonical wire message and [`PricingError::from_remote`] maps it back.
//! Dispatch failures (transport, breaker, limiter) stay local to the gateway.

use thiserror::Error;

/// Message returned for a request body that cannot be decoded.
pub const INVALID_REQUEST: &str = "Invalid Request";

/// Message used when an upstream response body cannot be decoded.
pub const INVALID_RESPONSE: &str = "Invalid Response";

/// Coarse classification of a [`PricingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    Transport,
    CircuitOpen,
    RateLimitExceeded,
    ExhaustedRetries,
    NoInstancesAvailable,
    Rejected,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Transport => "transport",
            ErrorKind::CircuitOpen => "circuit_open",
            ErrorKind::RateLimitExceeded => "rate_limit_exceeded",
            ErrorKind::ExhaustedRetries => "exhausted_retries",
            ErrorKind::NoInstancesAvailable => "no_instances_available",
            ErrorKind::Rejected => "rejected",
        }
    }
}

/// Which lookup came back empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    Product,
    Partner,
}

/// Errors produced anywhere along the pricing call chain.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PricingError {
    #[error("Invalid Code Requested")]
    InvalidCode,

    #[error("Invalid Partner Requested")]
    InvalidPartner,

    #[error("Invalid Quantity Requested")]
    InvalidQuantity,

    #[error("Code Not Found")]
    CodeNotFound,

    #[error("Partner Not Found")]
    PartnerNotFound,

    /// Connection, status, timeout or decode failure talking to an instance.
    #[error("transport error: {0}")]
    Transport(String),

    /// The instance's breaker refused the call.
    #[error("circuit open for {0}")]
    CircuitOpen(String),

    /// The instance's token bucket was empty.
    #[error("rate limit exceeded for {0}")]
    RateLimitExceeded(String),

    #[error(
        "retries exhausted after {attempts} attempt(s){}",
        .last.as_ref().map(|e| format!(": {e}")).unwrap_or_default()
    )]
    ExhaustedRetries {
        attempts: u32,
        last: Option<Box<PricingError>>,
    },

    #[error("no instances available")]
    NoInstancesAvailable,

    /// An instance answered with an error message this crate does not know.
    #[error("{0}")]
    Rejected(String),
}

impl PricingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PricingError::InvalidCode
            | PricingError::InvalidPartner
            | PricingError::InvalidQuantity => ErrorKind::InvalidArgument,
            PricingError::CodeNotFound | PricingError::PartnerNotFound => ErrorKind::NotFound,
            PricingError::Transport(_) => ErrorKind::Transport,
            PricingError::CircuitOpen(_) => ErrorKind::CircuitOpen,
            PricingError::RateLimitExceeded(_) => ErrorKind::RateLimitExceeded,
            PricingError::ExhaustedRetries { .. } => ErrorKind::ExhaustedRetries,
            PricingError::NoInstancesAvailable => ErrorKind::NoInstancesAvailable,
            PricingError::Rejected(_) => ErrorKind::Rejected,
        }
    }

    /// Which lookup failed, for `NotFound` errors.
    pub fn missing(&self) -> Option<Missing> {
        match self {
            PricingError::CodeNotFound => Some(Missing::Product),
            PricingError::PartnerNotFound => Some(Missing::Partner),
            _ => None,
        }
    }

    /// Whether another instance might produce a different outcome.
    ///
    /// Business answers are authoritative: any instance would give the same
    /// one, so only local dispatch failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Transport | ErrorKind::CircuitOpen | ErrorKind::RateLimitExceeded
        )
    }

    /// Map an `err` field received from an instance back to an error.
    pub fn from_remote(message: &str) -> Self {
        match message {
            "Invalid Code Requested" => PricingError::InvalidCode,
            "Invalid Partner Requested" => PricingError::InvalidPartner,
            "Invalid Quantity Requested" => PricingError::InvalidQuantity,
            "Code Not Found" => PricingError::CodeNotFound,
            "Partner Not Found" => PricingError::PartnerNotFound,
            other => PricingError::Rejected(other.to_string()),
        }
    }
}

/// Result type for pricing operations.
pub type PricingResult<T> = Result<T, PricingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_messages_round_trip() {
        for err in [
            PricingError::InvalidCode,
            PricingError::InvalidPartner,
            PricingError::InvalidQuantity,
            PricingError::CodeNotFound,
            PricingError::PartnerNotFound,
        ] {
            assert_eq!(PricingError::from_remote(&err.to_string()), err);
        }
    }

    #[test]
    fn test_unknown_message_is_rejected() {
        let err = PricingError::from_remote(INVALID_REQUEST);
        assert_eq!(err, PricingError::Rejected("Invalid Request".into()));
        assert_eq!(err.kind(), ErrorKind::Rejected);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(PricingError::Transport("refused".into()).is_retryable());
        assert!(PricingError::CircuitOpen("a:1".into()).is_retryable());
        assert!(PricingError::RateLimitExceeded("a:1".into()).is_retryable());
        assert!(!PricingError::CodeNotFound.is_retryable());
        assert!(!PricingError::InvalidQuantity.is_retryable());
        assert!(!PricingError::NoInstancesAvailable.is_retryable());
    }

    #[test]
    fn test_missing_distinguishes_lookups() {
        assert_eq!(PricingError::CodeNotFound.missing(), Some(Missing::Product));
        assert_eq!(PricingError::PartnerNotFound.missing(), Some(Missing::Partner));
        assert_eq!(PricingError::InvalidCode.missing(), None);
    }

    #[test]
    fn test_exhausted_retries_display() {
        let err = PricingError::ExhaustedRetries {
            attempts: 3,
            last: Some(Box::new(PricingError::Transport("connection refused".into()))),
        };
        assert_eq!(
            err.to_string(),
            "retries exhausted after 3 attempt(s): transport error: connection refused"
        );

        let bare = PricingError::ExhaustedRetries { attempts: 1, last: None };
        assert_eq!(bare.to_string(), "retries exhausted after 1 attempt(s)");
    }
}
