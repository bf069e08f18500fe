//! Error types shared across the planning pipeline.

use thiserror::Error;

/// Failures reported by a [`crate::traits::RoutingOracle`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OracleError {
    /// The service could not be reached at all.
    #[error("routing service unavailable: {0}")]
    Unavailable(String),

    /// The service answered but reported a non-OK status, e.g. no route found.
    #[error("routing service returned {code}: {}", .message.as_deref().unwrap_or("no message"))]
    Status {
        code: String,
        message: Option<String>,
    },

    /// The response could not be interpreted.
    #[error("malformed routing response: {0}")]
    Malformed(String),
}

impl OracleError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, OracleError::Unavailable(_))
    }
}

/// Request URLs are dropped: they may carry credentials such as an API key.
impl From<reqwest::Error> for OracleError {
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_decode() {
            OracleError::Malformed(err.to_string())
        } else if err.is_status() {
            OracleError::Status {
                code: err
                    .status()
                    .map(|status| status.as_u16().to_string())
                    .unwrap_or_else(|| "http".to_string()),
                message: Some(err.to_string()),
            }
        } else {
            OracleError::Unavailable(err.to_string())
        }
    }
}

/// Failures of the planning pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlannerError {
    /// Input rejected before any clustering or sequencing work.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The partitioning step could not produce groups.
    #[error("clustering failed: {0}")]
    ClusteringFailed(String),

    /// A single day's ordering or geometry lookup failed.
    #[error("route sequencing failed for day {day}: {source}")]
    RouteSequencingFailed {
        day: usize,
        #[source]
        source: OracleError,
    },

    /// The routing oracle transport could not be reached.
    #[error("routing oracle unavailable for day {day}: {message}")]
    OracleUnavailable { day: usize, message: String },

    /// No itinerary could be produced at all.
    #[error("failed to generate itinerary: {0}")]
    ItineraryGenerationFailed(#[source] Box<PlannerError>),
}

impl PlannerError {
    /// Converts an oracle failure for `day` into its per-day planner condition.
    pub fn sequencing(day: usize, source: OracleError) -> Self {
        match source {
            OracleError::Unavailable(message) => PlannerError::OracleUnavailable { day, message },
            source => PlannerError::RouteSequencingFailed { day, source },
        }
    }

    /// True when the caller is at fault (a 4xx-equivalent).
    pub fn is_client_error(&self) -> bool {
        matches!(self, PlannerError::InvalidRequest(_))
    }
}
