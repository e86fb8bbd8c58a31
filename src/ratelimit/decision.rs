//! Admission decisions returned to the routing layer.

/// Outcome of a single admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The request may proceed.
    Admit {
        /// Configured requests per window
        limit: u64,
        /// Requests left in the current window
        remaining: u64,
        /// When the current window ends (epoch milliseconds)
        reset_time_ms: u64,
    },
    /// The client has used its quota for the current window.
    Reject {
        limit: u64,
        reset_time_ms: u64,
        /// Whole seconds until the window ends, rounded up
        retry_after_secs: u64,
        status_code: u16,
        message: String,
    },
}

impl Decision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Decision::Admit { .. })
    }

    pub fn limit(&self) -> u64 {
        match self {
            Decision::Admit { limit, .. } | Decision::Reject { limit, .. } => *limit,
        }
    }

    /// Remaining quota. Always zero for a rejection.
    pub fn remaining(&self) -> u64 {
        match self {
            Decision::Admit { remaining, .. } => *remaining,
            Decision::Reject { .. } => 0,
        }
    }

    pub fn reset_time_ms(&self) -> u64 {
        match self {
            Decision::Admit { reset_time_ms, .. } | Decision::Reject { reset_time_ms, .. } => {
                *reset_time_ms
            }
        }
    }

    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Decision::Admit { .. } => None,
            Decision::Reject {
                retry_after_secs, ..
            } => Some(*retry_after_secs),
        }
    }
}
