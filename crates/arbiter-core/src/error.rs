use thiserror::Error;

/// Failure of a single upstream fetch, as seen by the resolver.
///
/// Whether a variant is fatal depends on the caller: the first decision search
/// and the top-level case fetch propagate it, per-case and per-decision
/// fetches inside the resolver log it and skip the item.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl FetchError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    /// True for [`FetchError::NotFound`] and for an upstream 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Upstream { status: 404, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_404_counts_as_not_found() {
        assert!(FetchError::NotFound("case 9".into()).is_not_found());
        let upstream = |status| FetchError::Upstream {
            status,
            body: String::new(),
        };
        assert!(upstream(404).is_not_found());
        assert!(!upstream(500).is_not_found());
        assert!(!FetchError::Transport("reset".into()).is_not_found());
    }
}
