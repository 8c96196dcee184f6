//! Cooperative cancellation of long-running operations.

use crate::error::MapcraftError;

/// Handle shared between the caller and a running pipeline.
///
/// Cloning the token gives another handle to the same state. Long operations check it between
/// batches of work and stop with [`MapcraftError::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(tokio_util::sync::CancellationToken);

impl CancellationToken {
    /// Creates a new token in the non-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.cancel();
    }

    /// Returns true if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }

    /// Creates a token that is cancelled together with this one, but can also be cancelled on its
    /// own without affecting the parent.
    pub fn child_token(&self) -> Self {
        Self(self.0.child_token())
    }

    pub(crate) fn check(&self) -> Result<(), MapcraftError> {
        if self.is_cancelled() {
            Err(MapcraftError::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl From<tokio_util::sync::CancellationToken> for CancellationToken {
    fn from(token: tokio_util::sync::CancellationToken) -> Self {
        Self(token)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn clones_share_state() {
        let token = CancellationToken::new();
        let other = token.clone();
        assert!(token.check().is_ok());

        other.cancel();
        assert!(token.is_cancelled());
        assert_matches!(token.check(), Err(MapcraftError::Cancelled));
    }

    #[test]
    fn child_follows_parent() {
        let parent = CancellationToken::new();
        let child = parent.child_token();
        child.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());

        let child = parent.child_token();
        parent.cancel();
        assert_matches!(child.check(), Err(MapcraftError::Cancelled));
    }

    #[test]
    fn wraps_external_token() {
        let external = tokio_util::sync::CancellationToken::new();
        let token = CancellationToken::from(external.clone());
        external.cancel();
        assert!(token.is_cancelled());
    }
}
