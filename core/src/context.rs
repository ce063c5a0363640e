//! Cancellation context handed to lifecycle hooks.

use tokio_util::sync::CancellationToken;

/// Carries a cancellation signal through the lifecycle call chain.
///
/// Every frame of a call stack runs under a child of its parent's context.
/// The child is cancelled as soon as that frame's lifecycle returns, whether
/// it succeeded or not. Hooks decide for themselves whether to observe it.
///
/// # Examples
///
/// ```
/// use cmder::Context;
///
/// let root = Context::new();
/// let child = root.child();
///
/// root.cancel();
/// assert!(child.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing token, e.g. one cancelled by a signal handler.
    pub fn from_token(token: CancellationToken) -> Self {
        Self { token }
    }

    /// Derives a context that is cancelled with this one, or on its own.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}
