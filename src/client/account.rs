use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

use crate::model::{Note, User};

/// The identity a session is acting as.
#[cfg_attr(test, automock)]
pub trait Account: Send + Sync {
    /// Whether this identity may publish. Read-only sessions return false.
    fn is_writeable(&self) -> bool;
    fn user_profile(&self) -> User;
}

/// Performs note actions on behalf of the active account.
///
/// Dispatches are fire-and-forget: the caller never learns whether they
/// succeeded except by watching the note's live streams.
#[cfg_attr(test, automock)]
pub trait ActionDispatcher: Send + Sync {
    /// The active account, if one is signed in.
    fn account(&self) -> Option<Arc<dyn Account>>;
    fn boost(&self, note: &Arc<Note>);
    fn react_to(&self, note: &Arc<Note>);
}
