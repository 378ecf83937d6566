use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tokio::sync::watch;

use super::account::{Account, ActionDispatcher};
use crate::model::{Note, NoteId, RelatedNote, User};

const KIND_REACTION: u8 = 7;
const KIND_BOOST: u8 = 6;

pub struct LocalAccount {
    user: User,
    writeable: bool,
}

impl LocalAccount {
    pub fn new(user: User, writeable: bool) -> Self {
        Self { user, writeable }
    }

    pub fn read_only(user: User) -> Self {
        Self::new(user, false)
    }
}

impl Account for LocalAccount {
    fn is_writeable(&self) -> bool {
        self.writeable
    }

    fn user_profile(&self) -> User {
        self.user.clone()
    }
}

/// In-process dispatcher. Boosts and reactions are not sent anywhere; they
/// show up in the note's live streams after `echo_delay`, the way a relay
/// round trip would.
pub struct LocalSession {
    account: watch::Sender<Option<Arc<dyn Account>>>,
    echo_delay: Duration,
}

impl LocalSession {
    pub fn new(account: Option<Arc<dyn Account>>, echo_delay: Duration) -> Self {
        let (sender, _) = watch::channel(account);
        Self {
            account: sender,
            echo_delay,
        }
    }

    pub fn set_account(&self, account: Option<Arc<dyn Account>>) {
        log::info!(
            "Active account {}",
            if account.is_some() { "changed" } else { "cleared" }
        );
        self.account.send_replace(account);
    }

    fn spawn_echo(&self, note: &Arc<Note>, kind: u8) {
        let Some(account) = self.account() else {
            return;
        };
        let author = account.user_profile().pubkey;
        let echo = RelatedNote {
            id: derive_event_id(kind, &note.id(), author.as_bytes()),
            author,
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            log::warn!("No runtime to echo kind {} on {}", kind, note.id());
            return;
        };
        let note = Arc::clone(note);
        let delay = self.echo_delay;

        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let added = match kind {
                KIND_BOOST => note.add_boost(echo),
                _ => note.add_reaction(echo),
            };
            log::debug!("Echoed kind {} on {}: {}", kind, note.id(), added);
        });
    }
}

impl ActionDispatcher for LocalSession {
    fn account(&self) -> Option<Arc<dyn Account>> {
        self.account.borrow().clone()
    }

    fn boost(&self, note: &Arc<Note>) {
        let Some(account) = self.account() else {
            return;
        };
        if note.is_boosted_by(&account.user_profile()) {
            log::debug!("Already boosted {}", note.id());
            return;
        }
        self.spawn_echo(note, KIND_BOOST);
    }

    fn react_to(&self, note: &Arc<Note>) {
        let Some(account) = self.account() else {
            return;
        };
        if note.is_reacted_by(&account.user_profile()) {
            log::debug!("Already reacted to {}", note.id());
            return;
        }
        self.spawn_echo(note, KIND_REACTION);
    }
}

fn derive_event_id(kind: u8, target: &NoteId, author: &[u8; 32]) -> NoteId {
    let mut hasher = Sha256::new();
    hasher.update([kind]);
    hasher.update(target.as_bytes());
    hasher.update(author);
    NoteId::from_bytes(hasher.finalize().into())
}
