use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use data_encoding::HEXLOWER_PERMISSIVE;
use thiserror::Error;

use super::live::LiveState;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Expected 32 bytes, got {0}")]
    WrongLength(usize),
}

fn decode_key(hex: &str) -> Result<[u8; 32], ModelError> {
    let bytes = HEXLOWER_PERMISSIVE
        .decode(hex.as_bytes())
        .map_err(|e| ModelError::InvalidHex(e.to_string()))?;
    <[u8; 32]>::try_from(bytes.as_slice()).map_err(|_| ModelError::WrongLength(bytes.len()))
}

macro_rules! hex_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name([u8; 32]);

        impl $name {
            pub const fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            pub fn from_hex(hex: &str) -> Result<Self, ModelError> {
                decode_key(hex).map(Self)
            }

            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            pub fn to_hex(&self) -> String {
                data_encoding::HEXLOWER.encode(&self.0)
            }

            /// First eight hex digits, for display.
            pub fn short(&self) -> String {
                data_encoding::HEXLOWER.encode(&self.0[..4])
            }
        }

        impl FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }
    };
}

hex_key!(
    /// Event id of a note.
    NoteId
);
hex_key!(
    /// Identity key of an author.
    PublicKey
);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub pubkey: PublicKey,
    pub display_name: Option<String>,
}

impl User {
    pub fn new(pubkey: PublicKey) -> Self {
        Self {
            pubkey,
            display_name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// The display name, or the short key for users without one.
    pub fn name(&self) -> String {
        self.display_name
            .clone()
            .unwrap_or_else(|| self.pubkey.short())
    }
}

/// A note that points at another one: a reply, a boost or a reaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RelatedNote {
    pub id: NoteId,
    pub author: PublicKey,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RelatedNotes {
    notes: HashMap<NoteId, PublicKey>,
}

impl RelatedNotes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if a note with the same id was already present.
    pub fn insert(&mut self, note: RelatedNote) -> bool {
        self.notes.insert(note.id, note.author).is_none()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn contains_author(&self, author: &PublicKey) -> bool {
        self.notes.values().any(|a| a == author)
    }
}

/// A post. Its replies, boosts and reactions are kept in live streams that
/// stay `None` until something has been loaded for them.
pub struct Note {
    id: NoteId,
    author: PublicKey,
    content: String,
    live_replies: LiveState<Option<RelatedNotes>>,
    live_boosts: LiveState<Option<RelatedNotes>>,
    live_reactions: LiveState<Option<RelatedNotes>>,
}

impl Note {
    pub fn new(id: NoteId, author: PublicKey, content: impl Into<String>) -> Self {
        Self {
            id,
            author,
            content: content.into(),
            live_replies: LiveState::new(None),
            live_boosts: LiveState::new(None),
            live_reactions: LiveState::new(None),
        }
    }

    pub fn id(&self) -> NoteId {
        self.id
    }

    pub fn id_hex(&self) -> String {
        self.id.to_hex()
    }

    pub fn author(&self) -> PublicKey {
        self.author
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn live_replies(&self) -> &LiveState<Option<RelatedNotes>> {
        &self.live_replies
    }

    pub fn live_boosts(&self) -> &LiveState<Option<RelatedNotes>> {
        &self.live_boosts
    }

    pub fn live_reactions(&self) -> &LiveState<Option<RelatedNotes>> {
        &self.live_reactions
    }

    pub fn add_reply(&self, reply: RelatedNote) -> bool {
        Self::add_related(&self.live_replies, reply)
    }

    pub fn add_boost(&self, boost: RelatedNote) -> bool {
        Self::add_related(&self.live_boosts, boost)
    }

    pub fn add_reaction(&self, reaction: RelatedNote) -> bool {
        Self::add_related(&self.live_reactions, reaction)
    }

    pub fn is_boosted_by(&self, user: &User) -> bool {
        Self::has_author(&self.live_boosts, &user.pubkey)
    }

    pub fn is_reacted_by(&self, user: &User) -> bool {
        Self::has_author(&self.live_reactions, &user.pubkey)
    }

    fn add_related(state: &LiveState<Option<RelatedNotes>>, note: RelatedNote) -> bool {
        state.modify(|notes| notes.get_or_insert_with(RelatedNotes::new).insert(note))
    }

    fn has_author(state: &LiveState<Option<RelatedNotes>>, author: &PublicKey) -> bool {
        state
            .snapshot()
            .is_some_and(|notes| notes.contains_author(author))
    }
}

impl fmt::Debug for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Note")
            .field("id", &self.id)
            .field("author", &self.author)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> [u8; 32] {
        [byte; 32]
    }

    #[test]
    fn note_id_hex_is_lowercase_64_chars() {
        let id = NoteId::from_bytes(key(0xab));
        let hex = id.to_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c == 'a' || c == 'b'));
        assert_eq!(NoteId::from_hex(&hex), Ok(id));
        assert_eq!(hex.to_uppercase().parse::<NoteId>(), Ok(id));
    }

    #[test]
    fn rejects_bad_ids() {
        assert!(matches!(NoteId::from_hex("zz"), Err(ModelError::InvalidHex(_))));
        assert_eq!(NoteId::from_hex("abcd"), Err(ModelError::WrongLength(2)));
    }

    #[test]
    fn name_falls_back_to_short_key() {
        let user = User::new(PublicKey::from_bytes(key(0xcd)));
        assert_eq!(user.name(), "cdcdcdcd");
        assert_eq!(user.with_name("carol").name(), "carol");
    }

    #[test]
    fn streams_start_unloaded() {
        let note = Note::new(NoteId::from_bytes(key(1)), PublicKey::from_bytes(key(2)), "gm");
        assert_eq!(note.live_replies().snapshot(), None);
        assert_eq!(note.live_boosts().snapshot(), None);
        assert_eq!(note.live_reactions().snapshot(), None);
    }

    #[test]
    fn boost_membership_follows_author() {
        let me = User::new(PublicKey::from_bytes(key(9)));
        let note = Note::new(NoteId::from_bytes(key(1)), PublicKey::from_bytes(key(2)), "gm");
        assert!(!note.is_boosted_by(&me));

        note.add_boost(RelatedNote {
            id: NoteId::from_bytes(key(3)),
            author: PublicKey::from_bytes(key(4)),
        });
        assert!(!note.is_boosted_by(&me));

        note.add_boost(RelatedNote {
            id: NoteId::from_bytes(key(5)),
            author: me.pubkey,
        });
        assert!(note.is_boosted_by(&me));
        assert!(!note.is_reacted_by(&me));
    }

    #[test]
    fn duplicate_related_notes_do_not_notify() {
        let note = Note::new(NoteId::from_bytes(key(1)), PublicKey::from_bytes(key(2)), "gm");
        let reply = RelatedNote {
            id: NoteId::from_bytes(key(3)),
            author: PublicKey::from_bytes(key(4)),
        };
        let mut sub = note.live_replies().subscribe();
        assert!(note.add_reply(reply));
        assert_eq!(sub.latest().flatten().map(|r| r.len()), Some(1));
        assert!(!note.add_reply(reply));
        assert_eq!(sub.latest(), None);
    }
}
