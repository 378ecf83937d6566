pub mod live;
pub mod note;

pub use live::{LiveState, Subscription};
pub use note::{ModelError, Note, NoteId, PublicKey, RelatedNote, RelatedNotes, User};
