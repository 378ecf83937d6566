pub mod action_row;
pub mod note_card;
pub mod note_menu;
pub mod reply_composer;
pub mod surface;
