use std::sync::Arc;

use ratatui::{
    buffer::Buffer,
    crossterm::event::KeyCode,
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

use super::surface::{MenuSurface, SurfaceSignal};
use crate::client::ActionDispatcher;
use crate::model::Note;

/// Bare overflow menu: names the note and closes again.
#[derive(Debug, Default)]
pub struct NoteDropDown;

impl NoteDropDown {
    pub fn new() -> Self {
        Self
    }
}

impl MenuSurface for NoteDropDown {
    fn handle_key(
        &mut self,
        note: &Arc<Note>,
        key: KeyCode,
        _dispatcher: &dyn ActionDispatcher,
    ) -> SurfaceSignal {
        match key {
            KeyCode::Esc | KeyCode::Char('m') | KeyCode::Char('q') => {
                log::debug!("Menu for {} dismissed", note.id());
                SurfaceSignal::Close
            }
            _ => SurfaceSignal::Continue,
        }
    }

    fn render(&mut self, note: &Note, expanded: bool, area: Rect, buf: &mut Buffer) {
        if !expanded || area.height == 0 {
            return;
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("⋮ {}", note.id().short()))
            .border_style(Style::default().fg(Color::Blue));

        Clear.render(area, buf);
        Paragraph::new(vec![
            Line::from(format!("note {}", note.id_hex())),
            Line::from(format!("by   {}", note.author().short())),
            Line::styled("Esc to close", Style::default().fg(Color::DarkGray)),
        ])
        .block(block)
        .render(area, buf);
    }
}
