use std::sync::Arc;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, StatefulWidget, Widget, Wrap},
};

use super::action_row::{NoteActionRow, RowContext};
use super::note_menu::NoteDropDown;
use super::reply_composer::ReplyComposer;
use crate::model::Note;

pub struct NoteCardState {
    pub selected: bool,
}

/// A note with its author line, text and action row, inside a border.
pub struct NoteCard {
    pub row: NoteActionRow,
}

impl NoteCard {
    pub fn new(note: Arc<Note>, context: RowContext) -> Self {
        let row = NoteActionRow::mount(
            note,
            context,
            Box::new(ReplyComposer::new()),
            Box::new(NoteDropDown::new()),
        );
        Self { row }
    }

    pub fn note(&self) -> &Arc<Note> {
        self.row.note()
    }

    /// Rows needed at `width`: borders, author line, wrapped text, action row.
    pub fn height(&self, width: u16) -> u16 {
        let inner = width.saturating_sub(2).max(1) as usize;
        let text = self.note().content().chars().count();
        let text_lines = text.div_ceil(inner).max(1) as u16;
        2 + 1 + text_lines + 1
    }
}

impl StatefulWidget for &mut NoteCard {
    type State = NoteCardState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        if area.height == 0 {
            return;
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if state.selected {
                Color::Blue
            } else {
                Color::White
            }));

        let inner_area = block.inner(area);
        block.render(area, buf);
        if inner_area.height == 0 {
            return;
        }

        let note = Arc::clone(self.note());
        let header = Line::from(vec![
            Span::styled(
                note.author().short(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" · {}", note.id().short()),
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        header.render(Rect { height: 1, ..inner_area }, buf);

        // The action row keeps the last line; text gets what is in between.
        let text_area = Rect {
            y: inner_area.y + 1,
            height: inner_area.height.saturating_sub(2),
            ..inner_area
        };
        if text_area.height > 0 {
            Paragraph::new(note.content())
                .wrap(Wrap { trim: true })
                .render(text_area, buf);
        }

        if inner_area.height >= 2 {
            let row_area = Rect {
                y: inner_area.bottom() - 1,
                height: 1,
                ..inner_area
            };
            self.row.render(row_area, buf);
        }
    }
}
