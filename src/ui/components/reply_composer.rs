use std::sync::Arc;

use ratatui::{
    buffer::Buffer,
    crossterm::event::KeyCode,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

use super::surface::{ReplySurface, SurfaceSignal};
use crate::client::Account;
use crate::model::Note;

const CHARACTER_LIMIT: usize = 280;

/// Text entry for a reply. Drafts are not published from here.
#[derive(Default)]
pub struct ReplyComposer {
    content: String,
    cursor_position: usize,
    reply_to: Option<Arc<Note>>,
    account: Option<Arc<dyn Account>>,
}

impl ReplyComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply_to(&self) -> Option<&Arc<Note>> {
        self.reply_to.as_ref()
    }

    pub fn insert_char(&mut self, c: char) {
        if self.get_character_count() < CHARACTER_LIMIT {
            let at = self.byte_index(self.cursor_position);
            self.content.insert(at, c);
            self.cursor_position += 1;
        }
    }

    pub fn delete_char(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
            let at = self.byte_index(self.cursor_position);
            self.content.remove(at);
        }
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor_position < self.get_character_count() {
            self.cursor_position += 1;
        }
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor_position = 0;
    }

    pub fn get_content(&self) -> &str {
        &self.content
    }

    fn byte_index(&self, chars: usize) -> usize {
        self.content
            .char_indices()
            .nth(chars)
            .map_or(self.content.len(), |(i, _)| i)
    }

    fn get_character_count(&self) -> usize {
        self.content.chars().count()
    }

    fn get_character_count_status(&self) -> (String, Color) {
        let count = self.get_character_count();
        let color = match count {
            0..=230 => Color::Green,
            231..=270 => Color::Yellow,
            _ => Color::Red,
        };

        (format!("{}/{}", count, CHARACTER_LIMIT), color)
    }

    fn close(&mut self) -> SurfaceSignal {
        self.clear();
        self.reply_to = None;
        self.account = None;
        SurfaceSignal::Close
    }
}

impl ReplySurface for ReplyComposer {
    fn open(&mut self, target: Arc<Note>, account: Arc<dyn Account>) {
        self.clear();
        self.reply_to = Some(target);
        self.account = Some(account);
    }

    fn handle_key(&mut self, key: KeyCode) -> SurfaceSignal {
        match key {
            KeyCode::Esc => return self.close(),
            KeyCode::Enter => {
                if let (Some(target), Some(account)) = (&self.reply_to, &self.account) {
                    log::info!(
                        "Reply draft to {} from {} ({} chars)",
                        target.id(),
                        account.user_profile().name(),
                        self.get_character_count()
                    );
                }
                return self.close();
            }
            KeyCode::Char(c) => self.insert_char(c),
            KeyCode::Backspace => self.delete_char(),
            KeyCode::Left => self.move_cursor_left(),
            KeyCode::Right => self.move_cursor_right(),
            _ => {}
        }
        SurfaceSignal::Continue
    }

    fn render(&mut self, area: Rect, buf: &mut Buffer) {
        let title = match &self.reply_to {
            Some(note) => format!("Reply to {}", note.id().short()),
            None => "Reply".to_string(),
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(Color::Green));

        let inner_area = block.inner(area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(inner_area);

        Clear.render(area, buf);
        block.render(area, buf);

        // Content with a block cursor
        let at = self.byte_index(self.cursor_position);
        let (before_cursor, after_cursor) = self.content.split_at(at);
        let mut after = after_cursor.chars();
        let under_cursor = after.next().map_or_else(|| "_".to_string(), String::from);

        let spans = vec![
            Span::raw(before_cursor),
            Span::styled(
                under_cursor,
                Style::default().bg(Color::White).fg(Color::Black),
            ),
            Span::raw(after.as_str()),
        ];

        Paragraph::new(Line::from(spans))
            .wrap(Wrap { trim: true })
            .render(chunks[0], buf);

        let (count_text, count_color) = self.get_character_count_status();
        let status_line = Line::from(vec![
            Span::raw("Enter to finish, Esc to cancel | "),
            Span::styled(count_text, Style::default().fg(count_color)),
        ]);

        Paragraph::new(status_line).render(chunks[1], buf);
    }
}
