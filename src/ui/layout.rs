use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    widgets::{Paragraph, StatefulWidget},
    Frame,
};

use super::components::note_card::NoteCardState;
use crate::ui::App;

pub fn draw(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(f.area());

    app.update_status();

    draw_cards(f, chunks[0], app);

    if let Some(card) = app.selected_card() {
        card.row.render_surfaces(chunks[0], f.buffer_mut());
    }

    f.render_widget(Paragraph::new(app.status_line.clone()), chunks[1]);
}

/// Index of the first card to draw so the selected one fits.
fn first_visible(app: &App, width: u16, height: u16) -> usize {
    if app.cards.is_empty() {
        return 0;
    }
    let mut used = 0u16;
    let mut first = app.selected_index;
    for index in (0..=app.selected_index.min(app.cards.len() - 1)).rev() {
        let card_height = app.cards[index].height(width);
        if used + card_height > height && index != app.selected_index {
            break;
        }
        used = used.saturating_add(card_height);
        first = index;
    }
    first
}

fn draw_cards(f: &mut Frame, area: Rect, app: &mut App) {
    let first = first_visible(app, area.width, area.height);
    let selected = app.selected_index;
    let buf = f.buffer_mut();
    let mut y = area.y;

    for (index, card) in app.cards.iter_mut().enumerate() {
        let height = card.height(area.width);
        if index < first || y >= area.bottom() {
            card.row.clear_hits();
            continue;
        }
        let card_area = Rect {
            x: area.x,
            y,
            width: area.width,
            height: height.min(area.bottom() - y),
        };
        let mut state = NoteCardState {
            selected: index == selected,
        };
        card.render(card_area, buf, &mut state);
        y += card_area.height;
    }
}
