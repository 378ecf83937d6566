use std::sync::Arc;

use ratatui::{buffer::Buffer, crossterm::event::KeyCode, layout::Rect};

use crate::client::{Account, ActionDispatcher};
use crate::model::Note;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceSignal {
    Continue,
    Close,
}

/// Where a reply gets written. Mounted while the row has a reply target.
pub trait ReplySurface: Send {
    fn open(&mut self, target: Arc<Note>, account: Arc<dyn Account>);
    fn handle_key(&mut self, key: KeyCode) -> SurfaceSignal;
    fn render(&mut self, area: Rect, buf: &mut Buffer);
}

/// The overflow menu. Always bound to the row; draws nothing while collapsed.
pub trait MenuSurface: Send {
    fn handle_key(
        &mut self,
        note: &Arc<Note>,
        key: KeyCode,
        dispatcher: &dyn ActionDispatcher,
    ) -> SurfaceSignal;
    fn render(&mut self, note: &Note, expanded: bool, area: Rect, buf: &mut Buffer);
}

/// A `percent_x` wide, `height` tall box centred in `area`.
pub fn popup_area(area: Rect, percent_x: u16, height: u16) -> Rect {
    let width = (u32::from(area.width) * u32::from(percent_x.min(100)) / 100) as u16;
    let width = width.max(1).min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn popup_is_centred_and_clamped() {
        let area = Rect::new(0, 0, 100, 20);
        assert_eq!(popup_area(area, 60, 8), Rect::new(20, 6, 60, 8));
        assert_eq!(popup_area(area, 150, 40), Rect::new(0, 0, 100, 20));
    }
}
