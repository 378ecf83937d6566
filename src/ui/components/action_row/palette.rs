use ratatui::style::Color;

// The row's icons and labels sit at roughly a third of full contrast.
const MUTED_ALPHA: f32 = 0.32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub foreground: Color,
    pub background: Color,
    pub boosted: Color,
    pub reacted: Color,
}

impl Palette {
    pub fn muted(&self) -> Color {
        blend(self.background, self.foreground, MUTED_ALPHA)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            foreground: Color::Rgb(230, 230, 230),
            background: Color::Rgb(0, 0, 0),
            boosted: Color::Rgb(52, 199, 89),
            reacted: Color::Rgb(255, 59, 92),
        }
    }
}

/// Moves `amount` of the way from `from` to `to`. Named and indexed colours
/// can't be mixed, so they snap at the halfway point.
pub fn blend(from: Color, to: Color, amount: f32) -> Color {
    let amount = amount.clamp(0.0, 1.0);
    match (from, to) {
        (Color::Rgb(r1, g1, b1), Color::Rgb(r2, g2, b2)) => Color::Rgb(
            mix(r1, r2, amount),
            mix(g1, g2, amount),
            mix(b1, b2, amount),
        ),
        _ if amount < 0.5 => from,
        _ => to,
    }
}

fn mix(a: u8, b: u8, amount: f32) -> u8 {
    let (a, b) = (f32::from(a), f32::from(b));
    (a + (b - a) * amount).round() as u8
}
