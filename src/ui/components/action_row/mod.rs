use std::sync::Arc;
use std::time::{Duration, Instant};

use ratatui::{
    buffer::Buffer,
    crossterm::event::KeyCode,
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Modifier, Style},
    widgets::Widget,
};

use badge::BadgeSlot;

use super::surface::{popup_area, MenuSurface, ReplySurface, SurfaceSignal};
use crate::client::{Account, ActionDispatcher, CounterService, UriHandler};
use crate::model::{Note, RelatedNotes, Subscription, User};

pub mod badge;
pub mod format;
pub mod palette;

pub use format::format_count;
pub use palette::Palette;

const REPLY_ICON: &str = "↩";
const BOOST_ICON: &str = "⇄";
const BOOSTED_ICON: &str = "⇆";
const LIKE_ICON: &str = "♡";
const LIKED_ICON: &str = "♥";
const STATS_ICON: &str = "▃";
const MENU_ICON: &str = "⋮";

const ICON_WIDTH: u16 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RowButton {
    Reply,
    Boost,
    React,
    Stats,
    Menu,
}

impl RowButton {
    pub fn from_key(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::Char('c') => Some(Self::Reply),
            KeyCode::Char('r') => Some(Self::Boost),
            KeyCode::Char('l') => Some(Self::React),
            KeyCode::Char('s') => Some(Self::Stats),
            KeyCode::Char('m') => Some(Self::Menu),
            _ => None,
        }
    }
}

/// What a tap ended up doing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TapOutcome {
    Ignored,
    ReplyOpened,
    Boosted,
    Reacted,
    StatsOpened,
    MenuExpanded,
    /// The key went to the open composer or menu.
    SurfaceKey,
}

/// Collaborators shared by every row on screen.
#[derive(Clone)]
pub struct RowContext {
    pub dispatcher: Arc<dyn ActionDispatcher>,
    pub counter: Arc<CounterService>,
    pub uri_handler: Arc<dyn UriHandler>,
    pub palette: Palette,
    pub crossfade: Duration,
}

/// Counts and toggles as of the latest delivered live state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RowSnapshot {
    pub reply_count: Option<usize>,
    pub boost_count: Option<usize>,
    pub reaction_count: Option<usize>,
    pub boosted_by_me: bool,
    pub reacted_by_me: bool,
}

/// Reply, boost, react, stats and menu controls under a note.
///
/// Counts come from the note's live streams, subscribed at mount and
/// released on drop. Nothing is toggled locally: the boosted and reacted
/// glyphs only change once the streams say so.
pub struct NoteActionRow {
    note: Arc<Note>,
    context: RowContext,
    replies: Subscription<Option<RelatedNotes>>,
    boosts: Subscription<Option<RelatedNotes>>,
    reactions: Subscription<Option<RelatedNotes>>,
    badge: BadgeSlot,
    composer: Box<dyn ReplySurface>,
    menu: Box<dyn MenuSurface>,
    menu_expanded: bool,
    reply_target: Option<Arc<Note>>,
    hits: Vec<(Rect, RowButton)>,
}

impl NoteActionRow {
    pub fn mount(
        note: Arc<Note>,
        context: RowContext,
        composer: Box<dyn ReplySurface>,
        menu: Box<dyn MenuSurface>,
    ) -> Self {
        log::info!("Mounting action row for {}", note.id());
        let badge = BadgeSlot::load(Arc::clone(&context.counter), note.id());
        Self {
            replies: note.live_replies().subscribe(),
            boosts: note.live_boosts().subscribe(),
            reactions: note.live_reactions().subscribe(),
            note,
            context,
            badge,
            composer,
            menu,
            menu_expanded: false,
            reply_target: None,
            hits: Vec::new(),
        }
    }

    pub fn note(&self) -> &Arc<Note> {
        &self.note
    }

    pub fn reply_target(&self) -> Option<&Arc<Note>> {
        self.reply_target.as_ref()
    }

    pub fn menu_expanded(&self) -> bool {
        self.menu_expanded
    }

    pub fn has_open_surface(&self) -> bool {
        self.reply_target.is_some() || self.menu_expanded
    }

    pub fn snapshot(&self, user: &User) -> RowSnapshot {
        let replies = self.replies.current();
        let boosts = self.boosts.current();
        let reactions = self.reactions.current();

        RowSnapshot {
            reply_count: Some(replies.as_ref().map_or(0, RelatedNotes::len)),
            boost_count: boosts.as_ref().map(RelatedNotes::len),
            reaction_count: reactions.as_ref().map(RelatedNotes::len),
            boosted_by_me: boosts.is_some_and(|b| b.contains_author(&user.pubkey)),
            reacted_by_me: reactions.is_some_and(|r| r.contains_author(&user.pubkey)),
        }
    }

    /// Drains pending deliveries. Returns true if the row should be redrawn.
    pub fn poll_updates(&mut self) -> bool {
        let replies = self.replies.latest().is_some();
        let boosts = self.boosts.latest().is_some();
        let reactions = self.reactions.latest().is_some();
        let badge = self.badge.poll();
        replies
            || boosts
            || reactions
            || badge
            || self.badge.is_fading(self.context.crossfade, Instant::now())
    }

    pub fn tap(&mut self, button: RowButton) -> TapOutcome {
        let Some(account) = self.context.dispatcher.account() else {
            return TapOutcome::Ignored;
        };

        match button {
            RowButton::Reply => {
                if !self.can_write(&account, button) {
                    return TapOutcome::Ignored;
                }
                self.reply_target = Some(Arc::clone(&self.note));
                self.composer.open(Arc::clone(&self.note), account);
                TapOutcome::ReplyOpened
            }
            RowButton::Boost => {
                if !self.can_write(&account, button) {
                    return TapOutcome::Ignored;
                }
                log::debug!("Boosting {}", self.note.id());
                self.context.dispatcher.boost(&self.note);
                TapOutcome::Boosted
            }
            RowButton::React => {
                if !self.can_write(&account, button) {
                    return TapOutcome::Ignored;
                }
                log::debug!("Reacting to {}", self.note.id());
                self.context.dispatcher.react_to(&self.note);
                TapOutcome::Reacted
            }
            RowButton::Stats => {
                self.open_stats();
                TapOutcome::StatsOpened
            }
            RowButton::Menu => {
                self.menu_expanded = true;
                TapOutcome::MenuExpanded
            }
        }
    }

    fn can_write(&self, account: &Arc<dyn Account>, button: RowButton) -> bool {
        let writeable = account.is_writeable();
        if !writeable {
            log::debug!("{:?} on {} ignored: account is read-only", button, self.note.id());
        }
        writeable
    }

    fn open_stats(&self) {
        match self.context.counter.stats_url(&self.note.id()) {
            Ok(url) => {
                if let Err(e) = self.context.uri_handler.open_uri(&url) {
                    log::warn!("Could not open {}: {}", url, e);
                }
            }
            Err(e) => log::warn!("No stats url for {}: {}", self.note.id(), e),
        }
    }

    /// Close callback handed to the reply composer.
    pub fn close_reply(&mut self) {
        self.reply_target = None;
    }

    /// Close callback handed to the menu.
    pub fn dismiss_menu(&mut self) {
        self.menu_expanded = false;
    }

    /// Keys go to an open composer or menu first, then map to buttons.
    pub fn handle_key(&mut self, key: KeyCode) -> TapOutcome {
        if self.reply_target.is_some() {
            if self.composer.handle_key(key) == SurfaceSignal::Close {
                self.close_reply();
            }
            return TapOutcome::SurfaceKey;
        }
        if self.menu_expanded {
            let signal = self
                .menu
                .handle_key(&self.note, key, self.context.dispatcher.as_ref());
            if signal == SurfaceSignal::Close {
                self.dismiss_menu();
            }
            return TapOutcome::SurfaceKey;
        }
        RowButton::from_key(key).map_or(TapOutcome::Ignored, |button| self.tap(button))
    }

    pub fn handle_click(&mut self, column: u16, row: u16) -> TapOutcome {
        if self.has_open_surface() {
            return TapOutcome::Ignored;
        }
        self.button_at(column, row)
            .map_or(TapOutcome::Ignored, |button| self.tap(button))
    }

    /// The button drawn at a screen cell in the last render, if any.
    pub fn button_at(&self, column: u16, row: u16) -> Option<RowButton> {
        let position = Position::new(column, row);
        self.hits
            .iter()
            .find(|(area, _)| area.contains(position))
            .map(|(_, button)| *button)
    }

    /// Forgets where buttons were drawn, for rows scrolled out of view.
    pub fn clear_hits(&mut self) {
        self.hits.clear();
    }

    /// Draws the composer and the menu over `area`.
    pub fn render_surfaces(&mut self, area: Rect, buf: &mut Buffer) {
        if self.reply_target.is_some() {
            self.composer.render(popup_area(area, 60, 8), buf);
        }
        self.menu
            .render(&self.note, self.menu_expanded, popup_area(area, 50, 5), buf);
    }

    fn draw_button(
        &mut self,
        cell: Rect,
        buf: &mut Buffer,
        button: RowButton,
        icon: &str,
        style: Style,
    ) {
        buf.set_stringn(cell.x, cell.y, icon, cell.width as usize, style);
        self.hits.push((cell, button));
    }
}

/// Counts sit two columns clear of their icon.
fn count_label(count: Option<usize>) -> String {
    format!("  {}", format_count(count))
}

fn draw_label(cell: Rect, buf: &mut Buffer, text: &str, style: Style) {
    buf.set_stringn(cell.x, cell.y, text, cell.width as usize, style);
}

impl Widget for &mut NoteActionRow {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.hits.clear();
        if area.height == 0 {
            return;
        }
        let Some(account) = self.context.dispatcher.account() else {
            return;
        };

        let snapshot = self.snapshot(&account.user_profile());
        let palette = self.context.palette;
        let muted = Style::default().fg(palette.muted());

        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(ICON_WIDTH),
                Constraint::Fill(1),
                Constraint::Length(ICON_WIDTH),
                Constraint::Fill(1),
                Constraint::Length(ICON_WIDTH),
                Constraint::Fill(1),
                Constraint::Length(ICON_WIDTH),
                Constraint::Fill(1),
                Constraint::Length(ICON_WIDTH),
            ])
            .split(Rect { height: 1, ..area });

        self.draw_button(cells[0], buf, RowButton::Reply, REPLY_ICON, muted);
        draw_label(cells[1], buf, &count_label(snapshot.reply_count), muted);

        let (boost_icon, boost_style) = if snapshot.boosted_by_me {
            (
                BOOSTED_ICON,
                Style::default()
                    .fg(palette.boosted)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            (BOOST_ICON, muted)
        };
        self.draw_button(cells[2], buf, RowButton::Boost, boost_icon, boost_style);
        draw_label(cells[3], buf, &count_label(snapshot.boost_count), muted);

        let (like_icon, like_style) = if snapshot.reacted_by_me {
            (LIKED_ICON, Style::default().fg(palette.reacted))
        } else {
            (LIKE_ICON, muted)
        };
        self.draw_button(cells[4], buf, RowButton::React, like_icon, like_style);
        draw_label(cells[5], buf, &count_label(snapshot.reaction_count), muted);

        self.draw_button(cells[6], buf, RowButton::Stats, STATS_ICON, muted);
        if let Some(text) = self.badge.text() {
            let color = self
                .badge
                .color(&palette, self.context.crossfade, Instant::now());
            draw_label(cells[7], buf, text, Style::default().fg(color));
        }

        self.draw_button(cells[8], buf, RowButton::Menu, MENU_ICON, muted);
    }
}

impl Drop for NoteActionRow {
    fn drop(&mut self) {
        log::info!("Unmounting action row for {}", self.note.id());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::account::{MockAccount, MockActionDispatcher};
    use crate::client::counter::Badge;
    use crate::client::uri::MockUriHandler;
    use crate::model::{NoteId, PublicKey, RelatedNote};
    use crate::ui::components::note_menu::NoteDropDown;
    use crate::ui::components::reply_composer::ReplyComposer;

    const WIDTH: u16 = 48;

    fn me() -> User {
        User::new(PublicKey::from_bytes([0xee; 32]))
    }

    fn someone(byte: u8) -> RelatedNote {
        RelatedNote {
            id: NoteId::from_bytes([byte; 32]),
            author: PublicKey::from_bytes([byte; 32]),
        }
    }

    fn mine(byte: u8) -> RelatedNote {
        RelatedNote {
            id: NoteId::from_bytes([byte; 32]),
            author: me().pubkey,
        }
    }

    fn note() -> Arc<Note> {
        Arc::new(Note::new(
            NoteId::from_bytes([0x42; 32]),
            PublicKey::from_bytes([0x01; 32]),
            "hello world",
        ))
    }

    fn account(writeable: bool) -> Arc<dyn Account> {
        let mut account = MockAccount::new();
        account.expect_is_writeable().return_const(writeable);
        account.expect_user_profile().returning(me);
        Arc::new(account)
    }

    fn dispatcher_with(account: Option<Arc<dyn Account>>) -> MockActionDispatcher {
        let mut dispatcher = MockActionDispatcher::new();
        dispatcher
            .expect_account()
            .returning(move || account.clone());
        dispatcher
    }

    fn uri_handler() -> MockUriHandler {
        let mut handler = MockUriHandler::new();
        handler.expect_open_uri().never();
        handler
    }

    fn mount_with(
        note: &Arc<Note>,
        dispatcher: MockActionDispatcher,
        uri_handler: MockUriHandler,
    ) -> NoteActionRow {
        let context = RowContext {
            dispatcher: Arc::new(dispatcher),
            counter: Arc::new(CounterService::new("https://counter.example.org/", 8).unwrap()),
            uri_handler: Arc::new(uri_handler),
            palette: Palette::default(),
            crossfade: Duration::ZERO,
        };
        NoteActionRow::mount(
            Arc::clone(note),
            context,
            Box::new(ReplyComposer::new()),
            Box::new(NoteDropDown::new()),
        )
    }

    fn draw(row: &mut NoteActionRow) -> Buffer {
        let area = Rect::new(0, 0, WIDTH, 1);
        let mut buf = Buffer::empty(area);
        row.render(area, &mut buf);
        buf
    }

    fn icon_cell(row: &NoteActionRow, button: RowButton) -> Rect {
        row.hits
            .iter()
            .find(|(_, b)| *b == button)
            .map(|(area, _)| *area)
            .unwrap()
    }

    /// The first `width` cells after a button's icon.
    fn cells_after(row: &NoteActionRow, buf: &Buffer, button: RowButton, width: u16) -> String {
        let icon = icon_cell(row, button);
        let start = icon.x + icon.width;
        (start..start + width)
            .map(|x| buf[(x, icon.y)].symbol().to_string())
            .collect()
    }

    fn label(row: &NoteActionRow, buf: &Buffer, button: RowButton) -> String {
        cells_after(row, buf, button, 3)
    }

    #[test]
    fn no_account_renders_nothing() {
        let note = note();
        let mut dispatcher = dispatcher_with(None);
        dispatcher.expect_boost().never();
        dispatcher.expect_react_to().never();
        let mut row = mount_with(&note, dispatcher, uri_handler());

        let buf = draw(&mut row);
        assert_eq!(buf, Buffer::empty(Rect::new(0, 0, WIDTH, 1)));
        assert!(row.hits.is_empty());
        assert_eq!(row.tap(RowButton::Boost), TapOutcome::Ignored);
        assert_eq!(row.tap(RowButton::Menu), TapOutcome::Ignored);
        assert!(!row.menu_expanded());
    }

    #[test]
    fn read_only_account_taps_are_inert() {
        let note = note();
        for byte in 1..=3 {
            note.add_reply(someone(byte));
        }
        let mut dispatcher = dispatcher_with(Some(account(false)));
        dispatcher.expect_boost().never();
        dispatcher.expect_react_to().never();
        let mut row = mount_with(&note, dispatcher, uri_handler());

        let buf = draw(&mut row);
        assert_eq!(label(&row, &buf, RowButton::Reply), "  3");
        assert_eq!(label(&row, &buf, RowButton::Boost), "   ");
        assert_eq!(label(&row, &buf, RowButton::React), "   ");

        assert_eq!(row.tap(RowButton::Reply), TapOutcome::Ignored);
        assert_eq!(row.tap(RowButton::Boost), TapOutcome::Ignored);
        assert_eq!(row.tap(RowButton::React), TapOutcome::Ignored);
        assert!(row.reply_target().is_none());
        assert!(!row.menu_expanded());
    }

    #[test]
    fn count_labels_are_indented_two_columns() {
        let note = note();
        note.add_reply(someone(1));
        let mut row = mount_with(&note, dispatcher_with(Some(account(true))), uri_handler());

        let buf = draw(&mut row);
        assert_eq!(cells_after(&row, &buf, RowButton::Reply, 4), "  1 ");
    }

    #[test]
    fn boosted_by_me_shows_boosted_variant() {
        let note = note();
        note.add_boost(someone(1));
        note.add_boost(mine(2));
        let mut row = mount_with(&note, dispatcher_with(Some(account(true))), uri_handler());

        let buf = draw(&mut row);
        let icon = icon_cell(&row, RowButton::Boost);
        assert_eq!(buf[(icon.x, icon.y)].fg, Palette::default().boosted);
        assert_eq!(buf[(icon.x, icon.y)].symbol(), BOOSTED_ICON);
        assert_eq!(label(&row, &buf, RowButton::Boost), "  2");
    }

    #[test]
    fn boost_dispatches_once_per_tap_and_waits_for_stream() {
        let note = note();
        let mut dispatcher = dispatcher_with(Some(account(true)));
        let id = note.id();
        dispatcher
            .expect_boost()
            .withf(move |n| n.id() == id)
            .times(2)
            .return_const(());
        let mut row = mount_with(&note, dispatcher, uri_handler());

        assert_eq!(row.tap(RowButton::Boost), TapOutcome::Boosted);
        let buf = draw(&mut row);
        let icon = icon_cell(&row, RowButton::Boost);
        assert_eq!(buf[(icon.x, icon.y)].fg, Palette::default().muted());
        assert_eq!(buf[(icon.x, icon.y)].symbol(), BOOST_ICON);

        note.add_boost(mine(9));
        assert!(row.poll_updates());
        let buf = draw(&mut row);
        assert_eq!(buf[(icon.x, icon.y)].fg, Palette::default().boosted);
        assert_eq!(buf[(icon.x, icon.y)].symbol(), BOOSTED_ICON);
        assert_eq!(label(&row, &buf, RowButton::Boost), "  1");

        assert_eq!(row.tap(RowButton::Boost), TapOutcome::Boosted);
    }

    #[test]
    fn react_flips_to_liked_glyph_after_delivery() {
        let note = note();
        let mut dispatcher = dispatcher_with(Some(account(true)));
        dispatcher.expect_react_to().times(1).return_const(());
        let mut row = mount_with(&note, dispatcher, uri_handler());

        assert_eq!(row.handle_key(KeyCode::Char('l')), TapOutcome::Reacted);
        let buf = draw(&mut row);
        let icon = icon_cell(&row, RowButton::React);
        assert_eq!(buf[(icon.x, icon.y)].symbol(), LIKE_ICON);

        note.add_reaction(mine(3));
        note.add_reaction(someone(4));
        row.poll_updates();
        let buf = draw(&mut row);
        assert_eq!(buf[(icon.x, icon.y)].symbol(), LIKED_ICON);
        assert_eq!(label(&row, &buf, RowButton::React), "  2");
    }

    #[test]
    fn reply_opens_composer_until_it_closes() {
        let note = note();
        let mut row = mount_with(&note, dispatcher_with(Some(account(true))), uri_handler());

        assert_eq!(row.tap(RowButton::Reply), TapOutcome::ReplyOpened);
        assert!(row
            .reply_target()
            .is_some_and(|target| Arc::ptr_eq(target, &note)));

        // Keys belong to the composer while it is open.
        assert_eq!(row.handle_key(KeyCode::Char('r')), TapOutcome::SurfaceKey);
        assert_eq!(row.handle_key(KeyCode::Esc), TapOutcome::SurfaceKey);
        assert!(row.reply_target().is_none());
    }

    #[test]
    fn menu_expands_and_dismisses() {
        let note = note();
        let mut row = mount_with(&note, dispatcher_with(Some(account(false))), uri_handler());

        assert_eq!(row.tap(RowButton::Menu), TapOutcome::MenuExpanded);
        assert!(row.menu_expanded());
        assert_eq!(row.handle_key(KeyCode::Char('x')), TapOutcome::SurfaceKey);
        assert!(row.menu_expanded());
        assert_eq!(row.handle_key(KeyCode::Esc), TapOutcome::SurfaceKey);
        assert!(!row.menu_expanded());

        row.tap(RowButton::Menu);
        row.dismiss_menu();
        assert!(!row.menu_expanded());
    }

    #[test]
    fn stats_opens_counter_page() {
        let note = note();
        let expected = format!("https://counter.example.org/{}/", note.id_hex());
        let mut handler = MockUriHandler::new();
        handler
            .expect_open_uri()
            .withf(move |url| url.as_str() == expected)
            .times(1)
            .returning(|_| Ok(()));
        let mut row = mount_with(&note, dispatcher_with(Some(account(false))), handler);

        assert_eq!(row.tap(RowButton::Stats), TapOutcome::StatsOpened);
        assert!(row.reply_target().is_none());
        assert!(!row.menu_expanded());
    }

    #[test]
    fn failed_open_is_swallowed() {
        let note = note();
        let mut handler = MockUriHandler::new();
        handler
            .expect_open_uri()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("no browser")));
        let mut row = mount_with(&note, dispatcher_with(Some(account(true))), handler);
        assert_eq!(row.tap(RowButton::Stats), TapOutcome::StatsOpened);
    }

    #[test]
    fn clicks_hit_the_drawn_buttons() {
        let note = note();
        let mut dispatcher = dispatcher_with(Some(account(true)));
        dispatcher.expect_boost().times(1).return_const(());
        let mut row = mount_with(&note, dispatcher, uri_handler());
        draw(&mut row);

        let boost = icon_cell(&row, RowButton::Boost);
        assert_eq!(row.handle_click(boost.x, boost.y), TapOutcome::Boosted);
        let menu = icon_cell(&row, RowButton::Menu);
        assert_eq!(row.button_at(menu.x + 1, menu.y), Some(RowButton::Menu));
        assert_eq!(row.handle_click(boost.x, boost.y + 1), TapOutcome::Ignored);
    }

    #[test]
    fn badge_is_drawn_in_muted_tint() {
        let note = note();
        let mut row = mount_with(&note, dispatcher_with(Some(account(true))), uri_handler());
        row.badge.show(
            Badge {
                text: "1204".to_string(),
            },
            true,
        );

        let buf = draw(&mut row);
        let stats = icon_cell(&row, RowButton::Stats);
        let cell = &buf[(stats.x + stats.width, stats.y)];
        assert_eq!(cell.symbol(), "1");
        assert_eq!(cell.fg, Palette::default().muted());
    }

    #[test]
    fn unmount_releases_subscriptions() {
        let note = note();
        let row = mount_with(&note, dispatcher_with(Some(account(true))), uri_handler());
        assert_eq!(note.live_boosts().subscriber_count(), 1);
        assert_eq!(note.live_replies().subscriber_count(), 1);
        drop(row);
        assert_eq!(note.live_boosts().subscriber_count(), 0);
        assert_eq!(note.live_reactions().subscriber_count(), 0);
    }

    #[test]
    fn unloaded_streams_render_blank_counts() {
        let note = note();
        let row = mount_with(&note, dispatcher_with(Some(account(true))), uri_handler());
        let snapshot = row.snapshot(&me());
        assert_eq!(snapshot.reply_count, Some(0));
        assert_eq!(snapshot.boost_count, None);
        assert!(!snapshot.boosted_by_me);
        assert_eq!(format_count(snapshot.reply_count), " ");
    }
}
