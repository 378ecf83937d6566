use std::io::{self, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
        MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::Backend, Terminal};
use sha2::{Digest, Sha256};

use super::components::action_row::{Palette, RowContext, TapOutcome};
use super::components::note_card::NoteCard;
use crate::client::{
    Account, ActionDispatcher, CounterService, LocalAccount, LocalSession, SystemUriHandler,
};
use crate::config::RowConfig;
use crate::model::{Note, NoteId, PublicKey, RelatedNote, User};
use crate::ui::draw;

#[derive(Debug, Clone, Copy, Default)]
pub struct AppOptions {
    pub read_only: bool,
    pub signed_out: bool,
}

pub struct App {
    pub session: Arc<LocalSession>,
    pub user: User,
    pub writeable: bool,
    pub cards: Vec<NoteCard>,
    pub selected_index: usize,
    pub status_line: String,
    last_outcome: Option<TapOutcome>,
}

impl App {
    pub fn new(config: &RowConfig, options: AppOptions) -> Result<Self> {
        let user = User::new(PublicKey::from_bytes(digest("local user"))).with_name("you");
        let writeable = !options.read_only;
        let account: Option<Arc<dyn Account>> = if options.signed_out {
            None
        } else {
            Some(Arc::new(LocalAccount::new(user.clone(), writeable)))
        };
        let session = Arc::new(LocalSession::new(account, config.echo_delay()));

        let context = RowContext {
            dispatcher: Arc::clone(&session) as Arc<dyn ActionDispatcher>,
            counter: Arc::new(CounterService::new(
                &config.counter_url,
                config.badge_cache_capacity,
            )?),
            uri_handler: Arc::new(SystemUriHandler),
            palette: config.palette.resolve().unwrap_or_else(|e| {
                log::warn!("Falling back to default palette: {}", e);
                Palette::default()
            }),
            crossfade: config.crossfade(),
        };

        let cards = seed_notes(&user)
            .into_iter()
            .map(|note| NoteCard::new(note, context.clone()))
            .collect();

        Ok(Self {
            session,
            user,
            writeable,
            cards,
            selected_index: 0,
            status_line: String::new(),
            last_outcome: None,
        })
    }

    pub fn selected_card(&mut self) -> Option<&mut NoteCard> {
        self.cards.get_mut(self.selected_index)
    }

    pub fn scroll_down(&mut self) {
        if self.selected_index + 1 < self.cards.len() {
            self.selected_index += 1;
        }
    }

    pub fn scroll_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    fn toggle_writeable(&mut self) {
        if self.session.account().is_none() {
            return;
        }
        self.writeable = !self.writeable;
        self.session.set_account(Some(Arc::new(LocalAccount::new(
            self.user.clone(),
            self.writeable,
        ))));
    }

    fn toggle_signed_in(&mut self) {
        let account: Option<Arc<dyn Account>> = match self.session.account() {
            Some(_) => None,
            None => Some(Arc::new(LocalAccount::new(self.user.clone(), self.writeable))),
        };
        self.session.set_account(account);
    }

    /// Returns true when the app should quit.
    pub fn handle_input(&mut self, key: KeyCode) -> bool {
        if let Some(card) = self.selected_card() {
            if card.row.has_open_surface() {
                card.row.handle_key(key);
                return false;
            }
        }

        match key {
            KeyCode::Char('q') => return true,
            KeyCode::Char('j') | KeyCode::Down => self.scroll_down(),
            KeyCode::Char('k') | KeyCode::Up => self.scroll_up(),
            KeyCode::Char('w') => self.toggle_writeable(),
            KeyCode::Char('a') => self.toggle_signed_in(),
            _ => {
                if let Some(card) = self.selected_card() {
                    let outcome = card.row.handle_key(key);
                    self.last_outcome = Some(outcome);
                }
            }
        }
        false
    }

    pub fn handle_click(&mut self, column: u16, row: u16) {
        if self
            .selected_card()
            .is_some_and(|card| card.row.has_open_surface())
        {
            return;
        }
        for (index, card) in self.cards.iter_mut().enumerate() {
            if card.row.button_at(column, row).is_some() {
                self.selected_index = index;
                self.last_outcome = Some(card.row.handle_click(column, row));
                return;
            }
        }
    }

    /// Picks up live-state deliveries for every mounted row.
    pub fn poll_updates(&mut self) -> bool {
        let mut changed = false;
        for card in &mut self.cards {
            changed |= card.row.poll_updates();
        }
        changed
    }

    pub async fn run(mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = ratatui::backend::CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal).await;

        self.cleanup(&mut terminal)?;

        result
    }

    async fn event_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        let tick_rate = Duration::from_millis(250);
        let mut last_tick = Instant::now();

        loop {
            self.poll_updates();

            terminal.draw(|f| draw(f, self))?;

            let timeout = tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_secs(0));

            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        if self.handle_input(key.code) {
                            return Ok(());
                        }
                    }
                    Event::Mouse(mouse) => {
                        if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
                            self.handle_click(mouse.column, mouse.row);
                        }
                    }
                    _ => {}
                }
            }

            if last_tick.elapsed() >= tick_rate {
                last_tick = Instant::now();
            }

            // Give echo tasks and badge loads a turn.
            tokio::task::yield_now().await;
        }
    }

    fn cleanup<B: Backend + Write>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
        Ok(())
    }

    pub fn update_status(&mut self) {
        let account = match self.session.account() {
            None => "signed out".to_string(),
            Some(account) if account.is_writeable() => {
                format!("{}, writeable", account.user_profile().name())
            }
            Some(account) => format!("{}, read-only", account.user_profile().name()),
        };
        let last = self
            .last_outcome
            .map(|o| format!(" | last: {:?}", o))
            .unwrap_or_default();
        self.status_line = format!(
            "q quit, j/k move, c reply, r boost, l like, s stats, m menu, w/a account [{}] {} / {}{}",
            account,
            self.selected_index + 1,
            self.cards.len(),
            last
        );
    }
}

fn digest(seed: &str) -> [u8; 32] {
    Sha256::digest(seed.as_bytes()).into()
}

fn related(seed: String, author: PublicKey) -> RelatedNote {
    RelatedNote {
        id: NoteId::from_bytes(digest(&seed)),
        author,
    }
}

fn stranger(seed: &str) -> PublicKey {
    PublicKey::from_bytes(digest(seed))
}

/// A few notes covering the states the row can show.
pub fn seed_notes(me: &User) -> Vec<Arc<Note>> {
    let author = stranger("alice");

    let quiet = Note::new(
        NoteId::from_bytes(digest("note:quiet")),
        author,
        "Three people replied to this one, nobody boosted it.",
    );
    for i in 0..3 {
        quiet.add_reply(related(format!("quiet:reply:{}", i), stranger(&format!("r{}", i))));
    }

    let boosted = Note::new(
        NoteId::from_bytes(digest("note:boosted")),
        stranger("bob"),
        "You boosted this already, along with one other person.",
    );
    boosted.add_boost(related("boosted:mine".to_string(), me.pubkey));
    boosted.add_boost(related("boosted:other".to_string(), stranger("carol")));

    let fresh = Note::new(
        NoteId::from_bytes(digest("note:fresh")),
        stranger("dave"),
        "Nothing has loaded for this note yet.",
    );

    let popular = Note::new(
        NoteId::from_bytes(digest("note:popular")),
        author,
        "A popular note with a thousand reactions.",
    );
    for i in 0..1000 {
        popular.add_reaction(related(format!("popular:like:{}", i), stranger(&format!("l{}", i))));
    }
    for i in 0..12 {
        popular.add_boost(related(format!("popular:boost:{}", i), stranger(&format!("b{}", i))));
    }

    vec![quiet, boosted, fresh, popular]
        .into_iter()
        .map(Arc::new)
        .collect()
}
