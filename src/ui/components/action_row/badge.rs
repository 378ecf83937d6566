use std::sync::Arc;
use std::time::{Duration, Instant};

use ratatui::style::Color;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tokio::task::JoinHandle;

use super::palette::{blend, Palette};
use crate::client::counter::{Badge, CounterService};
use crate::model::NoteId;

struct LoadedBadge {
    badge: Badge,
    shown_at: Instant,
    fade: bool,
}

/// The view-count badge cell. Loads in the background; until it arrives, or
/// if it never does, the cell stays blank.
pub struct BadgeSlot {
    pending: Option<oneshot::Receiver<Badge>>,
    task: Option<JoinHandle<()>>,
    loaded: Option<LoadedBadge>,
}

impl BadgeSlot {
    pub fn empty() -> Self {
        Self {
            pending: None,
            task: None,
            loaded: None,
        }
    }

    pub fn load(counter: Arc<CounterService>, id: NoteId) -> Self {
        let mut slot = Self::empty();

        // Memory hits are shown straight away, without the fade.
        if let Ok(mut cache) = counter.cache.try_write() {
            if let Some(badge) = cache.get(&id) {
                slot.show(badge.clone(), false);
                return slot;
            }
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            log::warn!("No runtime to load view badge for {}", id);
            return slot;
        };

        let (sender, receiver) = oneshot::channel();
        slot.pending = Some(receiver);
        slot.task = Some(runtime.spawn(async move {
            match counter.fetch_badge(&id).await {
                Ok(badge) => {
                    sender.send(badge).ok();
                }
                Err(e) => log::warn!("View badge for {} failed: {}", id, e),
            }
        }));
        slot
    }

    /// Picks up a finished load. Returns true if the badge just arrived.
    pub fn poll(&mut self) -> bool {
        let Some(receiver) = self.pending.as_mut() else {
            return false;
        };
        match receiver.try_recv() {
            Ok(badge) => {
                self.pending = None;
                self.task = None;
                self.show(badge, true);
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Closed) => {
                self.pending = None;
                self.task = None;
                false
            }
        }
    }

    pub fn show(&mut self, badge: Badge, fade: bool) {
        self.loaded = Some(LoadedBadge {
            badge,
            shown_at: Instant::now(),
            fade,
        });
    }

    pub fn text(&self) -> Option<&str> {
        self.loaded.as_ref().map(|l| l.badge.text.as_str())
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Badge colour at `now`: background fading into the muted tint.
    pub fn color(&self, palette: &Palette, crossfade: Duration, now: Instant) -> Color {
        blend(palette.background, palette.muted(), self.progress(crossfade, now))
    }

    pub fn is_fading(&self, crossfade: Duration, now: Instant) -> bool {
        self.loaded.is_some() && self.progress(crossfade, now) < 1.0
    }

    fn progress(&self, crossfade: Duration, now: Instant) -> f32 {
        match &self.loaded {
            None => 0.0,
            Some(loaded) if !loaded.fade || crossfade.is_zero() => 1.0,
            Some(loaded) => {
                let elapsed = now.saturating_duration_since(loaded.shown_at);
                (elapsed.as_secs_f32() / crossfade.as_secs_f32()).min(1.0)
            }
        }
    }
}

impl Drop for BadgeSlot {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
