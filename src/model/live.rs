use tokio::sync::watch;

/// A value owned by one side and pushed to any number of subscribers.
///
/// Writers go through [`LiveState::modify`], readers hold a [`Subscription`]
/// and pick up whatever was delivered since they last looked.
pub struct LiveState<T> {
    sender: watch::Sender<T>,
}

impl<T: Clone> LiveState<T> {
    pub fn new(initial: T) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    pub fn subscribe(&self) -> Subscription<T> {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Runs `f` against the current value. Subscribers are only notified
    /// when `f` reports that it changed something.
    pub fn modify(&self, f: impl FnOnce(&mut T) -> bool) -> bool {
        self.sender.send_if_modified(f)
    }

    pub fn snapshot(&self) -> T {
        self.sender.borrow().clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Read side of a [`LiveState`]. Dropping it unregisters.
pub struct Subscription<T> {
    receiver: watch::Receiver<T>,
}

impl<T: Clone> Subscription<T> {
    /// The value as of the last delivery, whether or not it has been read.
    pub fn current(&self) -> T {
        self.receiver.borrow().clone()
    }

    /// Returns the newest value if one arrived since the last call.
    pub fn latest(&mut self) -> Option<T> {
        match self.receiver.has_changed() {
            Ok(true) => Some(self.receiver.borrow_and_update().clone()),
            _ => None,
        }
    }

    /// Waits for the next delivery. Returns false once the owner is gone.
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }
}
