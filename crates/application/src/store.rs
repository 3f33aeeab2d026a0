use tokio::sync::watch;

/// Observable state holder. Views read snapshots or subscribe; only the
/// owning pipeline mutates.
pub struct StateStore<T> {
    tx: watch::Sender<T>,
}

impl<T: Clone> StateStore<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn snapshot(&self) -> T {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    /// Applies `update` under the channel lock and always notifies.
    pub(crate) fn update(&self, update: impl FnOnce(&mut T)) {
        self.tx.send_modify(update);
    }

    /// Applies `update` under the channel lock; subscribers are notified only
    /// when it returns `true`.
    pub(crate) fn update_if(&self, update: impl FnOnce(&mut T) -> bool) -> bool {
        self.tx.send_if_modified(update)
    }
}

impl<T: Clone + Default> Default for StateStore<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
