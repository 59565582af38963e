/// Handle returned by [`Observers::subscribe`]; pass it back to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Callback<T> = Box<dyn FnMut(&T)>;

/// Ordered list of callbacks notified synchronously, in subscription order.
pub struct Observers<T: ?Sized> {
    next_id: u64,
    entries: Vec<(ObserverId, Callback<T>)>,
}

impl<T: ?Sized> Observers<T> {
    pub fn new() -> Self {
        Observers {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, f: impl FnMut(&T) + 'static) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Box::new(f)));
        id
    }

    /// Returns false when the id was not subscribed.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(eid, _)| *eid != id);
        self.entries.len() != before
    }

    pub fn notify(&mut self, value: &T) {
        for (_, f) in self.entries.iter_mut() {
            f(value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: ?Sized> Default for Observers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> std::fmt::Debug for Observers<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("len", &self.entries.len())
            .finish()
    }
}
