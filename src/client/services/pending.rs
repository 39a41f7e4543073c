use crate::client::models::message::MessageId;
use crate::client::utils::task::ScheduledTask;

/// One in-flight local message awaiting its server echo.
#[derive(Debug)]
pub struct PendingEntry {
    pub id: MessageId,
    pub text: String,
    /// Timeout timer; aborted automatically when the entry is dropped, so
    /// confirming or failing an entry also cancels its timer.
    pub timeout: ScheduledTask,
}

/// In-flight local sends, in insertion order.
///
/// The server does not round-trip the client-assigned id, so the *text* is
/// the matching key against inbound echoes. Two identical pending texts are
/// indistinguishable; the oldest entry wins, which keeps confirmations in
/// send order. Known limitation inherited from the wire format.
#[derive(Debug, Default)]
pub struct PendingSet {
    entries: Vec<PendingEntry>,
}

impl PendingSet {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn register(&mut self, id: MessageId, text: String, timeout: ScheduledTask) {
        self.entries.push(PendingEntry { id, text, timeout });
    }

    /// Match an inbound echo: remove and return the oldest entry with this
    /// exact text, if any.
    pub fn confirm_oldest(&mut self, text: &str) -> Option<PendingEntry> {
        let idx = self.entries.iter().position(|e| e.text == text)?;
        Some(self.entries.remove(idx))
    }

    /// Resolve an entry by id (send failure or timeout).
    pub fn take(&mut self, id: &MessageId) -> Option<PendingEntry> {
        let idx = self.entries.iter().position(|e| &e.id == id)?;
        Some(self.entries.remove(idx))
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.entries.iter().any(|e| &e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
