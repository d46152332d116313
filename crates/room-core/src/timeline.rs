use crate::types::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadPhase {
    NotLoaded,
    Loading,
    Loaded,
    Closed,
}

/// Where a pushed message ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Appended to the visible tail.
    Appended,
    /// Held back until the in-flight initial load resolves.
    Buffered,
    /// Dropped because the room view was torn down.
    Dropped,
}

/// Append-only message store for the active room.
///
/// The store is populated by one bulk history load and subsequently appended
/// to by push notifications, in delivery order. Pushes that arrive while the
/// initial load is still in flight are buffered and append-replayed after it
/// resolves, so none are silently dropped. Duplicate message IDs are not
/// filtered here; delivery-guarantee questions belong to the channel layer.
#[derive(Debug, Clone)]
pub struct MessageLog {
    messages: Vec<Message>,
    pending: Vec<Message>,
    phase: LoadPhase,
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageLog {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            pending: Vec::new(),
            phase: LoadPhase::NotLoaded,
        }
    }

    /// Current messages in delivery order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Whether the initial history load has completed.
    pub fn is_loaded(&self) -> bool {
        self.phase == LoadPhase::Loaded
    }

    /// Mark the one-shot history fetch as in flight.
    pub fn begin_initial_load(&mut self) {
        if self.phase == LoadPhase::Closed {
            return;
        }
        self.phase = LoadPhase::Loading;
    }

    /// Replace the store wholesale with the fetched history, then replay any
    /// pushes buffered while the load was in flight.
    pub fn complete_initial_load(&mut self, history: Vec<Message>) {
        if self.phase == LoadPhase::Closed {
            return;
        }
        self.messages = history;
        self.messages.append(&mut self.pending);
        self.phase = LoadPhase::Loaded;
    }

    /// History fetch failed: keep prior contents, but flush buffered pushes
    /// to the tail so live updates still land without history.
    pub fn fail_initial_load(&mut self) {
        if self.phase == LoadPhase::Closed {
            return;
        }
        self.messages.append(&mut self.pending);
        self.phase = LoadPhase::NotLoaded;
    }

    /// Handle one push notification.
    pub fn append_from_push(&mut self, message: Message) -> AppendOutcome {
        match self.phase {
            LoadPhase::Closed => AppendOutcome::Dropped,
            LoadPhase::Loading => {
                self.pending.push(message);
                AppendOutcome::Buffered
            }
            LoadPhase::NotLoaded | LoadPhase::Loaded => {
                self.messages.push(message);
                AppendOutcome::Appended
            }
        }
    }

    /// Tear the store down with the room view; later pushes are dropped.
    pub fn close(&mut self) {
        self.phase = LoadPhase::Closed;
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessageType;
    use chrono::NaiveDate;

    fn message(id: &str, content: &str) -> Message {
        Message {
            id: id.to_owned(),
            room_id: "483920".to_owned(),
            user_id: "u1".to_owned(),
            user_name: "Asha".to_owned(),
            content: content.to_owned(),
            message_type: MessageType::Text,
            is_anonymous: true,
            timestamp: NaiveDate::from_ymd_opt(2026, 8, 30)
                .expect("valid date")
                .and_hms_opt(9, 41, 0)
                .expect("valid time"),
        }
    }

    fn ids(log: &MessageLog) -> Vec<&str> {
        log.messages().iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn preserves_push_delivery_order() {
        let mut log = MessageLog::new();
        log.begin_initial_load();
        log.complete_initial_load(Vec::new());

        for id in ["m1", "m2", "m3"] {
            assert_eq!(log.append_from_push(message(id, "x")), AppendOutcome::Appended);
        }

        assert_eq!(ids(&log), vec!["m1", "m2", "m3"]);
    }

    #[test]
    fn keeps_duplicate_ids() {
        let mut log = MessageLog::new();
        log.complete_initial_load(Vec::new());

        log.append_from_push(message("m1", "once"));
        log.append_from_push(message("m1", "once"));

        assert_eq!(ids(&log), vec!["m1", "m1"]);
    }

    #[test]
    fn buffers_pushes_during_initial_load_and_replays_after() {
        let mut log = MessageLog::new();
        log.begin_initial_load();

        assert_eq!(log.append_from_push(message("m3", "early")), AppendOutcome::Buffered);
        assert_eq!(log.append_from_push(message("m4", "early")), AppendOutcome::Buffered);
        assert!(log.messages().is_empty());

        log.complete_initial_load(vec![message("m1", "a"), message("m2", "b")]);
        assert_eq!(ids(&log), vec!["m1", "m2", "m3", "m4"]);
        assert!(log.is_loaded());
    }

    #[test]
    fn failed_load_keeps_prior_state_and_flushes_buffer() {
        let mut log = MessageLog::new();
        log.begin_initial_load();
        log.append_from_push(message("m9", "live"));

        log.fail_initial_load();
        assert_eq!(ids(&log), vec!["m9"]);
        assert!(!log.is_loaded());

        // The room stays usable for live updates.
        log.append_from_push(message("m10", "still live"));
        assert_eq!(ids(&log), vec!["m9", "m10"]);
    }

    #[test]
    fn load_replaces_store_wholesale() {
        let mut log = MessageLog::new();
        log.complete_initial_load(vec![message("old", "stale")]);

        log.begin_initial_load();
        log.complete_initial_load(vec![message("m1", "fresh")]);
        assert_eq!(ids(&log), vec!["m1"]);
    }

    #[test]
    fn drops_pushes_after_close() {
        let mut log = MessageLog::new();
        log.complete_initial_load(vec![message("m1", "a")]);

        log.close();
        assert_eq!(log.append_from_push(message("m2", "late")), AppendOutcome::Dropped);
        assert_eq!(ids(&log), vec!["m1"]);
    }
}
