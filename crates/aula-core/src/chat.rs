//! Chat timeline engine.
//!
//! Merges a possibly out-of-order stream of text events into a
//! display-ordered sequence, synthesizing time-separator entries when a
//! conversational gap exceeds the configured threshold.

use std::sync::OnceLock;
use std::time::Duration;

/// Timeline entry kind. Separators are derived by the engine, never
/// delivered by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Text,
    TimeSeparator,
}

/// Rendering size computed by the display layer's measurement callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutSize {
    pub width: u32,
    pub height: u32,
}

/// One timeline entry.
///
/// Immutable after creation except for the lazily-computed layout size,
/// which is a render cache and not part of the entry's identity.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub author: String,
    pub content: String,
    pub is_mine: bool,
    pub kind: MessageKind,
    pub timestamp_ms: i64,
    layout_size: OnceLock<LayoutSize>,
}

impl ChatMessage {
    pub fn text(author: &str, content: &str, is_mine: bool, timestamp_ms: i64) -> Self {
        Self {
            author: author.to_string(),
            content: content.to_string(),
            is_mine,
            kind: MessageKind::Text,
            timestamp_ms,
            layout_size: OnceLock::new(),
        }
    }

    /// A separator carries no author or content, only the timestamp of
    /// the entry it precedes.
    pub(crate) fn separator(timestamp_ms: i64) -> Self {
        Self {
            author: String::new(),
            content: String::new(),
            is_mine: false,
            kind: MessageKind::TimeSeparator,
            timestamp_ms,
            layout_size: OnceLock::new(),
        }
    }

    /// Return the cached layout size, computing it with `measure` on
    /// first access.
    pub fn layout_size(&self, measure: impl FnOnce(&ChatMessage) -> LayoutSize) -> LayoutSize {
        *self.layout_size.get_or_init(|| measure(self))
    }
}

impl PartialEq for ChatMessage {
    fn eq(&self, other: &Self) -> bool {
        self.author == other.author
            && self.content == other.content
            && self.is_mine == other.is_mine
            && self.kind == other.kind
            && self.timestamp_ms == other.timestamp_ms
    }
}

impl Eq for ChatMessage {}

/// Timeline tuning knobs.
#[derive(Debug, Clone, Copy)]
pub struct TimelineConfig {
    /// Gap between consecutive text entries beyond which a separator is
    /// synthesized.
    pub separator_gap: Duration,
    /// Upper bound on retained entries; `None` keeps the whole history.
    pub max_entries: Option<usize>,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            separator_gap: Duration::from_secs(300),
            max_entries: None,
        }
    }
}

/// Ordered chat timeline for one room.
///
/// Owned by the session; all mutation goes through the session's lock,
/// so readers always observe a fully-constructed sequence.
#[derive(Debug)]
pub struct ChatTimeline {
    entries: Vec<ChatMessage>,
    config: TimelineConfig,
    frozen: bool,
}

impl ChatTimeline {
    pub fn new(config: TimelineConfig) -> Self {
        Self {
            entries: Vec::new(),
            config,
            frozen: false,
        }
    }

    /// Insert a text entry at its ordered position.
    ///
    /// Ordering key is `timestamp_ms`; ties and in-order arrivals keep
    /// arrival order, so the common case is a tail push. The engine does
    /// not deduplicate; message identity belongs to the transport.
    ///
    /// Returns a copy of the inserted entry.
    pub fn append(
        &mut self,
        author: &str,
        content: &str,
        is_mine: bool,
        timestamp_ms: i64,
    ) -> ChatMessage {
        let msg = ChatMessage::text(author, content, is_mine, timestamp_ms);
        if self.frozen {
            tracing::warn!("append on frozen timeline dropped");
            return msg;
        }

        // Stable insertion from the tail: only strictly-later entries
        // move right, so equal timestamps preserve call order.
        let mut pos = self.entries.len();
        while pos > 0 && self.entries[pos - 1].timestamp_ms > timestamp_ms {
            pos -= 1;
        }

        // Separator rule consults only the immediately preceding text
        // entry: it marks conversational gaps, not calendar boundaries.
        let gap_ms = self.config.separator_gap.as_millis() as i64;
        let needs_separator = self.entries[..pos]
            .iter()
            .rev()
            .find(|m| m.kind == MessageKind::Text)
            .is_some_and(|prev| timestamp_ms - prev.timestamp_ms > gap_ms);

        if needs_separator {
            self.entries.insert(pos, ChatMessage::separator(timestamp_ms));
            pos += 1;
        }
        self.entries.insert(pos, msg.clone());
        self.evict_overflow();
        msg
    }

    /// Read-only view of the current sequence. Re-reading is idempotent
    /// and reflects the latest state.
    pub fn entries(&self) -> &[ChatMessage] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries (room exit).
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Stop accepting appends; the sequence stays readable as a frozen
    /// snapshot.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn evict_overflow(&mut self) {
        let Some(max) = self.config.max_entries else {
            return;
        };
        if self.entries.len() > max {
            let excess = self.entries.len() - max;
            self.entries.drain(..excess);
        }
        // A separator with nothing before it partitions nothing.
        while self
            .entries
            .first()
            .is_some_and(|m| m.kind == MessageKind::TimeSeparator)
        {
            self.entries.remove(0);
        }
    }
}

impl Default for ChatTimeline {
    fn default() -> Self {
        Self::new(TimelineConfig::default())
    }
}
