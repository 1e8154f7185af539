//! UI-facing side effects: the message log and the daily report.
//!
//! Role rules and the engine announce things (wins, investigation
//! results, narrator prompts) by appending messages. The log never takes
//! part in resolution; it is read by the presentation layer, which turns
//! each opaque `MessageKey` plus positional `MessageArg`s into text
//! through its own catalog.
//!
//! ## Example Usage
//!
//! ```
//! use mafia_engine::actions::{ActionLog, EngineActions, MessageArg, MessageKey};
//! use mafia_engine::core::{Moment, Phase, PlayerId};
//!
//! let mut log = ActionLog::new();
//! let now = Moment::new(1, Phase::Night);
//!
//! let id = EngineActions::new(&mut log, now).show_message(
//!     MessageKey::new("investigationResult"),
//!     vec![MessageArg::Player(PlayerId::new(2)), MessageArg::Flag(true)],
//!     true,
//! );
//!
//! assert_eq!(log.len(), 1);
//! assert!(EngineActions::new(&mut log, now).dismiss(id));
//! assert!(log.pending().next().is_none());
//! ```

use im::Vector;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{Moment, PlayerId, RoleId};

/// Message identifier, unique within a log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u32);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Message({})", self.0)
    }
}

/// Catalog key of a message, as an ordered path (`["win", "assassin"]`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageKey(pub SmallVec<[String; 2]>);

impl MessageKey {
    /// Key with a single segment.
    pub fn new(root: impl Into<String>) -> Self {
        let mut segments = SmallVec::new();
        segments.push(root.into());
        Self(segments)
    }

    /// Append a segment (builder pattern).
    #[must_use]
    pub fn with(mut self, segment: impl Into<String>) -> Self {
        self.0.push(segment.into());
        self
    }

    /// Path segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// First segment.
    #[must_use]
    pub fn root(&self) -> &str {
        self.0.first().map_or("", String::as_str)
    }
}

impl From<&str> for MessageKey {
    fn from(root: &str) -> Self {
        Self::new(root)
    }
}

impl std::fmt::Display for MessageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// Opaque positional argument of a message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageArg {
    /// A player reference.
    Player(PlayerId),
    /// A role reference.
    Role(RoleId),
    /// Free text.
    Text(String),
    /// A number.
    Number(i64),
    /// A yes/no value (catalogs map it to "is" / "is not").
    Flag(bool),
}

/// An entry in the message log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Identifier within the log.
    pub id: MessageId,

    /// Catalog key.
    pub key: MessageKey,

    /// Positional arguments.
    pub args: Vec<MessageArg>,

    /// Can the narrator dismiss it?
    pub dismissible: bool,

    /// Has it been dismissed?
    pub dismissed: bool,

    /// When it was posted.
    pub posted_at: Moment,
}

/// Message log plus the per-day report.
///
/// Persistent vectors keep snapshots for observers cheap.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLog {
    messages: Vector<Message>,
    daily_report: Vector<Message>,
    next_id: u32,
}

impl ActionLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages, oldest first.
    #[must_use]
    pub fn messages(&self) -> &Vector<Message> {
        &self.messages
    }

    /// Today's report entries, oldest first.
    #[must_use]
    pub fn daily_report(&self) -> &Vector<Message> {
        &self.daily_report
    }

    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Get a message by id.
    #[must_use]
    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Messages whose first key segment is `root`.
    pub fn with_root<'a>(&'a self, root: &'a str) -> impl Iterator<Item = &'a Message> + 'a {
        self.messages.iter().filter(move |m| m.key.root() == root)
    }

    /// Dismissible messages not yet dismissed.
    pub fn pending(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.dismissible && !m.dismissed)
    }

    /// Start a new daily report.
    pub fn reset_daily_report(&mut self) {
        self.daily_report.clear();
    }

    fn allocate(&mut self, key: MessageKey, args: Vec<MessageArg>, dismissible: bool, at: Moment) -> Message {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        Message {
            id,
            key,
            args,
            dismissible,
            dismissed: false,
            posted_at: at,
        }
    }
}

/// Action surface over the log.
///
/// Obtained from `Engine::actions`, or built directly over a log.
pub struct EngineActions<'a> {
    log: &'a mut ActionLog,
    now: Moment,
}

impl<'a> EngineActions<'a> {
    /// Wrap a log; `now` stamps new messages.
    pub fn new(log: &'a mut ActionLog, now: Moment) -> Self {
        Self { log, now }
    }

    /// Append a message to the log.
    pub fn show_message(
        &mut self,
        key: impl Into<MessageKey>,
        args: Vec<MessageArg>,
        dismissible: bool,
    ) -> MessageId {
        let message = self.log.allocate(key.into(), args, dismissible, self.now);
        let id = message.id;
        tracing::debug!(message = %id, key = %message.key, "message posted");
        self.log.messages.push_back(message);
        id
    }

    /// Append an entry to today's report.
    ///
    /// The report is cleared when the clock reaches the first phase of a date.
    pub fn report(&mut self, key: impl Into<MessageKey>, args: Vec<MessageArg>) -> MessageId {
        let message = self.log.allocate(key.into(), args, false, self.now);
        let id = message.id;
        self.log.daily_report.push_back(message);
        id
    }

    /// Dismiss a message. Returns `false` if it does not exist, is not
    /// dismissible, or was already dismissed.
    pub fn dismiss(&mut self, id: MessageId) -> bool {
        match self.log.messages.iter_mut().find(|m| m.id == id) {
            Some(message) if message.dismissible && !message.dismissed => {
                message.dismissed = true;
                true
            }
            _ => false,
        }
    }
}
