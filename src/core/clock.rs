//! Game clock: dates and phases.
//!
//! ## Phase
//!
//! A fixed enumeration of the phases that make up one game date.
//! The engine compares phases for equality and order only; what happens
//! in each phase is decided by the game's `StackBuilder`.
//!
//! ## Moment
//!
//! A `(date, phase)` pair, ordered lexicographically. Moments are used
//! for event scheduling and emblem expiry.
//!
//! ## Clock
//!
//! Advances monotonically. Wrapping past the last phase starts the next
//! date at the first phase.

use serde::{Deserialize, Serialize};

/// One phase of a game date.
///
/// Discriminants are the phase numbers used in messages and in
/// serialized state (`Dawn` is phase 1).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Phase {
    /// City wakes up; the daily report starts fresh.
    Dawn = 1,
    /// Discussion and voting.
    Day = 2,
    /// Day actions wind down.
    Dusk = 3,
    /// Night actions.
    Night = 4,
}

impl Phase {
    /// All phases in clock order.
    pub const ALL: [Phase; 4] = [Phase::Dawn, Phase::Day, Phase::Dusk, Phase::Night];

    /// The phase every date starts with.
    #[must_use]
    pub const fn first() -> Self {
        Phase::Dawn
    }

    /// The phase after this one within the same date, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Phase::Dawn => Some(Phase::Day),
            Phase::Day => Some(Phase::Dusk),
            Phase::Dusk => Some(Phase::Night),
            Phase::Night => None,
        }
    }

    /// The phase number (1-based).
    #[must_use]
    pub const fn number(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Dawn => "dawn",
            Phase::Day => "day",
            Phase::Dusk => "dusk",
            Phase::Night => "night",
        };
        f.write_str(name)
    }
}

/// A point in game time.
///
/// Field order matters: the derived `Ord` compares `date` first, then `phase`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Moment {
    /// Game date (starts at 1).
    pub date: u32,
    /// Phase within the date.
    pub phase: Phase,
}

impl Moment {
    /// Create a new moment.
    #[must_use]
    pub const fn new(date: u32, phase: Phase) -> Self {
        Self { date, phase }
    }
}

impl std::fmt::Display for Moment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "day {} {}", self.date, self.phase)
    }
}

/// Monotonic game clock.
///
/// ```
/// use mafia_engine::core::{Clock, Moment, Phase};
///
/// let mut clock = Clock::new();
/// assert_eq!(clock.now(), Moment::new(1, Phase::Dawn));
///
/// for _ in 0..4 {
///     clock.increment();
/// }
/// assert_eq!(clock.now(), Moment::new(2, Phase::Dawn));
/// assert!(clock.is_start_of_day());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clock {
    now: Moment,
}

impl Clock {
    /// Create a clock at date 1, first phase.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Moment::new(1, Phase::first()),
        }
    }

    /// Create a clock at a specific moment.
    ///
    /// Dates below 1 are raised to 1.
    #[must_use]
    pub fn starting_at(moment: Moment) -> Self {
        Self {
            now: Moment::new(moment.date.max(1), moment.phase),
        }
    }

    /// Current moment.
    #[must_use]
    pub const fn now(&self) -> Moment {
        self.now
    }

    /// Current date.
    #[must_use]
    pub const fn date(&self) -> u32 {
        self.now.date
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.now.phase
    }

    /// Is the clock at the first phase of a date?
    #[must_use]
    pub fn is_start_of_day(&self) -> bool {
        self.now.phase == Phase::first()
    }

    /// Advance to the next phase, rolling over to the next date after the
    /// last phase. Returns the new moment.
    pub fn increment(&mut self) -> Moment {
        self.now = match self.now.phase.next() {
            Some(phase) => Moment::new(self.now.date, phase),
            None => Moment::new(self.now.date + 1, Phase::first()),
        };
        self.now
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
