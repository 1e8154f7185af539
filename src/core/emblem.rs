//! Emblems: time-bounded status effects attached to players.
//!
//! An emblem without `until` is permanent. An emblem with `until`
//! survives until the named phase of the named date, then is dropped on
//! the first phase where the date has been reached and the phase no
//! longer matches.

use serde::{Deserialize, Serialize};

use super::actor::Actor;
use super::clock::{Moment, Phase};

/// Emblem kind. Games define the vocabulary ("protected", "silenced", ...).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmblemKind(pub String);

impl EmblemKind {
    /// Create a new emblem kind.
    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    /// The kind as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EmblemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Expiry bound of an emblem.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Until {
    /// Date from which the emblem may expire. `None` means any date.
    pub day: Option<u32>,

    /// Phase the emblem survives through. `None` means `Phase::first()`.
    pub time: Option<Phase>,
}

impl Until {
    /// Expire after the given phase of the given date.
    #[must_use]
    pub const fn moment(day: u32, time: Phase) -> Self {
        Self {
            day: Some(day),
            time: Some(time),
        }
    }

    /// Expire once the given date is reached and the phase is not the first.
    #[must_use]
    pub const fn day(day: u32) -> Self {
        Self {
            day: Some(day),
            time: None,
        }
    }

    /// The phase the bound survives through, with the default applied.
    #[must_use]
    pub fn survives_through(&self) -> Phase {
        self.time.unwrap_or_else(Phase::first)
    }

    /// Has the bound run out at `now`?
    #[must_use]
    pub fn is_expired(&self, now: Moment) -> bool {
        let day_reached = self.day.is_none_or(|day| now.date >= day);
        day_reached && now.phase != self.survives_through()
    }
}

/// A status effect on a player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Emblem {
    /// What the emblem means.
    pub kind: EmblemKind,

    /// Who attached it, if anyone.
    #[serde(default)]
    pub source: Option<Actor>,

    /// Expiry bound. `None` = permanent.
    #[serde(default)]
    pub until: Option<Until>,
}

impl Emblem {
    /// Create a permanent emblem.
    pub fn permanent(kind: impl Into<String>) -> Self {
        Self {
            kind: EmblemKind::new(kind),
            source: None,
            until: None,
        }
    }

    /// Create an emblem with an expiry bound.
    pub fn until(kind: impl Into<String>, until: Until) -> Self {
        Self {
            kind: EmblemKind::new(kind),
            source: None,
            until: Some(until),
        }
    }

    /// Set the source (builder pattern).
    #[must_use]
    pub fn with_source(mut self, source: Actor) -> Self {
        self.source = Some(source);
        self
    }

    /// Is the emblem still attached at `now`?
    #[must_use]
    pub fn is_active(&self, now: Moment) -> bool {
        self.until.is_none_or(|until| !until.is_expired(now))
    }
}
