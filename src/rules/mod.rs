//! Game rules supplied to the engine.
//!
//! The engine never interprets a specific game. Games provide:
//! - Role definitions (win predicates and hooks) through a [`RoleRegistry`]
//! - The events that open each phase through a [`StackBuilder`]

pub mod builder;
pub mod registry;

pub use builder::{CompositeBuilder, NoEvents, PhaseBuilder, StackBuilder};
pub use registry::{RoleDefinition, RoleRegistry};
