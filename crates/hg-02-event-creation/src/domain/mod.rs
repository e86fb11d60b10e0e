//! # Domain Layer - Event Creation
//!
//! - `status`: `EventCreationStatus`, `CreationDecision`
//! - `rule`: the `EventCreationRule` trait
//! - `rules`: concrete rules
//! - `aggregate`: `AggregateEventCreationRules`
//! - `config`: `EventCreationConfig`
//! - `errors`: `EventCreationError`

pub mod aggregate;
pub mod config;
pub mod errors;
pub mod rule;
pub mod rules;
pub mod status;

pub use aggregate::AggregateEventCreationRules;
pub use config::EventCreationConfig;
pub use errors::*;
pub use rule::EventCreationRule;
pub use rules::*;
pub use status::{CreationDecision, EventCreationStatus};
