//! # Event Creation Rules
//!
//! **Crate ID:** hg-02
//!
//! ## Purpose
//!
//! Decides whether the node may create a new self event right now. Each rule
//! is a small state machine; `AggregateEventCreationRules` combines them in a
//! fixed order and reports the status of the first rule that says no.
//!
//! ## Rules
//!
//! | Rule | Permits when | Status when blocked |
//! |------|--------------|---------------------|
//! | `MaximumRateRule` | token bucket has a token (rate <= 0: always) | `RateLimited` |
//! | `BackpressureRule` | intake queue depth < threshold | `Overloaded` |
//! | `PlatformStatusRule` | `ACTIVE`/`CHECKING`, or `FREEZING` with signature transactions pending | `PlatformStatus` |
//! | `PlatformHealthRule` | unhealthy duration <= maximum | `Overloaded` |
//!
//! ## Protocol
//!
//! ```text
//! if rule.is_event_creation_permitted() {
//!     create event
//!     rule.event_was_created()
//! } else {
//!     back off on rule.event_creation_status()   // only valid here
//! }
//! ```
//!
//! `EventCreationRule::check()` folds the first and last step into one call
//! returning `CreationDecision::{Permitted, Blocked(status)}`.
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! domain/    - rule trait, concrete rules, aggregate, config, errors
//! ports/     - outbound sources the rules read (queue depth, status, health)
//! adapters/  - port implementations over TransactionPoolNexus
//! service.rs - standard_rules() assembly
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use domain::*;
pub use ports::*;
pub use service::{standard_rules, RulePorts};
