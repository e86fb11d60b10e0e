//! # Shared Types Crate
//!
//! Domain types shared by every crate in the workspace.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Event, roster and window types are defined here
//!   and nowhere else.
//! - **Descriptors, not events**: Long-lived state (branch tracking, reporting)
//!   retains only `EventDescriptor`s. Full `PlatformEvent`s are owned by the caller.
//! - **Injected time**: Anything time-dependent takes an `Arc<dyn Clock>` so tests
//!   drive time explicitly with `FakeClock`.
//!
//! ## Modules
//!
//! | Module | Contents |
//! |--------|----------|
//! | `entities` | `Hash`, `NodeId`, `EventDescriptor`, `PlatformEvent`, `ConsensusData` |
//! | `event_window` | `EventWindow`, `AncientMode` |
//! | `roster` | `Roster`, `RosterEntry` (dense slot index + stake weights) |
//! | `platform_status` | `PlatformStatus` |
//! | `clock` | `Clock`, `SystemClock`, `FakeClock` |
//! | `rate_limiter` | Token-bucket `RateLimiter` |
//! | `errors` | `RosterError` |

pub mod clock;
pub mod entities;
pub mod errors;
pub mod event_window;
pub mod platform_status;
pub mod rate_limiter;
pub mod roster;

pub use clock::{Clock, FakeClock, SystemClock};
pub use entities::*;
pub use errors::*;
pub use event_window::{AncientMode, EventWindow};
pub use platform_status::PlatformStatus;
pub use rate_limiter::RateLimiter;
pub use roster::{Roster, RosterEntry};
