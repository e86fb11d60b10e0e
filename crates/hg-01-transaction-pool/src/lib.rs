//! # Transaction Pool Nexus
//!
//! **Crate ID:** hg-01
//!
//! ## Purpose
//!
//! Buffers transactions waiting to be put into the next self event, in two
//! FIFO classes:
//!
//! - **priority**: system (signature) transactions. Never throttled.
//! - **normal**: application transactions. Throttled by combined queue depth.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | One `get_transactions()` never exceeds `max_transaction_bytes_per_event` | `domain/nexus.rs` - `get_transactions()` budget loop |
//! | Priority before normal, FIFO within each class | `domain/nexus.rs` - two `VecDeque`s drained in order |
//! | Nothing duplicated or lost between submitters and the packer | `domain/nexus.rs` - single `Mutex<PoolState>` |
//!
//! ## Admission
//!
//! ```text
//! submit_application_transaction(payload)
//!     ├── unhealthy?                → reject
//!     ├── status != ACTIVE?         → reject
//!     ├── empty payload?            → reject
//!     ├── > maximum_transaction_size → reject
//!     └── submit_transaction(payload, priority = false)
//!             └── depth >= throttle_transaction_queue_size → reject
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! domain/config.rs  - TransactionPoolConfig (+ validate)
//! domain/errors.rs  - TransactionPoolError
//! domain/nexus.rs   - TransactionPoolNexus
//! ```

pub mod domain;

pub use domain::*;
