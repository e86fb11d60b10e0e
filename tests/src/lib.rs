//! # Hashgraph Guard Test Suite
//!
//! Cross-crate flows. Unit tests live next to the code in each crate.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── event_creation.rs   # pool nexus → standard rules
//!     ├── branching.rs        # detector → reporter
//!     └── event_stream.rs     # detector + stream under freeze, work group fate sharing
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p hg-tests
//! cargo test -p hg-tests integration::branching
//! ```

pub mod integration;
