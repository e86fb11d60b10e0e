//! Port implementations over other crates' components.

pub mod transaction_pool;
