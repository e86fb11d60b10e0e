//! Concrete event creation rules.

pub mod backpressure;
pub mod maximum_rate;
pub mod platform_health;
pub mod platform_status;

pub use backpressure::BackpressureRule;
pub use maximum_rate::MaximumRateRule;
pub use platform_health::PlatformHealthRule;
pub use platform_status::PlatformStatusRule;
