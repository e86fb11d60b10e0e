//! Assembly of the node's standard rule set.

use crate::domain::{
    AggregateEventCreationRules, BackpressureRule, EventCreationConfig, EventCreationRule,
    MaximumRateRule, PlatformHealthRule, PlatformStatusRule, Result,
};
use crate::ports::{
    IntakeQueueDepth, PlatformStatusSource, SignatureTransactionSource, UnhealthyDurationSource,
};
use shared_types::Clock;
use std::sync::Arc;
use tracing::info;

/// Everything the standard rules read.
#[derive(Clone)]
pub struct RulePorts {
    pub clock: Arc<dyn Clock>,
    pub intake_queue: Arc<dyn IntakeQueueDepth>,
    pub platform_status: Arc<dyn PlatformStatusSource>,
    pub signature_transactions: Arc<dyn SignatureTransactionSource>,
    pub unhealthy_duration: Arc<dyn UnhealthyDurationSource>,
}

/// Build the standard rules in their evaluation order: rate, backpressure,
/// platform status, platform health.
///
/// # Errors
/// The config's validation error.
pub fn standard_rules(
    config: &EventCreationConfig,
    ports: RulePorts,
) -> Result<AggregateEventCreationRules> {
    config.validate()?;

    let rate = MaximumRateRule::new(ports.clock, config.max_creation_rate);
    info!(
        max_creation_rate = config.max_creation_rate,
        unlimited = rate.is_unlimited(),
        event_intake_throttle = config.event_intake_throttle,
        "[hg-02] Event creation rules configured"
    );

    let rules: Vec<Box<dyn EventCreationRule>> = vec![
        Box::new(rate),
        Box::new(BackpressureRule::new(
            ports.intake_queue,
            config.event_intake_throttle,
        )),
        Box::new(PlatformStatusRule::new(
            ports.platform_status,
            ports.signature_transactions,
        )),
        Box::new(PlatformHealthRule::new(
            ports.unhealthy_duration,
            config.maximum_permissible_unhealthy_duration(),
        )),
    ];
    Ok(AggregateEventCreationRules::of(rules))
}
