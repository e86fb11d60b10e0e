//! Gates creation on the platform status.

use crate::domain::rule::EventCreationRule;
use crate::domain::status::EventCreationStatus;
use crate::ports::{PlatformStatusSource, SignatureTransactionSource};
use shared_types::PlatformStatus;
use std::sync::Arc;

/// Permits creation while `ACTIVE` or `CHECKING`.
///
/// While `FREEZING`, creation stays permitted only as long as signature
/// transactions are buffered, so the final signatures of the freeze round can
/// still go out in an event.
pub struct PlatformStatusRule {
    status: Arc<dyn PlatformStatusSource>,
    signature_transactions: Arc<dyn SignatureTransactionSource>,
}

impl PlatformStatusRule {
    pub fn new(
        status: Arc<dyn PlatformStatusSource>,
        signature_transactions: Arc<dyn SignatureTransactionSource>,
    ) -> Self {
        Self {
            status,
            signature_transactions,
        }
    }
}

impl EventCreationRule for PlatformStatusRule {
    fn is_event_creation_permitted(&mut self) -> bool {
        match self.status.platform_status() {
            PlatformStatus::Freezing => self
                .signature_transactions
                .has_buffered_signature_transactions(),
            status => status.permits_event_creation(),
        }
    }

    fn event_was_created(&mut self) {}

    fn event_creation_status(&self) -> EventCreationStatus {
        EventCreationStatus::PlatformStatus
    }
}
