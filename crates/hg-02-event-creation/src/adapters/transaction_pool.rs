//! `TransactionPoolNexus` as a status and signature-transaction source.
//!
//! The nexus is told the platform status and tracks priority transactions, so
//! the platform status rule can read both from it.

use crate::ports::{PlatformStatusSource, SignatureTransactionSource};
use hg_01_transaction_pool::TransactionPoolNexus;
use shared_types::PlatformStatus;

impl PlatformStatusSource for TransactionPoolNexus {
    fn platform_status(&self) -> PlatformStatus {
        TransactionPoolNexus::platform_status(self)
    }
}

impl SignatureTransactionSource for TransactionPoolNexus {
    fn has_buffered_signature_transactions(&self) -> bool {
        TransactionPoolNexus::has_buffered_signature_transactions(self)
    }
}
