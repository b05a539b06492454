//! Invoice entity.

use chrono::{DateTime, Utc};
use common::{InvoiceId, Money, QuotationId, RepairId};
use domain::Quotation;
use serde::{Deserialize, Serialize};

use crate::error::SettlementError;

/// A payment recorded against an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// The provider's external payment reference (idempotency key).
    pub reference: String,
    pub amount: Money,
    pub paid_at: DateTime<Utc>,
}

/// Result of applying a payment to an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentApplied {
    /// The payment was appended.
    Recorded,
    /// A payment with the same reference was already recorded; nothing
    /// was mutated.
    Duplicate,
}

/// An invoice derived from an approved quotation.
///
/// Amounts are snapshotted at creation time and never recomputed; the
/// quotation may not change afterwards, but the invoice does not depend
/// on that. At most one invoice exists per repair. The sum of payment
/// amounts never exceeds the total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    id: InvoiceId,
    repair_id: RepairId,
    quotation_id: QuotationId,
    subtotal: Money,
    tax: Money,
    total: Money,
    payments: Vec<Payment>,
    created_at: DateTime<Utc>,
}

impl Invoice {
    /// Snapshots an invoice from an approved quotation.
    pub fn from_quotation(id: InvoiceId, quotation: &Quotation) -> Self {
        Self {
            id,
            repair_id: quotation.repair_id(),
            quotation_id: quotation.id(),
            subtotal: quotation.subtotal(),
            tax: quotation.tax(),
            total: quotation.total(),
            payments: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Applies a payment idempotently, keyed by its external reference.
    ///
    /// A reference seen before yields [`PaymentApplied::Duplicate`] with
    /// no mutation. A new payment that would push the cumulative total
    /// past the invoice total fails with `OverpaymentNotAllowed` and is
    /// not applied.
    pub fn apply_payment(&mut self, payment: Payment) -> Result<PaymentApplied, SettlementError> {
        if self.has_payment(&payment.reference) {
            return Ok(PaymentApplied::Duplicate);
        }

        let remaining = self.total - self.paid_total();
        if payment.amount > remaining {
            return Err(SettlementError::OverpaymentNotAllowed {
                attempted: payment.amount.cents(),
                remaining: remaining.cents(),
            });
        }

        self.payments.push(payment);
        Ok(PaymentApplied::Recorded)
    }

    /// Returns true if a payment with this reference was recorded.
    pub fn has_payment(&self, reference: &str) -> bool {
        self.payments.iter().any(|p| p.reference == reference)
    }

    /// Sum of all recorded payments.
    pub fn paid_total(&self) -> Money {
        self.payments.iter().map(|p| p.amount).sum()
    }

    /// Returns true if the invoice is settled in full.
    pub fn is_paid(&self) -> bool {
        self.paid_total() >= self.total
    }
}

// Query methods
impl Invoice {
    pub fn id(&self) -> InvoiceId {
        self.id
    }

    pub fn repair_id(&self) -> RepairId {
        self.repair_id
    }

    pub fn quotation_id(&self) -> QuotationId {
        self.quotation_id
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn tax(&self) -> Money {
        self.tax
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
