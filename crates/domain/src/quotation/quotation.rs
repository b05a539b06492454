//! Quotation entity and monetary totals.

use chrono::{DateTime, Utc};
use common::{Money, QuotationId, RepairId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

use super::QuotationState;

/// Fixed tax rate applied to the subtotal: 22%.
pub const TAX_RATE_BASIS_POINTS: i64 = 2200;

/// Kind of work a line item bills for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineItemKind {
    Labor,
    Part,
}

/// One priced line of a quotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub kind: LineItemKind,
    pub description: String,
    /// Reference to a stocked part, for PART lines that have one.
    pub part_ref: Option<String>,
    pub quantity: u32,
    pub unit_price: Money,
}

impl LineItem {
    pub fn new(
        kind: LineItemKind,
        description: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            kind,
            description: description.into(),
            part_ref: None,
            quantity,
            unit_price,
        }
    }

    pub fn with_part_ref(mut self, part_ref: impl Into<String>) -> Self {
        self.part_ref = Some(part_ref.into());
        self
    }

    /// Line total: quantity × unit price, exact in cents.
    pub fn total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// A priced, itemized proposal tied to one repair order.
///
/// Totals are always consistent with the line items: they are recomputed
/// in full on every edit, never patched incrementally. Line items are
/// immutable outside BOZZA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quotation {
    id: QuotationId,
    repair_id: RepairId,
    items: Vec<LineItem>,
    subtotal: Money,
    tax: Money,
    total: Money,
    state: QuotationState,
    created_at: DateTime<Utc>,
    sent_at: Option<DateTime<Utc>>,
    responded_at: Option<DateTime<Utc>>,
}

/// Computes (subtotal, tax, total) from line items. Per-line amounts are
/// exact in cents; only the published figures carry rounding (the half-up
/// rounding inside the tax percentage).
fn compute_totals(items: &[LineItem]) -> (Money, Money, Money) {
    let subtotal: Money = items.iter().map(LineItem::total).sum();
    let tax = subtotal.percent(TAX_RATE_BASIS_POINTS);
    (subtotal, tax, subtotal + tax)
}

fn validate_items(items: &[LineItem]) -> Result<(), DomainError> {
    for item in items {
        if item.description.trim().is_empty() {
            return Err(DomainError::field_validation(
                "descrizione",
                "required",
                "Line item description is required",
            ));
        }
    }
    Ok(())
}

impl Quotation {
    /// Creates a quotation in BOZZA with validated items and computed
    /// totals.
    pub fn new(
        id: QuotationId,
        repair_id: RepairId,
        items: Vec<LineItem>,
    ) -> Result<Self, DomainError> {
        validate_items(&items)?;
        let (subtotal, tax, total) = compute_totals(&items);
        Ok(Self {
            id,
            repair_id,
            items,
            subtotal,
            tax,
            total,
            state: QuotationState::Bozza,
            created_at: Utc::now(),
            sent_at: None,
            responded_at: None,
        })
    }

    /// Fully replaces the line items and recomputes all totals.
    ///
    /// Allowed only while in BOZZA.
    pub fn replace_items(&mut self, items: Vec<LineItem>) -> Result<(), DomainError> {
        if !self.state.can_edit() {
            return Err(DomainError::validation(format!(
                "Cannot edit preventivo with stato {}",
                self.state
            )));
        }
        validate_items(&items)?;
        let (subtotal, tax, total) = compute_totals(&items);
        self.items = items;
        self.subtotal = subtotal;
        self.tax = tax;
        self.total = total;
        Ok(())
    }

    /// Marks the quotation INVIATO, stamping the send timestamp.
    pub fn mark_sent(&mut self) -> Result<(), DomainError> {
        if !self.state.can_send() {
            return Err(DomainError::validation("Preventivo already sent"));
        }
        self.state = QuotationState::Inviato;
        self.sent_at = Some(Utc::now());
        Ok(())
    }

    /// Compensating rollback of [`mark_sent`](Self::mark_sent): back to
    /// BOZZA with the send timestamp cleared.
    pub fn rollback_send(&mut self) {
        self.state = QuotationState::Bozza;
        self.sent_at = None;
    }

    /// Records the customer's response, stamping the response timestamp.
    pub fn record_response(&mut self, approved: bool) -> Result<(), DomainError> {
        match self.state {
            QuotationState::Bozza => Err(DomainError::validation(
                "Preventivo must be in INVIATO state to record response",
            )),
            QuotationState::Approvato | QuotationState::Rifiutato => Err(DomainError::Conflict(
                "Response already recorded for this preventivo".to_string(),
            )),
            QuotationState::Inviato => {
                self.state = if approved {
                    QuotationState::Approvato
                } else {
                    QuotationState::Rifiutato
                };
                self.responded_at = Some(Utc::now());
                Ok(())
            }
        }
    }

    /// Returns true if the stored totals agree with each other and with
    /// the line items. Checked before deriving an invoice.
    pub fn totals_consistent(&self) -> bool {
        let (subtotal, tax, total) = compute_totals(&self.items);
        self.subtotal == subtotal && self.tax == tax && self.total == total
    }
}

// Query methods
impl Quotation {
    pub fn id(&self) -> QuotationId {
        self.id
    }

    pub fn repair_id(&self) -> RepairId {
        self.repair_id
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
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

    pub fn state(&self) -> QuotationState {
        self.state
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        self.sent_at
    }

    pub fn responded_at(&self) -> Option<DateTime<Utc>> {
        self.responded_at
    }
}
