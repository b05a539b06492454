//! Invoice settlement service.

use common::{InvoiceId, QuotationId, RepairId};
use domain::{
    DispatchOutcome, Notification, NotificationDispatch, NotificationKind, Quotation,
    QuotationState,
};
use store::Repo;

use crate::error::{Result, SettlementError};
use crate::invoice::{Invoice, Payment, PaymentApplied};
use crate::webhook::{PaymentWebhook, SignatureVerifier};

/// Outcome of handling a payment webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebhookReceipt {
    /// True if the payment reference had already been recorded and the
    /// delivery was ignored.
    pub duplicate: bool,
}

/// Service deriving invoices from approved quotations and reconciling
/// payment webhooks against them.
pub struct InvoiceService<I, Q, V, N> {
    invoices: I,
    quotations: Q,
    verifier: V,
    notifier: N,
}

impl<I, Q, V, N> InvoiceService<I, Q, V, N>
where
    I: Repo<InvoiceId, Invoice>,
    Q: Repo<QuotationId, Quotation>,
    V: SignatureVerifier,
    N: NotificationDispatch,
{
    /// Creates a new settlement service over the given stores and
    /// collaborators.
    pub fn new(invoices: I, quotations: Q, verifier: V, notifier: N) -> Self {
        Self {
            invoices,
            quotations,
            verifier,
            notifier,
        }
    }

    /// Derives an invoice from the repair's approved quotation, at most
    /// once per repair.
    ///
    /// Fails with `NoApprovedQuotation` if the repair has no APPROVATO
    /// quotation, `InvalidApprovedQuotation` if its stored totals are
    /// inconsistent, and `InvoiceAlreadyExists` if the repair is already
    /// invoiced (the existing invoice is untouched).
    #[tracing::instrument(skip(self))]
    pub async fn create_from_approved_quotation(&self, repair_id: RepairId) -> Result<Invoice> {
        let quotation = self
            .quotations
            .all()
            .await?
            .into_iter()
            .find(|q| q.repair_id() == repair_id && q.state() == QuotationState::Approvato)
            .ok_or(SettlementError::NoApprovedQuotation(repair_id))?;

        if !quotation.totals_consistent() {
            return Err(SettlementError::InvalidApprovedQuotation(quotation.id()));
        }

        let already_invoiced = self
            .invoices
            .all()
            .await?
            .into_iter()
            .any(|invoice| invoice.repair_id() == repair_id);
        if already_invoiced {
            return Err(SettlementError::InvoiceAlreadyExists(repair_id));
        }

        let invoice = Invoice::from_quotation(InvoiceId::new(), &quotation);
        self.invoices.insert(invoice.id(), invoice.clone()).await?;

        metrics::counter!("invoices_created_total").increment(1);
        tracing::info!(invoice_id = %invoice.id(), total = %invoice.total(), "invoice created");

        Ok(invoice)
    }

    /// Applies a payment-provider webhook idempotently.
    ///
    /// Verifies the signature before touching any state, resolves the
    /// target invoice, and applies the payment keyed by the external
    /// payment reference: a replayed delivery yields
    /// `WebhookReceipt { duplicate: true }` with nothing mutated.
    #[tracing::instrument(skip(self, signature, raw_payload))]
    pub async fn handle_payment_webhook(
        &self,
        signature: &str,
        raw_payload: &str,
    ) -> Result<WebhookReceipt> {
        if !self.verifier.verify(signature, raw_payload) {
            return Err(SettlementError::InvalidSignature);
        }

        let webhook: PaymentWebhook = serde_json::from_str(raw_payload)?;
        if webhook.amount_cents <= 0 {
            return Err(SettlementError::Validation(format!(
                "Invalid payment amount: {}",
                webhook.amount_cents
            )));
        }

        let mut invoice = self
            .invoices
            .get(&webhook.invoice_id)
            .await?
            .ok_or(SettlementError::FatturaNotFound(webhook.invoice_id))?;

        let was_paid = invoice.is_paid();
        let applied = invoice.apply_payment(Payment {
            reference: webhook.payment_reference.clone(),
            amount: common::Money::from_cents(webhook.amount_cents),
            paid_at: webhook.paid_at,
        })?;

        if applied == PaymentApplied::Duplicate {
            tracing::info!(
                invoice_id = %invoice.id(),
                reference = %webhook.payment_reference,
                "duplicate webhook delivery ignored"
            );
            return Ok(WebhookReceipt { duplicate: true });
        }

        self.invoices.save(invoice.id(), invoice.clone()).await?;
        metrics::counter!("payments_recorded_total").increment(1);

        if invoice.is_paid() && !was_paid {
            self.notify_paid(&invoice).await;
        }

        Ok(WebhookReceipt { duplicate: false })
    }

    /// Loads an invoice by id. Returns None if it doesn't exist.
    pub async fn get(&self, invoice_id: InvoiceId) -> Result<Option<Invoice>> {
        Ok(self.invoices.get(&invoice_id).await?)
    }

    /// Best-effort paid notification: the payment is already recorded, so
    /// a dispatch failure is logged and never surfaced.
    async fn notify_paid(&self, invoice: &Invoice) {
        let DispatchOutcome { ok } = self
            .notifier
            .send(Notification {
                kind: NotificationKind::InvoicePaid,
                recipient: "backoffice".to_string(),
                subject: format!("Fattura {} saldata", invoice.id()),
                body: format!("Totale incassato {}", invoice.paid_total()),
                attachment: None,
            })
            .await;

        if !ok {
            tracing::warn!(invoice_id = %invoice.id(), "invoice-paid notification failed");
        }
    }
}
