//! Quotation lifecycle service.
//!
//! `send` and `respond` couple the quotation to its owning repair order:
//! both entities move together or not at all. With stores that commit each
//! save independently this is orchestrated as validate-first steps plus a
//! compensating rollback on partial failure, never as two fire-and-forget
//! writes.

use common::{QuotationId, RepairId, UserId};
use store::Repo;

use crate::customer::CustomerDirectory;
use crate::error::DomainError;
use crate::notify::{Notification, NotificationDispatch, NotificationKind};
use crate::repair::{RepairOrder, RepairState, Role};

use super::{LineItem, Quotation};

/// Command to create a quotation against a repair order.
#[derive(Debug, Clone)]
pub struct CreateQuotation {
    pub repair_id: RepairId,
    pub items: Vec<LineItem>,
}

/// Command to replace a draft quotation's line items.
#[derive(Debug, Clone)]
pub struct EditQuotation {
    pub quotation_id: QuotationId,
    pub items: Vec<LineItem>,
}

/// Command to send a quotation to the customer.
#[derive(Debug, Clone)]
pub struct SendQuotation {
    pub quotation_id: QuotationId,
    pub acting_user: UserId,
}

/// Command to record the customer's response.
#[derive(Debug, Clone)]
pub struct RespondQuotation {
    pub quotation_id: QuotationId,
    pub approved: bool,
    pub acting_user: UserId,
}

/// Service owning the quotation lifecycle and its coupling with the
/// repair order.
pub struct QuotationService<Q, R, C, N> {
    quotations: Q,
    repairs: R,
    customers: C,
    notifier: N,
}

impl<Q, R, C, N> QuotationService<Q, R, C, N>
where
    Q: Repo<QuotationId, Quotation>,
    R: Repo<RepairId, RepairOrder>,
    C: CustomerDirectory,
    N: NotificationDispatch,
{
    /// Creates a new quotation service over the given stores and
    /// collaborators.
    pub fn new(quotations: Q, repairs: R, customers: C, notifier: N) -> Self {
        Self {
            quotations,
            repairs,
            customers,
            notifier,
        }
    }

    /// Creates a quotation in BOZZA against an existing repair order.
    #[tracing::instrument(skip(self, cmd), fields(repair_id = %cmd.repair_id))]
    pub async fn create(&self, cmd: CreateQuotation) -> Result<Quotation, DomainError> {
        self.repairs
            .get(&cmd.repair_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Repair", cmd.repair_id))?;

        let quotation = Quotation::new(QuotationId::new(), cmd.repair_id, cmd.items)?;
        self.quotations
            .insert(quotation.id(), quotation.clone())
            .await?;

        metrics::counter!("quotations_created_total").increment(1);
        tracing::info!(quotation_id = %quotation.id(), total = %quotation.total(), "quotation created");

        Ok(quotation)
    }

    /// Replaces a draft quotation's line items, recomputing all totals.
    #[tracing::instrument(skip(self, cmd), fields(quotation_id = %cmd.quotation_id))]
    pub async fn edit(&self, cmd: EditQuotation) -> Result<Quotation, DomainError> {
        let mut quotation = self.load(cmd.quotation_id).await?;

        quotation.replace_items(cmd.items)?;
        self.quotations
            .save(quotation.id(), quotation.clone())
            .await?;

        Ok(quotation)
    }

    /// Sends the quotation to the customer and moves the owning repair
    /// order to IN_ATTESA_APPROVAZIONE as one logical operation.
    ///
    /// Email dispatch failure rolls the quotation back to BOZZA (send
    /// timestamp cleared) and leaves the repair untouched. A repair that
    /// cannot accept the transition fails the send entirely, again with
    /// the quotation rolled back.
    #[tracing::instrument(skip(self, cmd), fields(quotation_id = %cmd.quotation_id))]
    pub async fn send(&self, cmd: SendQuotation) -> Result<Quotation, DomainError> {
        let mut quotation = self.load(cmd.quotation_id).await?;
        if !quotation.state().can_send() {
            return Err(DomainError::validation("Preventivo already sent"));
        }

        let mut repair = self
            .repairs
            .get(&quotation.repair_id())
            .await?
            .ok_or_else(|| DomainError::not_found("Repair", quotation.repair_id()))?;

        let customer = self
            .customers
            .resolve(repair.customer_id())
            .await?
            .ok_or_else(|| DomainError::not_found("Customer", repair.customer_id()))?;
        let Some(email) = customer.email else {
            return Err(DomainError::validation(
                "Customer email is required to send quotation",
            ));
        };

        // Guard the repair side before any write: a repair that cannot
        // enter IN_ATTESA_APPROVAZIONE must fail the send with no partial
        // state.
        repair.transition(
            RepairState::InAttesaApprovazione,
            cmd.acting_user,
            Role::Sistema,
            "Preventivo inviato al cliente",
        )?;

        quotation.mark_sent()?;
        self.quotations
            .save(quotation.id(), quotation.clone())
            .await?;

        let outcome = self
            .notifier
            .send(Notification {
                kind: NotificationKind::QuotationSent,
                recipient: email,
                subject: format!("Preventivo per riparazione {}", repair.code()),
                body: format!(
                    "Imponibile {}, IVA {}, totale {}",
                    quotation.subtotal(),
                    quotation.tax(),
                    quotation.total()
                ),
                attachment: None,
            })
            .await;

        if !outcome.ok {
            quotation.rollback_send();
            self.quotations
                .save(quotation.id(), quotation.clone())
                .await?;
            metrics::counter!("quotation_send_failures_total").increment(1);
            tracing::warn!(quotation_id = %quotation.id(), "email dispatch failed, quotation rolled back to BOZZA");
            return Err(DomainError::Dependency(
                "Email dispatch failed, quotation not sent".to_string(),
            ));
        }

        if let Err(e) = self.repairs.save(repair.id(), repair).await {
            // Compensate the already-persisted quotation before surfacing
            // the failure.
            quotation.rollback_send();
            self.quotations
                .save(quotation.id(), quotation.clone())
                .await?;
            return Err(e.into());
        }

        metrics::counter!("quotations_sent_total").increment(1);
        tracing::info!(quotation_id = %quotation.id(), "quotation sent");

        Ok(quotation)
    }

    /// Records the customer's response and drives the owning repair order
    /// forward (APPROVATA) or to ANNULLATA, atomically with the response.
    #[tracing::instrument(skip(self, cmd), fields(quotation_id = %cmd.quotation_id, approved = cmd.approved))]
    pub async fn respond(&self, cmd: RespondQuotation) -> Result<Quotation, DomainError> {
        let mut quotation = self.load(cmd.quotation_id).await?;
        let mut repair = self
            .repairs
            .get(&quotation.repair_id())
            .await?
            .ok_or_else(|| DomainError::not_found("Repair", quotation.repair_id()))?;
        let repair_before = repair.clone();

        // Validates the quotation state (INVIATO only) before any write.
        quotation.record_response(cmd.approved)?;

        let (target, note) = if cmd.approved {
            (RepairState::Approvata, "Preventivo approvato dal cliente")
        } else {
            (RepairState::Annullata, "Preventivo rifiutato dal cliente")
        };

        // If the repair side fails, nothing has been persisted and the
        // response is not recorded.
        repair.transition(target, cmd.acting_user, Role::Sistema, note)?;
        self.repairs.save(repair.id(), repair).await?;

        if let Err(e) = self
            .quotations
            .save(quotation.id(), quotation.clone())
            .await
        {
            // Compensate the repair transition so neither mutation is
            // visible.
            self.repairs
                .save(repair_before.id(), repair_before)
                .await?;
            return Err(e.into());
        }

        metrics::counter!("quotation_responses_total").increment(1);
        tracing::info!(quotation_id = %quotation.id(), state = %quotation.state(), "quotation response recorded");

        Ok(quotation)
    }

    /// Loads a quotation by id. Returns None if it doesn't exist.
    pub async fn get(&self, quotation_id: QuotationId) -> Result<Option<Quotation>, DomainError> {
        Ok(self.quotations.get(&quotation_id).await?)
    }

    async fn load(&self, quotation_id: QuotationId) -> Result<Quotation, DomainError> {
        self.quotations
            .get(&quotation_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Quotation", quotation_id))
    }
}

#[cfg(test)]
mod tests {
    use common::{CustomerId, Money};
    use store::{InMemoryRepo, InMemorySequences};

    use crate::customer::InMemoryCustomerDirectory;
    use crate::notify::InMemoryNotifier;
    use crate::quotation::{LineItemKind, QuotationState};
    use crate::repair::{CreateRepair, DeviceInfo, Priority, RepairService, TransitionRepair};

    use super::*;

    type Repairs = InMemoryRepo<RepairId, RepairOrder>;
    type Quotations = InMemoryRepo<QuotationId, Quotation>;
    type TestRepairService = RepairService<Repairs, InMemoryCustomerDirectory, InMemorySequences>;
    type TestQuotationService =
        QuotationService<Quotations, Repairs, InMemoryCustomerDirectory, InMemoryNotifier>;

    struct Fixture {
        repair_service: TestRepairService,
        quotation_service: TestQuotationService,
        notifier: InMemoryNotifier,
        customer_id: CustomerId,
    }

    async fn setup_with_email(email: Option<&str>) -> Fixture {
        let repairs = Repairs::new();
        let quotations = Quotations::new();
        let directory = InMemoryCustomerDirectory::new();
        let notifier = InMemoryNotifier::new();
        let customer_id = directory
            .add_customer("Mario Rossi", email.map(String::from))
            .await;

        Fixture {
            repair_service: RepairService::new(
                repairs.clone(),
                directory.clone(),
                InMemorySequences::new(),
            ),
            quotation_service: QuotationService::new(
                quotations,
                repairs,
                directory,
                notifier.clone(),
            ),
            notifier,
            customer_id,
        }
    }

    async fn setup() -> Fixture {
        setup_with_email(Some("mario@example.com")).await
    }

    async fn repair_in_preventivo_emesso(fixture: &Fixture) -> RepairId {
        let order = fixture
            .repair_service
            .create(CreateRepair {
                customer_id: fixture.customer_id,
                device: DeviceInfo::new("Notebook", "Dell", "XPS 13", None),
                problem: "Tastiera guasta".to_string(),
                accessories: vec![],
                priority: Priority::Normale,
                created_by: UserId::new(),
            })
            .await
            .unwrap();

        let user = UserId::new();
        for target in [
            RepairState::InDiagnosi,
            RepairState::InLavorazione,
            RepairState::PreventivoEmesso,
        ] {
            fixture
                .repair_service
                .transition(TransitionRepair {
                    repair_id: order.id(),
                    target,
                    acting_user: user,
                    role: Role::Tecnico,
                    note: String::new(),
                })
                .await
                .unwrap();
        }

        order.id()
    }

    fn labor_items() -> Vec<LineItem> {
        vec![LineItem::new(
            LineItemKind::Labor,
            "Sostituzione tastiera",
            2,
            Money::from_cents(9_000),
        )]
    }

    async fn sent_quotation(fixture: &Fixture) -> (RepairId, QuotationId) {
        let repair_id = repair_in_preventivo_emesso(fixture).await;
        let quotation = fixture
            .quotation_service
            .create(CreateQuotation {
                repair_id,
                items: labor_items(),
            })
            .await
            .unwrap();
        fixture
            .quotation_service
            .send(SendQuotation {
                quotation_id: quotation.id(),
                acting_user: UserId::new(),
            })
            .await
            .unwrap();
        (repair_id, quotation.id())
    }

    #[tokio::test]
    async fn test_create_quotation() {
        let fixture = setup().await;
        let repair_id = repair_in_preventivo_emesso(&fixture).await;

        let quotation = fixture
            .quotation_service
            .create(CreateQuotation {
                repair_id,
                items: labor_items(),
            })
            .await
            .unwrap();

        assert_eq!(quotation.state(), QuotationState::Bozza);
        assert_eq!(quotation.total().cents(), 21_960);
    }

    #[tokio::test]
    async fn test_create_quotation_unknown_repair_fails() {
        let fixture = setup().await;

        let result = fixture
            .quotation_service
            .create(CreateQuotation {
                repair_id: RepairId::new(),
                items: labor_items(),
            })
            .await;

        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_edit_recomputes_totals() {
        let fixture = setup().await;
        let repair_id = repair_in_preventivo_emesso(&fixture).await;
        let quotation = fixture
            .quotation_service
            .create(CreateQuotation {
                repair_id,
                items: labor_items(),
            })
            .await
            .unwrap();

        let edited = fixture
            .quotation_service
            .edit(EditQuotation {
                quotation_id: quotation.id(),
                items: vec![LineItem::new(
                    LineItemKind::Part,
                    "Tastiera",
                    1,
                    Money::from_cents(5_000),
                )],
            })
            .await
            .unwrap();

        assert_eq!(edited.subtotal().cents(), 5_000);
        assert_eq!(edited.tax().cents(), 1_100);
        assert_eq!(edited.total().cents(), 6_100);
    }

    #[tokio::test]
    async fn test_send_moves_repair_to_in_attesa_approvazione() {
        let fixture = setup().await;
        let (repair_id, quotation_id) = sent_quotation(&fixture).await;

        let quotation = fixture
            .quotation_service
            .get(quotation_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(quotation.state(), QuotationState::Inviato);
        assert!(quotation.sent_at().is_some());

        let repair = fixture.repair_service.get(repair_id).await.unwrap().unwrap();
        assert_eq!(repair.state(), RepairState::InAttesaApprovazione);
        assert_eq!(fixture.notifier.sent_count().await, 1);
    }

    #[tokio::test]
    async fn test_send_without_customer_email_leaves_repair_untouched() {
        let fixture = setup_with_email(None).await;
        let repair_id = repair_in_preventivo_emesso(&fixture).await;
        let quotation = fixture
            .quotation_service
            .create(CreateQuotation {
                repair_id,
                items: labor_items(),
            })
            .await
            .unwrap();

        let result = fixture
            .quotation_service
            .send(SendQuotation {
                quotation_id: quotation.id(),
                acting_user: UserId::new(),
            })
            .await;

        match result {
            Err(DomainError::Validation { message, .. }) => {
                assert_eq!(message, "Customer email is required to send quotation");
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        let repair = fixture.repair_service.get(repair_id).await.unwrap().unwrap();
        assert_eq!(repair.state(), RepairState::PreventivoEmesso);
        let stored = fixture
            .quotation_service
            .get(quotation.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.state(), QuotationState::Bozza);
    }

    #[tokio::test]
    async fn test_send_dispatch_failure_rolls_quotation_back() {
        let fixture = setup().await;
        let repair_id = repair_in_preventivo_emesso(&fixture).await;
        let quotation = fixture
            .quotation_service
            .create(CreateQuotation {
                repair_id,
                items: labor_items(),
            })
            .await
            .unwrap();

        fixture.notifier.set_fail_on_send(true).await;

        let result = fixture
            .quotation_service
            .send(SendQuotation {
                quotation_id: quotation.id(),
                acting_user: UserId::new(),
            })
            .await;
        assert!(matches!(result, Err(DomainError::Dependency(_))));

        let stored = fixture
            .quotation_service
            .get(quotation.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.state(), QuotationState::Bozza);
        assert!(stored.sent_at().is_none());

        let repair = fixture.repair_service.get(repair_id).await.unwrap().unwrap();
        assert_eq!(repair.state(), RepairState::PreventivoEmesso);
    }

    #[tokio::test]
    async fn test_send_from_wrong_repair_state_fails_entirely() {
        let fixture = setup().await;
        let order = fixture
            .repair_service
            .create(CreateRepair {
                customer_id: fixture.customer_id,
                device: DeviceInfo::new("Tablet", "Samsung", "Tab S9", None),
                problem: "Batteria".to_string(),
                accessories: vec![],
                priority: Priority::Bassa,
                created_by: UserId::new(),
            })
            .await
            .unwrap();
        // Still RICEVUTA: cannot enter IN_ATTESA_APPROVAZIONE.
        let quotation = fixture
            .quotation_service
            .create(CreateQuotation {
                repair_id: order.id(),
                items: labor_items(),
            })
            .await
            .unwrap();

        let result = fixture
            .quotation_service
            .send(SendQuotation {
                quotation_id: quotation.id(),
                acting_user: UserId::new(),
            })
            .await;
        assert!(matches!(result, Err(DomainError::InvalidTransition { .. })));

        let stored = fixture
            .quotation_service
            .get(quotation.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.state(), QuotationState::Bozza);
        assert!(stored.sent_at().is_none());
        assert_eq!(fixture.notifier.sent_count().await, 0);
    }

    #[tokio::test]
    async fn test_send_twice_rejected() {
        let fixture = setup().await;
        let (_, quotation_id) = sent_quotation(&fixture).await;

        let result = fixture
            .quotation_service
            .send(SendQuotation {
                quotation_id,
                acting_user: UserId::new(),
            })
            .await;

        match result {
            Err(DomainError::Validation { message, .. }) => {
                assert_eq!(message, "Preventivo already sent");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_respond_approved_drives_repair_to_approvata() {
        let fixture = setup().await;
        let (repair_id, quotation_id) = sent_quotation(&fixture).await;

        let quotation = fixture
            .quotation_service
            .respond(RespondQuotation {
                quotation_id,
                approved: true,
                acting_user: UserId::new(),
            })
            .await
            .unwrap();

        assert_eq!(quotation.state(), QuotationState::Approvato);
        assert!(quotation.responded_at().is_some());

        let repair = fixture.repair_service.get(repair_id).await.unwrap().unwrap();
        assert_eq!(repair.state(), RepairState::Approvata);
        assert_eq!(
            repair.history().last().unwrap().note,
            "Preventivo approvato dal cliente"
        );
    }

    #[tokio::test]
    async fn test_respond_rejected_cancels_repair() {
        let fixture = setup().await;
        let (repair_id, quotation_id) = sent_quotation(&fixture).await;

        let quotation = fixture
            .quotation_service
            .respond(RespondQuotation {
                quotation_id,
                approved: false,
                acting_user: UserId::new(),
            })
            .await
            .unwrap();

        assert_eq!(quotation.state(), QuotationState::Rifiutato);

        let repair = fixture.repair_service.get(repair_id).await.unwrap().unwrap();
        assert_eq!(repair.state(), RepairState::Annullata);
    }

    #[tokio::test]
    async fn test_respond_on_draft_rejected() {
        let fixture = setup().await;
        let repair_id = repair_in_preventivo_emesso(&fixture).await;
        let quotation = fixture
            .quotation_service
            .create(CreateQuotation {
                repair_id,
                items: labor_items(),
            })
            .await
            .unwrap();

        let result = fixture
            .quotation_service
            .respond(RespondQuotation {
                quotation_id: quotation.id(),
                approved: true,
                acting_user: UserId::new(),
            })
            .await;

        match result {
            Err(DomainError::Validation { message, .. }) => {
                assert_eq!(message, "Preventivo must be in INVIATO state to record response");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_second_respond_is_conflict_and_mutates_nothing() {
        let fixture = setup().await;
        let (repair_id, quotation_id) = sent_quotation(&fixture).await;

        fixture
            .quotation_service
            .respond(RespondQuotation {
                quotation_id,
                approved: true,
                acting_user: UserId::new(),
            })
            .await
            .unwrap();

        let repair_history_len = fixture
            .repair_service
            .get(repair_id)
            .await
            .unwrap()
            .unwrap()
            .history()
            .len();

        for approved in [true, false] {
            let result = fixture
                .quotation_service
                .respond(RespondQuotation {
                    quotation_id,
                    approved,
                    acting_user: UserId::new(),
                })
                .await;
            assert!(matches!(result, Err(DomainError::Conflict(_))));
        }

        let repair = fixture.repair_service.get(repair_id).await.unwrap().unwrap();
        assert_eq!(repair.state(), RepairState::Approvata);
        assert_eq!(repair.history().len(), repair_history_len);
    }
}
