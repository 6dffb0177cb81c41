//! Append-only payment ledger records and the pure fold deriving a
//! project's payment status from them.
//!
//! The derived status is recomputed on every read. Nothing stored alongside
//! the project is ever consulted in its place.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::status::{define_name_enum, PaymentStatus};
use crate::types::{Amount, DbId, Timestamp, DEFAULT_CURRENCY};

/// Maximum length of a provider transaction reference.
pub const MAX_TRANSACTION_REF_LENGTH: usize = 128;

define_name_enum! {
    /// How the client paid.
    PaymentMethod ("payment method") {
        Mpesa => "mpesa",
        Card => "card",
        BankTransfer => "bank_transfer",
        Cash => "cash",
    }
}

/// One recorded payment attempt. Never updated or deleted once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: DbId,
    pub project_id: DbId,
    pub client_id: DbId,
    pub amount: Amount,
    pub currency: String,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_ref: Option<String>,
    pub payment_date: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// Caller input for recording a payment outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPayment {
    pub amount: Amount,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    #[serde(default)]
    pub transaction_ref: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub payment_date: Option<Timestamp>,
}

/// Insert payload handed to a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    pub project_id: DbId,
    pub client_id: DbId,
    pub amount: Amount,
    pub currency: String,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_ref: Option<String>,
    pub payment_date: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl NewPayment {
    pub fn from_input(
        project_id: DbId,
        client_id: DbId,
        input: RecordPayment,
        now: Timestamp,
    ) -> Self {
        let payment_date = match (input.payment_date, input.status) {
            (Some(date), _) => Some(date),
            (None, PaymentStatus::Completed) => Some(now),
            (None, _) => None,
        };
        Self {
            project_id,
            client_id,
            amount: input.amount,
            currency: input
                .currency
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            method: input.method,
            status: input.status,
            transaction_ref: input.transaction_ref,
            payment_date,
            created_at: now,
        }
    }

    pub fn into_payment(self, id: DbId) -> Payment {
        Payment {
            id,
            project_id: self.project_id,
            client_id: self.client_id,
            amount: self.amount,
            currency: self.currency,
            method: self.method,
            status: self.status,
            transaction_ref: self.transaction_ref,
            payment_date: self.payment_date,
            created_at: self.created_at,
        }
    }
}

/// Validate caller input before anything is appended.
pub fn validate_payment(input: &RecordPayment) -> Result<(), CoreError> {
    if input.amount <= 0 {
        return Err(CoreError::Validation(format!(
            "Payment amount must be positive (got {})",
            input.amount
        )));
    }

    if let Some(reference) = &input.transaction_ref {
        if reference.trim().is_empty() {
            return Err(CoreError::Validation(
                "Transaction reference must not be blank when given".to_string(),
            ));
        }
        if reference.len() > MAX_TRANSACTION_REF_LENGTH {
            return Err(CoreError::Validation(format!(
                "Transaction reference exceeds maximum length of {MAX_TRANSACTION_REF_LENGTH} characters"
            )));
        }
    }

    if let Some(currency) = &input.currency {
        let valid = currency.len() == 3 && currency.chars().all(|c| c.is_ascii_uppercase());
        if !valid {
            return Err(CoreError::Validation(format!(
                "Invalid currency '{currency}'. Must be a 3-letter ISO code"
            )));
        }
    }

    Ok(())
}

/* --------------------------------------------------------------------------
Derivation
-------------------------------------------------------------------------- */

/// Completed and refunded sums over a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Totals {
    completed: Amount,
    refunded: Amount,
}

impl Totals {
    fn of(payments: &[Payment]) -> Self {
        payments.iter().fold(
            Totals {
                completed: 0,
                refunded: 0,
            },
            |mut acc, p| {
                match p.status {
                    PaymentStatus::Completed => acc.completed += p.amount,
                    PaymentStatus::Refunded => acc.refunded += p.amount,
                    PaymentStatus::Pending | PaymentStatus::Failed => {}
                }
                acc
            },
        )
    }

    /// Completed minus refunded.
    fn net_paid(self) -> Amount {
        self.completed - self.refunded
    }
}

/// Fold a project's payments into its payment status.
///
/// - `completed` when net paid (completed minus refunded) covers `total_amount`.
/// - `refunded` when a refund exists and leaves the project short.
/// - `failed` when the most recent record failed.
/// - `pending` otherwise, including when there are no records.
pub fn derive_payment_status(total_amount: Amount, payments: &[Payment]) -> PaymentStatus {
    let totals = Totals::of(payments);

    if totals.net_paid() >= total_amount {
        return PaymentStatus::Completed;
    }
    if totals.refunded > 0 {
        return PaymentStatus::Refunded;
    }

    let latest = payments.iter().max_by_key(|p| (p.created_at, p.id));
    match latest {
        Some(last) if last.status == PaymentStatus::Failed => PaymentStatus::Failed,
        _ => PaymentStatus::Pending,
    }
}

/// Money position of a single project, derived from its ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentSummary {
    /// Sum of completed payments.
    pub amount_completed: Amount,
    /// Sum of refunds.
    pub amount_refunded: Amount,
    /// Completed minus refunded.
    pub amount_paid: Amount,
    /// What is still owed, never negative.
    pub balance_due: Amount,
    /// Completed payments exceed the project price and need a human to reconcile.
    pub reconciliation_required: bool,
}

pub fn summarize(total_amount: Amount, payments: &[Payment]) -> PaymentSummary {
    let totals = Totals::of(payments);
    let amount_paid = totals.net_paid();

    PaymentSummary {
        amount_completed: totals.completed,
        amount_refunded: totals.refunded,
        amount_paid,
        balance_due: (total_amount - amount_paid).max(0),
        reconciliation_required: amount_paid > total_amount,
    }
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */
