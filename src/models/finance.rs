// src/models/finance.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::api::resource::{Entity, EntityId, Searchable};

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Credit,
    Debit,
    Pix,
    Insurance, // Convênio
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Issued,
    Cancelled,
}

// --- Pagamento (criado junto com o agendamento) ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: EntityId,
    pub appointment: EntityId,
    pub amount: Decimal,
    #[serde(default)]
    pub method: Option<PaymentMethod>,
    #[serde(default)]
    pub status: PaymentStatus,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
}

impl Payment {
    pub fn is_paid(&self) -> bool {
        self.status == PaymentStatus::Paid
    }
}

// Formulário de registro (quitação) do pagamento
#[derive(Debug, Clone, Serialize, Validate)]
pub struct PaymentForm {
    #[validate(custom(function = "validate_positive", message = "O valor deve ser maior que zero."))]
    pub amount: Decimal,
    pub method: PaymentMethod,
}

impl PaymentForm {
    /// Corpo do PATCH que marca o pagamento como quitado.
    pub fn into_patch(self) -> serde_json::Value {
        serde_json::json!({
            "amount": self.amount,
            "method": self.method,
            "status": PaymentStatus::Paid,
        })
    }
}

// --- Despesas ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: EntityId,
    pub description: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    #[serde(default)]
    pub category: Option<EntityId>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub paid: bool,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct ExpenseDraft {
    #[validate(length(min = 1, message = "A descrição é obrigatória."))]
    pub description: String,
    #[validate(custom(function = "validate_positive", message = "O valor deve ser maior que zero."))]
    pub amount: Decimal,
    pub date: NaiveDate,
    pub category: Option<EntityId>,
    pub paid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseCategory {
    pub id: EntityId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct ExpenseCategoryDraft {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
}

// --- Notas fiscais / faturas ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: EntityId,
    #[serde(default)]
    pub number: Option<String>,
    pub patient: EntityId,
    #[serde(default)]
    pub patient_name: Option<String>,
    pub amount: Decimal,
    pub issue_date: NaiveDate,
    #[serde(default)]
    pub status: InvoiceStatus,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct InvoiceDraft {
    pub patient: EntityId,
    #[validate(custom(function = "validate_positive", message = "O valor deve ser maior que zero."))]
    pub amount: Decimal,
    pub issue_date: NaiveDate,
    pub status: InvoiceStatus,
}

fn validate_positive(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_positive() && !value.is_zero() {
        Ok(())
    } else {
        Err(ValidationError::new("not_positive"))
    }
}

impl Entity for Expense {
    type Draft = ExpenseDraft;
    fn id(&self) -> EntityId {
        self.id
    }
}

impl Entity for ExpenseCategory {
    type Draft = ExpenseCategoryDraft;
    fn id(&self) -> EntityId {
        self.id
    }
}

impl Entity for Invoice {
    type Draft = InvoiceDraft;
    fn id(&self) -> EntityId {
        self.id
    }
}

impl Searchable for Expense {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.description.as_str()];
        fields.extend(self.category_name.as_deref());
        fields
    }
}

impl Searchable for ExpenseCategory {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str()]
    }
}

impl Searchable for Invoice {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = Vec::with_capacity(2);
        fields.extend(self.number.as_deref());
        fields.extend(self.patient_name.as_deref());
        fields
    }
}
