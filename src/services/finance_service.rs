// src/services/finance_service.rs

use chrono::Datelike;
use rust_decimal::Decimal;
use serde_json::json;

use crate::{
    api::{ApiClient, EntityId},
    common::{error::AppResult, notify::Notifier},
    models::finance::{Expense, ExpenseCategory, Invoice, InvoiceStatus},
    services::{RestMutations, rest_mutations},
    sync::{SubmitOutcome, derive},
};

/// Financeiro da clínica: despesas, categorias e notas.
pub struct FinanceService {
    pub expenses: RestMutations<Expense>,
    pub categories: RestMutations<ExpenseCategory>,
    pub invoices: RestMutations<Invoice>,
}

impl FinanceService {
    pub fn new(client: &ApiClient, notifier: &Notifier) -> Self {
        Self {
            expenses: rest_mutations(client, notifier, "expenses"),
            categories: rest_mutations(client, notifier, "expense-categories"),
            invoices: rest_mutations(client, notifier, "invoices"),
        }
    }

    pub async fn load(&self) -> AppResult<()> {
        tokio::try_join!(
            self.expenses.store().load(),
            self.categories.store().load(),
            self.invoices.store().load(),
        )?;
        Ok(())
    }

    pub fn close(&self) {
        self.expenses.store().unmount();
        self.categories.store().unmount();
        self.invoices.store().unmount();
    }

    pub fn search_expenses(&self, term: &str) -> Vec<Expense> {
        self.expenses
            .store()
            .with_items(|items| derive::search(items, term).into_iter().cloned().collect())
    }

    /// Total das despesas lançadas no mês.
    pub fn expenses_in_month(&self, year: i32, month: u32) -> Decimal {
        self.expenses.store().with_items(|items| {
            derive::expenses_total(
                items
                    .iter()
                    .filter(|e| e.date.year() == year && e.date.month() == month),
            )
        })
    }

    /// Despesas ainda não pagas.
    pub fn open_expenses_total(&self) -> Decimal {
        self.expenses
            .store()
            .with_items(|items| derive::expenses_total(items.iter().filter(|e| !e.paid)))
    }

    /// Marca a despesa como paga na hora; desfaz se o servidor recusar.
    pub async fn mark_expense_paid(&self, id: EntityId) -> SubmitOutcome<Expense> {
        self.expenses
            .toggle(id, |e| e.paid = true, json!({ "paid": true }))
            .await
    }

    pub async fn cancel_invoice(&self, id: EntityId) -> SubmitOutcome<Invoice> {
        self.invoices
            .toggle(
                id,
                |i| i.status = InvoiceStatus::Cancelled,
                json!({ "status": InvoiceStatus::Cancelled }),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::client_for;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_lists(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/expenses/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "description": "Aluguel", "amount": "3000.00", "date": "2024-03-05", "paid": true},
                {"id": 2, "description": "Luz", "amount": 412.3, "date": "2024-03-10"},
                {"id": 3, "description": "Água", "amount": 95, "date": "2024-02-10"}
            ])))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/expense-categories/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "name": "Fixas"}])))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/invoices/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 7, "patient": 3, "amount": 250, "issue_date": "2024-03-01", "status": "issued"}
            ])))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn monthly_totals_use_exact_decimals() {
        let server = MockServer::start().await;
        mount_lists(&server).await;

        let finance = FinanceService::new(&client_for(&server), &Notifier::new());
        finance.load().await.unwrap();

        assert_eq!(finance.expenses_in_month(2024, 3), Decimal::new(341230, 2));
        assert_eq!(finance.open_expenses_total(), Decimal::new(50730, 2));
        assert_eq!(finance.search_expenses("LUZ").len(), 1);
    }

    #[tokio::test]
    async fn rejected_invoice_cancel_is_rolled_back() {
        let server = MockServer::start().await;
        mount_lists(&server).await;
        Mock::given(method("PATCH"))
            .and(path("/api/invoices/7/"))
            .and(body_json(json!({"status": "cancelled"})))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"detail": "Nota já transmitida."})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let finance = FinanceService::new(&client_for(&server), &Notifier::new());
        finance.load().await.unwrap();

        let outcome = finance.cancel_invoice(7).await;
        assert_eq!(outcome.notification().unwrap().message, "Nota já transmitida.");
        assert_eq!(finance.invoices.store().get(7).unwrap().status, InvoiceStatus::Issued);
    }
}
