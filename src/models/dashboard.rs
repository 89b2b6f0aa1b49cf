// src/models/dashboard.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// Agregados calculados pelo backend (os cards do topo do painel)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    #[serde(default)]
    pub appointments_today: u32,
    #[serde(default)]
    pub unpaid_appointments: u32,
    #[serde(default)]
    pub active_patients: u32,
    pub revenue_month: Decimal,
    pub expenses_month: Decimal,
}

impl DashboardSummary {
    /// Resultado do mês (receita - despesas).
    pub fn balance_month(&self) -> Decimal {
        self.revenue_month - self.expenses_month
    }
}
