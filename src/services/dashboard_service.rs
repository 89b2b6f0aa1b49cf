// src/services/dashboard_service.rs

use crate::{api::ApiClient, common::error::AppResult, models::dashboard::DashboardSummary};

#[derive(Clone)]
pub struct DashboardService {
    client: ApiClient,
}

impl DashboardService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Cards do painel, agregados pelo backend.
    pub async fn get_summary(&self) -> AppResult<DashboardSummary> {
        self.client.get_json("/dashboard/").await
    }
}
