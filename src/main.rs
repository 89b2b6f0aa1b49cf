// src/main.rs

use std::env;

use anyhow::Context;
use chrono::Local;
use tracing_subscriber::EnvFilter;

use clinica::{
    AppConfig, AppState,
    models::auth::LoginPayload,
    sync::derive::{self, AppointmentFilter},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG controla o nível (padrão: info)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = AppConfig::from_env().context("Falha ao ler a configuração.")?;
    let state = AppState::new(config).context("Falha ao inicializar o estado da aplicação.")?;
    let locale = state.client.locale();

    let payload = LoginPayload {
        username: env::var("CLINICA_USER").context("CLINICA_USER deve ser definida")?,
        password: env::var("CLINICA_PASSWORD").context("CLINICA_PASSWORD deve ser definida")?,
    };
    let profile = state.auth_service.login(&payload).await?;
    tracing::info!("Olá, {}!", profile.display_name());

    let summary = state.dashboard_service.get_summary().await?;
    println!(
        "Hoje: {} agendamentos | pendentes: {} | saldo do mês: {}",
        summary.appointments_today,
        summary.unpaid_appointments,
        summary.balance_month()
    );

    let agenda = state.agenda();
    agenda.load().await?;

    println!("\n--- Calendário ---");
    for event in agenda.calendar() {
        println!("{} -> {}  {} [{}]", event.start, event.end.format("%H:%M"), event.title, event.color);
    }

    println!("\n--- Pagamentos pendentes ---");
    let filter = AppointmentFilter { unpaid_only: true, ..Default::default() };
    for appointment in agenda.filtered(&filter) {
        let badge = derive::status_badge(&appointment.status, locale);
        println!("#{} {} {} ({})", appointment.id, appointment.start, appointment.title(), badge.label);
    }

    let today = Local::now().date_naive();
    println!("\n{} agendamento(s) em {}", agenda.on_day(today).len(), today);

    agenda.close();
    for note in state.notifier.drain() {
        println!("[{:?}] {}", note.level, note.message);
    }

    state.auth_service.logout().await;
    Ok(())
}
