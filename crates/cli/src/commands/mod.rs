pub mod allocate;
pub mod migrate;
pub mod override_price;
pub mod price;

use std::sync::Arc;

use serde::Serialize;

use dentabill_core::config::{AppConfig, LoadOptions};
use dentabill_core::{BillingService, PricingService};
use dentabill_db::repositories::{
    SqlClientBalanceRepository, SqlPaymentLedgerRepository, SqlPriceOverrideRepository,
    SqlPriceSnapshotRepository, SqlPricingRuleRepository, SqlWorkIdentityRepository,
};
use dentabill_db::{connect_with_settings, DbPool};

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data: None,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data: Some(data),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Error tuple threaded out of the async blocks: class, message, exit code.
pub(crate) type StepError = (&'static str, String, u8);

pub(crate) struct Services {
    pub pool: DbPool,
    pub pricing: Arc<PricingService>,
    pub billing: BillingService,
    pub overrides: Arc<SqlPriceOverrideRepository>,
}

pub(crate) fn load_config(command: &str) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(command, "config_validation", format!("configuration issue: {error}"), 2)
    })
}

pub(crate) fn build_runtime(command: &str) -> Result<tokio::runtime::Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            3,
        )
    })
}

pub(crate) async fn connect_services(config: &AppConfig) -> Result<Services, StepError> {
    let pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

    let snapshots = Arc::new(SqlPriceSnapshotRepository::new(pool.clone()));
    let overrides = Arc::new(SqlPriceOverrideRepository::new(pool.clone()));
    let pricing = Arc::new(PricingService::new(
        Arc::new(SqlWorkIdentityRepository::new(pool.clone())),
        Arc::new(SqlPricingRuleRepository::new(pool.clone())),
        snapshots,
        overrides.clone(),
    ));
    let billing = BillingService::new(
        pricing.clone(),
        Arc::new(SqlPaymentLedgerRepository::new(pool.clone())),
        Arc::new(SqlClientBalanceRepository::new(pool.clone())),
    );

    Ok(Services { pool, pricing, billing, overrides })
}
