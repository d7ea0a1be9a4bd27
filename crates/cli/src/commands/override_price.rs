use clap::Args;
use rust_decimal::Decimal;

use dentabill_core::{NewPriceOverride, OverrideStore, SnapshotId};

use crate::commands::{build_runtime, connect_services, load_config, CommandResult, StepError};

#[derive(Debug, Args)]
pub struct OverrideArgs {
    #[arg(long, help = "Snapshot identifier the override attaches to")]
    pub snapshot_id: String,
    #[arg(long, help = "Signed adjustment amount, e.g. 25 or -10.50", allow_hyphen_values = true)]
    pub amount: Decimal,
    #[arg(long, help = "Reason recorded with the override")]
    pub reason: String,
    #[arg(long, help = "Operator recording the override")]
    pub by: String,
}

pub fn run(args: OverrideArgs) -> CommandResult {
    let config = match load_config("override") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("override") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let services = connect_services(&config).await?;

        let recorded = services
            .overrides
            .append(NewPriceOverride {
                snapshot_id: SnapshotId(args.snapshot_id.clone()),
                adjustment: args.amount,
                reason: args.reason.clone(),
                created_by: args.by.clone(),
            })
            .await
            .map_err(|error| ("pricing", error.to_string(), 6u8))?;
        tracing::info!(
            snapshot_id = %recorded.snapshot_id,
            override_id = %recorded.id,
            "recorded price override"
        );

        services.pool.close().await;
        let data = serde_json::to_value(&recorded)
            .map_err(|error| ("serialization", error.to_string(), 7u8))?;
        Ok::<_, StepError>((
            format!("recorded override {} on snapshot {}", recorded.id, args.snapshot_id),
            data,
        ))
    });

    match result {
        Ok((message, data)) => CommandResult::success_with_data("override", message, data),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("override", error_class, message, exit_code)
        }
    }
}
