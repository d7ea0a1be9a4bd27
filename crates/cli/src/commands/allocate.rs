use clap::Args;
use rust_decimal::Decimal;

use dentabill_core::{ClientId, WorkId};

use crate::commands::{build_runtime, connect_services, load_config, CommandResult, StepError};

#[derive(Debug, Args)]
pub struct AllocateArgs {
    #[arg(long, help = "Client account the payment belongs to")]
    pub client_id: String,
    #[arg(long, help = "Payment amount to distribute")]
    pub amount: Decimal,
    #[arg(
        long = "work-id",
        required = true,
        help = "Work to allocate into; repeat in allocation order"
    )]
    pub work_ids: Vec<String>,
}

pub fn run(args: AllocateArgs) -> CommandResult {
    let config = match load_config("allocate") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("allocate") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let services = connect_services(&config).await?;

        let work_ids: Vec<WorkId> = args.work_ids.iter().cloned().map(WorkId).collect();
        let preview = services
            .billing
            .preview_payment_allocation(&ClientId(args.client_id.clone()), args.amount, &work_ids)
            .await
            .map_err(|error| ("billing", error.to_string(), 6u8))?;

        let message = if preview.requires_balance_confirmation {
            format!(
                "allocated {} of {}; {} unallocated, needs balance confirmation",
                preview.total_allocated, preview.payment_amount, preview.remaining_unallocated
            )
        } else {
            format!("allocated {} across {} works", preview.total_allocated, preview.allocations.len())
        };

        services.pool.close().await;
        let data = serde_json::to_value(&preview)
            .map_err(|error| ("serialization", error.to_string(), 7u8))?;
        Ok::<_, StepError>((message, data))
    });

    match result {
        Ok((message, data)) => CommandResult::success_with_data("allocate", message, data),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("allocate", error_class, message, exit_code)
        }
    }
}
