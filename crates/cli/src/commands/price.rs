use chrono::{NaiveDate, Utc};
use clap::{Args, Subcommand};

use dentabill_core::{PricePreviewRequest, WorkId};

use crate::commands::{build_runtime, connect_services, load_config, CommandResult, StepError};

#[derive(Debug, Subcommand)]
pub enum PriceCommand {
    #[command(about = "Resolve the base price a work would be fixed at, without persisting")]
    Preview(PriceArgs),
    #[command(about = "Freeze the resolved base price as the work's immutable snapshot")]
    Fix(PriceArgs),
    #[command(about = "Report the final price: frozen base plus all recorded overrides")]
    Resolve(ResolveArgs),
}

#[derive(Debug, Args)]
pub struct PriceArgs {
    #[arg(long, help = "Work identifier")]
    pub work_id: String,
    #[arg(long, default_value = "standard", help = "Client price group")]
    pub price_group: String,
    #[arg(long, help = "Pricing date (YYYY-MM-DD), defaults to today")]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Args)]
pub struct ResolveArgs {
    #[arg(long, help = "Work identifier")]
    pub work_id: String,
}

impl PriceArgs {
    fn request(&self) -> PricePreviewRequest {
        PricePreviewRequest {
            work_id: WorkId(self.work_id.clone()),
            price_group: self.price_group.clone(),
            pricing_date: self.date.unwrap_or_else(|| Utc::now().date_naive()),
        }
    }
}

pub fn run(command: PriceCommand) -> CommandResult {
    let name = match command {
        PriceCommand::Preview(_) => "price preview",
        PriceCommand::Fix(_) => "price fix",
        PriceCommand::Resolve(_) => "price resolve",
    };

    let config = match load_config(name) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime(name) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let services = connect_services(&config).await?;

        let (message, data) = match &command {
            PriceCommand::Preview(args) => {
                let preview = services
                    .pricing
                    .preview_base_price(&args.request())
                    .await
                    .map_err(|error| ("pricing", error.to_string(), 6u8))?;
                (
                    format!("base price for work {}: {} {}", args.work_id, preview.base_price, preview.currency),
                    serde_json::to_value(&preview),
                )
            }
            PriceCommand::Fix(args) => {
                let request = args.request();
                let preview = services
                    .pricing
                    .preview_base_price(&request)
                    .await
                    .map_err(|error| ("pricing", error.to_string(), 6u8))?;
                let snapshot = services
                    .pricing
                    .fix_base_price(&request.work_id, &preview)
                    .await
                    .map_err(|error| ("pricing", error.to_string(), 6u8))?;
                tracing::info!(work_id = %snapshot.work_id, snapshot_id = %snapshot.id, "fixed base price");
                (
                    format!("fixed work {} at {} {}", args.work_id, snapshot.price, snapshot.currency),
                    serde_json::to_value(&snapshot),
                )
            }
            PriceCommand::Resolve(args) => {
                let work_id = WorkId(args.work_id.clone());
                let resolution = services
                    .pricing
                    .resolve_final_price(&work_id)
                    .await
                    .map_err(|error| ("pricing", error.to_string(), 6u8))?;
                (
                    format!(
                        "final price for work {}: {} {}",
                        args.work_id, resolution.final_price, resolution.currency
                    ),
                    serde_json::to_value(&resolution),
                )
            }
        };

        services.pool.close().await;
        let data = data.map_err(|error| ("serialization", error.to_string(), 7u8))?;
        Ok::<_, StepError>((message, data))
    });

    match result {
        Ok((message, data)) => CommandResult::success_with_data(name, message, data),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure(name, error_class, message, exit_code)
        }
    }
}
