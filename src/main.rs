use clap::Parser;
use transactions_etl::utils::{logger, validation::Validate};
use transactions_etl::{CliArgs, CsvToSqlitePipeline, EtlEngine};

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("Starting transactions-etl");

    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Failed to load configuration: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::debug!("Config: {:?}", config);

    let monitor_enabled = args.monitor_enabled(&config);
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let pipeline = CsvToSqlitePipeline::new(config);
    let mut engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run() {
        Ok(report) => {
            tracing::info!(
                "✅ ETL run finished: {} extracted, {} kept",
                report.extracted_rows,
                report.transformed_rows
            );
            tracing::debug!("Run report: {}", serde_json::to_string(&report)?);
        }
        Err(e) => {
            tracing::error!(
                "❌ ETL run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(e.exit_code());
        }
    }

    Ok(())
}
