// ============================================================================
// FILE: src/main.rs
// TABLE MIRROR - SQL Server source / MySQL destination
// Side-by-side table viewer with a typed manual insert dialog
// ============================================================================
mod catalog_report;
mod cli_parser;
mod coercion;
mod connection_manager;
mod console;
mod env_config;
mod errors;
mod health_checker;
mod insert_flow;
mod introspector;
mod logger_system;
mod model;
mod random_values;
mod sql_types;
mod statement_builder;
mod table_fetch;
mod viewer;

use chrono::Local;
use log::{error, info};
use tokio::io::BufReader;

use crate::cli_parser::RunMode;
use crate::console::Console;
use crate::env_config::EnvConfig;
use crate::errors::AppError;

// ============================================================================
// L1: MAIN APPLICATION - ORCHESTRATION
// ============================================================================
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mode = cli_parser::parse_arguments();
    let env_config = EnvConfig::from_env();
    let _logger = logger_system::init_logger(&env_config.log_level)?;

    let cpu_cores = num_cpus::get();
    let max_workers = cpu_cores.saturating_sub(1).max(2);

    info!("");
    info!("🚀 TABLE MIRROR - SQL Server / MySQL");
    info!("⚙️ CPU Cores: {}", cpu_cores);
    info!("👥 Workers: {}", max_workers);
    info!("⏰ Started: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
    info!("📋 Mode: {:?}", mode);
    env_config.log_config();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(max_workers)
        .enable_all()
        .build()?;

    match runtime.block_on(run(mode, &env_config)) {
        Ok(()) => {
            info!("🏁 Table Mirror - FINISHED");
            info!("⏰ Completed: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
            Ok(())
        }
        Err(e) => {
            error!("❌ FAILED: {}", e);
            Err(Box::new(e))
        }
    }
}

async fn run(mode: RunMode, env_config: &EnvConfig) -> Result<(), AppError> {
    let source = env_config.build_source_endpoint()?;
    let mut console = Console::new(BufReader::new(tokio::io::stdin()));

    match mode {
        RunMode::Watch => {
            let pairs = env_config.table_pairs()?;
            let endpoints = viewer::Endpoints {
                source,
                destination: env_config.build_destination_endpoint()?,
            };
            viewer::run(
                &mut console,
                pairs,
                endpoints,
                env_config.refresh_interval(),
                env_config.max_display_rows,
            )
            .await
        }
        RunMode::Insert => {
            if let Err(e) = insert_flow::run(&mut console, &source).await {
                error!("❌ Manual insert failed: {}", e);
                console.notify("Error", &e.to_string()).await?;
            }
            Ok(())
        }
        RunMode::Tables => catalog_report::print_tables(&source).await,
        RunMode::Columns(table) => catalog_report::print_columns(&source, &table).await,
        RunMode::Health => {
            let pairs = env_config.table_pairs()?;
            let destination = env_config.build_destination_endpoint()?;
            health_checker::run_health_check(&source, &destination, &pairs).await
        }
    }
}
