// ============================================================================
// L2.12: HEALTH CHECK SUBSYSTEM
// ============================================================================
use log::{error, info, warn};

use crate::connection_manager::{self, DestinationEndpoint, SourceEndpoint};
use crate::errors::{AppError, Engine};
use crate::model::TablePair;
use crate::table_fetch::{count_destination_rows, count_source_rows};

pub async fn run_health_check(
    source: &SourceEndpoint,
    destination: &DestinationEndpoint,
    pairs: &[TablePair],
) -> Result<(), AppError> {
    info!("");
    info!("🏥 === HEALTH CHECK ===");
    info!("════════════════════════════════════════════════");

    connection_manager::verify_source(source).await?;
    connection_manager::verify_destination(destination).await?;

    info!("");
    info!("📋 Table Pair Status:");
    for pair in pairs {
        report(
            Engine::SqlServer,
            &pair.source_table,
            count_source_rows(source, &pair.source_table).await,
        );
        report(
            Engine::MySql,
            &pair.destination_table,
            count_destination_rows(destination, &pair.destination_table).await,
        );
    }

    info!("");
    info!("✅ Health check completed");
    info!("════════════════════════════════════════════════");
    Ok(())
}

fn report(engine: Engine, table: &str, count: Result<i64, AppError>) {
    let line = match count {
        Ok(0) => {
            warn!("  ⚠️ {} {}: EMPTY", engine, table);
            format!("{} {}: EMPTY", engine, table)
        }
        Ok(count) => {
            info!("  ✅ {} {}: {} records", engine, table, count);
            format!("{} {}: {} records", engine, table, count)
        }
        Err(e) if e.is_table_not_found() => {
            warn!("  ⚠️ {} {}: table does not exist", engine, table);
            format!("{} {}: table does not exist", engine, table)
        }
        Err(e) => {
            error!("  ❌ {} {}: {}", engine, table, e);
            format!("{} {}: {}", engine, table, e)
        }
    };
    println!("{}", line);
}
