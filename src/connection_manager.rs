// ============================================================================
// L2.2: CONNECTION MANAGER SUBSYSTEM
// ============================================================================
use log::{debug, error, info};
use sqlx::Connection;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use tiberius::Client;
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::errors::{AppError, Engine};

pub type SqlServerClient = Client<Compat<TcpStream>>;

/// Where the source lives. Every `connect` opens a fresh connection.
#[derive(Clone)]
pub struct SourceEndpoint {
    config: tiberius::Config,
}

impl SourceEndpoint {
    pub fn new(config: tiberius::Config) -> Self {
        SourceEndpoint { config }
    }

    pub async fn connect(&self) -> Result<SqlServerClient, AppError> {
        let addr = self.config.get_addr();
        debug!("📡 Connecting to {} at {}", Engine::SqlServer, addr);

        let tcp = TcpStream::connect(&addr)
            .await
            .map_err(|e| AppError::connect(Engine::SqlServer, e))?;
        tcp.set_nodelay(true)
            .map_err(|e| AppError::connect(Engine::SqlServer, e))?;

        Client::connect(self.config.clone(), tcp.compat_write())
            .await
            .map_err(|e| AppError::connect(Engine::SqlServer, e))
    }
}

#[derive(Clone)]
pub struct DestinationEndpoint {
    options: MySqlConnectOptions,
}

impl DestinationEndpoint {
    pub fn new(options: MySqlConnectOptions) -> Self {
        DestinationEndpoint { options }
    }

    pub async fn connect(&self) -> Result<MySqlConnection, AppError> {
        debug!("📡 Connecting to {}", Engine::MySql);
        MySqlConnection::connect_with(&self.options)
            .await
            .map_err(|e| AppError::connect(Engine::MySql, e))
    }
}

/// Closing failures are logged only; the work on the connection is done.
pub async fn close_source(client: SqlServerClient) {
    if let Err(e) = client.close().await {
        debug!("Closing {} connection failed: {}", Engine::SqlServer, e);
    }
}

pub async fn close_destination(conn: MySqlConnection) {
    if let Err(e) = conn.close().await {
        debug!("Closing {} connection failed: {}", Engine::MySql, e);
    }
}

pub async fn verify_source(endpoint: &SourceEndpoint) -> Result<(), AppError> {
    debug!("🔍 Verifying connection to {}", Engine::SqlServer);
    let mut client = endpoint.connect().await?;
    let result = async {
        let row = client
            .query("SELECT 1", &[])
            .await?
            .into_row()
            .await?;
        Ok::<_, tiberius::error::Error>(row.and_then(|r| r.get::<i32, _>(0)))
    }
    .await;
    close_source(client).await;

    match result {
        Ok(Some(1)) => {
            info!("✅ Database connection verified for: {}", Engine::SqlServer);
            Ok(())
        }
        Ok(other) => Err(AppError::Database {
            engine: Engine::SqlServer,
            message: format!("unexpected probe result: {:?}", other),
        }),
        Err(e) => {
            error!("❌ Connection verification failed for {}: {}", Engine::SqlServer, e);
            Err(AppError::from_mssql(e, None))
        }
    }
}

pub async fn verify_destination(endpoint: &DestinationEndpoint) -> Result<(), AppError> {
    debug!("🔍 Verifying connection to {}", Engine::MySql);
    let mut conn = endpoint.connect().await?;
    let result = sqlx::query_as::<_, (i64,)>("SELECT 1")
        .fetch_one(&mut conn)
        .await;
    close_destination(conn).await;

    match result {
        Ok((1,)) => {
            info!("✅ Database connection verified for: {}", Engine::MySql);
            Ok(())
        }
        Ok((other,)) => Err(AppError::Database {
            engine: Engine::MySql,
            message: format!("unexpected probe result: {}", other),
        }),
        Err(e) => {
            error!("❌ Connection verification failed for {}: {}", Engine::MySql, e);
            Err(AppError::from_mysql(e, None))
        }
    }
}
