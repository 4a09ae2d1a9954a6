use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Error, SqlitePool};
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone)]
pub struct Client {
    pool: SqlitePool,
}

impl Client {
    pub async fn new(database_url: &str) -> Result<Self, Error> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new().max_connections(5).connect_with(options).await?;

        Ok(Self { pool })
    }

    pub async fn init(database_url: &str) -> Result<Self, Error> {
        let client = Client::new(database_url).await?;

        // Create the projection tables on startup
        sqlx::raw_sql(include_str!("../resources/create_tables.sql")).execute(client.pool()).await?;

        Ok(client)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
