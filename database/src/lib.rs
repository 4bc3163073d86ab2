use std::path::Path;

use common::normalize_launch_command;
use sqlx::{SqlitePool, sqlite::{SqlitePoolOptions, SqliteConnectOptions}};
use std::collections::HashSet;
use tracing::{debug, instrument};


#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// The master list of curated games. Maintained elsewhere, we only ever read it.
pub struct Database {
    pool: SqlitePool
}

impl Database {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let options = SqliteConnectOptions::new()
            .read_only(true)
            .filename(path.as_ref());
        let pool = SqlitePoolOptions::new()
            .connect_with(options).await?;
        Ok(Self::from_pool(pool))
    }
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool
        }
    }
    /// every launch command in the master list, as stored
    #[instrument(skip(self))]
    pub async fn launch_commands(&self) -> Result<Vec<String>, Error> {
        let commands: Vec<String> = sqlx::query_scalar(
            "select launchCommand from game where launchCommand is not null",
        )
        .fetch_all(&self.pool)
        .await?;
        debug!("loaded {} launch commands", commands.len());
        Ok(commands)
    }
    /// Is `launch_command` (in any quoting) already in the master list?
    pub async fn has_launch_command(&self, launch_command: &str) -> Result<bool, Error> {
        let wanted = normalize_launch_command(launch_command);
        let known: HashSet<String> = self
            .launch_commands()
            .await?
            .iter()
            .map(|c| normalize_launch_command(c))
            .collect();
        Ok(known.contains(&wanted))
    }
}
