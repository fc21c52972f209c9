use std::sync::Arc;

use crate::{config::Config, db::Database};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let database = Database::new(&config.database.url).await?;
        database.init().await?;

        Ok(Self {
            db: Arc::new(database),
            config,
        })
    }
}
