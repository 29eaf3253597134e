use std::sync::Arc;

use admin::{App, Backends};
use anyhow::Result;
use auth::SessionManager;
use auth::gotrue::GoTrueClient;
use catalog::ImageUploader;
use catalog::repositories::product::PgProductRepository;
use catalog::storage::s3::S3ImageStorage;
use common::config::Settings;
use common::{database, telemetry};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::from_env()?;
    telemetry::init(&settings.log_filter)?;

    info!("Starting catalog admin");

    let pool = database::init_pool(&settings.database).await?;
    let storage = S3ImageStorage::from_settings(&settings.storage).await;
    let backends = Backends {
        repository: Arc::new(PgProductRepository::new(pool)),
        uploader: ImageUploader::from_settings(Arc::new(storage), &settings.storage),
    };

    let provider = GoTrueClient::from_settings(&settings.auth);
    let session = Arc::new(SessionManager::start(Arc::new(provider)));
    let mut changes = session.subscribe();

    let mut app = App::new(session, backends);
    let view = app.start().await;
    info!("Showing {} view", view.name());

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = app.sync().await;
                info!("Showing {} view", view.name());
            }
            result = &mut shutdown => {
                result?;
                break;
            }
        }
    }

    info!("Shutting down catalog admin");
    Ok(())
}
