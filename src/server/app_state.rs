use std::sync::Arc;
use std::time::Instant;

use crate::common::types::AnyResult;
use crate::configs::Config;
use crate::demo::{DemoPipeline, EngineRegistry, FfmpegLoader, ResourceLimiter};
use crate::storage::{DriveStorage, StorageBackend};

/// Top-level application state.
pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn StorageBackend>,
    pub limiter: Arc<ResourceLimiter>,
    pub engines: Arc<EngineRegistry>,
    pub pipeline: Arc<DemoPipeline>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config) -> AnyResult<Arc<Self>> {
        let storage: Arc<dyn StorageBackend> =
            Arc::new(DriveStorage::new(config.storage.clone())?);
        let limiter = Arc::new(ResourceLimiter::default());
        let engines = Arc::new(EngineRegistry::new(Box::new(FfmpegLoader::new(
            config.engine.clone(),
        ))));
        let pipeline = Arc::new(DemoPipeline::new(
            storage.clone(),
            engines.clone(),
            limiter.clone(),
        ));

        Ok(Arc::new(Self {
            config,
            storage,
            limiter,
            engines,
            pipeline,
            started_at: Instant::now(),
        }))
    }
}
