use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use topstories_core::{Config, MemoryCache, StoryPipeline, WorkerPoolQueue};

/// Shared application state
pub struct AppState {
    config: Config,
    pipeline: Arc<StoryPipeline>,
    queue: Arc<WorkerPoolQueue>,
    cache: Arc<MemoryCache>,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        config: Config,
        pipeline: Arc<StoryPipeline>,
        queue: Arc<WorkerPoolQueue>,
        cache: Arc<MemoryCache>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            config,
            pipeline,
            queue,
            cache,
            shutdown,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pipeline(&self) -> &StoryPipeline {
        &self.pipeline
    }

    pub fn queue(&self) -> &WorkerPoolQueue {
        &self.queue
    }

    pub fn cache(&self) -> &MemoryCache {
        &self.cache
    }

    /// Token cancelled when the server begins shutting down.
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }
}
