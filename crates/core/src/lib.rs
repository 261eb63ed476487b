pub mod aggregator;
pub mod cache;
pub mod config;
pub mod ingest;
pub mod metrics;
pub mod pipeline;
pub mod poller;
pub mod queue;
pub mod testing;
pub mod upstream;

pub use aggregator::RankedStory;
pub use cache::{CacheKey, CachedValue, MemoryCache, ResultCache};
pub use config::{
    load_config, load_config_from_str, validate_config, CacheConfig, Config, ConfigError,
    LoggingConfig, PipelineConfig, PollerConfig, QueueConfig, ServerConfig, UpstreamConfig,
};
pub use ingest::IngestRunner;
pub use pipeline::{PipelineError, StoryCount, StoryPipeline, ValidationError};
pub use poller::{CompletionPoller, PollError, PollPolicy};
pub use queue::{
    JobError, JobHandle, JobInfo, JobQueue, JobRunner, JobState, QueueStatus, UnitOfWork,
    WorkerPoolQueue,
};
pub use upstream::{CandidateIdSet, HackerNewsClient, StoryDetail, Upstream, UpstreamError};
