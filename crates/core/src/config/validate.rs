use super::{types::Config, ConfigError};

/// Validate configuration
///
/// Rejects values that would leave the service unable to answer a request:
/// a zero port, an unusable upstream URL, zero-sized TTLs, pools, poll
/// budgets or deadlines, and a job record retention shorter than the poll
/// window (a record collected while it is still being polled reads as
/// `Unknown`).
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(invalid("server.port cannot be 0"));
    }

    match reqwest::Url::parse(&config.upstream.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => {
            return Err(invalid(format!(
                "upstream.base_url must be http or https, got '{}'",
                url.scheme()
            )))
        }
        Err(e) => {
            return Err(invalid(format!(
                "upstream.base_url '{}' is not a valid URL: {}",
                config.upstream.base_url, e
            )))
        }
    }

    if config.upstream.timeout_secs == 0 {
        return Err(invalid("upstream.timeout_secs must be greater than 0"));
    }
    if config.cache.ttl_secs == 0 {
        return Err(invalid("cache.ttl_secs must be greater than 0"));
    }
    if config.queue.worker_count == 0 {
        return Err(invalid("queue.worker_count must be greater than 0"));
    }
    if config.poller.max_attempts == 0 {
        return Err(invalid("poller.max_attempts must be greater than 0"));
    }
    if config.poller.interval_ms == 0 {
        return Err(invalid("poller.interval_ms must be greater than 0"));
    }
    if config.pipeline.request_timeout_secs == 0 {
        return Err(invalid("pipeline.request_timeout_secs must be greater than 0"));
    }

    let poll_window_ms =
        u128::from(config.poller.interval_ms) * u128::from(config.poller.max_attempts);
    let retention_ms = u128::from(config.queue.record_retention_secs) * 1000;
    if retention_ms < poll_window_ms {
        return Err(invalid(format!(
            "queue.record_retention_secs ({}s) must cover the poll window of {}ms \
             (poller.interval_ms * poller.max_attempts)",
            config.queue.record_retention_secs, poll_window_ms
        )));
    }

    Ok(())
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}
