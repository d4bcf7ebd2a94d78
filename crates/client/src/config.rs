use std::time::Duration;

/// Client tunables
#[derive(Debug, Clone)]
pub struct Config {
    /// delay between result polls while a task is
    ///  still pending
    pub poll_interval: Duration,
    /// upper bound applied to every result retrieval,
    ///  if not set then retrieval polls until the task
    ///  reaches a terminal status
    pub result_deadline: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            result_deadline: None,
        }
    }
}
