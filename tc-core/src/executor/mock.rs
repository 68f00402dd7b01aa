//! Mock executor for testing.
//!
//! Records every invocation and replays queued outputs.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{ExecOutput, PrivilegedExecutor};
use crate::error::Result;
use crate::qdisc::command_line;

/// Mock executor for testing.
///
/// Every call is recorded as a command line. Outputs queued with
/// [`queue_output`](Self::queue_output) are returned in order; once the queue is
/// empty every call succeeds with empty output.
#[derive(Debug, Default)]
pub struct MockExecutor {
    inner: Arc<Mutex<MockExecutorInner>>,
}

#[derive(Debug, Default)]
struct MockExecutorInner {
    invocations: Vec<String>,
    outputs: VecDeque<ExecOutput>,
    fail_next_spawn: Option<String>,
    delay: Option<Duration>,
}

impl MockExecutor {
    /// Create a new mock executor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the output returned by the next call.
    pub fn queue_output(&self, output: ExecOutput) {
        let mut inner = self.inner.lock().unwrap();
        inner.outputs.push_back(output);
    }

    /// Cause the next call to fail as if the binary could not be spawned.
    pub fn fail_next_spawn(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_spawn = Some(error.to_string());
    }

    /// Sleep this long inside every call.
    pub fn set_delay(&self, delay: Duration) {
        let mut inner = self.inner.lock().unwrap();
        inner.delay = Some(delay);
    }

    /// All command lines run so far.
    pub fn invocations(&self) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        inner.invocations.clone()
    }

    /// The last command line run.
    pub fn last_invocation(&self) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner.invocations.last().cloned()
    }

    /// Clear all state.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        *inner = MockExecutorInner::default();
    }
}

impl Clone for MockExecutor {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl PrivilegedExecutor for MockExecutor {
    async fn run(&self, program: &str, args: &[String]) -> Result<ExecOutput> {
        let (delay, next) = {
            let mut inner = self.inner.lock().unwrap();
            inner.invocations.push(command_line(program, args));

            if let Some(error) = inner.fail_next_spawn.take() {
                return Err(std::io::Error::new(std::io::ErrorKind::NotFound, error).into());
            }

            (inner.delay, inner.outputs.pop_front().unwrap_or_default())
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        Ok(next)
    }
}
