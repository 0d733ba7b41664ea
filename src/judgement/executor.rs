//! Single-judge execution and parallel dispatch.
//!
//! [`JudgeExecutor::execute`] is the failure-isolation boundary for one
//! judge: whatever goes wrong in the completion call, it returns a valid
//! [`JudgeOutcome`]. [`JudgeExecutor::dispatch`] fans the executor out over
//! every selected judge and waits for all of them.

use std::sync::Arc;

use futures::future::join_all;

use crate::judgement::error::JudgementError;
use crate::judgement::judge::{JudgeConfig, JudgeOutcome};
use crate::llm::{BackendRegistry, CompletionError, CompletionRequest};

#[derive(Clone)]
pub struct JudgeExecutor {
    backends: Arc<BackendRegistry>,
}

impl JudgeExecutor {
    pub fn new(backends: Arc<BackendRegistry>) -> Self {
        Self { backends }
    }

    /// Ask one judge for its opinion of `statement`. Never fails.
    pub async fn execute(&self, judge: &JudgeConfig, statement: &str) -> JudgeOutcome {
        match self.call(judge, statement).await {
            Ok(response) => {
                let outcome = JudgeOutcome::answered(&judge.name, response);
                log::debug!(
                    "judge {} answered (confidence {})",
                    judge.name,
                    outcome.confidence
                );
                outcome
            }
            Err(e) => {
                log::warn!("judge {} failed: {e}", judge.name);
                JudgeOutcome::degraded(&judge.name)
            }
        }
    }

    async fn call(&self, judge: &JudgeConfig, statement: &str) -> Result<String, CompletionError> {
        let api = self.backends.get(&judge.backend)?;
        let request = CompletionRequest::system_user(&judge.model, &judge.prompt, statement)
            .temperature(judge.temperature)
            .max_tokens(judge.max_tokens);
        let completion = api.complete(&request).await?;
        if completion.is_refusal() {
            log::info!(
                "judge {} refused: {}",
                judge.name,
                completion.refusal.as_deref().unwrap_or_default()
            );
        }
        if completion.content.trim().is_empty() {
            return Err(CompletionError::EmptyResponse);
        }
        Ok(completion.content)
    }

    /// Run every judge concurrently and collect one outcome per judge, in
    /// input order.
    ///
    /// Each judge runs in its own task so a slow backend never holds up the
    /// others. Judge failures are already absorbed by [`execute`]; an error
    /// here means a task itself could not be joined.
    ///
    /// [`execute`]: Self::execute
    pub async fn dispatch(
        &self,
        judges: Vec<JudgeConfig>,
        statement: &str,
    ) -> Result<Vec<JudgeOutcome>, JudgementError> {
        let statement: Arc<str> = Arc::from(statement);

        let handles = judges.into_iter().map(|judge| {
            let executor = self.clone();
            let statement = Arc::clone(&statement);
            tokio::spawn(async move { executor.execute(&judge, &statement).await })
        });

        join_all(handles)
            .await
            .into_iter()
            .map(|joined| joined.map_err(JudgementError::from))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
