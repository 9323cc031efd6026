//! Dependency resolution and execution for a task chain.
//!
//! [`Task::process`] walks the dependency tree depth-first in list order, runs
//! every task that is not done yet, then runs the task itself. Everything is sequential;
//! the only await point that does real work is the client call, which races the
//! caller's cancellation token. The first error aborts the whole chain.

use std::collections::HashSet;

use futures::future::{BoxFuture, FutureExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{ClientError, TaskError};
use crate::llm::CompletionRequest;

use super::{Task, TaskId};

/// Per-call options for [`Task::process`].
#[derive(Clone, Debug, Default)]
pub struct RunContext {
    cancel: CancellationToken,
    force_reexecute: bool,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `token` to cancel the run (builder). Cancelling aborts the in-flight
    /// client call and no further task is started.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Re-run the root task even if it is already done (builder).
    ///
    /// Dependencies that are done are still reused; only the task `process` is
    /// called on is executed again, overwriting its output and adding its usage
    /// to the endpoint a second time.
    pub fn with_force_reexecute(mut self, force: bool) -> Self {
        self.force_reexecute = force;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Bookkeeping for one `process` call.
#[derive(Debug, Default)]
struct Walk {
    /// Tasks on the current resolution path.
    in_progress: HashSet<TaskId>,
    /// Tasks whose whole dependency tree is done in this run.
    resolved: HashSet<TaskId>,
}

impl Task {
    /// Makes sure every transitive dependency is done, then runs this task.
    ///
    /// - The whole dependency tree is walked on every call, so dependencies added
    ///   after an earlier run are resolved too.
    /// - Done tasks are not executed again, so shared (diamond) dependencies run
    ///   once. A done root is only re-executed when the context forces it.
    /// - Errors from any task in the chain are returned unchanged; nothing after
    ///   the failing task is attempted and its output stays empty.
    /// - A dependency cycle fails with `TaskError::CyclicDependency`.
    pub async fn process(&self, ctx: &RunContext) -> Result<(), TaskError> {
        let mut walk = Walk::default();
        self.process_in(ctx, &mut walk, ctx.force_reexecute).await
    }

    /// Recursive step: resolve dependencies, then execute unless done.
    fn process_in<'a>(
        &'a self,
        ctx: &'a RunContext,
        walk: &'a mut Walk,
        force: bool,
    ) -> BoxFuture<'a, Result<(), TaskError>> {
        async move {
            if walk.resolved.contains(&self.id) {
                return Ok(());
            }
            if !walk.in_progress.insert(self.id) {
                warn!(task_id = %self.id, description = %self.description, "Dependency cycle");
                return Err(TaskError::CyclicDependency { task_id: self.id });
            }

            let dependencies = self.dependencies();
            let pending = dependencies.iter().filter(|d| !d.is_done()).count();
            if pending > 0 {
                info!(
                    task_id = %self.id,
                    amount = pending,
                    description = %self.description,
                    "Processing task dependencies first"
                );
            }
            for dep in dependencies {
                let was_done = dep.is_done();
                if !was_done {
                    info!(task_id = %dep.id, description = %dep.description, "Processing dependency");
                }
                if let Err(e) = dep.process_in(ctx, walk, false).await {
                    warn!(
                        task_id = %self.id,
                        dependency_id = %dep.id,
                        error = %e,
                        "Dependency failed"
                    );
                    return Err(e);
                }
                if !was_done {
                    info!(task_id = %dep.id, description = %dep.description, "Dependency processed");
                }
            }
            walk.in_progress.remove(&self.id);

            if self.is_done() && !force {
                debug!(task_id = %self.id, "Task already done, skipping");
            } else {
                self.execute(ctx).await?;
            }
            walk.resolved.insert(self.id);
            Ok(())
        }
        .boxed()
    }

    /// Runs this task once: compose prompts, call the client, record the result.
    ///
    /// Empty content fails with `ClientError::MalformedResponse`; its usage is
    /// still counted and the previous output is kept.
    async fn execute(&self, ctx: &RunContext) -> Result<(), TaskError> {
        if ctx.is_cancelled() {
            return Err(TaskError::Cancelled);
        }
        let client = self.endpoint.client()?;
        let request = CompletionRequest::new(
            self.system_prompt(),
            self.user_prompt(),
            self.creativity,
        );

        info!(task_id = %self.id, description = %self.description, "Processing task");
        debug!(
            task_id = %self.id,
            provider = %self.endpoint.provider(),
            model = %self.endpoint.model(),
            temperature = request.temperature,
            "Task request"
        );

        let response = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => {
                warn!(task_id = %self.id, "Task cancelled");
                return Err(TaskError::Cancelled);
            }
            result = client.run(&request) => result.map_err(|e| {
                warn!(task_id = %self.id, error = %e, "Client call failed");
                TaskError::Client(e)
            })?,
        };

        self.endpoint.record_usage(&response.usage);
        if response.content.is_empty() {
            warn!(task_id = %self.id, "Model returned empty content");
            return Err(TaskError::Client(ClientError::MalformedResponse(
                "model returned empty content".to_string(),
            )));
        }
        self.record_completion(response.content, response.usage);
        info!(
            task_id = %self.id,
            total_tokens = response.usage.total_tokens,
            "Task processed"
        );
        Ok(())
    }
}
