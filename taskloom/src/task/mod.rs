//! Task: one unit of LLM work with a persona, an expected-output contract and
//! optional prerequisite tasks.
//!
//! Tasks are shared as `Arc<Task>`: a dependency may feed several dependents and
//! the output is written once the task has run. A task is **done** when its
//! output is non-empty.
//!
//! - [`prompt`]: system / user prompt composition.
//! - [`process`]: dependency resolution and execution ([`Task::process`], [`RunContext`]).

pub mod process;
pub mod prompt;

pub use process::RunContext;

use std::fmt;
use std::io::Cursor;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::de::DeserializeOwned;

use crate::endpoint::LlmEndpoint;
use crate::error::TaskError;
use crate::llm::LlmUsage;
use crate::persona::Persona;

/// Unique id of a task instance; used in logs and for cycle detection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(uuid::Uuid);

impl TaskId {
    fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Sampling temperature with named presets.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Creativity(pub f32);

impl Creativity {
    pub const NOT_CREATIVE: Creativity = Creativity(0.0);
    pub const SLIGHTLY_CREATIVE: Creativity = Creativity(0.5);
    pub const SOMEWHAT_CREATIVE: Creativity = Creativity(1.0);
    pub const VERY_CREATIVE: Creativity = Creativity(1.5);
    pub const EXTREMELY_CREATIVE: Creativity = Creativity(2.0);
}

impl From<f32> for Creativity {
    fn from(value: f32) -> Self {
        Creativity(value)
    }
}

impl From<Creativity> for f32 {
    fn from(value: Creativity) -> Self {
        value.0
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A unit of work for the model.
///
/// Build with [`Task::new`] and the `with_*` builders, then wrap in `Arc` to use
/// it as a dependency of other tasks.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use taskloom::{Creativity, LlmEndpoint, Persona, RunContext, Task};
///
/// # async fn run() -> Result<(), taskloom::TaskError> {
/// let endpoint = Arc::new(LlmEndpoint::from_env()?);
/// let writer = Arc::new(Persona::new().with_role("Jokes Writer"));
/// let jokes = Arc::new(
///     Task::new(Arc::clone(&endpoint), writer)
///         .with_description("Write 10 jokes")
///         .with_expected_output(r#"A JSON array like ["joke1", "joke2"]"#)
///         .with_creativity(Creativity::SLIGHTLY_CREATIVE),
/// );
/// jokes.process(&RunContext::new()).await?;
/// let parsed: Vec<String> = jokes.decode()?;
/// # Ok(())
/// # }
/// ```
pub struct Task {
    id: TaskId,
    description: String,
    expected_output: String,
    creativity: f32,
    persona: Arc<Persona>,
    endpoint: Arc<LlmEndpoint>,
    dependencies: RwLock<Vec<Arc<Task>>>,
    output: RwLock<String>,
    last_usage: RwLock<Option<LlmUsage>>,
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dependency_ids: Vec<TaskId> = read(&self.dependencies).iter().map(|d| d.id).collect();
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("description", &self.description)
            .field("creativity", &self.creativity)
            .field("dependencies", &dependency_ids)
            .field("done", &self.is_done())
            .finish_non_exhaustive()
    }
}

impl Task {
    /// Creates a task with empty description and contract, creativity 0 and no dependencies.
    pub fn new(endpoint: Arc<LlmEndpoint>, persona: Arc<Persona>) -> Self {
        Self {
            id: TaskId::new(),
            description: String::new(),
            expected_output: String::new(),
            creativity: Creativity::NOT_CREATIVE.0,
            persona,
            endpoint,
            dependencies: RwLock::new(Vec::new()),
            output: RwLock::new(String::new()),
            last_usage: RwLock::new(None),
        }
    }

    /// Set description (builder).
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set expected output contract (builder).
    pub fn with_expected_output(mut self, expected_output: impl Into<String>) -> Self {
        self.expected_output = expected_output.into();
        self
    }

    /// Set creativity, either a preset or a raw temperature (builder).
    pub fn with_creativity(mut self, creativity: impl Into<Creativity>) -> Self {
        self.creativity = creativity.into().0;
        self
    }

    /// Replace dependencies (builder). Order is execution and prompt order.
    pub fn with_dependencies(self, dependencies: impl IntoIterator<Item = Arc<Task>>) -> Self {
        *write(&self.dependencies) = dependencies.into_iter().collect();
        self
    }

    /// Appends a dependency to an already-shared task.
    ///
    /// Allows wiring graphs after construction, which is also the only way to
    /// form a cycle; cycles are rejected by [`Task::process`], not here. A cycle
    /// of `Arc`s is never freed.
    pub fn add_dependency(&self, dependency: Arc<Task>) {
        write(&self.dependencies).push(dependency);
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn expected_output(&self) -> &str {
        &self.expected_output
    }

    pub fn creativity(&self) -> f32 {
        self.creativity
    }

    pub fn persona(&self) -> &Arc<Persona> {
        &self.persona
    }

    pub fn endpoint(&self) -> &Arc<LlmEndpoint> {
        &self.endpoint
    }

    /// Snapshot of the dependency list, in order.
    pub fn dependencies(&self) -> Vec<Arc<Task>> {
        read(&self.dependencies).clone()
    }

    /// True when the output is non-empty.
    pub fn is_done(&self) -> bool {
        !read(&self.output).is_empty()
    }

    /// True when every dependency is done (vacuously true without dependencies).
    pub fn can_process(&self) -> bool {
        read(&self.dependencies).iter().all(|d| d.is_done())
    }

    /// Raw output; empty until the task is done.
    pub fn output(&self) -> String {
        read(&self.output).clone()
    }

    /// Usage of the most recent successful execution.
    pub fn last_usage(&self) -> Option<LlmUsage> {
        *read(&self.last_usage)
    }

    /// Output re-encoded as a JSON string literal (quoted and escaped).
    pub fn output_to_json(&self) -> Result<String, TaskError> {
        Ok(serde_json::to_string(&*read(&self.output))?)
    }

    /// Parses the output as JSON into `T`.
    ///
    /// Only as reliable as the model's adherence to the expected-output contract;
    /// fails with `TaskError::Decode` otherwise.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, TaskError> {
        Ok(serde_json::from_str(&read(&self.output))?)
    }

    /// Reader over a copy of the output, e.g. for `std::io::copy` into a file.
    pub fn reader(&self) -> Cursor<String> {
        Cursor::new(self.output())
    }

    pub(crate) fn record_completion(&self, content: String, usage: LlmUsage) {
        *write(&self.output) = content;
        *write(&self.last_usage) = Some(usage);
    }
}
