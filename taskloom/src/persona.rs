//! Persona: role, goal and backstory injected into a task's system prompt.
//!
//! One persona is usually shared (`Arc<Persona>`) by several tasks.

/// Who the model should act as for a task.
///
/// Built once with the `with_*` builders and then only read.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Persona {
    pub role: String,
    pub goal: String,
    pub backstory: String,
}

impl Persona {
    /// Creates an empty persona; fill it with the `with_*` builders.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set role (builder).
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    /// Set goal (builder).
    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = goal.into();
        self
    }

    /// Set backstory (builder).
    pub fn with_backstory(mut self, backstory: impl Into<String>) -> Self {
        self.backstory = backstory.into();
        self
    }
}
