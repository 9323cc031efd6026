//! Prompt composition for a task.
//!
//! System prompt: persona role, goal, backstory, then the expected-output
//! contract the reply must match. User prompt: completed dependency results (in
//! dependency order, each description paired with its output), then the task's
//! own description. Compliance with the contract is not checked here.

use crate::persona::Persona;

use super::Task;

const SECTION_RULE: &str = "------------------------";

const CONTRACT_INSTRUCTION: &str =
    "Respond EXACTLY in the following format and with NOTHING else:";

const DEPENDENCY_PREAMBLE: &str = "Before your actual task, read the results of the previously \
finished tasks below carefully. They are prerequisites of your task and provide the context you need.";

const DEPENDENCY_CLOSING: &str =
    "Once you have read the previous task outcomes, continue with your actual task below.";

const TASK_INSTRUCTION: &str = "Using all the information you have, solve YOUR task carefully:";

/// Fences `body` in `'''` lines.
fn fenced(out: &mut String, body: &str) {
    out.push_str("'''\n");
    out.push_str(body);
    out.push_str("\n'''\n");
}

/// Builds the system prompt from a persona and an expected-output contract.
pub fn compose_system_prompt(persona: &Persona, expected_output: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("Your role is '{}'\n", persona.role));
    out.push_str(&format!("Your goal is '{}'\n", persona.goal));
    out.push_str(&format!("Your backstory: '{}'\n", persona.backstory));
    out.push_str(CONTRACT_INSTRUCTION);
    out.push('\n');
    fenced(&mut out, expected_output);
    out
}

/// Builds the user prompt from `(description, output)` pairs of finished
/// dependencies (in order) and the task's own description.
pub fn compose_user_prompt<'a, I>(dependencies: I, description: &str) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut out = String::new();
    let mut deps = dependencies.into_iter().enumerate().peekable();

    if deps.peek().is_some() {
        out.push_str(SECTION_RULE);
        out.push('\n');
        out.push_str(DEPENDENCY_PREAMBLE);
        out.push_str("\n\n");
        for (i, (dep_description, dep_output)) in deps {
            out.push_str(&format!("# Finished Task Nr. {}\n", i));
            out.push_str("## Task Description\n");
            out.push_str(dep_description);
            out.push('\n');
            out.push_str("## Task Outcome\n");
            fenced(&mut out, dep_output);
            out.push('\n');
        }
        out.push_str(SECTION_RULE);
        out.push_str("\n\n");
        out.push_str(DEPENDENCY_CLOSING);
        out.push_str("\n\n");
    }

    out.push_str(TASK_INSTRUCTION);
    out.push('\n');
    fenced(&mut out, description);
    out
}

impl Task {
    /// System prompt for this task.
    pub fn system_prompt(&self) -> String {
        compose_system_prompt(&self.persona, &self.expected_output)
    }

    /// User prompt for this task, using the dependencies' current outputs.
    ///
    /// Meant to be called once every dependency is done; an unfinished dependency
    /// contributes an empty outcome block.
    pub fn user_prompt(&self) -> String {
        let deps = self.dependencies();
        let snapshots: Vec<(&str, String)> = deps
            .iter()
            .map(|d| (d.description(), d.output()))
            .collect();
        compose_user_prompt(
            snapshots.iter().map(|(desc, out)| (*desc, out.as_str())),
            &self.description,
        )
    }
}
