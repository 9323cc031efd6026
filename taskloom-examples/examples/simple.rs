//! Single task, no dependencies: ask for three jokes as a JSON array.
//!
//! Run: `cargo run -p taskloom-examples --example simple`
//! Offline: `TASKLOOM_PROVIDER=mock cargo run -p taskloom-examples --example simple`

use std::sync::Arc;

use taskloom::{Creativity, Persona, RunContext, Task};

const MOCK_JOKES: &str = r#"["Why do programmers prefer dark mode? Because light attracts bugs.","I told my compiler a joke. It didn't get the reference.","There are 10 kinds of people: those who read binary and those who don't."]"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let _log_guard = env_config::logging::init()?;

    let endpoint = taskloom_examples::load_endpoint(&[MOCK_JOKES])?;
    let comedian = Arc::new(
        Persona::new()
            .with_role("Stand-up comedian")
            .with_goal("Make people laugh with short, clean jokes")
            .with_backstory("You have been writing one-liners for programmers for a decade."),
    );

    let task = Task::new(Arc::clone(&endpoint), comedian)
        .with_description("Tell three different jokes about programming.")
        .with_expected_output("A JSON array of three strings, one joke per string.")
        .with_creativity(Creativity::VERY_CREATIVE);

    if let Err(e) = task.process(&RunContext::new()).await {
        tracing::error!(error = %e, "task failed");
        return Err(e.into());
    }

    println!("raw output:\n{}\n", task.output());
    println!("as JSON string: {}\n", task.output_to_json()?);

    match task.decode::<Vec<String>>() {
        Ok(jokes) => {
            for (i, joke) in jokes.iter().enumerate() {
                println!("{}. {}", i + 1, joke);
            }
        }
        Err(e) => tracing::warn!(error = %e, "output is not a JSON array of strings"),
    }

    let usage = endpoint.usage().snapshot();
    tracing::info!(
        prompt = usage.prompt_tokens,
        completion = usage.completion_tokens,
        total = usage.total_tokens,
        "token usage"
    );
    Ok(())
}
