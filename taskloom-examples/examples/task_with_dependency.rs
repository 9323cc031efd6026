//! Two chained tasks: a jokes writer produces jokes, a casual developer rates them.
//!
//! Processing the rating task runs the writing task first and feeds the jokes
//! into the rater's prompt. The ratings are written to `task_output.json`.
//!
//! Run: `cargo run -p taskloom-examples --example task_with_dependency`
//! Offline: `TASKLOOM_PROVIDER=mock cargo run -p taskloom-examples --example task_with_dependency`

use std::fs::File;
use std::sync::Arc;

use serde::Deserialize;
use taskloom::{Creativity, Persona, RunContext, Task};

const MOCK_JOKES: &str = r#"["Why do programmers prefer dark mode? Because light attracts bugs.","A SQL query walks into a bar, goes up to two tables and asks: can I join you?"]"#;
const MOCK_RATINGS: &str = r#"[{"joke": "Why do programmers prefer dark mode? Because light attracts bugs.", "rating": 3, "reason": "Classic, but everyone has heard it."}, {"joke": "A SQL query walks into a bar, goes up to two tables and asks: can I join you?", "rating": 4, "reason": "Short setup and a clean pun."}]"#;

#[derive(Debug, Deserialize)]
struct RatedJoke {
    joke: String,
    rating: u8,
    reason: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let _log_guard = env_config::logging::init()?;

    let endpoint = taskloom_examples::load_endpoint(&[MOCK_JOKES, MOCK_RATINGS])?;

    let jokes_writer = Arc::new(
        Persona::new()
            .with_role("Professional Jokes Writer")
            .with_goal("Writing exceptional funny and not well-known jokes about programmers")
            .with_backstory(
                "You work at a leading tech think tank. Your expertise lies in identifying trending jokes",
            ),
    );
    let casual_dev = Arc::new(
        Persona::new()
            .with_role("Casual JS Developer")
            .with_goal("Rate the jokes")
            .with_backstory(
                "You have been watching memes, fun reels and comedy clubs for 20 years. You know what is funny and what not!",
            ),
    );

    let jokes = Arc::new(
        Task::new(Arc::clone(&endpoint), jokes_writer)
            .with_description("Write 10 jokes")
            .with_expected_output(
                r#"All jokes must be returned in a single valid JSON array like: ["joke1", "joke2", "joke3", ...]"#,
            )
            .with_creativity(Creativity::EXTREMELY_CREATIVE),
    );
    let ratings = Task::new(Arc::clone(&endpoint), casual_dev)
        .with_description(
            "Rate each joke between 1-5 (1=joke is bad, 5=joke is really funny) and tell the reason why you rated it how you rated",
        )
        .with_expected_output(
            r#"A valid JSON array with one object per joke holding the joke itself, its rating and the reason, like: [{"joke": "...", "rating": 1, "reason": "..."}, ...]"#,
        )
        .with_creativity(Creativity::SLIGHTLY_CREATIVE)
        .with_dependencies([Arc::clone(&jokes)]);

    if let Err(e) = ratings.process(&RunContext::new()).await {
        tracing::error!(description = %ratings.description(), error = %e, "task failed");
        return Err(e.into());
    }

    match ratings.decode::<Vec<RatedJoke>>() {
        Ok(rated) => {
            for r in &rated {
                println!("[{}/5] {}\n      {}", r.rating, r.joke, r.reason);
            }
        }
        Err(e) => tracing::warn!(error = %e, "ratings are not the expected JSON array"),
    }

    let mut file = File::create("task_output.json")?;
    let written = std::io::copy(&mut ratings.reader(), &mut file)?;
    tracing::info!(bytes = written, "wrote task_output.json");

    let usage = endpoint.usage().snapshot();
    tracing::info!(total = usage.total_tokens, "token usage across both tasks");
    Ok(())
}
