//! Integration tests: dependency resolution, prompt propagation, usage accounting
//! and failure handling across task chains, using `MockLlm`.


use std::sync::Arc;
use std::time::Duration;

use taskloom::{
    CancellationToken, ClientError, Creativity, LlmEndpoint, LlmUsage, MockLlm, Persona, Provider, RunContext,
    Task, TaskError,
};

const JOKES_CONTRACT: &str =
    r#"All jokes must be returned in a single valid JSON array like: ["joke1", "joke2", ...]"#;

fn mock_endpoint(mock: &Arc<MockLlm>) -> Arc<LlmEndpoint> {
    Arc::new(
        LlmEndpoint::builder()
            .provider(Provider::Custom("mock".to_string()))
            .model("mock-1")
            .api_key("test-key")
            .build()
            .expect("valid endpoint")
            .with_client(Arc::clone(mock) as Arc<dyn taskloom::LlmClient>),
    )
}

fn jokes_writer() -> Arc<Persona> {
    Arc::new(
        Persona::new()
            .with_role("Professional Jokes Writer")
            .with_goal("Writing exceptional funny jokes about programmers")
            .with_backstory("You work at a leading tech think tank"),
    )
}

fn critic() -> Arc<Persona> {
    Arc::new(
        Persona::new()
            .with_role("Casual JS Developer")
            .with_goal("Rate the jokes")
            .with_backstory("You know what is funny and what not"),
    )
}

/// **Scenario**: A task without dependencies is processed and becomes done.
#[tokio::test]
async fn single_task_processes_to_done() {
    let mock = Arc::new(MockLlm::new(r#"["joke1", "joke2"]"#));
    let ep = mock_endpoint(&mock);
    let a = Task::new(Arc::clone(&ep), jokes_writer())
        .with_description("Write 10 jokes")
        .with_expected_output(JOKES_CONTRACT)
        .with_creativity(Creativity::SLIGHTLY_CREATIVE);

    assert!(!a.is_done());
    a.process(&RunContext::new()).await.unwrap();

    assert!(a.is_done());
    assert!(!a.output().is_empty());
    let jokes: Vec<String> = a.decode().unwrap();
    assert_eq!(jokes, vec!["joke1", "joke2"]);

    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].temperature, 0.5);
    assert!(requests[0].system_prompt.contains("Professional Jokes Writer"));
    assert!(requests[0].system_prompt.contains(JOKES_CONTRACT));
    assert!(requests[0].user_prompt.contains("Write 10 jokes"));
}

/// **Scenario**: Processing B (depends on A) processes A first; B's user prompt
/// carries A's description and output.
#[tokio::test]
async fn dependent_task_processes_dependency_first() {
    let mock = Arc::new(
        MockLlm::new("unused")
            .then_reply(r#"["a joke"]"#)
            .then_reply(r#"[{"joke": "a joke", "rating": 5}]"#),
    );
    let ep = mock_endpoint(&mock);
    let a = Arc::new(
        Task::new(Arc::clone(&ep), jokes_writer())
            .with_description("Write 10 jokes")
            .with_expected_output(JOKES_CONTRACT),
    );
    let b = Task::new(Arc::clone(&ep), critic())
        .with_description("Rate each joke between 1-5")
        .with_dependencies([Arc::clone(&a)]);

    assert!(!b.can_process());
    b.process(&RunContext::new()).await.unwrap();

    assert!(a.is_done());
    assert!(b.is_done());
    assert!(b.can_process());

    let requests = mock.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].user_prompt.contains("Write 10 jokes"));
    let b_prompt = &requests[1].user_prompt;
    assert!(b_prompt.contains("Write 10 jokes"));
    assert!(b_prompt.contains(r#"["a joke"]"#));
    assert!(b_prompt.find(r#"["a joke"]"#).unwrap() < b_prompt.find("Rate each joke").unwrap());
    assert!(requests[1].system_prompt.contains("Casual JS Developer"));
}

/// **Scenario**: Dependencies run in list order and appear in that order in the prompt.
#[tokio::test]
async fn dependencies_run_and_render_in_list_order() {
    let mock = Arc::new(
        MockLlm::new("root out")
            .then_reply("d1 out")
            .then_reply("d2 out"),
    );
    let ep = mock_endpoint(&mock);
    let d1 = Arc::new(Task::new(Arc::clone(&ep), jokes_writer()).with_description("d1 task"));
    let d2 = Arc::new(Task::new(Arc::clone(&ep), jokes_writer()).with_description("d2 task"));
    let root = Task::new(Arc::clone(&ep), critic())
        .with_description("root task")
        .with_dependencies([Arc::clone(&d1), Arc::clone(&d2)]);

    root.process(&RunContext::new()).await.unwrap();

    assert_eq!(d1.output(), "d1 out");
    assert_eq!(d2.output(), "d2 out");
    assert_eq!(root.output(), "root out");

    let prompt = root.user_prompt();
    let p1 = prompt.find("d1 out").unwrap();
    let p2 = prompt.find("d2 out").unwrap();
    let own = prompt.find("root task").unwrap();
    assert!(p1 < p2 && p2 < own);
}

/// **Scenario**: A dependency shared by two branches (diamond) runs exactly once.
#[tokio::test]
async fn diamond_dependency_runs_once() {
    let mock = Arc::new(MockLlm::new("out"));
    let ep = mock_endpoint(&mock);
    let base = Arc::new(Task::new(Arc::clone(&ep), jokes_writer()).with_description("base"));
    let left = Arc::new(
        Task::new(Arc::clone(&ep), jokes_writer())
            .with_description("left")
            .with_dependencies([Arc::clone(&base)]),
    );
    let right = Arc::new(
        Task::new(Arc::clone(&ep), jokes_writer())
            .with_description("right")
            .with_dependencies([Arc::clone(&base)]),
    );
    let top = Task::new(Arc::clone(&ep), critic())
        .with_description("top")
        .with_dependencies([left, right]);

    top.process(&RunContext::new()).await.unwrap();
    assert_eq!(mock.call_count(), 4);
}

/// **Scenario**: Endpoint counters equal the sum of the usage of every task that used it.
#[tokio::test]
async fn endpoint_usage_accumulates_across_tasks() {
    let mock = Arc::new(MockLlm::new("out").with_usage(LlmUsage::new(7, 3)));
    let ep = mock_endpoint(&mock);
    let t1 = Arc::new(Task::new(Arc::clone(&ep), jokes_writer()).with_description("t1"));
    let t2 = Task::new(Arc::clone(&ep), critic())
        .with_description("t2")
        .with_dependencies([Arc::clone(&t1)]);

    t2.process(&RunContext::new()).await.unwrap();

    let u1 = t1.last_usage().unwrap();
    let u2 = t2.last_usage().unwrap();
    let usage = ep.usage();
    assert_eq!(usage.total_tokens(), u1.total_tokens + u2.total_tokens);
    assert_eq!(usage.prompt_tokens(), u1.prompt_tokens + u2.prompt_tokens);
    assert_eq!(
        usage.completion_tokens(),
        u1.completion_tokens + u2.completion_tokens
    );
    assert_eq!(usage.total_tokens(), 20);
}

/// **Scenario**: A failing client call leaves the task not done and returns the error.
#[tokio::test]
async fn client_failure_leaves_task_not_done() {
    let mock = Arc::new(MockLlm::failing("rate limited"));
    let ep = mock_endpoint(&mock);
    let c = Task::new(Arc::clone(&ep), jokes_writer()).with_description("c");

    let err = c.process(&RunContext::new()).await.unwrap_err();

    assert!(matches!(err, TaskError::Client(_)));
    assert!(err.to_string().contains("rate limited"));
    assert!(!c.is_done());
    assert_eq!(ep.usage().total_tokens(), 0);
}

/// **Scenario**: A failing dependency aborts the chain: later siblings and the parent never run.
#[tokio::test]
async fn failing_dependency_aborts_remaining_chain() {
    let mock = Arc::new(MockLlm::new("ok").then_reply("first ok").then_fail("boom"));
    let ep = mock_endpoint(&mock);
    let d1 = Arc::new(Task::new(Arc::clone(&ep), jokes_writer()).with_description("d1"));
    let d2 = Arc::new(Task::new(Arc::clone(&ep), jokes_writer()).with_description("d2"));
    let d3 = Arc::new(Task::new(Arc::clone(&ep), jokes_writer()).with_description("d3"));
    let root = Task::new(Arc::clone(&ep), critic())
        .with_description("root")
        .with_dependencies([Arc::clone(&d1), Arc::clone(&d2), Arc::clone(&d3)]);

    let err = root.process(&RunContext::new()).await.unwrap_err();

    assert!(matches!(err, TaskError::Client(_)));
    assert!(d1.is_done());
    assert!(!d2.is_done());
    assert!(!d3.is_done());
    assert!(!root.is_done());
    assert_eq!(mock.call_count(), 2);
}

/// **Scenario**: Re-processing after a failure resumes from the failed task; done work is kept.
#[tokio::test]
async fn retry_after_failure_resumes_from_failed_task() {
    let mock = Arc::new(MockLlm::new("later").then_reply("dep out").then_fail("flaky"));
    let ep = mock_endpoint(&mock);
    let dep = Arc::new(Task::new(Arc::clone(&ep), jokes_writer()).with_description("dep"));
    let root = Task::new(Arc::clone(&ep), critic())
        .with_description("root")
        .with_dependencies([Arc::clone(&dep)]);

    assert!(root.process(&RunContext::new()).await.is_err());
    assert!(dep.is_done());
    assert!(!root.is_done());

    root.process(&RunContext::new()).await.unwrap();
    assert_eq!(root.output(), "later");
    assert_eq!(dep.output(), "dep out");
    assert_eq!(mock.call_count(), 3);
}

/// **Scenario**: Unknown provider yields UnsupportedProvider and no task executes.
#[tokio::test]
async fn unsupported_provider_executes_nothing() {
    let ep = Arc::new(
        LlmEndpoint::builder()
            .provider("anthropic".parse::<Provider>().unwrap())
            .model("claude")
            .api_key("k")
            .build()
            .unwrap(),
    );
    let dep = Arc::new(Task::new(Arc::clone(&ep), jokes_writer()).with_description("dep"));
    let root = Task::new(Arc::clone(&ep), critic())
        .with_description("root")
        .with_dependencies([Arc::clone(&dep)]);

    let err = root.process(&RunContext::new()).await.unwrap_err();

    assert!(matches!(err, TaskError::UnsupportedProvider(ref p) if p == "anthropic"));
    assert!(!dep.is_done());
    assert!(!root.is_done());
    assert_eq!(ep.usage().total_tokens(), 0);
}

/// **Scenario**: A cycle wired after construction is reported instead of recursing forever.
#[tokio::test]
async fn two_task_cycle_is_detected() {
    let mock = Arc::new(MockLlm::new("x"));
    let ep = mock_endpoint(&mock);
    let a = Arc::new(Task::new(Arc::clone(&ep), jokes_writer()).with_description("a"));
    let b = Arc::new(
        Task::new(Arc::clone(&ep), jokes_writer())
            .with_description("b")
            .with_dependencies([Arc::clone(&a)]),
    );
    a.add_dependency(Arc::clone(&b));

    let err = a.process(&RunContext::new()).await.unwrap_err();

    assert!(matches!(err, TaskError::CyclicDependency { task_id } if task_id == a.id()));
    assert_eq!(mock.call_count(), 0);
}

/// **Scenario**: Cancelling mid-call aborts the in-flight request; the task stays not done.
#[tokio::test]
async fn cancellation_aborts_in_flight_call() {
    let mock = Arc::new(MockLlm::new("too late").with_delay(Duration::from_secs(30)));
    let ep = mock_endpoint(&mock);
    let t = Task::new(Arc::clone(&ep), jokes_writer()).with_description("slow");
    let token = CancellationToken::new();
    let ctx = RunContext::new().with_cancellation(token.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });
    let err = t.process(&ctx).await.unwrap_err();
    canceller.await.unwrap();

    assert!(matches!(err, TaskError::Cancelled));
    assert!(!t.is_done());
    assert_eq!(mock.call_count(), 0);
}

/// **Scenario**: A caller-side timeout around `process` drops the in-flight call.
#[tokio::test]
async fn caller_timeout_leaves_task_not_done() {
    let mock = Arc::new(MockLlm::new("too late").with_delay(Duration::from_secs(30)));
    let ep = mock_endpoint(&mock);
    let t = Task::new(Arc::clone(&ep), jokes_writer()).with_description("slow");

    let ctx = RunContext::new();
    let res = tokio::time::timeout(Duration::from_millis(20), t.process(&ctx)).await;

    assert!(res.is_err());
    assert!(!t.is_done());
}

/// **Scenario**: A dependency answering with empty content fails the chain; the
/// parent is never sent to the model.
#[tokio::test]
async fn empty_dependency_reply_stops_parent() {
    let mock = Arc::new(MockLlm::new("root out").then_reply(""));
    let ep = mock_endpoint(&mock);
    let dep = Arc::new(Task::new(Arc::clone(&ep), jokes_writer()).with_description("dep"));
    let root = Task::new(Arc::clone(&ep), critic())
        .with_description("root")
        .with_dependencies([Arc::clone(&dep)]);

    let err = root.process(&RunContext::new()).await.unwrap_err();

    assert!(matches!(
        err,
        TaskError::Client(ClientError::MalformedResponse(_))
    ));
    assert!(!dep.is_done());
    assert!(!root.is_done());
    assert_eq!(mock.call_count(), 1);
    assert_eq!(ep.usage().total_tokens(), 15);
}

/// **Scenario**: Dependencies wired onto an already-done task are processed on the
/// next call, without re-running the done task itself.
#[tokio::test]
async fn dependency_added_after_completion_is_resolved() {
    let mock = Arc::new(
        MockLlm::new("unused")
            .then_reply("root out")
            .then_reply("late out"),
    );
    let ep = mock_endpoint(&mock);
    let root = Arc::new(Task::new(Arc::clone(&ep), critic()).with_description("root"));
    root.process(&RunContext::new()).await.unwrap();

    let late = Arc::new(Task::new(Arc::clone(&ep), jokes_writer()).with_description("late"));
    root.add_dependency(Arc::clone(&late));
    root.process(&RunContext::new()).await.unwrap();

    assert!(late.is_done());
    assert_eq!(late.output(), "late out");
    assert!(root.can_process());
    assert_eq!(root.output(), "root out");
    assert_eq!(mock.call_count(), 2);
}
