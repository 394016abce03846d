//! Draft/critique loop integration tests
//!
//! Drives the full runner with a scripted LLM and canned search results.

use std::sync::Arc;

use draftgate::domain::LoopState;
use draftgate::error::DraftgateError;
use draftgate::llm::MockLlmClient;
use draftgate::runner::{LoopRunner, LoopRunnerConfig};
use draftgate::search::StaticSearch;

const TASK: &str = "Analyze 2026 cybersecurity risks for Fintech";

/// Script alternating drafter and reviewer replies
fn scripted(replies: &[&str]) -> (LoopRunner, Arc<MockLlmClient>, Arc<StaticSearch>) {
    let llm = Arc::new(MockLlmClient::with_responses(replies.iter().copied()));
    let search = Arc::new(StaticSearch::new("1. Ransomware\n2. API abuse"));
    let runner = LoopRunner::from_clients(llm.clone(), search.clone(), LoopRunnerConfig::default());
    (runner, llm, search)
}

#[tokio::test]
async fn test_accepted_on_first_evaluation() {
    let (runner, llm, search) = scripted(&["# Fintech Risk Report v1", "READY"]);

    let session = runner.run(TASK).await.unwrap();

    assert_eq!(session.state, LoopState::Accepted);
    assert!(session.accepted);
    assert_eq!(session.iteration_count, 1);
    assert_eq!(session.draft, "# Fintech Risk Report v1");
    assert!(session.feedback.is_empty());
    assert_eq!(session.log.len(), 2);
    assert_eq!(search.queries(), vec![TASK.to_string()]);
    assert_eq!(llm.call_count(), 2);
    assert!(session.finished_at.is_some());
}

#[tokio::test]
async fn test_accepted_on_third_evaluation() {
    let (runner, llm, search) = scripted(&[
        "draft one",
        "Missing threat taxonomy.",
        "draft two",
        "Still lacks regulatory context.",
        "draft three",
        "ready",
    ]);

    let session = runner.run(TASK).await.unwrap();

    assert_eq!(session.state, LoopState::Accepted);
    assert!(session.accepted);
    assert_eq!(session.iteration_count, 3);
    assert_eq!(session.log.len(), 6);
    assert_eq!(session.draft, "draft three");
    // Only the first draft searches
    assert_eq!(search.queries().len(), 1);

    let prompts = llm.prompts();
    assert!(prompts[2].contains("draft one"));
    assert!(prompts[2].contains("Missing threat taxonomy."));
    assert!(prompts[4].contains("draft two"));
    assert!(prompts[4].contains("Still lacks regulatory context."));
}

#[tokio::test]
async fn test_exhausted_after_three_rejections() {
    let (runner, _, _) = scripted(&[
        "draft one",
        "Too shallow.",
        "draft two",
        "Needs numbers.",
        "draft three",
        "Cite sources.",
    ]);

    let session = runner.run(TASK).await.unwrap();

    assert_eq!(session.state, LoopState::Exhausted);
    assert!(!session.accepted);
    assert_eq!(session.iteration_count, 3);
    assert_eq!(session.log.len(), 6);
    assert_eq!(session.draft, "draft three");
    assert_eq!(session.feedback, "Cite sources.");
}

#[tokio::test]
async fn test_log_length_is_twice_iterations() {
    for accept_at in 1..=4usize {
        let mut replies = Vec::new();
        for i in 1..=3usize {
            replies.push(format!("draft {}", i));
            replies.push(if i == accept_at { "READY".to_string() } else { "no".to_string() });
        }
        let llm = Arc::new(MockLlmClient::with_responses(replies));
        let search = Arc::new(StaticSearch::new("m"));
        let runner = LoopRunner::from_clients(llm, search, LoopRunnerConfig::default());

        let session = runner.run(TASK).await.unwrap();

        assert!((1..=3).contains(&session.iteration_count));
        assert_eq!(session.log.len(), 2 * session.iteration_count as usize);
        assert!(session.state.is_terminal());
        assert_eq!(session.accepted, session.state == LoopState::Accepted);
        assert_eq!(session.feedback.is_empty(), session.accepted);
    }
}

#[tokio::test]
async fn test_log_entries_name_iterations() {
    let (runner, _, _) = scripted(&["a", "no", "b", "READY"]);
    let session = runner.run(TASK).await.unwrap();

    assert_eq!(
        session.log,
        vec![
            "Iteration 1: draft generated.".to_string(),
            "Quality gate: failed, requesting edits.".to_string(),
            "Iteration 2: draft revised.".to_string(),
            "Quality gate: passed.".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_blank_task_is_passed_through() {
    let (runner, llm, search) = scripted(&["something", "READY"]);
    let session = runner.run("").await.unwrap();

    assert_eq!(session.task, "");
    assert_eq!(search.queries(), vec![String::new()]);
    assert_eq!(llm.call_count(), 2);
}

#[tokio::test]
async fn test_llm_failure_aborts_run() {
    let llm = Arc::new(MockLlmClient::with_responses(["draft one", "no"]));
    llm.push_error(DraftgateError::Llm("API error 500".to_string()));
    let search = Arc::new(StaticSearch::new("m"));
    let runner = LoopRunner::from_clients(llm.clone(), search, LoopRunnerConfig::default());

    let err = runner.run(TASK).await.unwrap_err();

    assert!(matches!(err, DraftgateError::Llm(_)));
    assert_eq!(llm.call_count(), 3);
}

#[tokio::test]
async fn test_search_failure_aborts_run_before_generation() {
    let llm = Arc::new(MockLlmClient::with_responses(["draft one", "READY"]));
    let search = Arc::new(StaticSearch::failing("Tavily error 500"));
    let runner = LoopRunner::from_clients(llm.clone(), search.clone(), LoopRunnerConfig::default());

    let err = runner.run(TASK).await.unwrap_err();

    assert!(matches!(err, DraftgateError::Search(_)));
    assert!(err.is_collaborator_failure());
    assert_eq!(search.queries(), vec![TASK.to_string()]);
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn test_empty_rejection_still_revises() {
    let (runner, llm, search) = scripted(&["a", "", "b", "READY"]);
    let session = runner.run(TASK).await.unwrap();

    assert_eq!(session.iteration_count, 2);
    assert_eq!(search.queries().len(), 1);
    assert!(llm.prompts()[2].contains("REVISE"));
}
