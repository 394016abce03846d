//! Prompt builders for the two agents.
//!
//! Each prompt is a single user message; no system prompt is sent.

/// Default acceptance token the reviewer is asked to answer with
pub const DEFAULT_ACCEPTANCE_TOKEN: &str = "READY";

/// First-draft prompt: topic plus retrieved material
pub fn research_prompt(task: &str, material: &str) -> String {
    format!(
        "Topic: {}\n\n\
         ## Research Data\n\n{}\n\n\
         Write a comprehensive technical report on the topic above, using the research data where relevant.",
        task, material
    )
}

/// Revision prompt: prior draft plus the reviewer's critique
pub fn revision_prompt(draft: &str, feedback: &str) -> String {
    format!(
        "REVISE the following report.\n\n\
         ## Report\n\n{}\n\n\
         ## Critique Notes\n\n{}\n\n\
         Apply every critique note and return the full revised report.",
        draft, feedback
    )
}

/// Evaluation prompt asking for the acceptance token or deficiency notes
pub fn evaluation_prompt(draft: &str, acceptance_token: &str) -> String {
    format!(
        "Evaluate this report for accuracy and depth.\n\n\
         ## Report\n\n{}\n\n\
         ## Your Response\n\n\
         If it is technical, accurate, and complete, respond ONLY with '{}'.\n\
         Otherwise, provide specific instructions on what is missing or wrong.",
        draft, acceptance_token
    )
}
