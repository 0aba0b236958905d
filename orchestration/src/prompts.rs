//! Prompt Composer: text templates for each workflow phase.
//!
//! Every function here is pure: same inputs, same text. Accumulated history
//! (debate transcript, sequential narrative) is passed in by the drivers.

use std::fmt::Write;

use crate::session::WorkflowContext;

const DEFAULT_GOAL: &str = "Improve the quality, correctness and maintainability of the code.";
const NO_CODE: &str = "(no code provided)";

/// One earlier step of a sequential pipeline, as shown to later agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorStep<'a> {
    pub agent_name: &'a str,
    pub output: &'a str,
}

/// Prefix the agent's system prompt to a phase prompt.
pub fn compose_full_prompt(system_prompt: &str, prompt: &str) -> String {
    if system_prompt.is_empty() {
        prompt.to_string()
    } else {
        format!("{system_prompt}\n\n{prompt}")
    }
}

/// Transcript entry appended after each debate round.
pub fn round_entry(round: u32, proposal: &str, review: &str) -> String {
    format!("--- Round {round} ---\nProposal: {proposal}\nReview: {review}\n\n")
}

/// Narrative line appended after each sequential step.
pub fn narrative_entry(agent_name: &str, output: &str) -> String {
    format!("{agent_name}: {output}\n")
}

/// Proposer prompt for a debate round (1-based). An empty `debate_history`
/// marks the first round.
pub fn proposal(
    round: u32,
    current_code: &str,
    user_goal: &str,
    debate_history: &str,
    context: &WorkflowContext,
) -> String {
    let mut out = format!("## Debate Round {round}: Proposal\n\n");
    push_goal(&mut out, user_goal);
    push_context(&mut out, context);
    push_code(&mut out, "Current Code", current_code);
    push_history(&mut out, "Debate So Far", debate_history, "(this is the first round)");
    out.push_str(
        "Analyze the current code against the goal and produce an improved version. \
         Address every issue raised in earlier reviews. Return the complete updated \
         code first, then a short explanation of what you changed and why.\n",
    );
    out
}

/// Critic prompt for a debate round, reviewing that round's proposal.
pub fn review(
    round: u32,
    proposed_code: &str,
    user_goal: &str,
    debate_history: &str,
    context: &WorkflowContext,
) -> String {
    let mut out = format!("## Debate Round {round}: Review\n\n");
    push_goal(&mut out, user_goal);
    push_context(&mut out, context);
    push_code(&mut out, "Proposed Code", proposed_code);
    push_history(&mut out, "Debate So Far", debate_history, "(this is the first round)");
    out.push_str(
        "Critically evaluate the proposal. List concrete problems (bugs, missed edge \
         cases, unclear design, deviations from the goal) and propose alternatives \
         where the proposal falls short. Be specific; do not rewrite the whole program.\n",
    );
    out
}

/// Integrator prompt: merge the last proposal and review into one answer.
/// Empty inputs render as placeholders.
pub fn finalize(final_proposal: &str, final_review: &str, debate_history: &str, user_goal: &str) -> String {
    let mut out = String::from("## Final Integration\n\n");
    push_goal(&mut out, user_goal);
    push_history(&mut out, "Full Debate", debate_history, "(no debate recorded)");
    push_code(&mut out, "Final Proposal", final_proposal);
    let _ = write!(out, "### Final Review\n{}\n\n", or_placeholder(final_review, "(no review)"));
    out.push_str(
        "Merge the final proposal with the valid points of the final review into one \
         production-ready result. Return the complete final code, then a brief summary \
         of the changes and any remaining recommendations.\n",
    );
    out
}

/// Prompt for one pipeline step. `step_number` is 1-based. Every earlier
/// step's output is rendered verbatim, in order.
pub fn sequential(
    step_number: usize,
    total_steps: usize,
    agent_role: &str,
    current_code: &str,
    user_goal: &str,
    workflow_context: &str,
    previous_steps: &[PriorStep<'_>],
) -> String {
    let mut out = format!("## Pipeline Step {step_number} of {total_steps}: {agent_role}\n\n");
    push_goal(&mut out, user_goal);
    push_code(&mut out, "Current Code", current_code);
    push_history(&mut out, "Workflow So Far", workflow_context, "(you are the first agent)");
    if !previous_steps.is_empty() {
        out.push_str("### Previous Agent Outputs\n");
        for (i, step) in previous_steps.iter().enumerate() {
            let _ = write!(out, "#### Step {}: {}\n{}\n\n", i + 1, step.agent_name, step.output);
        }
    }
    let _ = writeln!(
        out,
        "Build on the work of the previous agents. Focus on your specialty as {agent_role}; \
         do not repeat what has already been said. Return the updated code if you change \
         it, followed by your findings."
    );
    out
}

fn or_placeholder<'a>(text: &'a str, placeholder: &'a str) -> &'a str {
    if text.trim().is_empty() {
        placeholder
    } else {
        text
    }
}

fn push_goal(out: &mut String, user_goal: &str) {
    let _ = write!(out, "### Goal\n{}\n\n", or_placeholder(user_goal, DEFAULT_GOAL));
}

fn push_code(out: &mut String, heading: &str, code: &str) {
    let _ = write!(out, "### {heading}\n```\n{}\n```\n\n", or_placeholder(code, NO_CODE));
}

fn push_history(out: &mut String, heading: &str, history: &str, placeholder: &str) {
    let _ = write!(out, "### {heading}\n{}\n\n", or_placeholder(history.trim_end(), placeholder));
}

fn push_context(out: &mut String, context: &WorkflowContext) {
    let fields = [
        ("Project", context.project_path.as_deref()),
        ("File", context.file_path.as_deref()),
        ("Additional context", context.additional_context.as_deref()),
    ];
    if fields.iter().all(|(_, v)| v.map_or(true, |v| v.trim().is_empty())) {
        return;
    }
    out.push_str("### Context\n");
    for (label, value) in fields {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            let _ = writeln!(out, "- {label}: {value}");
        }
    }
    out.push('\n');
}
