//! Debate driver: proposer and critic alternate for N rounds, then the
//! integrator merges the last proposal with the last review.

use tracing::debug;

use super::executor::StepRunner;
use crate::agent::AgentRegistry;
use crate::error::WorkflowError;
use crate::prompts;
use crate::session::WorkflowContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebatePlan {
    pub proposer_id: String,
    pub critic_id: String,
    pub integrator_id: String,
    /// Zero or negative runs no rounds and no finalize step.
    pub rounds: i32,
}

/// Run the debate and return the final proposal text.
///
/// All three participants must exist before the first provider call. They are
/// looked up again right before each step, so registry edits made while the
/// debate runs apply to later steps.
pub async fn drive(
    runner: &StepRunner<'_>,
    registry: &AgentRegistry,
    context: &WorkflowContext,
    plan: &DebatePlan,
) -> Result<String, WorkflowError> {
    let goal = context.goal();
    let mut current_proposal = context.code().to_string();
    let mut history = String::new();
    let rounds = u32::try_from(plan.rounds).unwrap_or(0);
    if rounds > 0 {
        for id in [&plan.proposer_id, &plan.critic_id, &plan.integrator_id] {
            registry.resolve(id)?;
        }
    }

    for round in 1..=rounds {
        let proposer = registry.resolve(&plan.proposer_id)?;
        let prompt = prompts::proposal(round, &current_proposal, goal, &history, context);
        let proposal = runner.execute(&proposer, &prompt).await?;
        if !proposal.is_empty() {
            current_proposal = proposal;
        }

        let critic = registry.resolve(&plan.critic_id)?;
        let prompt = prompts::review(round, &current_proposal, goal, &history, context);
        let review = runner.execute(&critic, &prompt).await?;

        history.push_str(&prompts::round_entry(round, &current_proposal, &review));
        debug!(session_id = %runner.session_id, round, rounds, "Debate round complete");

        if round == rounds {
            let integrator = registry.resolve(&plan.integrator_id)?;
            let prompt = prompts::finalize(&current_proposal, &review, &history, goal);
            let integrated = runner.execute(&integrator, &prompt).await?;
            if !integrated.is_empty() {
                current_proposal = integrated;
            }
        }
    }

    Ok(current_proposal)
}
