//! Sequential driver: each agent consumes the previous agent's output plus the
//! running narrative.

use super::executor::StepRunner;
use crate::agent::AgentRegistry;
use crate::error::WorkflowError;
use crate::prompts::{self, PriorStep};
use crate::session::WorkflowContext;

/// Run the pipeline over `agent_ids` in order and return the last output.
pub async fn drive(
    runner: &StepRunner<'_>,
    registry: &AgentRegistry,
    context: &WorkflowContext,
    agent_ids: &[String],
) -> Result<String, WorkflowError> {
    let goal = context.goal();
    let total = agent_ids.len();
    let mut current_output = context.code().to_string();
    let mut narrative = String::new();
    // (agent name, output) of every finished step so far.
    let mut prior: Vec<(String, String)> = Vec::with_capacity(total);

    for (index, agent_id) in agent_ids.iter().enumerate() {
        let agent = registry.resolve(agent_id)?;
        let prompt = {
            let previous: Vec<PriorStep<'_>> = prior
                .iter()
                .map(|(name, output)| PriorStep {
                    agent_name: name,
                    output,
                })
                .collect();
            prompts::sequential(
                index + 1,
                total,
                &agent.role,
                &current_output,
                goal,
                &narrative,
                &previous,
            )
        };

        let output = runner.execute(&agent, &prompt).await?;
        narrative.push_str(&prompts::narrative_entry(&agent.name, &output));
        if !output.is_empty() {
            current_output = output.clone();
        }
        prior.push((agent.name, output));
    }

    Ok(current_output)
}
