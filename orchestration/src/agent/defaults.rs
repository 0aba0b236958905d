//! Built-in agent set loaded at engine start.

use super::types::{Agent, Provider};

const CLAUDE_MODEL: &str = "claude-sonnet-4-20250514";
const OPENAI_MODEL: &str = "gpt-4o";
const GEMINI_MODEL: &str = "gemini-1.5-pro";

const ARCHITECT_PROMPT: &str = r#"You are a senior software architect. You care about module boundaries,
data flow, and how a change fits the system around it. Point out coupling,
missing abstractions, and places where the design will not scale. Prefer
small, incremental structural changes over rewrites."#;

const CODER_PROMPT: &str = r#"You are an expert software developer. Produce complete, working code
that compiles and follows the conventions already present in the snippet.
When you change code, return the full updated version, not a diff. Keep
explanations short and put them after the code."#;

const REVIEWER_PROMPT: &str = r#"You are a meticulous code reviewer. Look for bugs, unhandled edge cases,
unclear naming, and missing error handling. Be specific: quote the line you
are talking about and say what should change. Do not rewrite the whole
program."#;

const SECURITY_PROMPT: &str = r#"You are an application security engineer. Look for injection, unsafe
deserialization, secrets in code, missing input validation, and privilege
problems. Rate each finding by severity and suggest a concrete fix."#;

const TESTER_PROMPT: &str = r#"You are a test engineer. Identify the behaviors that need coverage,
including failure paths and boundary values, and write the tests. Prefer
deterministic tests with no network or clock dependence."#;

const INTEGRATOR_PROMPT: &str = r#"You are the integrator. You receive a proposal and the critique of it.
Merge them into one production-ready result: apply every valid review
point, reject the invalid ones with a one-line reason, and return the final
code followed by a short summary of what changed."#;

/// The default agents, in no particular order.
pub fn default_agents() -> Vec<Agent> {
    vec![
        Agent::new("architect", "Architect", "Software Architect", Provider::Anthropic, CLAUDE_MODEL)
            .with_system_prompt(ARCHITECT_PROMPT)
            .with_temperature(0.3)
            .with_max_tokens(4096),
        Agent::new("coder", "Coder", "Senior Developer", Provider::OpenAi, OPENAI_MODEL)
            .with_system_prompt(CODER_PROMPT)
            .with_temperature(0.2)
            .with_max_tokens(4096),
        Agent::new("reviewer", "Reviewer", "Code Reviewer", Provider::Anthropic, CLAUDE_MODEL)
            .with_system_prompt(REVIEWER_PROMPT)
            .with_temperature(0.1)
            .with_max_tokens(2048),
        Agent::new("security", "Security Analyst", "Security Engineer", Provider::Gemini, GEMINI_MODEL)
            .with_system_prompt(SECURITY_PROMPT)
            .with_temperature(0.2)
            .with_max_tokens(2048),
        Agent::new("tester", "Tester", "Test Engineer", Provider::OpenAi, OPENAI_MODEL)
            .with_system_prompt(TESTER_PROMPT)
            .with_temperature(0.3)
            .with_max_tokens(4096),
        Agent::new("integrator", "Integrator", "Integration Lead", Provider::Anthropic, CLAUDE_MODEL)
            .with_system_prompt(INTEGRATOR_PROMPT)
            .with_temperature(0.2)
            .with_max_tokens(4096),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_ids_are_unique() {
        let agents = default_agents();
        let ids: HashSet<&str> = agents.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids.len(), agents.len());
    }

    #[test]
    fn test_defaults_cover_every_provider() {
        let agents = default_agents();
        for provider in Provider::all() {
            assert!(agents.iter().any(|a| a.provider == *provider));
        }
    }

    #[test]
    fn test_default_parameters_in_range() {
        for agent in default_agents() {
            assert!((0.0..=1.0).contains(&agent.temperature), "{}", agent.id);
            assert!(agent.max_tokens > 0);
            assert!(!agent.system_prompt.is_empty());
        }
    }
}
