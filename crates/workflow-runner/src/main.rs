//! workflow-runner: run debate and sequential workflows from the command line.
//!
//! Reads API keys from `ANTHROPIC_API_KEY`, `OPENAI_API_KEY` and
//! `GEMINI_API_KEY`, prints the resulting session as JSON on stdout, and logs
//! to stderr.
//!
//! ```bash
//! workflow-runner agents
//! workflow-runner debate --goal "add input validation" --code-file src/f.js --rounds 2
//! workflow-runner sequential --goal "harden parser" --code-file src/parse.rs --agents architect,coder,security
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use orchestration::{
    CredentialStore, Engine, EngineConfig, Provider, RunError, WorkflowContext, WorkflowSession,
};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML engine config; ORCH_* environment variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the registered agents
    Agents,

    /// Proposer and critic alternate for N rounds, then the integrator merges
    Debate {
        #[command(flatten)]
        task: TaskArgs,

        /// Proposer agent id (default from config)
        #[arg(long)]
        proposer: Option<String>,

        /// Critic agent id (default from config)
        #[arg(long)]
        critic: Option<String>,

        /// Number of rounds; zero or less runs no steps
        #[arg(long, allow_negative_numbers = true)]
        rounds: Option<i32>,
    },

    /// Agents run in order, each building on the previous output
    Sequential {
        #[command(flatten)]
        task: TaskArgs,

        /// Comma-separated agent ids (default from config)
        #[arg(long, value_delimiter = ',')]
        agents: Vec<String>,
    },
}

#[derive(clap::Args, Debug)]
struct TaskArgs {
    /// What the agents should achieve
    #[arg(long)]
    goal: Option<String>,

    /// File whose contents are the code under discussion
    #[arg(long)]
    code_file: Option<PathBuf>,

    /// Path reported to the agents (defaults to --code-file)
    #[arg(long)]
    file_path: Option<String>,

    #[arg(long)]
    project_path: Option<String>,

    /// Free-text context appended to every prompt
    #[arg(long)]
    context: Option<String>,
}

impl TaskArgs {
    fn into_context(self) -> Result<WorkflowContext> {
        let selected_code = match &self.code_file {
            Some(path) => Some(
                std::fs::read_to_string(path)
                    .with_context(|| format!("reading code file {}", path.display()))?,
            ),
            None => None,
        };
        let file_path = self
            .file_path
            .or_else(|| self.code_file.as_ref().map(|p| p.display().to_string()));
        Ok(WorkflowContext {
            project_path: self.project_path,
            selected_code,
            file_path,
            user_goal: self.goal,
            additional_context: self.context,
        })
    }
}

fn init_tracing(json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print the session (completed or failed) and turn a failure into an error exit.
fn report(engine: &Engine, outcome: Result<WorkflowSession, RunError>) -> Result<()> {
    match outcome {
        Ok(session) => {
            info!(
                session_id = %session.id,
                steps = session.steps.len(),
                confidence = session.result.as_ref().map(|r| r.confidence).unwrap_or_default(),
                "Workflow completed"
            );
            print_json(&session)
        }
        Err(err) => {
            if let Some(session) = engine.get_session(&err.session_id) {
                print_json(&session)?;
            }
            let category = err.category();
            Err(anyhow::Error::new(err).context(format!("workflow failed ({category})")))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = EngineConfig::load(cli.config.as_deref()).context("loading engine config")?;
    let credentials = CredentialStore::from_env();
    for provider in Provider::all() {
        if !credentials.has(*provider) {
            debug!(%provider, env = provider.credential_env_var(), "No API key configured");
        }
    }
    let engine = Engine::new(config, credentials).context("building engine")?;

    match cli.command {
        Command::Agents => print_json(&engine.list_agents()),
        Command::Debate {
            task,
            proposer,
            critic,
            rounds,
        } => {
            let context = task.into_context()?;
            let outcome = engine
                .run_debate_workflow(context, proposer.as_deref(), critic.as_deref(), rounds)
                .await;
            report(&engine, outcome)
        }
        Command::Sequential { task, agents } => {
            let context = task.into_context()?;
            let agents = (!agents.is_empty()).then_some(agents);
            let outcome = engine.run_sequential_workflow(context, agents).await;
            report(&engine, outcome)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_sequential_agents_split_on_commas() {
        let cli = Cli::try_parse_from([
            "workflow-runner",
            "sequential",
            "--goal",
            "g",
            "--agents",
            "architect,coder",
        ])
        .unwrap();
        match cli.command {
            Command::Sequential { agents, task } => {
                assert_eq!(agents, vec!["architect", "coder"]);
                assert_eq!(task.goal.as_deref(), Some("g"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_debate_accepts_negative_rounds() {
        let cli = Cli::try_parse_from(["workflow-runner", "debate", "--rounds", "-1"]).unwrap();
        assert!(matches!(cli.command, Command::Debate { rounds: Some(-1), .. }));
    }

    #[test]
    fn test_code_file_feeds_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.js");
        std::fs::write(&path, "function f(x){return x}").unwrap();

        let task = TaskArgs {
            goal: Some("validate".into()),
            code_file: Some(path.clone()),
            file_path: None,
            project_path: None,
            context: None,
        };
        let context = task.into_context().unwrap();
        assert_eq!(context.code(), "function f(x){return x}");
        assert_eq!(context.file_path, Some(path.display().to_string()));
    }

    #[test]
    fn test_missing_code_file_is_an_error() {
        let task = TaskArgs {
            goal: None,
            code_file: Some(PathBuf::from("/nonexistent/code.rs")),
            file_path: None,
            project_path: None,
            context: None,
        };
        let err = task.into_context().unwrap_err();
        assert!(err.to_string().contains("/nonexistent/code.rs"));
    }
}
