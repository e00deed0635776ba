use crate::config::AgentConfig;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

pub mod claude;
pub mod process;

pub use process::EventSource;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("event record is not a JSON object")]
    NotAnObject,
}

/// How to launch the coding agent in structured streaming mode.
#[derive(Debug, Clone)]
pub struct AgentCommand {
    pub program: String,
    pub args: Vec<String>,
    pub prompt_flag: String,
    pub resume_flag: String,
    pub skip_permissions_flag: String,
    pub skip_permissions: bool,
    pub resume: Option<String>,
    pub working_dir: Option<PathBuf>,
}

impl AgentCommand {
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            prompt_flag: config.prompt_flag.clone(),
            resume_flag: config.resume_flag.clone(),
            skip_permissions_flag: config.skip_permissions_flag.clone(),
            skip_permissions: config.skip_permissions,
            resume: None,
            working_dir: None,
        }
    }

    pub fn skip_permissions(mut self, skip: bool) -> Self {
        self.skip_permissions = skip;
        self
    }

    pub fn resume(mut self, session_id: Option<String>) -> Self {
        self.resume = session_id;
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Full argument list for one prompt, in launch order.
    pub fn argv(&self, prompt: &str) -> Vec<String> {
        let mut argv = self.args.clone();
        if self.skip_permissions && !self.skip_permissions_flag.is_empty() {
            argv.push(self.skip_permissions_flag.clone());
        }
        if let Some(session_id) = &self.resume {
            argv.push(self.resume_flag.clone());
            argv.push(session_id.clone());
        }
        if !self.prompt_flag.is_empty() {
            argv.push(self.prompt_flag.clone());
        }
        argv.push(prompt.to_string());
        argv
    }

    pub fn command(&self, prompt: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.argv(prompt))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}
