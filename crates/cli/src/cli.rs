use std::path::PathBuf;

use clap::Parser;

/// Polling monitoring agent.
///
/// Samples metrics and availability from the configured endpoints at
/// fixed intervals and forwards every data point to storage.
#[derive(Parser, Debug)]
#[command(name = "vigil-agent", about = "Polling monitoring agent")]
pub struct AgentArgs {
    /// Path to the agent configuration file (TOML). Without it the agent
    /// samples a default set of host platform metrics.
    #[arg(long, env = "VIGIL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "VIGIL_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Worker thread override (0 = number of CPUs)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Validate the configuration, print the task list and exit
    #[arg(long)]
    pub check: bool,
}
