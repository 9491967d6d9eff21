//! Command-line surface.

use clap::{Args, Parser, Subcommand};
use dashmon_core::StoreKind;

#[derive(Debug, Parser)]
#[command(name = "dashmon", version, about = "Device and camera monitoring dashboard")]
pub struct Cli {
    /// API root, e.g. https://monitor.example.com/api
    #[arg(long, global = true, env = "DASHMON_API_BASE")]
    pub api_base: Option<String>,

    /// Where tokens are kept: keyring, file or memory
    #[arg(long, global = true)]
    pub store: Option<StoreKind>,

    /// Print raw JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Also write logs to a daily file in the cache directory
    #[arg(long, global = true)]
    pub log_file: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and store tokens
    Login {
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Forget stored tokens
    Logout,
    /// Show whether tokens are stored and where requests go
    Status,
    /// Show the logged-in user's profile
    Whoami,
    #[command(subcommand)]
    Users(UsersCommand),
    #[command(subcommand)]
    Devices(DevicesCommand),
    #[command(subcommand)]
    Cameras(CamerasCommand),
    #[command(subcommand)]
    Alerts(AlertsCommand),
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// Send an arbitrary request, e.g. `raw GET /devices/status`
    Raw {
        method: String,
        path: String,
        /// JSON request body
        #[arg(long)]
        body: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    List,
    Get { id: i64 },
    Delete { id: i64 },
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    List,
    Get { id: i64 },
    /// Poll a device now
    Poll { id: i64 },
    Status,
    Delete { id: i64 },
}

#[derive(Debug, Subcommand)]
pub enum CamerasCommand {
    List,
    Get { id: i64 },
    Stream { id: i64 },
    /// Check that the camera stream is reachable
    Test { id: i64 },
    Status,
    Delete { id: i64 },
}

#[derive(Debug, Subcommand)]
pub enum AlertsCommand {
    List(AlertFilter),
    Get { id: i64 },
    Ack { id: i64 },
    AckAll,
    Delete { id: i64 },
    Summary,
}

#[derive(Debug, Args)]
pub struct AlertFilter {
    #[arg(long)]
    pub severity: Option<String>,
    #[arg(long)]
    pub acknowledged: Option<bool>,
    #[arg(long)]
    pub page: Option<u32>,
    #[arg(long)]
    pub per_page: Option<u32>,
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    Get,
    /// Update settings from KEY=VALUE pairs; values are parsed as JSON when possible
    Set {
        #[arg(required = true, value_name = "KEY=VALUE")]
        pairs: Vec<String>,
    },
    TestEmail,
    TestSlack,
    RestartPolling,
    ClearCache,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_is_a_flag() {
        let cli = Cli::try_parse_from(["dashmon", "status", "--log-file"]).unwrap();
        assert!(cli.log_file);
        assert!(matches!(cli.command, Command::Status));

        let cli = Cli::try_parse_from(["dashmon", "status"]).unwrap();
        assert!(!cli.log_file);
    }
}
