//! Command-line interface

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::api::ResourceMetric;
use crate::api::types::{ResourceStatus, ResourceType};

/// Ops platform console - navigation gate, backend client and dev proxy
#[derive(Parser, Debug)]
#[command(name = "ops-console")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "OPS_CONSOLE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Backend API base URL (overrides `api.base_url`)
    #[arg(long, env = "OPS_CONSOLE_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Session file (overrides `session.path`)
    #[arg(long, env = "OPS_CONSOLE_SESSION_FILE", global = true)]
    pub session_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long,
        default_value = "info",
        env = "OPS_CONSOLE_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "OPS_CONSOLE_LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Subcommand (optional - defaults to serving the dev proxy)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the dev proxy (default)
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Backend origin to forward to
        #[arg(long)]
        target: Option<String>,
    },

    /// Show the compiled route table
    Routes {
        /// Output format (table, json, yaml)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Evaluate the navigation gate for a transition
    Navigate {
        /// Destination path
        #[arg(required = true)]
        to: String,

        /// Current path
        #[arg(long)]
        from: Option<String>,

        /// Session to assume (default: read the session store)
        #[arg(long, value_enum, default_value_t = SessionMode::Stored)]
        session: SessionMode,
    },

    /// Log in and store the session token
    Login {
        /// Account name
        #[arg(short, long)]
        username: String,

        /// Password
        #[arg(short, long, env = "OPS_CONSOLE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Log out and remove the session token
    Logout,

    /// Show the account owning the current session
    Whoami,

    /// Create an account
    Register {
        /// Account name
        #[arg(short, long)]
        username: String,

        /// Contact address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long, env = "OPS_CONSOLE_PASSWORD", hide_env_values = true)]
        password: String,

        /// Display name
        #[arg(long)]
        full_name: Option<String>,
    },

    /// Resource inventory commands
    #[command(subcommand)]
    Resources(ResourceCommand),

    /// Monitoring commands
    #[command(subcommand)]
    Monitoring(MonitoringCommand),
}

/// Session assumed by `navigate`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SessionMode {
    /// Whatever the session store holds
    Stored,
    /// Token present
    Authenticated,
    /// No token
    Anonymous,
}

/// Resource subcommands
#[derive(Subcommand, Debug)]
pub enum ResourceCommand {
    /// List resources
    List {
        /// Rows to skip
        #[arg(long)]
        skip: Option<u32>,

        /// Maximum rows
        #[arg(long)]
        limit: Option<u32>,

        /// Only this resource type
        #[arg(long = "type")]
        resource_type: Option<ResourceType>,

        /// Only this status
        #[arg(long)]
        status: Option<ResourceStatus>,
    },

    /// Show one resource
    Get {
        /// Resource id
        id: i64,
    },

    /// Register a resource
    Create(ResourceCreateArgs),

    /// Update a resource
    Update {
        /// Resource id
        id: i64,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New status
        #[arg(long)]
        status: Option<ResourceStatus>,

        /// New IP address
        #[arg(long)]
        ip_address: Option<String>,

        /// New host name
        #[arg(long)]
        hostname: Option<String>,

        /// New description
        #[arg(long)]
        description: Option<String>,

        /// Replace tags (repeatable)
        #[arg(long = "tag")]
        tags: Option<Vec<String>>,
    },

    /// Delete a resource
    Delete {
        /// Resource id
        id: i64,
    },

    /// Push a usage sample
    Metrics {
        /// Resource id
        id: i64,

        /// CPU usage percent
        #[arg(long)]
        cpu: f64,

        /// Memory usage percent
        #[arg(long)]
        memory: f64,

        /// Disk usage percent
        #[arg(long)]
        disk: f64,
    },

    /// Inventory summary
    Stats,
}

/// Arguments for `resources create`
#[derive(Args, Debug)]
pub struct ResourceCreateArgs {
    /// Unique name
    #[arg(long)]
    pub name: String,

    /// Resource type
    #[arg(long = "type")]
    pub resource_type: ResourceType,

    /// IP address
    #[arg(long)]
    pub ip_address: Option<String>,

    /// Host name
    #[arg(long)]
    pub hostname: Option<String>,

    /// CPU cores
    #[arg(long)]
    pub cpu_cores: Option<u32>,

    /// Memory in GiB
    #[arg(long)]
    pub memory_gb: Option<f64>,

    /// Disk in GiB
    #[arg(long)]
    pub disk_gb: Option<f64>,

    /// Tags (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Description
    #[arg(long)]
    pub description: Option<String>,
}

/// Monitoring subcommands
#[derive(Subcommand, Debug)]
pub enum MonitoringCommand {
    /// Fleet dashboard figures
    Dashboard,

    /// Instant query
    Query {
        /// Query expression
        query: String,

        /// Evaluation time (unix seconds)
        #[arg(long)]
        time: Option<f64>,
    },

    /// Range query
    Range {
        /// Query expression
        query: String,

        /// Range start (unix seconds)
        #[arg(long)]
        start: i64,

        /// Range end (unix seconds)
        #[arg(long)]
        end: i64,

        /// Resolution in seconds
        #[arg(long, default_value_t = crate::api::DEFAULT_STEP)]
        step: u64,
    },

    /// History of one metric for one resource
    History {
        /// Metric (cpu, memory, disk, network-in, network-out)
        metric: ResourceMetric,

        /// Resource id
        resource_id: String,

        /// How far back to look (e.g. 30m, 6h, 2d)
        #[arg(long, default_value = "1h", value_parser = parse_duration)]
        since: Duration,
    },
}

fn parse_duration(raw: &str) -> Result<Duration, String> {
    humantime_serde::re::humantime::parse_duration(raw).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_command_is_none() {
        let cli = Cli::try_parse_from(["ops-console"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn test_navigate_args() {
        let cli = Cli::try_parse_from([
            "ops-console",
            "navigate",
            "/login",
            "--from",
            "/dashboard",
            "--session",
            "authenticated",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Navigate { to, from, session }) => {
                assert_eq!(to, "/login");
                assert_eq!(from.as_deref(), Some("/dashboard"));
                assert_eq!(session, SessionMode::Authenticated);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_history_args() {
        let cli = Cli::try_parse_from([
            "ops-console",
            "monitoring",
            "history",
            "memory",
            "42",
            "--since",
            "6h",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Monitoring(MonitoringCommand::History {
                metric,
                resource_id,
                since,
            })) => {
                assert_eq!(metric, ResourceMetric::Memory);
                assert_eq!(resource_id, "42");
                assert_eq!(since, Duration::from_secs(6 * 3600));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_resource_list_filters() {
        let cli = Cli::try_parse_from([
            "ops-console",
            "resources",
            "list",
            "--type",
            "server",
            "--status",
            "inactive",
            "--limit",
            "50",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Resources(ResourceCommand::List {
                resource_type,
                status,
                limit,
                skip,
            })) => {
                assert_eq!(resource_type, Some(ResourceType::Server));
                assert_eq!(status, Some(ResourceStatus::Inactive));
                assert_eq!(limit, Some(50));
                assert_eq!(skip, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_bad_metric() {
        assert!(
            Cli::try_parse_from(["ops-console", "monitoring", "history", "load", "1"]).is_err()
        );
    }
}
