//! Ops Console - client-side companion for the ops platform
//!
//! Navigation gate, typed backend client and dev proxy.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use serde::Serialize;
use tracing::error;

use ops_console::{
    Result,
    api::{
        ApiClient,
        types::{
            LoginCredentials, RegisterData, ResourceCreate, ResourceMetrics, ResourceQuery,
            ResourceUpdate,
        },
    },
    cli::{Cli, Command, MonitoringCommand, ResourceCommand, ResourceCreateArgs, SessionMode},
    config::Config,
    proxy::DevProxy,
    session::{FileSessionStore, SessionStore},
    setup_tracing,
};
use ops_console_core::{Decision, NavigationGate, SessionState};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup tracing
    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = config.apply_overrides(cli.api_url, cli.session_file) {
        eprintln!("❌ {e}");
        return ExitCode::FAILURE;
    }

    let session: Arc<dyn SessionStore> =
        Arc::new(FileSessionStore::new(config.session.resolve_path()));

    let outcome = match cli.command {
        Some(Command::Serve { port, host, target }) => {
            run_server(config, session, port, host, target).await
        }
        None => run_server(config, session, None, None, None).await,
        Some(Command::Routes { format }) => run_routes(&config, &format),
        Some(Command::Navigate { to, from, session: mode }) => {
            run_navigate(&config, session, &to, from.as_deref(), mode)
        }
        Some(command) => match ApiClient::new(&config.api, session) {
            Ok(client) => run_api_command(&client, command).await,
            Err(e) => Err(e),
        },
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("❌ {e}");
            ExitCode::FAILURE
        }
    }
}

/// Run the dev proxy
async fn run_server(
    mut config: Config,
    session: Arc<dyn SessionStore>,
    port: Option<u16>,
    host: Option<String>,
    target: Option<String>,
) -> Result<ExitCode> {
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(target) = target {
        config.proxy.target = target;
        config.validate()?;
    }

    DevProxy::new(config, session)?.run().await?;
    Ok(ExitCode::SUCCESS)
}

/// Print the compiled route table
fn run_routes(config: &Config, format: &str) -> Result<ExitCode> {
    let table = config.route_table()?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(table.entries())?),
        "yaml" => match serde_yaml::to_string(table.entries()) {
            Ok(yaml) => print!("{yaml}"),
            Err(e) => {
                eprintln!("❌ Failed to serialize to YAML: {e}");
                return Ok(ExitCode::FAILURE);
            }
        },
        _ => {
            println!("{:<20} {:<14} {:<10} REDIRECT", "PATH", "NAME", "ACCESS");
            for entry in table.entries() {
                println!(
                    "{:<20} {:<14} {:<10} {}",
                    entry.path,
                    entry.name.as_deref().unwrap_or("-"),
                    if entry.requires_auth { "protected" } else { "public" },
                    entry.redirect.as_deref().unwrap_or("-"),
                );
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Evaluate the navigation gate once
fn run_navigate(
    config: &Config,
    session: Arc<dyn SessionStore>,
    to: &str,
    from: Option<&str>,
    mode: SessionMode,
) -> Result<ExitCode> {
    let table = config.route_table()?;
    let has_token = match mode {
        SessionMode::Stored => session.has_token(),
        SessionMode::Authenticated => true,
        SessionMode::Anonymous => false,
    };

    let gate = NavigationGate::new(table, has_token);
    let evaluation = gate.evaluate(to, from);

    println!("session:  {}", evaluation.phase);
    println!("to:       {}", evaluation.request.to.path);
    match &evaluation.decision {
        Decision::Proceed => println!("decision: proceed"),
        Decision::RedirectTo(path) => println!("decision: redirect -> {path}"),
    }
    Ok(ExitCode::SUCCESS)
}

fn print_json<T: Serialize>(value: &T) -> Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(ExitCode::SUCCESS)
}

/// Commands that talk to the backend
async fn run_api_command(client: &ApiClient, command: Command) -> Result<ExitCode> {
    match command {
        Command::Login { username, password } => {
            client
                .auth()
                .login(&LoginCredentials::new(username.clone(), password))
                .await?;
            println!("✅ Logged in as {username}");
            Ok(ExitCode::SUCCESS)
        }
        Command::Logout => {
            client.auth().logout().await?;
            println!("✅ Logged out");
            Ok(ExitCode::SUCCESS)
        }
        Command::Whoami => print_json(&client.auth().current_user().await?),
        Command::Register {
            username,
            email,
            password,
            full_name,
        } => {
            let data = RegisterData {
                username,
                email,
                password,
                full_name,
            };
            print_json(&client.auth().register(&data).await?)
        }
        Command::Resources(cmd) => run_resource_command(client, cmd).await,
        Command::Monitoring(cmd) => run_monitoring_command(client, cmd).await,
        Command::Serve { .. } | Command::Routes { .. } | Command::Navigate { .. } => {
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run_resource_command(client: &ApiClient, cmd: ResourceCommand) -> Result<ExitCode> {
    let resources = client.resources();
    match cmd {
        ResourceCommand::List {
            skip,
            limit,
            resource_type,
            status,
        } => {
            let query = ResourceQuery {
                skip,
                limit,
                resource_type,
                status,
            };
            print_json(&resources.list(&query).await?)
        }
        ResourceCommand::Get { id } => print_json(&resources.get(id).await?),
        ResourceCommand::Create(args) => print_json(&resources.create(&create_payload(args)).await?),
        ResourceCommand::Update {
            id,
            name,
            status,
            ip_address,
            hostname,
            description,
            tags,
        } => {
            let update = ResourceUpdate {
                name,
                status,
                ip_address,
                hostname,
                description,
                tags,
                ..ResourceUpdate::default()
            };
            print_json(&resources.update(id, &update).await?)
        }
        ResourceCommand::Delete { id } => print_json(&resources.delete(id).await?),
        ResourceCommand::Metrics {
            id,
            cpu,
            memory,
            disk,
        } => {
            let metrics = ResourceMetrics {
                cpu_usage: cpu,
                memory_usage: memory,
                disk_usage: disk,
            };
            print_json(&resources.update_metrics(id, &metrics).await?)
        }
        ResourceCommand::Stats => print_json(&resources.stats().await?),
    }
}

fn create_payload(args: ResourceCreateArgs) -> ResourceCreate {
    let mut create = ResourceCreate::new(args.name, args.resource_type);
    create.ip_address = args.ip_address;
    create.hostname = args.hostname;
    create.cpu_cores = args.cpu_cores;
    create.memory_gb = args.memory_gb;
    create.disk_gb = args.disk_gb;
    create.tags = args.tags;
    create.description = args.description;
    create
}

async fn run_monitoring_command(client: &ApiClient, cmd: MonitoringCommand) -> Result<ExitCode> {
    let monitoring = client.monitoring();
    match cmd {
        MonitoringCommand::Dashboard => print_json(&monitoring.dashboard().await?),
        MonitoringCommand::Query { query, time } => {
            print_json(&monitoring.query(&query, time).await?)
        }
        MonitoringCommand::Range {
            query,
            start,
            end,
            step,
        } => print_json(&monitoring.query_range(&query, start, end, step).await?),
        MonitoringCommand::History {
            metric,
            resource_id,
            since,
        } => {
            let end = chrono::Utc::now().timestamp();
            let start = end.saturating_sub(i64::try_from(since.as_secs()).unwrap_or(i64::MAX));
            print_json(
                &monitoring
                    .resource_history(metric, resource_id, start, end)
                    .await?,
            )
        }
    }
}
