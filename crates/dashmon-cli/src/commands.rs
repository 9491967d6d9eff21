//! Command execution and terminal output.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use chrono::Utc;
use dashmon_core::api::QueryParams;
use dashmon_core::models::{Alert, Camera, Device, UserProfile};
use dashmon_core::utils::{format_relative, truncate};
use dashmon_core::{ApiClient, ApiResponse, Config, Method, RequestOptions};
use serde::Serialize;
use tracing::debug;

use crate::cli::{
    AlertFilter, AlertsCommand, CamerasCommand, Command, DevicesCommand, SettingsCommand,
    UsersCommand,
};

/// Environment variable consulted before prompting for a password
const PASSWORD_ENV: &str = "DASHMON_PASSWORD";

/// Column width for names in table output
const NAME_WIDTH: usize = 24;

/// Column width for alert messages in table output
const MESSAGE_WIDTH: usize = 48;

pub struct RunContext<'a> {
    pub client: &'a ApiClient,
    pub config: &'a mut Config,
    pub json: bool,
}

pub async fn run(command: Command, ctx: RunContext<'_>) -> Result<()> {
    match command {
        Command::Login { username } => login(ctx, username).await,
        Command::Logout => {
            ctx.client.logout()?;
            println!("Logged out");
            Ok(())
        }
        Command::Status => {
            let state = if ctx.client.is_authenticated() {
                "logged in"
            } else {
                "not logged in"
            };
            println!("{} ({})", state, ctx.client.base_url());
            Ok(())
        }
        Command::Whoami => {
            let user = ctx.client.get_profile().await?;
            print_users(&ctx, &[user])
        }
        Command::Users(cmd) => users(&ctx, cmd).await,
        Command::Devices(cmd) => devices(&ctx, cmd).await,
        Command::Cameras(cmd) => cameras(&ctx, cmd).await,
        Command::Alerts(cmd) => alerts(&ctx, cmd).await,
        Command::Settings(cmd) => settings(&ctx, cmd).await,
        Command::Raw { method, path, body } => {
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .with_context(|| format!("Invalid HTTP method '{}'", method))?;
            let mut options = RequestOptions::new(method);
            if let Some(body) = body {
                options = options.with_body(body);
            }
            let response = ctx.client.request(&path, options, true).await?;
            print_response(&ctx, &response)
        }
    }
}

async fn login(ctx: RunContext<'_>, username: Option<String>) -> Result<()> {
    let username = match username.or_else(|| ctx.config.last_username.clone()) {
        Some(name) => name,
        None => prompt("Username: ")?,
    };
    let password = match std::env::var(PASSWORD_ENV) {
        Ok(password) if !password.is_empty() => password,
        _ => rpassword::prompt_password(format!("Password for {}: ", username))
            .context("Failed to read password")?,
    };

    let user = ctx.client.login(&username, &password).await?;

    if ctx.config.last_username.as_deref() != Some(username.as_str()) {
        ctx.config.last_username = Some(username);
        if let Err(e) = ctx.config.save() {
            debug!(error = %e, "Could not save last username");
        }
    }
    println!("Logged in as {} ({})", user.username, user.role_display());
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let value = line.trim().to_string();
    if value.is_empty() {
        anyhow::bail!("No username given");
    }
    Ok(value)
}

async fn users(ctx: &RunContext<'_>, cmd: UsersCommand) -> Result<()> {
    let client = ctx.client;
    match cmd {
        UsersCommand::List => print_users(ctx, &client.list_users().await?),
        UsersCommand::Get { id } => print_users(ctx, &[client.get_user(id).await?]),
        UsersCommand::Delete { id } => print_response(ctx, &client.delete_user(id).await?),
    }
}

async fn devices(ctx: &RunContext<'_>, cmd: DevicesCommand) -> Result<()> {
    let client = ctx.client;
    match cmd {
        DevicesCommand::List => print_devices(ctx, &client.list_devices().await?),
        DevicesCommand::Get { id } => print_devices(ctx, &[client.get_device(id).await?]),
        DevicesCommand::Poll { id } => print_response(ctx, &client.poll_device(id).await?),
        DevicesCommand::Status => print_response(ctx, &client.devices_status().await?),
        DevicesCommand::Delete { id } => print_response(ctx, &client.delete_device(id).await?),
    }
}

async fn cameras(ctx: &RunContext<'_>, cmd: CamerasCommand) -> Result<()> {
    let client = ctx.client;
    match cmd {
        CamerasCommand::List => print_cameras(ctx, &client.list_cameras().await?),
        CamerasCommand::Get { id } => print_cameras(ctx, &[client.get_camera(id).await?]),
        CamerasCommand::Stream { id } => print_response(ctx, &client.camera_stream(id).await?),
        CamerasCommand::Test { id } => print_response(ctx, &client.test_camera(id).await?),
        CamerasCommand::Status => print_response(ctx, &client.cameras_status().await?),
        CamerasCommand::Delete { id } => print_response(ctx, &client.delete_camera(id).await?),
    }
}

pub fn alert_params(filter: &AlertFilter) -> QueryParams {
    QueryParams::new()
        .with("severity", filter.severity.clone())
        .with("acknowledged", filter.acknowledged)
        .with("page", filter.page)
        .with("per_page", filter.per_page)
}

async fn alerts(ctx: &RunContext<'_>, cmd: AlertsCommand) -> Result<()> {
    let client = ctx.client;
    match cmd {
        AlertsCommand::List(filter) => {
            let page = client.list_alerts(&alert_params(&filter)).await?;
            if ctx.json {
                return print_json(&page);
            }
            print_alerts(&page.alerts);
            println!(
                "page {}/{} ({} total)",
                page.pagination.page, page.pagination.pages, page.pagination.total
            );
            Ok(())
        }
        AlertsCommand::Get { id } => {
            let alert = client.get_alert(id).await?;
            if ctx.json {
                return print_json(&alert);
            }
            print_alerts(&[alert]);
            Ok(())
        }
        AlertsCommand::Ack { id } => print_response(ctx, &client.acknowledge_alert(id).await?),
        AlertsCommand::AckAll => {
            print_response(ctx, &client.acknowledge_all_alerts(&serde_json::json!({})).await?)
        }
        AlertsCommand::Delete { id } => print_response(ctx, &client.delete_alert(id).await?),
        AlertsCommand::Summary => {
            let summary = client.alerts_summary().await?;
            if ctx.json {
                return print_json(&summary);
            }
            println!(
                "{} total, {} open ({} critical, {} high)",
                summary.total, summary.unacknowledged, summary.critical, summary.high
            );
            print_alerts(&summary.recent);
            Ok(())
        }
    }
}

/// Turn `KEY=VALUE` pairs into a flat JSON object
pub fn settings_payload(pairs: &[String]) -> Result<serde_json::Map<String, serde_json::Value>> {
    let mut payload = serde_json::Map::new();
    for pair in pairs {
        let (key, raw) = pair
            .split_once('=')
            .with_context(|| format!("Expected KEY=VALUE, got '{}'", pair))?;
        let value = serde_json::from_str(raw)
            .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
        payload.insert(key.trim().to_string(), value);
    }
    Ok(payload)
}

async fn settings(ctx: &RunContext<'_>, cmd: SettingsCommand) -> Result<()> {
    let client = ctx.client;
    let response = match cmd {
        SettingsCommand::Get => client.get_settings().await?,
        SettingsCommand::Set { pairs } => client.update_settings(&settings_payload(&pairs)?).await?,
        SettingsCommand::TestEmail => client.test_email().await?,
        SettingsCommand::TestSlack => client.test_slack().await?,
        SettingsCommand::RestartPolling => client.restart_polling().await?,
        SettingsCommand::ClearCache => client.clear_cache().await?,
    };
    print_response(ctx, &response)
}

// ===== Output =====

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a dual-mode body: a `msg` field alone, JSON otherwise, text as is
fn print_response(ctx: &RunContext<'_>, response: &ApiResponse) -> Result<()> {
    match response {
        ApiResponse::Json(value) => match value.get("msg").and_then(|m| m.as_str()) {
            Some(msg) if !ctx.json && value.as_object().map(|o| o.len()) == Some(1) => {
                println!("{}", msg);
                Ok(())
            }
            _ => print_json(value),
        },
        ApiResponse::Text(text) => {
            println!("{}", text);
            Ok(())
        }
    }
}

fn print_users(ctx: &RunContext<'_>, users: &[UserProfile]) -> Result<()> {
    if ctx.json {
        return print_json(users);
    }
    for user in users {
        println!(
            "{:>5}  {:<w$}  {:<9}  {}",
            user.id,
            truncate(&user.username, NAME_WIDTH),
            user.role_display(),
            user.email.as_deref().unwrap_or("-"),
            w = NAME_WIDTH
        );
    }
    Ok(())
}

fn id_display(id: Option<i64>) -> String {
    id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string())
}

fn print_devices(ctx: &RunContext<'_>, devices: &[Device]) -> Result<()> {
    if ctx.json {
        return print_json(devices);
    }
    let now = Utc::now();
    for device in devices {
        println!(
            "{:>5}  {:<w$}  {:<15}  {:<8}  last seen {}",
            id_display(device.id),
            truncate(device.display_name(), NAME_WIDTH),
            device.ip_address.as_deref().unwrap_or("-"),
            device.status_display(),
            format_relative(device.last_seen.as_deref(), now),
            w = NAME_WIDTH
        );
    }
    Ok(())
}

fn print_cameras(ctx: &RunContext<'_>, cameras: &[Camera]) -> Result<()> {
    if ctx.json {
        return print_json(cameras);
    }
    for camera in cameras {
        println!(
            "{:>5}  {:<w$}  {:<15}  {:<8}  {}",
            id_display(camera.id),
            truncate(camera.display_name(), NAME_WIDTH),
            camera.ip_address.as_deref().unwrap_or("-"),
            camera.status_display(),
            camera.location.as_deref().unwrap_or(""),
            w = NAME_WIDTH
        );
    }
    Ok(())
}

fn print_alerts(alerts: &[Alert]) {
    let now = Utc::now();
    for alert in alerts {
        let mark = if alert.acknowledged { "ack" } else { "open" };
        println!(
            "{:>5}  {:<8}  {:<4}  {:<w$}  {}  {}",
            id_display(alert.id),
            alert.severity_display(),
            mark,
            truncate(alert.message.as_deref().unwrap_or(""), MESSAGE_WIDTH),
            alert.device_name.as_deref().unwrap_or("-"),
            format_relative(alert.created_at.as_deref(), now),
            w = MESSAGE_WIDTH
        );
    }
}
