//! CLI command implementations.

use attendo_client::capture::{
    AttendanceCapture, CameraSpec, CancelToken, CaptureReport, HttpBackend,
};
use attendo_client::config::{self, AppConfig};
use attendo_client::presentation::{describe_manual, describe_outcome, CaptureStatus};
use attendo_client::views::{render_stats, ReportsView, UsersView};
use attendo_client::{ApiClient, IdentityContext, TokenStore};
use attendo_common::{CaptureOutcome, NewUser, ReportRange, Role, UserId};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

use crate::colors;
use crate::exit_codes::ExitCode;

/// Global flags and configuration shared by every command.
pub struct CommandContext {
    pub config: AppConfig,
    /// `--server`, taking precedence over config and environment
    pub server: Option<String>,
    pub json: bool,
    pub quiet: bool,
    pub verbose: bool,
}

impl CommandContext {
    fn base_url(&self) -> String {
        self.server
            .clone()
            .unwrap_or_else(|| self.config.resolve_base_url())
    }

    /// Report a failure on stderr, or as `{"error": ...}` in JSON mode.
    fn fail(&self, msg: &str) {
        if self.json {
            print_json(&serde_json::json!({ "error": msg }));
        } else if !self.quiet {
            eprintln!("{}", colors::error(msg));
        }
    }

    fn note(&self, msg: &str) {
        if !self.quiet && !self.json {
            println!("{}", msg);
        }
    }

    fn identity_context(&self) -> Result<IdentityContext, ExitCode> {
        let client = ApiClient::new(&self.base_url(), self.config.server.timeout()).map_err(|e| {
            self.fail(&e.to_string());
            ExitCode::InvalidArguments
        })?;
        let store = TokenStore::default_location().map_err(|e| {
            self.fail(&e.to_string());
            ExitCode::GeneralError
        })?;
        Ok(IdentityContext::new(client, store))
    }

    /// Resume the stored session; commands that need a user start here.
    async fn signed_in(&self) -> Result<IdentityContext, ExitCode> {
        let mut identity = self.identity_context()?;
        match identity.init().await {
            Ok(Some(_)) => Ok(identity),
            Ok(None) => {
                self.fail("Not logged in. Run `attendo login <name>` first.");
                Err(ExitCode::NotAuthenticated)
            }
            Err(e) => {
                self.fail(&format!("Could not resume session: {}", e));
                Err(ExitCode::from(&e))
            }
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("{}", colors::error(&format!("Failed to serialize output: {}", e))),
    }
}

/// Authenticate and persist the session.
pub async fn login(ctx: &CommandContext, name: &str, password: Option<String>) -> ExitCode {
    let Some(password) = password.filter(|p| !p.is_empty()) else {
        ctx.fail("A password is required (--password or ATTENDO_PASSWORD)");
        return ExitCode::InvalidArguments;
    };
    let mut identity = match ctx.identity_context() {
        Ok(identity) => identity,
        Err(code) => return code,
    };

    match identity.login(name, &password).await {
        Ok(user) => {
            if ctx.json {
                print_json(user);
            } else if !ctx.quiet {
                println!(
                    "{} {} ({})",
                    colors::success("Logged in as"),
                    colors::bold(&user.name),
                    colors::role(user.role)
                );
            }
            ExitCode::Success
        }
        Err(e) => {
            ctx.fail(&format!("Login failed: {}", e));
            ExitCode::from(&e)
        }
    }
}

/// Forget the stored session.
pub fn logout(ctx: &CommandContext) -> ExitCode {
    let mut identity = match ctx.identity_context() {
        Ok(identity) => identity,
        Err(code) => return code,
    };
    match identity.logout() {
        Ok(()) => {
            if ctx.json {
                print_json(&serde_json::json!({ "status": "logged_out" }));
            } else {
                ctx.note(&colors::success("Logged out."));
            }
            ExitCode::Success
        }
        Err(e) => {
            ctx.fail(&e.to_string());
            ExitCode::from(&e)
        }
    }
}

/// Show the current identity.
pub async fn whoami(ctx: &CommandContext) -> ExitCode {
    let identity = match ctx.signed_in().await {
        Ok(identity) => identity,
        Err(code) => return code,
    };
    if let Some(user) = identity.identity() {
        if ctx.json {
            print_json(user);
        } else {
            println!("{} {}", colors::bold("Name:"), user.name);
            println!("{} {}", colors::bold("Role:"), colors::role(user.role));
            println!("{} {}", colors::bold("Id:"), colors::number(user.id.as_str()));
        }
    }
    ExitCode::Success
}

/// Options of `attend`.
#[derive(Debug, Clone, Default)]
pub struct AttendOptions {
    pub camera: Option<String>,
    pub frames: Option<u32>,
    pub interval_ms: Option<u64>,
    pub manual: bool,
}

#[derive(Serialize)]
struct AttendResult<'a> {
    status: CaptureStatus,
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<&'a CaptureOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frames: Option<CaptureReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Record attendance, with the camera or manually.
pub async fn attend(ctx: &CommandContext, options: AttendOptions) -> ExitCode {
    let identity = match ctx.signed_in().await {
        Ok(identity) => identity,
        Err(code) => return code,
    };

    let spec = match &options.camera {
        Some(raw) => match CameraSpec::parse(raw) {
            Some(spec) => spec,
            None => {
                ctx.fail(&format!(
                    "Invalid camera '{}' (expected auto, synthetic, file:<path> or v4l2:<index>)",
                    raw
                ));
                return ExitCode::InvalidArguments;
            }
        },
        None => ctx.config.camera.spec(),
    };

    let mut settings = ctx.config.capture_settings();
    if let Some(frames) = options.frames {
        settings.frame_count = frames;
    }
    if let Some(ms) = options.interval_ms {
        settings.frame_interval = Duration::from_millis(ms);
    }
    debug!(camera = %spec, frames = settings.frame_count, "Preparing capture");

    let backend = HttpBackend::new(identity.client().clone());
    let mut capture = AttendanceCapture::new(spec.into_source(), backend, settings);
    if !ctx.quiet && !ctx.json {
        capture = capture.with_status_listener(progress_printer());
    }

    let result = if options.manual {
        capture.manual().await
    } else {
        let cancel = CancelToken::new();
        let signal_token = cancel.clone();
        let signals = tokio::spawn(async move {
            shutdown_signal().await;
            signal_token.cancel();
        });
        let result = capture.run(&cancel).await;
        signals.abort();
        result
    };

    let status = capture.status();
    let frames = (!options.manual).then(|| capture.last_report());
    match result {
        Ok(outcome) => {
            if ctx.json {
                print_json(&AttendResult {
                    status,
                    message: status.message(),
                    outcome: Some(&outcome),
                    frames,
                    error: None,
                });
            } else if !ctx.quiet {
                let line = if options.manual {
                    describe_manual(&outcome)
                } else {
                    describe_outcome(&outcome)
                };
                println!("{}", colors::success(&line));
            }
            ExitCode::Success
        }
        Err(e) => {
            if ctx.json {
                print_json(&AttendResult {
                    status,
                    message: status.message(),
                    outcome: None,
                    frames,
                    error: Some(e.to_string()),
                });
            } else if !ctx.quiet {
                eprintln!("{}", colors::error(status.message()));
                if ctx.verbose || status != CaptureStatus::NotRecognized {
                    eprintln!("{}", colors::dim(&e.to_string()));
                }
                if status.suggests_manual() && !options.manual {
                    eprintln!(
                        "{}",
                        colors::info("Run `attendo attend --manual` to record attendance without the camera.")
                    );
                }
            }
            ExitCode::from(&e)
        }
    }
}

/// Prints capture progress to stderr, overwriting the frame counter in place.
fn progress_printer() -> attendo_client::capture::StatusListener {
    let mid_line = AtomicBool::new(false);
    Box::new(move |status: &CaptureStatus| {
        let mut stderr = std::io::stderr();
        match status {
            CaptureStatus::Capturing { frame, total } => {
                let _ = write!(
                    stderr,
                    "\r{} {}",
                    colors::status(status),
                    colors::number(&format!("{}/{}", frame, total))
                );
                let _ = stderr.flush();
                mid_line.store(true, Ordering::SeqCst);
            }
            // Final states are reported by the command itself.
            _ if !status.is_busy() => {
                if mid_line.swap(false, Ordering::SeqCst) {
                    let _ = writeln!(stderr);
                }
            }
            _ => {
                if mid_line.swap(false, Ordering::SeqCst) {
                    let _ = writeln!(stderr);
                }
                let _ = writeln!(stderr, "{}", colors::status(status));
            }
        }
    })
}

/// Resolves on SIGINT or SIGTERM (Ctrl+C elsewhere).
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
            (Ok(mut sigint), Ok(mut sigterm)) => {
                tokio::select! {
                    _ = sigint.recv() => {}
                    _ = sigterm.recv() => {}
                }
                return;
            }
            (Err(e), _) | (_, Err(e)) => warn!("Failed to install signal handlers: {}", e),
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// List all users (admin).
pub async fn users_list(ctx: &CommandContext) -> ExitCode {
    let identity = match ctx.signed_in().await {
        Ok(identity) => identity,
        Err(code) => return code,
    };

    match UsersView::new(&identity).list().await {
        Ok(users) => {
            if ctx.json {
                print_json(&users);
            } else if users.is_empty() {
                ctx.note(&colors::dim("No users found."));
            } else {
                let id_width = users
                    .iter()
                    .map(|u| u.id.as_str().len())
                    .max()
                    .unwrap_or(2)
                    .max(2);
                let name_width = users
                    .iter()
                    .map(|u| u.name.chars().count())
                    .max()
                    .unwrap_or(4)
                    .max(4);

                println!(
                    "{}  {}  {}  {}",
                    colors::pad_left("ID", id_width, colors::header),
                    colors::pad_left("NAME", name_width, colors::header),
                    colors::pad_left("ROLE", 7, colors::header),
                    colors::header("EMAIL")
                );
                println!(
                    "{}  {}  {}  {}",
                    "-".repeat(id_width),
                    "-".repeat(name_width),
                    "-".repeat(7),
                    "-".repeat(5)
                );
                for user in &users {
                    println!(
                        "{}  {:<name_width$}  {}  {}",
                        colors::pad_left(user.id.as_str(), id_width, colors::number),
                        user.name,
                        colors::pad_left(user.role.as_str(), 7, colors::role_str),
                        user.email.as_deref().unwrap_or("-")
                    );
                }
            }
            ExitCode::Success
        }
        Err(e) => {
            ctx.fail(&e.to_string());
            ExitCode::from(&e)
        }
    }
}

/// Create a user (admin).
pub async fn users_create(ctx: &CommandContext, new_user: NewUser) -> ExitCode {
    let identity = match ctx.signed_in().await {
        Ok(identity) => identity,
        Err(code) => return code,
    };

    match UsersView::new(&identity).create(&new_user).await {
        Ok(user) => {
            if ctx.json {
                print_json(&user);
            } else {
                ctx.note(&format!(
                    "{} {} ({}, id {})",
                    colors::success("Created user"),
                    colors::bold(&user.name),
                    colors::role(user.role),
                    colors::number(user.id.as_str())
                ));
            }
            ExitCode::Success
        }
        Err(e) => {
            ctx.fail(&format!("Failed to create user: {}", e));
            ExitCode::from(&e)
        }
    }
}

/// Delete a user (admin).
pub async fn users_delete(ctx: &CommandContext, id: &str) -> ExitCode {
    let identity = match ctx.signed_in().await {
        Ok(identity) => identity,
        Err(code) => return code,
    };

    let id = UserId::new(id);
    match UsersView::new(&identity).delete(&id).await {
        Ok(()) => {
            if ctx.json {
                print_json(&serde_json::json!({ "status": "deleted", "id": id }));
            } else {
                ctx.note(&format!(
                    "{} {}",
                    colors::success("Deleted user"),
                    colors::number(id.as_str())
                ));
            }
            ExitCode::Success
        }
        Err(e) => {
            ctx.fail(&format!("Failed to delete user: {}", e));
            ExitCode::from(&e)
        }
    }
}

/// Download the attendance CSV export.
pub async fn export(ctx: &CommandContext, range: ReportRange, output: Option<String>) -> ExitCode {
    let identity = match ctx.signed_in().await {
        Ok(identity) => identity,
        Err(code) => return code,
    };

    let export = match ReportsView::new(&identity).export_csv(range).await {
        Ok(export) => export,
        Err(e) => {
            ctx.fail(&format!("Export failed: {}", e));
            return ExitCode::from(&e);
        }
    };

    let target = export_target(output.as_deref(), &export.file_name);
    if let Err(e) = std::fs::write(&target, &export.bytes) {
        ctx.fail(&format!("Failed to write {}: {}", target.display(), e));
        return ExitCode::GeneralError;
    }

    if ctx.json {
        print_json(&serde_json::json!({
            "status": "exported",
            "path": target,
            "bytes": export.bytes.len(),
        }));
    } else {
        ctx.note(&format!(
            "{} {}",
            colors::success("Export saved:"),
            colors::path(&target.display().to_string())
        ));
    }
    ExitCode::Success
}

/// Where to write an export: an explicit file, into an explicit directory,
/// or into the working directory under the suggested name.
fn export_target(output: Option<&str>, file_name: &str) -> PathBuf {
    match output {
        Some(raw) => {
            let path = PathBuf::from(shellexpand::tilde(raw).into_owned());
            if path.is_dir() {
                path.join(file_name)
            } else {
                path
            }
        }
        None => PathBuf::from(file_name),
    }
}

/// Show attendance statistics.
pub async fn stats(ctx: &CommandContext, range: ReportRange) -> ExitCode {
    let identity = match ctx.signed_in().await {
        Ok(identity) => identity,
        Err(code) => return code,
    };

    match ReportsView::new(&identity).stats(range).await {
        Ok(stats) => {
            if ctx.json {
                print_json(&stats);
            } else {
                println!("{} {}", colors::header("Attendance statistics:"), range);
                println!();
                print!("{}", render_stats(&stats));
            }
            ExitCode::Success
        }
        Err(e) => {
            ctx.fail(&e.to_string());
            ExitCode::from(&e)
        }
    }
}

/// Print the effective configuration.
pub fn config_show(ctx: &CommandContext) -> ExitCode {
    let path = config::config_path().ok();
    if ctx.json {
        print_json(&serde_json::json!({
            "path": path,
            "effective_server": ctx.base_url(),
            "config": ctx.config,
        }));
        return ExitCode::Success;
    }

    if let Some(path) = &path {
        println!("{} {}", colors::bold("File:"), colors::path(&path.display().to_string()));
    }
    println!("{} {}", colors::bold("Server:"), ctx.base_url());
    println!(
        "{} {} ({}x{})",
        colors::bold("Camera:"),
        ctx.config.camera.device,
        ctx.config.camera.width,
        ctx.config.camera.height
    );
    println!(
        "{} {} frames every {} ms, JPEG quality {}",
        colors::bold("Capture:"),
        ctx.config.capture.frame_count,
        ctx.config.capture.frame_interval_ms,
        ctx.config.capture.jpeg_quality
    );
    ExitCode::Success
}

/// Persist a new backend URL.
pub fn config_set_server(ctx: &CommandContext, url: &str) -> ExitCode {
    let mut config = ctx.config.clone();
    if let Err(e) = config.set_server(url) {
        ctx.fail(&e.to_string());
        return ExitCode::InvalidArguments;
    }
    match config::save_config(&config) {
        Ok(path) => {
            if ctx.json {
                print_json(&serde_json::json!({
                    "status": "saved",
                    "server": config.server.base_url,
                    "path": path,
                }));
            } else {
                ctx.note(&format!(
                    "{} {}",
                    colors::success("Server set to"),
                    config.server.base_url
                ));
            }
            ExitCode::Success
        }
        Err(e) => {
            ctx.fail(&e.to_string());
            ExitCode::GeneralError
        }
    }
}

/// Show version information.
pub fn version(json: bool) {
    let version = env!("CARGO_PKG_VERSION");
    if json {
        print_json(&serde_json::json!({ "version": version }));
    } else {
        println!("{} {}", colors::bold("attendo"), version);
    }
}

/// Parse a role name for `users create`.
pub fn parse_role(s: &str) -> Result<Role, String> {
    match Role::parse(s) {
        Some(Role::Other) | None => Err(format!(
            "unknown role '{}' (expected admin, teacher or student)",
            s
        )),
        Some(role) => Ok(role),
    }
}

/// Parse a report range for `export` and `stats`.
pub fn parse_range(s: &str) -> Result<ReportRange, String> {
    ReportRange::parse(s)
        .ok_or_else(|| format!("unknown range '{}' (expected today, week, month or all)", s))
}
