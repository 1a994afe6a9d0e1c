//! Attendo Command-Line Interface
//!
//! Records attendance through the webcam (or the manual fallback) and gives
//! administrators scriptable access to users, statistics and CSV exports.

mod colors;
mod commands;
mod exit_codes;
mod logging;

use attendo_common::{NewUser, ReportRange, Role};
use clap::{Parser, Subcommand};
use commands::{AttendOptions, CommandContext};
use exit_codes::ExitCode;

/// Attendo - Attendance Capture CLI
#[derive(Parser, Debug)]
#[command(name = "attendo")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format for scripting
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Backend URL (overrides config and ATTENDO_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    server: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Log in and remember the session
    Login {
        /// User name
        name: String,

        /// Password
        #[arg(long, env = "ATTENDO_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Record attendance with the camera
    Attend {
        /// Camera: auto, synthetic, file:<path> or v4l2:<index>
        #[arg(long, conflicts_with = "manual")]
        camera: Option<String>,

        /// Number of frames to send
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..), conflicts_with = "manual")]
        frames: Option<u32>,

        /// Delay between frames (milliseconds)
        #[arg(long, value_name = "MS", conflicts_with = "manual")]
        interval_ms: Option<u64>,

        /// Record attendance without the camera
        #[arg(long)]
        manual: bool,
    },
    /// Manage users (administrators only)
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
    /// Download the attendance CSV export
    Export {
        /// Report range: today, week, month or all
        #[arg(short, long, default_value = "week", value_parser = commands::parse_range)]
        range: ReportRange,

        /// Output file or directory (defaults to the suggested file name)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Show attendance statistics
    Stats {
        /// Report range: today, week, month or all
        #[arg(short, long, default_value = "week", value_parser = commands::parse_range)]
        range: ReportRange,
    },
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Show version information
    Version,
}

#[derive(Subcommand, Debug)]
enum UsersAction {
    /// List users
    List,
    /// Create a user
    Create {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: Option<String>,

        #[arg(long, env = "ATTENDO_NEW_PASSWORD", hide_env_values = true)]
        password: String,

        /// admin, teacher or student
        #[arg(long, default_value = "student", value_parser = commands::parse_role)]
        role: Role,
    },
    /// Delete a user by id
    Delete {
        /// User id (see 'attendo users list')
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Set the backend URL
    SetServer {
        /// e.g. https://school.example/api
        url: String,
    },
}

fn main() {
    let cli = Cli::parse();
    let _log_guard = logging::init(cli.verbose, cli.quiet);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("{}", colors::error(&format!("Failed to create Tokio runtime: {}", e)));
            std::process::exit(ExitCode::GeneralError.as_i32());
        }
    };

    let exit_code = runtime.block_on(run(cli));
    tracing::debug!("Exiting: {}", exit_code);
    drop(runtime);
    drop(_log_guard);
    std::process::exit(exit_code.as_i32());
}

async fn run(cli: Cli) -> ExitCode {
    let ctx = CommandContext {
        config: attendo_client::config::load_config(),
        server: cli.server,
        json: cli.json,
        quiet: cli.quiet,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Login { name, password } => commands::login(&ctx, &name, password).await,
        Commands::Logout => commands::logout(&ctx),
        Commands::Whoami => commands::whoami(&ctx).await,
        Commands::Attend {
            camera,
            frames,
            interval_ms,
            manual,
        } => {
            let options = AttendOptions {
                camera,
                frames,
                interval_ms,
                manual,
            };
            commands::attend(&ctx, options).await
        }
        Commands::Users { action } => match action {
            UsersAction::List => commands::users_list(&ctx).await,
            UsersAction::Create {
                name,
                email,
                password,
                role,
            } => {
                let new_user = NewUser {
                    name,
                    email,
                    password,
                    role,
                };
                commands::users_create(&ctx, new_user).await
            }
            UsersAction::Delete { id } => commands::users_delete(&ctx, &id).await,
        },
        Commands::Export { range, output } => commands::export(&ctx, range, output).await,
        Commands::Stats { range } => commands::stats(&ctx, range).await,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_show(&ctx),
            ConfigAction::SetServer { url } => commands::config_set_server(&ctx, &url),
        },
        Commands::Version => {
            commands::version(ctx.json);
            ExitCode::Success
        }
    }
}
