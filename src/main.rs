use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};
use tracing::{debug, info, Level};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use prlint_core::actions::{error_command, in_actions, runner_debug};
use prlint_core::{
    env_input, resolve_token, EventContext, PolicyConfig, PullRequestRef, TitlePolicy, INPUT_NAMES,
};
use prlint_review::github::GitHubClient;
use prlint_review::pipeline::{run_check, RunReport};
use prlint_review::title::evaluate;

const DEFAULT_CONFIG_PATH: &str = ".prlint.toml";

#[derive(Parser)]
#[command(
    name = "prlint",
    version,
    about = "Pull request title linting for CI",
    long_about = "prlint checks a pull request title against a pattern and keeps a single bot review\n\
                   on the pull request in sync with the result.\n\n\
                   Settings come from GitHub Actions inputs (INPUT_*), then .prlint.toml, then flags.\n\n\
                   Examples:\n  \
                     prlint                                   Run as a GitHub Actions step\n  \
                     prlint run --pr owner/repo#12 --title 'fix: bug'  Run against a PR locally\n  \
                     prlint check --title 'feat: add parser'  Test a title without touching GitHub\n  \
                     prlint init                              Create a .prlint.toml config file"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .prlint.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    format: Format,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Emit log lines as JSON
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Check the title and reconcile the bot review (default)
    #[command(long_about = "Check the title and reconcile the bot review.\n\n\
        Inside GitHub Actions the pull request and title are read from GITHUB_REPOSITORY and\n\
        the event payload at GITHUB_EVENT_PATH. Outside Actions, pass --pr and --title.\n\
        The step fails with the rendered comment when the title does not match and\n\
        on-failed-regex-fail-action is enabled.")]
    Run {
        /// Pull request to check (format: owner/repo#123)
        #[arg(long)]
        pr: Option<PullRequestRef>,

        /// Title to check instead of the one in the event payload
        #[arg(long)]
        title: Option<String>,

        /// GitHub token (default: repo-token input, GITHUB_TOKEN, GH_TOKEN)
        #[arg(long)]
        repo_token: Option<String>,

        /// GitHub API base URL, for GitHub Enterprise
        #[arg(long, env = "GITHUB_API_URL")]
        api_url: Option<String>,

        #[command(flatten)]
        policy: PolicyArgs,
    },
    /// Test a title against the pattern without calling GitHub
    #[command(long_about = "Test a title against the pattern without calling GitHub.\n\n\
        Exits with status 1 and prints the rendered failure comment when the title does not match.\n\n\
        Examples:\n  prlint check --title 'fix: bug'\n  prlint check --title-regex '^JIRA-[0-9]+' --title 'JIRA-1 fix'")]
    Check {
        /// Title to test
        #[arg(long)]
        title: String,

        #[command(flatten)]
        policy: PolicyArgs,
    },
    /// Create a default .prlint.toml configuration file
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Flags that override the configured policy.
#[derive(Args, Default)]
struct PolicyArgs {
    /// Pattern the title must match
    #[arg(long)]
    title_regex: Option<String>,

    /// Fail the step when the title does not match
    #[arg(long)]
    fail_action: bool,

    /// Manage a bot review on the pull request
    #[arg(long)]
    create_review: bool,

    /// Submit new reviews as REQUEST_CHANGES
    #[arg(long)]
    request_changes: bool,

    /// Minimize stale bot feedback once the title matches
    #[arg(long)]
    minimize: bool,
}

impl PolicyArgs {
    fn to_layer(&self) -> PolicyConfig {
        let flag = |set: bool| set.then_some(true);
        PolicyConfig {
            title_regex: self.title_regex.clone(),
            on_failed_regex_fail_action: flag(self.fail_action),
            on_failed_regex_create_review: flag(self.create_review),
            on_failed_regex_request_changes: flag(self.request_changes),
            on_succeeded_regex_minimize_comment: flag(self.minimize),
            ..PolicyConfig::default()
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Human-readable summary
    Text,
    /// Machine-readable JSON with camelCase keys
    Json,
}

const DEFAULT_CONFIG: &str = r#"# prlint configuration
# Keys match the GitHub Actions inputs; inputs set on the step take precedence.

# Pattern the pull request title must match (anywhere in the title).
title-regex = "^(feat|fix|docs|style|refactor|perf|test|build|ci|chore|revert)(\\(.+\\))?!?: "

# Fail the step when the title does not match.
on-failed-regex-fail-action = false

# Post a review carrying the failure comment when the title does not match.
on-failed-regex-create-review = true

# Submit that review as REQUEST_CHANGES instead of COMMENT.
on-failed-regex-request-changes = false

# Failure comment; %regex% is replaced by the pattern.
on-failed-regex-comment = "PR title does not match the pattern: `%regex%`"

# Message used when the review is dismissed or superseded.
on-succeeded-regex-dismiss-review-comment = "PR title now matches the pattern."

# Minimize the bot's review and comments once the title matches.
on-succeeded-regex-minimize-comment = false

# Classifier for minimized feedback: SPAM, ABUSE, OFF_TOPIC, OUTDATED, DUPLICATE or RESOLVED.
on-minimize-comment-reason = "RESOLVED"
"#;

/// Install the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` wins when set; otherwise `--verbose` or step debug logging
/// selects `debug`, and `info` is the default.
fn init_tracing(verbose: bool, json: bool) {
    let level = if verbose || runner_debug() {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr).json())
            .try_init()
            .ok();
    } else {
        let ansi = std::io::stderr().is_terminal() && std::env::var("NO_COLOR").is_err();
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(ansi)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .ok();
    }
}

/// Stack defaults, the config file, action inputs and flags into a policy.
fn load_policy(config: Option<&Path>, overrides: &PolicyArgs) -> Result<TitlePolicy> {
    let file_layer = match config {
        Some(path) => PolicyConfig::from_file(path)?,
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                PolicyConfig::from_file(default_path)?
            } else {
                PolicyConfig::default()
            }
        }
    };

    let present: Vec<&str> = INPUT_NAMES
        .iter()
        .copied()
        .filter(|name| env_input(name).is_some_and(|v| !v.is_empty()))
        .collect();
    debug!(inputs = ?present, "action inputs present");

    let merged = file_layer
        .overlay(PolicyConfig::from_inputs(env_input))
        .overlay(overrides.to_layer());
    Ok(TitlePolicy::from_config(&merged)?)
}

fn print_report(report: &RunReport, format: Format) -> Result<()> {
    match format {
        Format::Json => {
            println!("{}", serde_json::to_string_pretty(report).into_diagnostic()?);
        }
        Format::Text => {
            let verdict = if report.matched {
                "matches"
            } else {
                "does not match"
            };
            eprintln!("{}: title {verdict} ({:?})", report.pr, report.title);
            if let Some(write) = &report.review_write {
                eprintln!("  review: {write:?}");
            }
            if let Some(dismissal) = &report.dismissal {
                eprintln!("  dismissal: {dismissal:?}");
            }
            if let Some(minimize) = &report.minimize {
                eprintln!("  minimized review: {:?}", minimize.review);
                eprintln!(
                    "  minimized comments: {} of {} ({} unresolved, {} failed)",
                    minimize.comments.minimized,
                    minimize.comments.examined,
                    minimize.comments.unresolved,
                    minimize.comments.failed,
                );
            }
        }
    }
    Ok(())
}

/// Report a terminal step failure and exit with status 1.
fn fail_step(message: &str) -> ! {
    if in_actions() {
        println!("{}", error_command(message));
    } else {
        eprintln!("error: {message}");
    }
    std::process::exit(1);
}

async fn run(
    config: Option<&Path>,
    format: Format,
    pr: Option<PullRequestRef>,
    title: Option<String>,
    repo_token: Option<String>,
    api_url: Option<String>,
    overrides: &PolicyArgs,
) -> Result<()> {
    let policy = load_policy(config, overrides)?;

    let ctx = match pr {
        Some(pr) => EventContext {
            pr,
            title: title.unwrap_or_default(),
        },
        None => {
            let mut ctx = EventContext::from_env()?;
            if let Some(title) = title {
                ctx.title = title;
            }
            ctx
        }
    };
    info!(pr = %ctx.pr, "checking pull request title");

    let token = resolve_token(repo_token.as_deref())?;
    let client = GitHubClient::new(&token, api_url.as_deref())?;
    let report = run_check(&client, &policy, &ctx.pr, &ctx.title).await?;

    print_report(&report, format)?;
    if let Some(message) = &report.failure {
        fail_step(message);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);
    let config = cli.config.as_deref();

    match cli.command {
        None => {
            let api_url = std::env::var("GITHUB_API_URL").ok();
            let overrides = PolicyArgs::default();
            run(config, cli.format, None, None, None, api_url, &overrides).await?;
        }
        Some(Command::Run {
            pr,
            title,
            repo_token,
            api_url,
            ref policy,
        }) => {
            run(config, cli.format, pr, title, repo_token, api_url, policy).await?;
        }
        Some(Command::Check { ref title, ref policy }) => {
            let policy = load_policy(config, policy)?;
            let matched = evaluate(&policy.pattern, title);
            match cli.format {
                Format::Json => {
                    let json = serde_json::json!({
                        "title": title,
                        "pattern": policy.pattern_source(),
                        "matched": matched,
                    });
                    println!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
                }
                Format::Text => {
                    let verdict = if matched { "matches" } else { "does not match" };
                    println!("{title:?} {verdict} {}", policy.pattern_source());
                }
            }
            if !matched {
                fail_step(&policy.rendered_comment());
            }
        }
        Some(Command::Init) => {
            let path = Path::new(DEFAULT_CONFIG_PATH);
            if path.exists() {
                miette::bail!("{DEFAULT_CONFIG_PATH} already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created {DEFAULT_CONFIG_PATH} with default configuration");
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "prlint", &mut std::io::stdout());
        }
    }

    Ok(())
}
