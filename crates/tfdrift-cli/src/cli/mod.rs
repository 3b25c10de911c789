use clap::{ArgAction, Parser, Subcommand};
use std::process;

use tfdrift_core::validation::findings::format_finding;
use tfdrift_core::{
    validate_project, CancellationToken, Context, DefaultTerraformRunner, ValidationConfig,
};

use crate::github::GitHubIssueManager;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Opts {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, PartialEq, Clone, Debug)]
enum Command {
    /// Validate a Terraform project against its provider schemas
    #[clap(name = "scan", bin_name = "scan")]
    Scan(ScanModules),
}

#[derive(Parser, PartialEq, Clone, Debug)]
pub struct ScanModules {
    /// Path to the Terraform root module
    #[arg(long = "root", short = 'r', default_value = ".")]
    pub root: String,
    /// Resource type to exclude from validation (repeatable)
    #[arg(long = "exclude-resource")]
    pub excluded_resources: Vec<String>,
    /// Data source type to exclude from validation (repeatable)
    #[arg(long = "exclude-data-source")]
    pub excluded_data_sources: Vec<String>,
    /// Print findings as a JSON array
    #[arg(long = "json", action = ArgAction::SetTrue, group = "output_mode")]
    pub json: bool,
    /// Do not print findings to stdout
    #[arg(long = "silent", action = ArgAction::SetTrue, group = "output_mode")]
    pub silent: bool,
    /// Mirror the findings into a GitHub issue on the current repository
    #[arg(long = "github-issue", action = ArgAction::SetTrue)]
    pub github_issue: bool,
    /// GitHub repository owner, defaults to $GITHUB_REPOSITORY_OWNER
    #[arg(long = "github-owner", requires = "github_issue")]
    pub github_owner: Option<String>,
    /// GitHub repository name, defaults to $GITHUB_REPOSITORY_NAME
    #[arg(long = "github-repo", requires = "github_issue")]
    pub github_repo: Option<String>,
}

pub fn main() {
    let logger = hiro_system_kit::log::setup_logger();
    let _guard = hiro_system_kit::log::setup_global_logger(logger.clone());
    let ctx = Context { logger: Some(logger), tracer: false };

    let opts: Opts = match Opts::try_parse() {
        Ok(opts) => opts,
        Err(e) => {
            println!("{}", e);
            process::exit(1);
        }
    };

    match handle_command(opts, &ctx) {
        Err(e) => {
            error!(ctx.expect_logger(), "{e}");
            std::thread::sleep(std::time::Duration::from_millis(500));
            process::exit(1);
        }
        Ok(_) => {}
    }
}

fn handle_command(opts: Opts, ctx: &Context) -> Result<(), String> {
    match opts.command {
        Command::Scan(cmd) => handle_scan_command(&cmd, ctx),
    }
}

fn handle_scan_command(cmd: &ScanModules, ctx: &Context) -> Result<(), String> {
    let cancellation = CancellationToken::new();
    let moved_token = cancellation.clone();
    ctrlc::set_handler(move || {
        moved_token.cancel();
    })
    .map_err(|e| format!("unable to install interrupt handler: {e}"))?;

    let root = env_value("TERRAFORM_ROOT").unwrap_or_else(|| cmd.root.clone());

    let config = ValidationConfig::new(root.clone())
        .with_excluded_resources(cmd.excluded_resources.clone())
        .with_excluded_resources(env_list("EXCLUDED_RESOURCES"))
        .with_excluded_data_sources(cmd.excluded_data_sources.clone())
        .with_excluded_data_sources(env_list("EXCLUDED_DATA_SOURCES"))
        .with_cancellation(cancellation);

    info!(ctx.expect_logger(), "validating terraform project at {}", root);

    let runner = DefaultTerraformRunner::new();
    let findings = validate_project(ctx, &config, &runner).map_err(|e| e.to_string())?;

    if cmd.json {
        let rendered = serde_json::to_string_pretty(&findings)
            .map_err(|e| format!("unable to serialize findings: {e}"))?;
        println!("{}", rendered);
    } else if !cmd.silent {
        for finding in &findings {
            println!("{}", format_finding(finding));
        }
    }

    if findings.is_empty() {
        info!(ctx.expect_logger(), "no schema mismatches found");
    } else {
        info!(ctx.expect_logger(), "found {} schema mismatches", findings.len());
    }

    if cmd.github_issue {
        let manager =
            GitHubIssueManager::from_env(cmd.github_owner.clone(), cmd.github_repo.clone())?;
        manager.sync(&findings)?;
        info!(ctx.expect_logger(), "github issue synchronized");
    }

    Ok(())
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn env_list(name: &str) -> Vec<String> {
    let Some(value) = env_value(name) else {
        return Vec::new();
    };
    value.split(',').map(|entry| entry.trim().to_string()).filter(|e| !e.is_empty()).collect()
}
