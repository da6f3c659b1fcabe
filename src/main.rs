use anyhow::Result;
use clap::Parser;
use colored::*;
use rca_agent::ai::HttpModelClient;
use rca_agent::cli::{self, Args};
use rca_agent::parser::LogDocumentParser;
use rca_agent::report::ReportStore;
use rca_agent::scanner::SystemLogScanner;
use rca_agent::theme::Theme;
use rca_agent::tools::{ContainerMonitor, HostInspector, ResourceMonitor};
use rca_agent::config::get_config_path;
use rca_agent::{Collaborators, Config, Pipeline, RcaError, RunRequest};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    if args.license {
        println!("{}", cli::LICENSE_TEXT);
        return ExitCode::SUCCESS;
    }

    if args.init_config {
        return init_config(&args);
    }

    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match Config::resolve(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {:#}", "Configuration error:".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };
    args.apply_overrides(&mut config);
    if let Err(e) = config.validate() {
        eprintln!("{} {:#}", "Configuration error:".red().bold(), e);
        return ExitCode::FAILURE;
    }
    if !config.display.color_output {
        colored::control::set_override(false);
    }

    cli::print_banner(&args, &config);

    tokio::select! {
        result = run(&args, &config) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                match e.downcast_ref::<RcaError>() {
                    Some(user) if user.is_user_error() => {
                        eprintln!("{} {}", "Error:".red().bold(), user);
                        eprintln!("Run with --help for usage.");
                    }
                    _ => cli::print_troubleshooting(&e, &config),
                }
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\n\nAnalysis interrupted by user.");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args, config: &Config) -> Result<()> {
    let description = args.error.clone().unwrap_or_default();
    let command_timeout = config.scan.command_timeout();

    let parser = Arc::new(LogDocumentParser::new(config.parser.options()));
    let scanner = SystemLogScanner::new(parser, config.scan.scan_options());
    let system = HostInspector::new(command_timeout);
    let containers = ContainerMonitor::new(command_timeout);
    let resources = ResourceMonitor::new(command_timeout);
    let model = HttpModelClient::new(&config.ai)?;

    let pipeline = Pipeline::new(
        scanner,
        Collaborators {
            system: &system,
            containers: &containers,
            resources: &resources,
            model: &model,
        },
        ReportStore::new(config.report.directory()),
    )
    .with_progress(config.display.show_progress)
    .with_announcements(true);

    let outcome = pipeline
        .run(&RunRequest {
            description,
            scan: args.scan_request(config),
            triage: args.triage,
        })
        .await?;

    let theme = Theme::named(config.display.theme);
    println!();
    println!("{}", theme.format_output(&outcome.analysis, config.display.color_output));
    println!("\nReport saved to: {}", outcome.report_path.display());
    cli::print_follow_up();
    Ok(())
}

fn init_config(args: &Args) -> ExitCode {
    let resolved = match &args.config {
        Some(path) => Ok(path.clone()),
        None => get_config_path(),
    };
    let path = match resolved {
        Ok(path) => path,
        Err(e) => {
            eprintln!("{} {:#}", "Configuration error:".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };
    if path.exists() {
        eprintln!("Config already exists at {}", path.display());
        return ExitCode::FAILURE;
    }
    match Config::write_default(&path) {
        Ok(()) => {
            println!("Wrote default config to {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{} {:#}", "Configuration error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
