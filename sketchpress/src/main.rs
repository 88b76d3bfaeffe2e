//! sketchpress - Entry Point
//!
//! Turns a hand-drawn UI sketch into a page hosted on GitHub Pages, then
//! audits the live page and repairs what fails.

use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use colored::Colorize;
use secrecy::SecretString;
use tracing::{error, info, warn};

use sketchpress::app::options::AppOptions;
use sketchpress::app::workbench::Workbench;
use sketchpress::audit::AuditEngine;
use sketchpress::authn::session::{verify_session, Credential, Session};
use sketchpress::deploy::cancel::{CancelHandle, CancelSignal};
use sketchpress::deploy::orchestrator::Orchestrator;
use sketchpress::errors::{
    AppError, AuditError, DeployError, GeneratorError, HostError, RepairError,
};
use sketchpress::filesys::file::File;
use sketchpress::generator::sketch::{generate_markup, mime_for_path, SketchImage};
use sketchpress::generator::Generator;
use sketchpress::host::RemoteResourceClient;
use sketchpress::http::gemini::GeminiClient;
use sketchpress::http::github::GitHubClient;
use sketchpress::logs::{init_logging, LogOptions};
use sketchpress::models::{DeployableContent, FailingFinding, Finding, FindingSet, RepositoryRef};
use sketchpress::progress::sinks::{FanoutSink, TerminalSink, TracingSink};
use sketchpress::progress::ProgressSink;
use sketchpress::repair::RepairController;
use sketchpress::storage::layout::StorageLayout;
use sketchpress::storage::settings::Settings;
use sketchpress::utils::version_info;

const TOKEN_ENV: &str = "GITHUB_TOKEN";
const API_KEY_ENV: &str = "GEMINI_API_KEY";
const DEFAULT_ROUNDS: u32 = 3;

const USAGE: &str = "\
usage: sketchpress [--settings=PATH] [--token=TOKEN] <command>

commands:
  --version
  --generate --sketch=PATH [--out=PATH]
  --deploy   --content=PATH [--repo=OWNER/NAME]
  --audit    --url=URL --content=PATH [--out=PATH]
  --repair   --content=PATH --findings=PATH [--out=PATH]
  --cycle    --sketch=PATH [--repo=OWNER/NAME] [--rounds=N] [--out=PATH]

environment:
  GITHUB_TOKEN     host access token (or --token=)
  GEMINI_API_KEY   generator API key";

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let mut cli_args: HashMap<String, String> = HashMap::new();
    for arg in env::args().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            cli_args.insert(key.trim_start_matches('-').to_string(), value.to_string());
        } else if arg.starts_with("--") {
            cli_args.insert(arg.trim_start_matches('-').to_string(), "true".to_string());
        }
    }

    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version_info()) {
            Ok(version) => println!("{}", version),
            Err(e) => eprintln!("{}", e),
        }
        return;
    }

    if cli_args.contains_key("help") || cli_args.is_empty() {
        println!("{}", USAGE);
        return;
    }

    let layout = StorageLayout::default();
    let settings_file = cli_args
        .get("settings")
        .map(File::new)
        .unwrap_or_else(|| layout.settings_file());
    let settings = match Settings::load_or_default(&settings_file).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{} {}", "Unable to read settings:".red(), e);
            std::process::exit(2);
        }
    };

    // Initialize logging
    let log_dir = match layout.setup().await {
        Ok(()) => Some(layout.logs_dir().path().to_path_buf()),
        Err(e) => {
            eprintln!("File logging disabled: {}", e);
            None
        }
    };
    let _log_guard = match init_logging(LogOptions {
        log_level: settings.log_level.clone(),
        json_format: settings.log_json,
        log_dir,
        ..Default::default()
    }) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            None
        }
    };

    // Ctrl-C cancels the run in flight
    let cancel = Arc::new(CancelHandle::new());
    let signal = cancel.signal();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            await_shutdown_signal().await;
            cancel.cancel();
        });
    }

    let options = AppOptions::from(&settings);
    if let Err(e) = run(&cli_args, &options, &signal).await {
        error!("{:#}", e);
        eprintln!("{} {}", "error:".red().bold(), user_facing(&e));
        std::process::exit(1);
    }
}

async fn run(
    cli_args: &HashMap<String, String>,
    options: &AppOptions,
    cancel: &CancelSignal,
) -> anyhow::Result<()> {
    if cli_args.contains_key("generate") {
        generate(cli_args, options).await
    } else if cli_args.contains_key("deploy") {
        deploy(cli_args, options, cancel).await
    } else if cli_args.contains_key("audit") {
        audit(cli_args, options).await
    } else if cli_args.contains_key("repair") {
        repair(cli_args, options).await
    } else if cli_args.contains_key("cycle") {
        cycle(cli_args, options, cancel).await
    } else {
        bail!("no command given\n\n{}", USAGE)
    }
}

// ================================= COMMANDS ===================================== //

async fn generate(cli_args: &HashMap<String, String>, options: &AppOptions) -> anyhow::Result<()> {
    let generator = connect_generator(options)?;
    let image = read_sketch(required(cli_args, "sketch")?).await?;

    let content = generate_markup(generator.as_ref(), &image, &options.tuning).await?;
    write_output(cli_args, &content).await
}

async fn deploy(
    cli_args: &HashMap<String, String>,
    options: &AppOptions,
    cancel: &CancelSignal,
) -> anyhow::Result<()> {
    let client = connect_host(cli_args, options)?;
    let content = read_content(required(cli_args, "content")?).await?;
    let repo = resolve_repo(cli_args, client.as_ref()).await?;

    let orchestrator = Orchestrator::new(client, options.orchestrator.clone());
    let (terminal, tracing_sink) = (TerminalSink, TracingSink);
    let sink = FanoutSink::new(vec![&terminal as &dyn ProgressSink, &tracing_sink]);

    let handle = orchestrator.deploy(&repo, &content, &sink, cancel).await?;
    println!("{}", handle.last_known_url().bold());
    Ok(())
}

async fn audit(cli_args: &HashMap<String, String>, options: &AppOptions) -> anyhow::Result<()> {
    let generator = connect_generator(options)?;
    let url = required(cli_args, "url")?;
    let content = read_content(required(cli_args, "content")?).await?;

    let engine = AuditEngine::new(generator, options.audit_policy, options.tuning.clone());
    let findings = engine.audit(url, &content).await?;
    print_findings(&findings);

    if let Some(out) = cli_args.get("out") {
        File::new(out).write_json(&findings.findings()).await?;
        info!("Findings written to {}", out);
    }
    Ok(())
}

async fn repair(cli_args: &HashMap<String, String>, options: &AppOptions) -> anyhow::Result<()> {
    let generator = connect_generator(options)?;
    let content = read_content(required(cli_args, "content")?).await?;

    let findings_path = required(cli_args, "findings")?;
    let findings: Vec<Finding> = File::new(findings_path)
        .read_json()
        .await
        .with_context(|| format!("reading findings from {}", findings_path))?;
    let failing: Vec<FailingFinding> = FindingSet::new(findings).failing();

    let controller = RepairController::new(generator, options.tuning.clone());
    let outcome = controller.repair(&content, &failing).await?;
    if !outcome.is_repaired() {
        println!("{}", "Nothing to repair".green());
        return Ok(());
    }

    println!(
        "{}",
        format!("Repaired {} findings; redeploy to publish", failing.len()).yellow()
    );
    write_output(cli_args, outcome.content()).await
}

async fn cycle(
    cli_args: &HashMap<String, String>,
    options: &AppOptions,
    cancel: &CancelSignal,
) -> anyhow::Result<()> {
    let client = connect_host(cli_args, options)?;
    let generator = connect_generator(options)?;
    let image = read_sketch(required(cli_args, "sketch")?).await?;
    let repo = resolve_repo(cli_args, client.as_ref()).await?;
    let rounds = match cli_args.get("rounds") {
        Some(n) => n
            .parse::<u32>()
            .with_context(|| format!("--rounds must be a number, got {}", n))?,
        None => DEFAULT_ROUNDS,
    };

    let mut workbench = Workbench::new(client, generator, options);
    workbench.generate_from_sketch(&image).await?;

    let (terminal, tracing_sink) = (TerminalSink, TracingSink);
    let sink = FanoutSink::new(vec![&terminal as &dyn ProgressSink, &tracing_sink]);
    let report = workbench.cycle(&repo, rounds, &sink, cancel).await?;

    if let Some(findings) = workbench.last_findings() {
        print_findings(findings);
    }
    println!("{} after {} rounds", report.url.bold(), report.rounds);
    if !report.remaining.is_empty() {
        warn!("{} findings still failing", report.remaining.len());
    }

    if let Some(content) = workbench.content() {
        if cli_args.contains_key("out") {
            write_output(cli_args, content).await?;
        }
    }
    Ok(())
}

// ================================== HELPERS ===================================== //

fn required<'a>(cli_args: &'a HashMap<String, String>, key: &str) -> anyhow::Result<&'a str> {
    cli_args
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing --{}=...\n\n{}", key, USAGE))
}

fn connect_host(
    cli_args: &HashMap<String, String>,
    options: &AppOptions,
) -> anyhow::Result<Arc<dyn RemoteResourceClient>> {
    let token = cli_args
        .get("token")
        .cloned()
        .or_else(|| env::var(TOKEN_ENV).ok())
        .ok_or_else(|| anyhow!("set {} or pass --token=", TOKEN_ENV))?;

    let session = Arc::new(Session::new(Credential::new(token)?));
    info!("Host session opened at {}", session.created_at().to_rfc3339());
    let client = GitHubClient::new(&options.host, session)?;
    Ok(Arc::new(client))
}

fn connect_generator(options: &AppOptions) -> anyhow::Result<Arc<dyn Generator>> {
    let key = env::var(API_KEY_ENV).with_context(|| format!("set {}", API_KEY_ENV))?;
    let client = GeminiClient::new(&options.generator, SecretString::from(key))?;
    Ok(Arc::new(client))
}

/// `--repo=` if given, else the default repository of the token's account
async fn resolve_repo(
    cli_args: &HashMap<String, String>,
    client: &dyn RemoteResourceClient,
) -> anyhow::Result<RepositoryRef> {
    if let Some(path) = cli_args.get("repo") {
        return Ok(RepositoryRef::parse(path)?);
    }

    let login = verify_session(client)
        .await
        .context("verifying the access token")?;
    Ok(RepositoryRef::default_for(&login))
}

async fn read_sketch(path: &str) -> anyhow::Result<SketchImage> {
    let bytes = File::new(path)
        .read_bytes()
        .await
        .with_context(|| format!("reading sketch {}", path))?;
    Ok(SketchImage::from_bytes(&bytes, mime_for_path(Path::new(path))))
}

async fn read_content(path: &str) -> anyhow::Result<DeployableContent> {
    let bytes = File::new(path)
        .read_bytes()
        .await
        .with_context(|| format!("reading content {}", path))?;
    Ok(DeployableContent::new(bytes))
}

async fn write_output(
    cli_args: &HashMap<String, String>,
    content: &DeployableContent,
) -> anyhow::Result<()> {
    match cli_args.get("out") {
        Some(out) => {
            File::new(out).write_bytes(content.bytes()).await?;
            println!("{} {}", "Wrote".green(), out);
        }
        None => println!("{}", content.as_text()),
    }
    Ok(())
}

/// Remote failures are shown through their fixed templates; the detail is in the log
fn user_facing(err: &anyhow::Error) -> String {
    if let Some(app) = err.downcast_ref::<AppError>() {
        return app.user_message();
    }
    if let Some(deploy) = err.downcast_ref::<DeployError>() {
        return deploy.user_message();
    }
    if let Some(host) = err.downcast_ref::<HostError>() {
        return host.user_message();
    }
    if let Some(generator) = err.downcast_ref::<GeneratorError>() {
        return generator.user_message();
    }
    if let Some(audit) = err.downcast_ref::<AuditError>() {
        return audit.user_message();
    }
    if let Some(repair) = err.downcast_ref::<RepairError>() {
        return repair.user_message();
    }
    err.to_string()
}

fn print_findings(findings: &FindingSet) {
    if findings.is_empty() {
        println!("{}", "No checkpoints reported".yellow());
        return;
    }
    for finding in findings.findings() {
        if finding.passed {
            println!("{} {}: {}", "✓".green(), finding.label, finding.status);
        } else {
            println!("{} {}: {}", "✗".red(), finding.label.bold(), finding.status);
        }
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
                _ => {
                    warn!("Unable to install signal handlers, falling back to Ctrl+C");
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, cancelling...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, cancelling...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl+C received, cancelling...");
        }
    }
}
