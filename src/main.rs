use std::process::ExitCode;

use clap::Parser;
use console::Style;
use tracing_subscriber::EnvFilter;

use convsweep::cli::Cli;
use convsweep::config::SweepConfig;
use convsweep::conversations::HttpConversationsClient;
use convsweep::error::SweepError;
use convsweep::reconciler::Reconciler;
use convsweep::sweep::RunReport;
use convsweep::ui::{self, SweepProgress};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let report = match reconcile(&cli).await {
        Ok(report) => report,
        Err(err) => {
            eprintln!("{} {err}", Style::new().red().bold().apply_to("error:"));
            return ExitCode::from(err.exit_code());
        }
    };

    // Per-conversation failures are in the report; the run itself completed.
    if let Err(err) = emit(&cli, &report) {
        eprintln!("{} {err:#}", Style::new().red().bold().apply_to("error:"));
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "convsweep=debug" } else { "convsweep=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn reconcile(cli: &Cli) -> Result<RunReport, SweepError> {
    let mut config = SweepConfig::load(&cli.config)?;
    cli.apply_overrides(&mut config);
    let settings = config.validate(cli.mode())?;

    let client = HttpConversationsClient::new(settings.client)?;
    let reconciler = Reconciler::new(client, settings.run);

    let progress = (!cli.json).then(|| SweepProgress::start(cli.dry));
    let result = reconciler
        .run_observed(|window, totals| {
            if let Some(p) = &progress {
                p.window_settled(window, totals);
            }
        })
        .await;
    if let Some(p) = &progress {
        p.finish();
    }
    Ok(result?)
}

fn emit(cli: &Cli, report: &RunReport) -> anyhow::Result<()> {
    if let Some(path) = &cli.report_file {
        report.write_json(path)?;
    }
    if cli.json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        ui::print_report(report);
    }
    Ok(())
}
