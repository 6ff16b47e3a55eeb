mod bootstrap;

use anyhow::{Context, Result};
use grader_core::formatting::format_report;
use grader_core::settings::{Command, Settings};
use grader_data::parser::parse_file;
use grader_runtime::orchestrator::GradingOrchestrator;
use grader_runtime::processor::CycleOutcome;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("Sensor Grader v{} starting", env!("CARGO_PKG_VERSION"));

    match settings.command() {
        Command::Grade { file } => {
            let parsed = parse_file(&file)?;
            println!("{}", format_report(&parsed.report())?);
        }

        Command::Pending => {
            let processor = bootstrap::build_processor(&settings)?;
            for name in processor.pending()? {
                println!("{}", name);
            }
        }

        Command::Once => {
            let processor = bootstrap::build_processor(&settings)?;
            match processor.run_cycle().context("grading cycle failed")? {
                CycleOutcome::Graded { file, output } => {
                    tracing::info!("Graded {}", file);
                    println!("{}", output);
                }
                outcome => println!("{}", outcome),
            }
        }

        Command::Watch => {
            let processor = bootstrap::build_processor(&settings)?;
            tracing::info!(
                "Polling every {}s for files prefixed {:?}",
                settings.poll_interval,
                settings.file_prefix
            );

            let orchestrator = GradingOrchestrator::new(settings.poll_interval(), processor);
            let (mut rx, handle) = orchestrator.start();

            loop {
                tokio::select! {
                    report = rx.recv() => {
                        let Some(report) = report else {
                            tracing::warn!("polling loop ended unexpectedly");
                            break;
                        };
                        match report.result {
                            Ok(CycleOutcome::Graded { file, output }) => {
                                tracing::info!(at = %report.at, "Graded {}", file);
                                println!("{}", output);
                            }
                            Ok(outcome) => tracing::info!(at = %report.at, "{}", outcome),
                            Err(e) => tracing::error!(at = %report.at, "Cycle failed: {}", e),
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Ctrl+C received; finishing current cycle");
                        break;
                    }
                }
            }

            // A full channel would otherwise keep the loop blocked on send.
            drop(rx);
            handle.stop().await;
        }
    }

    Ok(())
}
