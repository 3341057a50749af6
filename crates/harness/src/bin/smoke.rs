// IPM API - one-shot contract run against a live instance

use ipm_harness::{init_tracing, HarnessConfig, Scenario, ScenarioReport};
use tracing::{error, info};

fn print_completed(report: &ScenarioReport) {
    for stage in &report.completed {
        println!("✅ {}", stage);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = HarnessConfig::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(base_url = %config.base_url, "Running contract scenario");

    let report = match Scenario::default_for(config).run().await {
        Ok(report) => report,
        Err(failure) => {
            print_completed(&failure.report);
            println!("❌ {}", failure.stage);
            return Err(failure.into());
        }
    };

    print_completed(&report);
    if let Some(prediction) = &report.prediction {
        println!("   predicao: {:?}", prediction.predicao);
    }

    info!("All {} stages passed", report.completed.len());
    Ok(())
}
