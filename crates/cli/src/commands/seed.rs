use cpg_core::config::{AppConfig, LoadOptions};
use cpg_db::{migrations, DemoDataset, SeedResult};

use crate::commands::{connect, runtime, CommandResult, StepError};

/// Loads the demo promotions; `reset` removes them first so their values are restored.
pub fn run(reset: bool) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match runtime("seed") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect(&config).await?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        if reset {
            DemoDataset::clean(&pool)
                .await
                .map_err(|error| ("seed_execution", error.to_string(), 6u8))?;
        }

        let seed_result = DemoDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 6u8))?;

        let verification = DemoDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        pool.close().await;

        let outcome: Result<SeedResult, StepError> = if verification.all_present {
            Ok(seed_result)
        } else {
            Err(("seed_verification", verification_failure_message(&verification.checks), 6u8))
        };
        outcome
    });

    match result {
        Ok(seed_result) => CommandResult::success(
            "seed",
            format!(
                "demo promotions loaded: {} inserted, {} total",
                seed_result.rows_inserted, seed_result.rows_total
            ),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn verification_failure_message(checks: &[(&'static str, bool)]) -> String {
    let failed_checks =
        checks.iter().filter_map(|(check, passed)| (!passed).then_some(*check)).collect::<Vec<_>>();

    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}
