use crate::commands::CommandResult;
use showhome_core::config::{AppConfig, LoadOptions};
use showhome_db::{connect, migrations, ShowroomSeedDataset};

pub fn run() -> CommandResult {
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

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let seed_result = ShowroomSeedDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = ShowroomSeedDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        let run_result: Result<_, (&'static str, String, u8)> = if !verification.all_passed() {
            let failed_checks = verification
                .checks
                .iter()
                .filter_map(|(check, passed)| (!passed).then_some(check.as_str()))
                .collect::<Vec<_>>();
            let message = if failed_checks.is_empty() {
                "Some seed data failed to load".to_string()
            } else {
                format!("Seed verification failed for checks: {}", failed_checks.join(", "))
            };
            Err(("seed_verification", message, 6u8))
        } else {
            Ok(seed_result)
        };

        pool.close().await;
        run_result
    });

    match result {
        Ok(output) => CommandResult::success_with_details(
            "seed",
            format!(
                "showroom demo dataset loaded: {} inventory models, {} visits",
                output.models_seeded, output.visits_seeded
            ),
            Some(serde_json::json!({
                "models_seeded": output.models_seeded,
                "visits_seeded": output.visits_seeded,
            })),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}
