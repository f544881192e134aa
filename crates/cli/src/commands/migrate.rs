use crate::commands::CommandResult;
use flowsnap_core::config::{AppConfig, LoadOptions, PROJECT_PLACEHOLDER};
use flowsnap_core::source::check_destination_project;
use flowsnap_db::{connect_warehouse, migrations};

/// Applies pending migrations to the warehouse of `project`.
pub fn run(project: Option<&str>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "migrate",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let project = match project.map(check_destination_project) {
        Some(Ok(project)) => project,
        Some(Err(error)) => {
            return CommandResult::failure("migrate", "invalid_input", error.to_string(), 1);
        }
        None if config.warehouse.url.contains(PROJECT_PLACEHOLDER) => {
            return CommandResult::failure(
                "migrate",
                "config_validation",
                format!(
                    "warehouse.url `{}` is per-project; pass --project",
                    config.warehouse.url
                ),
                2,
            );
        }
        None => "",
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "migrate",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_warehouse(&config.warehouse, project)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;
        pool.close().await;
        Ok::<(), (&'static str, String, u8)>(())
    });

    match result {
        Ok(()) => CommandResult::success(
            "migrate",
            format!("applied pending migrations to {}", config.warehouse.url_for_project(project)),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("migrate", error_class, message, exit_code)
        }
    }
}
