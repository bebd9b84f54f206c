use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;

use crate::{
    backend::adapter::FirebaseAdapter,
    infra::{
        self, config::FileConfigAdapter, contracts::ConfigAdapter, error::AppError,
        storage_layout::StorageLayout,
    },
    usecases::context::AppContext,
};

/// Builds the application context and brings up file logging. The returned
/// guard must stay alive for the duration of the process; dropping it
/// flushes and stops the log writer.
pub fn bootstrap(config_path: Option<&Path>) -> Result<(AppContext, WorkerGuard), AppError> {
    let context = build_context(config_path)?;

    let layout = StorageLayout::resolve()?;
    layout.ensure_dirs()?;
    let guard = infra::logging::init(&context.config.logging, &layout)?;

    Ok((context, guard))
}

fn build_context(config_path: Option<&Path>) -> Result<AppContext, AppError> {
    let config_adapter = FileConfigAdapter::new(config_path);
    let config = config_adapter.load().map_err(AppError::Other)?;

    let layout = StorageLayout::resolve()?;
    layout.ensure_dirs()?;
    let backend = FirebaseAdapter::new(&config.backend, &layout)?;

    Ok(AppContext::new(config, backend))
}
