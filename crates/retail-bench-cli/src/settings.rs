use config::{Config, Environment, File};
use retail_bench_core::service::EngineConfig;

/// Prefix for environment overrides, e.g. `RBENCH_REPOSITORY_TIMEOUT_MS=2000`.
const ENV_PREFIX: &str = "RBENCH";

/// Build the engine configuration from built-in defaults, an optional file
/// (`--config`, any format the config crate understands) and `RBENCH_*`
/// environment variables, in that order of precedence.
pub fn load_engine_config(path: Option<&str>) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::with_name(path).required(true));
    }
    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));

    let engine: EngineConfig = builder
        .build()
        .map_err(|e| format!("Failed to load configuration: {}", e))?
        .try_deserialize()
        .map_err(|e| format!("Invalid configuration: {}", e))?;
    engine.validate()?;
    Ok(engine)
}
