use gcmcflow::engine::config as core_config;

/// Fully merged configuration handed to the command handlers.
pub struct AppConfig {
    pub restart: core_config::RestartConfig,
    pub postprocess: core_config::PostProcessConfig,
}
