use crate::config::Config;
use crate::layout::Layout;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::path::Path;

/// Load, parse and validate configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<Config> {
    info!("Loading configuration from: {:?}", config_path);

    let content = std::fs::read_to_string(config_path)
        .wrap_err_with(|| format!("Failed to read configuration '{}'", config_path.display()))?;

    let config = Config::from_yaml_str(&content)
        .wrap_err_with(|| format!("Failed to parse configuration '{}'", config_path.display()))?;

    config.validate()?;

    info!(
        "Loaded layout section '{}' with {} groups",
        config.general.layout_section,
        config.layout.groups.len()
    );

    Ok(config)
}

/// Load only the layout from a configuration file
pub fn load_layout(config_path: &Path) -> Result<Layout> {
    Ok(load_config(config_path)?.layout)
}
