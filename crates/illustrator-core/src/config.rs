use crate::model::{IllustratorConfig, PartialConfig};
use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const PROJECT_CONFIG: &str = "illustrator.toml";

/// Load config with precedence:
/// 1. Built-in defaults - lowest priority
/// 2. User config (~/.illustrator/config.toml)
/// 3. Project config (./illustrator.toml)
/// 4. Environment variables - highest priority
///
/// Command-line flags are applied on top by the caller.
pub fn load_config_with_precedence() -> Result<IllustratorConfig> {
    let user = dirs::home_dir().map(|home| home.join(".illustrator/config.toml"));
    let project = PathBuf::from(PROJECT_CONFIG);

    let mut config = load_layers(user.as_deref(), &project)?;
    apply_env_overrides(&mut config, |key| env::var(key).ok());
    Ok(config)
}

/// Merge the user and project files (either may be absent) over the defaults.
/// A broken user config only warns; a broken project config is an error.
pub fn load_layers(user: Option<&Path>, project: &Path) -> Result<IllustratorConfig> {
    let mut layers = Vec::new();

    if let Some(user_config) = user.filter(|p| p.exists()) {
        match load_single_config(user_config) {
            Ok(cfg) => layers.push(cfg),
            Err(e) => eprintln!("Warning: Failed to load user config: {:#}", e),
        }
    }

    if project.exists() {
        layers.push(load_single_config(project)?);
    }

    debug!(layers = layers.len(), "loaded config layers");
    Ok(resolve(merge_configs(layers)))
}

/// Load a single config file as a partial config
pub fn load_single_config(path: &Path) -> Result<PartialConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let config: PartialConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.display()))?;
    Ok(config)
}

/// Merge partial configs field by field; later layers win.
pub fn merge_configs(configs: Vec<PartialConfig>) -> PartialConfig {
    let mut merged = PartialConfig::default();

    for cfg in configs {
        if let Some(new_paths) = cfg.paths {
            let paths = merged.paths.get_or_insert_with(Default::default);
            if new_paths.styles_dir.is_some() {
                paths.styles_dir = new_paths.styles_dir;
            }
            if new_paths.output_dir.is_some() {
                paths.output_dir = new_paths.output_dir;
            }
        }

        if let Some(new_defaults) = cfg.defaults {
            let defaults = merged.defaults.get_or_insert_with(Default::default);
            if new_defaults.level.is_some() {
                defaults.level = new_defaults.level;
            }
            if new_defaults.style.is_some() {
                defaults.style = new_defaults.style;
            }
        }

        if let Some(new_render) = cfg.render {
            let render = merged.render.get_or_insert_with(Default::default);
            if new_render.model.is_some() {
                render.model = new_render.model;
            }
            if new_render.aspect_ratio.is_some() {
                render.aspect_ratio = new_render.aspect_ratio;
            }
            if new_render.resolution.is_some() {
                render.resolution = new_render.resolution;
            }
            if new_render.max_body_chars.is_some() {
                render.max_body_chars = new_render.max_body_chars;
            }
            if new_render.endpoint.is_some() {
                render.endpoint = new_render.endpoint;
            }
            if new_render.timeout_secs.is_some() {
                render.timeout_secs = new_render.timeout_secs;
            }
            if new_render.api_key.is_some() {
                render.api_key = new_render.api_key;
            }
        }
    }

    merged
}

/// Fill every unset field from the defaults.
pub fn resolve(partial: PartialConfig) -> IllustratorConfig {
    let mut config = IllustratorConfig::default();

    if let Some(paths) = partial.paths {
        if let Some(styles_dir) = paths.styles_dir {
            config.paths.styles_dir = styles_dir;
        }
        config.paths.output_dir = paths.output_dir;
    }

    if let Some(defaults) = partial.defaults {
        config.defaults.level = defaults.level;
        config.defaults.style = defaults.style;
    }

    if let Some(render) = partial.render {
        let r = &mut config.render;
        if let Some(model) = render.model {
            r.model = model;
        }
        if let Some(endpoint) = render.endpoint {
            r.endpoint = endpoint;
        }
        r.aspect_ratio = render.aspect_ratio.unwrap_or(r.aspect_ratio);
        r.resolution = render.resolution.unwrap_or(r.resolution);
        r.max_body_chars = render.max_body_chars.map_or(r.max_body_chars, NonZeroUsize::get);
        r.timeout_secs = render.timeout_secs.unwrap_or(r.timeout_secs);
        r.api_key = render.api_key;
    }

    config
}

/// Apply environment variable overrides
///
/// - GEMINI_API_KEY: image API key
/// - ILLUSTRATOR_MODEL: model name
/// - ILLUSTRATOR_STYLES_DIR: directory holding style files
/// - ILLUSTRATOR_ENDPOINT: API base URL
pub fn apply_env_overrides<F>(config: &mut IllustratorConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(key) = non_empty("GEMINI_API_KEY") {
        config.render.api_key = Some(key);
    }
    if let Some(model) = non_empty("ILLUSTRATOR_MODEL") {
        config.render.model = model;
    }
    if let Some(dir) = non_empty("ILLUSTRATOR_STYLES_DIR") {
        config.paths.styles_dir = dir;
    }
    if let Some(endpoint) = non_empty("ILLUSTRATOR_ENDPOINT") {
        config.render.endpoint = endpoint;
    }
}
