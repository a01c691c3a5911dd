use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use showhome_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_key: &str| {
        field_source(key_path, env_key, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "database.url",
        &config.database.url,
        source("database.url", "SHOWHOME_DATABASE_URL"),
    ));
    lines.push(render_line(
        "database.max_connections",
        &config.database.max_connections.to_string(),
        source("database.max_connections", "SHOWHOME_DATABASE_MAX_CONNECTIONS"),
    ));
    lines.push(render_line(
        "database.timeout_secs",
        &config.database.timeout_secs.to_string(),
        source("database.timeout_secs", "SHOWHOME_DATABASE_TIMEOUT_SECS"),
    ));

    lines.push(render_line(
        "generation.provider",
        &format!("{:?}", config.generation.provider),
        source("generation.provider", "SHOWHOME_GENERATION_PROVIDER"),
    ));
    lines.push(render_line(
        "generation.model",
        &config.generation.model,
        source("generation.model", "SHOWHOME_GENERATION_MODEL"),
    ));
    lines.push(render_line(
        "generation.base_url",
        config.generation.base_url.as_deref().unwrap_or("<unset>"),
        source("generation.base_url", "SHOWHOME_GENERATION_BASE_URL"),
    ));
    let generation_api_key =
        if config.generation.api_key.is_some() { "<redacted>" } else { "<unset>" };
    lines.push(render_line(
        "generation.api_key",
        generation_api_key,
        source("generation.api_key", "SHOWHOME_GENERATION_API_KEY"),
    ));
    lines.push(render_line(
        "generation.timeout_secs",
        &config.generation.timeout_secs.to_string(),
        source("generation.timeout_secs", "SHOWHOME_GENERATION_TIMEOUT_SECS"),
    ));

    lines.push(render_line(
        "server.bind_address",
        &config.server.bind_address,
        source("server.bind_address", "SHOWHOME_SERVER_BIND_ADDRESS"),
    ));
    lines.push(render_line(
        "server.port",
        &config.server.port.to_string(),
        source("server.port", "SHOWHOME_SERVER_PORT"),
    ));
    lines.push(render_line(
        "server.health_check_port",
        &config.server.health_check_port.to_string(),
        source("server.health_check_port", "SHOWHOME_SERVER_HEALTH_CHECK_PORT"),
    ));
    let admin_token = if config.server.admin_token.is_some() { "<redacted>" } else { "<unset>" };
    lines.push(render_line(
        "server.admin_token",
        admin_token,
        source("server.admin_token", "SHOWHOME_SERVER_ADMIN_TOKEN"),
    ));

    lines.push(render_line(
        "auth.email_from",
        &config.auth.email_from,
        source("auth.email_from", "SHOWHOME_AUTH_EMAIL_FROM"),
    ));

    lines.push(render_line(
        "intake.default_host_email",
        &config.intake.default_host_email,
        source("intake.default_host_email", "SHOWHOME_INTAKE_DEFAULT_HOST_EMAIL"),
    ));
    lines.push(render_line(
        "intake.default_host_name",
        &config.intake.default_host_name,
        source("intake.default_host_name", "SHOWHOME_INTAKE_DEFAULT_HOST_NAME"),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", "SHOWHOME_LOGGING_LEVEL"),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", "SHOWHOME_LOGGING_FORMAT"),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("showhome.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/showhome.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
