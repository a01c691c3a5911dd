use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub generation: GenerationConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub intake: IntakeConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct GenerationConfig {
    pub provider: GenerationProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub health_check_port: u16,
    pub graceful_shutdown_secs: u64,
    /// Shared secret for the administrative seed/reset operation. When
    /// unset, the admin surface is disabled entirely.
    pub admin_token: Option<SecretString>,
}

/// Magic-link authentication is handled by an external provider; only its
/// sender address is configured here.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub email_from: String,
}

#[derive(Clone, Debug)]
pub struct IntakeConfig {
    /// Host the intake flow assigns new visits to.
    pub default_host_email: String,
    pub default_host_name: String,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationProvider {
    OpenAi,
    Anthropic,
    Ollama,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub generation_provider: Option<GenerationProvider>,
    pub generation_model: Option<String>,
    pub admin_token: Option<String>,
    pub default_host_email: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://showhome.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            generation: GenerationConfig {
                provider: GenerationProvider::Ollama,
                api_key: None,
                base_url: Some("http://localhost:11434".to_string()),
                model: "llama3.1".to_string(),
                timeout_secs: 60,
                max_retries: 2,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8090,
                health_check_port: 8091,
                graceful_shutdown_secs: 15,
                admin_token: None,
            },
            auth: AuthConfig { email_from: "no-reply@showhome.local".to_string() },
            intake: IntakeConfig {
                default_host_email: "sarah@example.com".to_string(),
                default_host_name: "Sarah P.".to_string(),
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for GenerationProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::Validation(format!(
                "unsupported generation provider `{other}` (expected openai|anthropic|ollama)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("showhome.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(generation) = patch.generation {
            if let Some(provider) = generation.provider {
                self.generation.provider = provider;
            }
            if let Some(api_key_value) = generation.api_key {
                self.generation.api_key = Some(secret_value(api_key_value));
            }
            if let Some(base_url) = generation.base_url {
                self.generation.base_url = Some(base_url);
            }
            if let Some(model) = generation.model {
                self.generation.model = model;
            }
            if let Some(timeout_secs) = generation.timeout_secs {
                self.generation.timeout_secs = timeout_secs;
            }
            if let Some(max_retries) = generation.max_retries {
                self.generation.max_retries = max_retries;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
            if let Some(admin_token_value) = server.admin_token {
                self.server.admin_token = Some(secret_value(admin_token_value));
            }
        }

        if let Some(auth) = patch.auth {
            if let Some(email_from) = auth.email_from {
                self.auth.email_from = email_from;
            }
        }

        if let Some(intake) = patch.intake {
            if let Some(default_host_email) = intake.default_host_email {
                self.intake.default_host_email = default_host_email;
            }
            if let Some(default_host_name) = intake.default_host_name {
                self.intake.default_host_name = default_host_name;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("SHOWHOME_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("SHOWHOME_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("SHOWHOME_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("SHOWHOME_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("SHOWHOME_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("SHOWHOME_GENERATION_PROVIDER") {
            self.generation.provider = value.parse()?;
        }
        if let Some(value) = read_env("SHOWHOME_GENERATION_API_KEY") {
            self.generation.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("SHOWHOME_GENERATION_BASE_URL") {
            self.generation.base_url = Some(value);
        }
        if let Some(value) = read_env("SHOWHOME_GENERATION_MODEL") {
            self.generation.model = value;
        }
        if let Some(value) = read_env("SHOWHOME_GENERATION_TIMEOUT_SECS") {
            self.generation.timeout_secs = parse_u64("SHOWHOME_GENERATION_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("SHOWHOME_GENERATION_MAX_RETRIES") {
            self.generation.max_retries = parse_u32("SHOWHOME_GENERATION_MAX_RETRIES", &value)?;
        }

        if let Some(value) = read_env("SHOWHOME_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("SHOWHOME_SERVER_PORT") {
            self.server.port = parse_u16("SHOWHOME_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("SHOWHOME_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port =
                parse_u16("SHOWHOME_SERVER_HEALTH_CHECK_PORT", &value)?;
        }
        if let Some(value) = read_env("SHOWHOME_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("SHOWHOME_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }
        if let Some(value) = read_env("SHOWHOME_SERVER_ADMIN_TOKEN") {
            self.server.admin_token = Some(secret_value(value));
        }

        if let Some(value) = read_env("SHOWHOME_AUTH_EMAIL_FROM") {
            self.auth.email_from = value;
        }

        if let Some(value) = read_env("SHOWHOME_INTAKE_DEFAULT_HOST_EMAIL") {
            self.intake.default_host_email = value;
        }
        if let Some(value) = read_env("SHOWHOME_INTAKE_DEFAULT_HOST_NAME") {
            self.intake.default_host_name = value;
        }

        let log_level =
            read_env("SHOWHOME_LOGGING_LEVEL").or_else(|| read_env("SHOWHOME_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("SHOWHOME_LOGGING_FORMAT").or_else(|| read_env("SHOWHOME_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(provider) = overrides.generation_provider {
            self.generation.provider = provider;
        }
        if let Some(model) = overrides.generation_model {
            self.generation.model = model;
        }
        if let Some(admin_token) = overrides.admin_token {
            self.server.admin_token = Some(secret_value(admin_token));
        }
        if let Some(default_host_email) = overrides.default_host_email {
            self.intake.default_host_email = default_host_email;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_generation(&self.generation)?;
        validate_server(&self.server)?;
        validate_auth(&self.auth)?;
        validate_intake(&self.intake)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("showhome.toml"), PathBuf::from("config/showhome.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_generation(generation: &GenerationConfig) -> Result<(), ConfigError> {
    if generation.timeout_secs == 0 || generation.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "generation.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    match generation.provider {
        GenerationProvider::OpenAi | GenerationProvider::Anthropic => {
            let missing = generation
                .api_key
                .as_ref()
                .map(|value| value.expose_secret().trim().is_empty())
                .unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "generation.api_key is required for openai/anthropic providers".to_string(),
                ));
            }
        }
        GenerationProvider::Ollama => {
            let missing =
                generation.base_url.as_ref().map(|value| value.trim().is_empty()).unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "generation.base_url is required for ollama provider".to_string(),
                ));
            }
        }
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.health_check_port == 0 {
        return Err(ConfigError::Validation(
            "server.health_check_port must be greater than zero".to_string(),
        ));
    }

    if server.port == server.health_check_port {
        return Err(ConfigError::Validation(
            "server.port and server.health_check_port must differ".to_string(),
        ));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    if let Some(token) = &server.admin_token {
        if token.expose_secret().trim().len() < 16 {
            return Err(ConfigError::Validation(
                "server.admin_token must be at least 16 characters".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_auth(auth: &AuthConfig) -> Result<(), ConfigError> {
    if !auth.email_from.contains('@') {
        return Err(ConfigError::Validation(
            "auth.email_from must be an email address".to_string(),
        ));
    }
    Ok(())
}

fn validate_intake(intake: &IntakeConfig) -> Result<(), ConfigError> {
    if !intake.default_host_email.contains('@') {
        return Err(ConfigError::Validation(
            "intake.default_host_email must be an email address".to_string(),
        ));
    }
    if intake.default_host_name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "intake.default_host_name must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    generation: Option<GenerationPatch>,
    server: Option<ServerPatch>,
    auth: Option<AuthPatch>,
    intake: Option<IntakePatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct GenerationPatch {
    provider: Option<GenerationProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    health_check_port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
    admin_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AuthPatch {
    email_from: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct IntakePatch {
    default_host_email: Option<String>,
    default_host_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, GenerationProvider, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_GENERATION_API_KEY", "sk-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("showhome.toml");
            fs::write(
                &path,
                r#"
[generation]
provider = "openai"
api_key = "${TEST_GENERATION_API_KEY}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config
                    .generation
                    .api_key
                    .as_ref()
                    .map(|key| key.expose_secret() == "sk-from-env")
                    .unwrap_or(false),
                "api key should be loaded from environment",
            )?;
            ensure(
                config.generation.provider == GenerationProvider::OpenAi,
                "provider should come from file",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_GENERATION_API_KEY"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SHOWHOME_LOG_LEVEL", "warn");
        env::set_var("SHOWHOME_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["SHOWHOME_LOG_LEVEL", "SHOWHOME_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SHOWHOME_DATABASE_URL", "sqlite://from-env.db");
        env::set_var("SHOWHOME_INTAKE_DEFAULT_HOST_EMAIL", "host-from-env@example.com");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("showhome.toml");
            fs::write(
                &path,
                r#"
[database]
url = "sqlite://from-file.db"

[intake]
default_host_email = "host-from-file@example.com"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://from-override.db",
                "override database url should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.intake.default_host_email == "host-from-env@example.com",
                "env host email should win over file and defaults",
            )?;
            Ok(())
        })();

        clear_vars(&["SHOWHOME_DATABASE_URL", "SHOWHOME_INTAKE_DEFAULT_HOST_EMAIL"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SHOWHOME_GENERATION_PROVIDER", "openai");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("generation.api_key")
            );
            ensure(has_message, "validation failure should mention generation.api_key")
        })();

        clear_vars(&["SHOWHOME_GENERATION_PROVIDER"]);
        result
    }

    #[test]
    fn short_admin_token_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SHOWHOME_SERVER_ADMIN_TOKEN", "short");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("expected validation failure".to_string()),
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("server.admin_token")
            );
            ensure(has_message, "validation failure should mention server.admin_token")
        })();

        clear_vars(&["SHOWHOME_SERVER_ADMIN_TOKEN"]);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("SHOWHOME_GENERATION_API_KEY", "sk-secret-value");
        env::set_var("SHOWHOME_SERVER_ADMIN_TOKEN", "admin-secret-token-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("sk-secret-value"), "debug output should not contain api key")?;
            ensure(
                !debug.contains("admin-secret-token-value"),
                "debug output should not contain admin token",
            )?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )?;
            Ok(())
        })();

        clear_vars(&["SHOWHOME_GENERATION_API_KEY", "SHOWHOME_SERVER_ADMIN_TOKEN"]);
        result
    }
}
