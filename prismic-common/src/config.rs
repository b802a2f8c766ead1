//! Source options loading and validation
//!
//! Options come from a TOML file. The file is located in priority order:
//! 1. Command-line argument
//! 2. `PRISMIC_CONFIG` environment variable
//! 3. `./prismic.toml`
//! 4. `<platform config dir>/prismic/prismic.toml`

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{Error, Result};

pub const CONFIG_FILE_NAME: &str = "prismic.toml";
pub const CONFIG_PATH_ENV: &str = "PRISMIC_CONFIG";
pub const ACCESS_TOKEN_ENV: &str = "PRISMIC_ACCESS_TOKEN";

/// Which context the options are validated for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    /// Offline build with schemas on disk
    Build,
    /// Preview of a single document; schemas are optional
    Preview,
}

/// Logging section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    /// Optional log file path
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Options shared by the build and preview contexts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceOptions {
    pub repository_name: String,
    pub access_token: Option<String>,
    /// Language filter; `*` for every language
    pub lang: String,
    /// Link expansion hints, `<contentType>.<field>`
    pub fetch_links: Vec<String>,
    /// Directory of `<contentTypeId>.json` schema files
    pub schemas_dir: Option<PathBuf>,
    /// Maximum documents normalized at once
    pub concurrent_file_requests: usize,
    pub type_paths_filename_prefix: Option<String>,
    pub output_dir: PathBuf,
    /// Downloaded media lands here
    pub cache_dir: PathBuf,
    /// Download images into `cache_dir`
    pub normalize_images: bool,
    /// Override of `https://<repository_name>.cdn.prismic.io/api/v2`
    pub api_endpoint: Option<String>,
    pub requests_per_second: Option<u32>,
    pub logging: LoggingConfig,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            repository_name: String::new(),
            access_token: None,
            lang: "*".to_string(),
            fetch_links: Vec::new(),
            schemas_dir: None,
            concurrent_file_requests: 20,
            type_paths_filename_prefix: None,
            output_dir: PathBuf::from("public"),
            cache_dir: PathBuf::from(".cache/prismic"),
            normalize_images: true,
            api_endpoint: None,
            requests_per_second: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl SourceOptions {
    pub fn new(repository_name: impl Into<String>) -> Self {
        Self {
            repository_name: repository_name.into(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid options file: {}", e)))
    }

    /// Load options from the first config file found
    ///
    /// A missing `access_token` is taken from `PRISMIC_ACCESS_TOKEN`.
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let path = resolve_config_path(cli_path)?;
        debug!(path = %path.display(), "Loading options");

        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        let mut options = Self::from_toml_str(&content)?;
        options.apply_env();
        Ok(options)
    }

    /// Fill unset values from the environment
    pub fn apply_env(&mut self) {
        if self.access_token.as_deref().map_or(true, str::is_empty) {
            if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
                if !token.is_empty() {
                    self.access_token = Some(token);
                }
            }
        }
    }

    /// Check every option, reporting all problems at once
    pub fn validate(&self, context: Context) -> Result<()> {
        let mut problems = Vec::new();

        if self.repository_name.trim().is_empty() {
            problems.push("repository_name is required".to_string());
        }
        if self.access_token.as_deref().map_or(true, str::is_empty) {
            problems.push("access_token is required".to_string());
        }
        if self.lang.trim().is_empty() {
            problems.push("lang must not be empty".to_string());
        }
        for (i, link) in self.fetch_links.iter().enumerate() {
            if link.trim().is_empty() {
                problems.push(format!("fetch_links[{}] must be a non-empty string", i));
            }
        }
        if self.concurrent_file_requests < 1 {
            problems.push("concurrent_file_requests must be at least 1".to_string());
        }
        if self.requests_per_second == Some(0) {
            problems.push("requests_per_second must be at least 1".to_string());
        }
        if context == Context::Build && self.schemas_dir.is_none() {
            problems.push("schemas_dir is required".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::Config(problems.join(", ")))
        }
    }

    /// Prefix of the persisted type-path index file name
    pub fn type_paths_prefix(&self) -> String {
        self.type_paths_filename_prefix
            .clone()
            .unwrap_or_else(|| format!("prismic-typepaths---{}-", self.repository_name))
    }

    /// Content API root
    pub fn endpoint(&self) -> String {
        self.api_endpoint
            .clone()
            .unwrap_or_else(|| format!("https://{}.cdn.prismic.io/api/v2", self.repository_name))
    }
}

/// Locate the options file
pub fn resolve_config_path(cli_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = cli_path {
        return Ok(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Ok(local);
    }

    if let Some(path) = dirs::config_dir().map(|d| d.join("prismic").join(CONFIG_FILE_NAME)) {
        if path.exists() {
            return Ok(path);
        }
    }

    Err(Error::Config(format!(
        "No options file found (pass --config, set {} or create ./{})",
        CONFIG_PATH_ENV, CONFIG_FILE_NAME
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let options = SourceOptions::from_toml_str("repository_name = \"repo\"").unwrap();
        assert_eq!(options.lang, "*");
        assert_eq!(options.concurrent_file_requests, 20);
        assert!(options.normalize_images);
        assert_eq!(options.type_paths_prefix(), "prismic-typepaths---repo-");
        assert_eq!(options.endpoint(), "https://repo.cdn.prismic.io/api/v2");
        assert_eq!(options.logging.level, "info");
    }

    #[test]
    fn test_validation_reports_every_problem() {
        let options = SourceOptions {
            concurrent_file_requests: 0,
            fetch_links: vec!["page.title".to_string(), "".to_string()],
            ..SourceOptions::default()
        };
        let Err(Error::Config(msg)) = options.validate(Context::Build) else {
            panic!("expected config error");
        };
        assert_eq!(
            msg,
            "repository_name is required, access_token is required, fetch_links[1] must be a non-empty string, concurrent_file_requests must be at least 1, schemas_dir is required"
        );
    }

    #[test]
    fn test_preview_does_not_need_schemas() {
        let options = SourceOptions {
            access_token: Some("token".to_string()),
            ..SourceOptions::new("repo")
        };
        assert!(options.validate(Context::Preview).is_ok());
        assert!(options.validate(Context::Build).is_err());
    }

    #[test]
    fn test_parse_full_file() {
        let options = SourceOptions::from_toml_str(
            r#"
            repository_name = "repo"
            access_token = "secret"
            lang = "en-us"
            fetch_links = ["author.name"]
            schemas_dir = "schemas"
            concurrent_file_requests = 4
            normalize_images = false
            requests_per_second = 10

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(options.fetch_links, vec!["author.name"]);
        assert_eq!(options.schemas_dir, Some(PathBuf::from("schemas")));
        assert_eq!(options.concurrent_file_requests, 4);
        assert!(!options.normalize_images);
        assert_eq!(options.logging.level, "debug");
        assert!(options.validate(Context::Build).is_ok());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        assert!(matches!(
            SourceOptions::from_toml_str("concurrent_file_requests = \"many\""),
            Err(Error::Config(_))
        ));
    }

    #[test]
    #[serial]
    fn test_load_from_env_path_with_env_token() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "repository_name = \"repo\"").unwrap();

        std::env::set_var(CONFIG_PATH_ENV, file.path());
        std::env::set_var(ACCESS_TOKEN_ENV, "from-env");
        let options = SourceOptions::load(None);
        std::env::remove_var(CONFIG_PATH_ENV);
        std::env::remove_var(ACCESS_TOKEN_ENV);

        let options = options.unwrap();
        assert_eq!(options.repository_name, "repo");
        assert_eq!(options.access_token.as_deref(), Some("from-env"));
    }

    #[test]
    #[serial]
    fn test_cli_path_wins_over_env() {
        std::env::set_var(CONFIG_PATH_ENV, "/nonexistent/prismic.toml");
        let path = resolve_config_path(Some(Path::new("custom.toml")));
        std::env::remove_var(CONFIG_PATH_ENV);
        assert_eq!(path.unwrap(), PathBuf::from("custom.toml"));
    }
}
