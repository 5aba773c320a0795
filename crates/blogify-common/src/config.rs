use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

/// Connection settings for the managed backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`
    pub url: Url,
    /// Public (anon) API key sent with every request
    pub anon_key: String,
    /// Storage bucket holding cover images
    #[serde(default = "default_bucket")]
    pub bucket: String,
    #[serde(default)]
    pub tables: TableNames,
    #[serde(default)]
    pub oauth: OAuthConfig,
}

fn default_bucket() -> String {
    BackendConfig::DEFAULT_BUCKET.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableNames {
    pub blogs: String,
    pub profiles: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            blogs: "blogs".into(),
            profiles: "profiles".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    /// Identity provider passed to the authorize endpoint
    pub provider: String,
    /// Where the provider sends the browser back to. None uses the backend default.
    #[serde(default)]
    pub redirect_to: Option<Url>,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            provider: "github".into(),
            redirect_to: None,
        }
    }
}

impl BackendConfig {
    pub const DEFAULT_BUCKET: &'static str = "blog-images";

    pub fn new(url: Url, anon_key: impl Into<String>) -> Self {
        Self {
            url,
            anon_key: anon_key.into(),
            bucket: default_bucket(),
            tables: TableNames::default(),
            oauth: OAuthConfig::default(),
        }
    }

    /// Load configuration from environment variables, reading `.env` first if present.
    ///
    /// Required env vars:
    /// - `BLOGIFY_BACKEND_URL`: project base URL
    /// - `BLOGIFY_ANON_KEY`: public API key
    ///
    /// Optional env vars:
    /// - `BLOGIFY_BUCKET`: cover image bucket (default: blog-images)
    /// - `BLOGIFY_OAUTH_PROVIDER`: identity provider (default: github)
    /// - `BLOGIFY_OAUTH_REDIRECT`: post-login redirect URL
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            tracing::trace!(error = %e, "no .env loaded");
        }

        let url_str = std::env::var("BLOGIFY_BACKEND_URL").map_err(|_| ConfigError::MissingEnv {
            var: "BLOGIFY_BACKEND_URL",
        })?;
        let url = parse_url(url_str)?;

        let anon_key = std::env::var("BLOGIFY_ANON_KEY").map_err(|_| ConfigError::MissingEnv {
            var: "BLOGIFY_ANON_KEY",
        })?;

        let mut config = Self::new(url, anon_key);
        if let Ok(bucket) = std::env::var("BLOGIFY_BUCKET") {
            config.bucket = bucket;
        }
        if let Ok(provider) = std::env::var("BLOGIFY_OAUTH_PROVIDER") {
            config.oauth.provider = provider;
        }
        if let Ok(redirect) = std::env::var("BLOGIFY_OAUTH_REDIRECT") {
            config.oauth.redirect_to = Some(parse_url(redirect)?);
        }
        Ok(config)
    }

    /// Load a TOML config file. `$VAR` references are replaced with the
    /// matching environment variable before parsing.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&substitute_env(raw, std::env::vars()), path)
    }

    fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

fn parse_url(url: String) -> Result<Url, ConfigError> {
    Url::parse(&url).map_err(|e| ConfigError::UrlParse {
        message: e.to_string(),
        url,
    })
}

fn substitute_env(mut text: String, vars: impl IntoIterator<Item = (String, String)>) -> String {
    // Longest names first so `$FOO_BAR` is not clobbered by `$FOO`.
    let mut vars: Vec<_> = vars.into_iter().collect();
    vars.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    for (k, v) in vars {
        text = text.replace(&format!("${}", k), &v);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_defaults() {
        let text = r#"
            url = "https://project.example.co"
            anon_key = "anon"
        "#;
        let config = BackendConfig::parse(text, Path::new("blogify.toml")).unwrap();
        assert_eq!(config.bucket, "blog-images");
        assert_eq!(config.tables.blogs, "blogs");
        assert_eq!(config.tables.profiles, "profiles");
        assert_eq!(config.oauth.provider, "github");
        assert!(config.oauth.redirect_to.is_none());
    }

    #[test]
    fn test_env_substitution() {
        let text = "anon_key = \"$BLOGIFY_TEST_KEY\"\nother = \"$BLOGIFY_TEST\"".to_string();
        let vars = vec![
            ("BLOGIFY_TEST".to_string(), "short".to_string()),
            ("BLOGIFY_TEST_KEY".to_string(), "secret".to_string()),
        ];
        let out = substitute_env(text, vars);
        assert_eq!(out, "anon_key = \"secret\"\nother = \"short\"");
    }

    #[test]
    fn test_invalid_url_rejected() {
        let text = r#"
            url = "not a url"
            anon_key = "anon"
        "#;
        let err = BackendConfig::parse(text, Path::new("blogify.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
