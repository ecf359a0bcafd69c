mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = ["./config.toml", "./shelfmark.toml"];

    for path_str in default_paths {
        let path = Path::new(path_str);
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    for root in &config.roots {
        if !root.path.exists() {
            tracing::warn!("Library root does not exist: {:?}", root.path);
        }
    }

    for feed in &config.feeds {
        if feed.url.is_empty() {
            anyhow::bail!("Feed subscription has an empty URL");
        }
        if !feed.url.starts_with("http://") && !feed.url.starts_with("https://") {
            anyhow::bail!("Feed URL must be http(s): {}", feed.url);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelfmark_common::MediaKind;
    use std::io::Write;

    #[test]
    fn parse_full_config() {
        let toml_src = r#"
            [[roots]]
            path = "/media/movies"
            kind = "movies"

            [[roots]]
            path = "/media/shows"
            kind = "tvshows"

            [[feeds]]
            url = "https://example.com/releases.xml"
            kind = "tvshows"

            [catalog]
            api_key = "secret"
            language = "de-DE"

            [scan]
            max_concurrency = 4
        "#;

        let config: Config = toml::from_str(toml_src).unwrap();
        assert_eq!(config.roots.len(), 2);
        assert_eq!(config.roots[1].kind, MediaKind::TvShows);
        assert_eq!(config.feeds.len(), 1);
        assert_eq!(config.catalog.api_key, "secret");
        assert_eq!(config.catalog.language, "de-DE");
        assert_eq!(config.scan.max_concurrency, 4);
        // base_url keeps its default when omitted
        assert_eq!(config.catalog.base_url, "https://api.themoviedb.org/3");
    }

    #[test]
    fn defaults_when_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.roots.is_empty());
        assert!(config.feeds.is_empty());
        assert_eq!(config.catalog.language, "en-US");
        assert!(config.scan.effective_concurrency() >= 2);
    }

    #[test]
    fn rejects_bad_feed_url() {
        let toml_src = r#"
            [[feeds]]
            url = "ftp://example.com/feed.xml"
        "#;
        let config: Config = toml::from_str(toml_src).unwrap();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[catalog]\napi_key = \"k\"\n\n[[feeds]]\nurl = \"https://example.com/f.json\"\n"
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.catalog.api_key, "k");
        assert_eq!(config.feeds.len(), 1);
    }

    #[test]
    fn missing_file_is_error() {
        assert!(load_config(Path::new("/nonexistent/config.toml")).is_err());
    }
}
