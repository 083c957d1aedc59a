use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Recorded on every crawl run so stored products can be traced back to the
/// configuration that produced them.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecordFormat;
    use crate::extract::SkuMode;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[user-agent]
crawler-name = "TestCrawler"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[output]
database-path = "./test.db"
records-path = "./products.jsonl"
summary-path = "./summary.md"
"#;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_minimal_config_uses_site_defaults() {
        let file = create_temp_config(MINIMAL);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.site.name, "encuentro");
        assert_eq!(config.site.category_id, 109);
        assert_eq!(config.site.allowed_domains, vec!["encuentromoda.com"]);
        assert_eq!(config.rules.listings_css, "li.dropdown-item.dropdown a");
        assert_eq!(config.rules.products_css, ".carousel-item a");
        assert_eq!(config.extraction.sku_mode, SkuMode::Compatible);
        assert_eq!(config.crawler.max_concurrent_requests, 8);
        assert!(config.crawler.obey_robots_txt);
        assert_eq!(config.output.format, RecordFormat::Jsonl);
    }

    #[test]
    fn test_load_full_config() {
        let content = r#"
[site]
name = "shop"
allowed-domains = ["shop.example.com"]
start-url-template = "https://shop.example.com/c/{}"
category-id = 3
category-names = ["SALE"]

[rules]
listings-css = "nav a"
products-css = ".tile a"

[extraction]
sku-mode = "paired"

[crawler]
max-concurrent-requests = 2
download-delay = 250
request-timeout = 5
max-retries = 0
obey-robots-txt = false

[user-agent]
crawler-name = "TestCrawler"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[output]
database-path = "./test.db"
records-path = "./products.json"
format = "json"
summary-path = "./summary.md"
"#;

        let file = create_temp_config(content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.site.name, "shop");
        assert_eq!(
            config.site.seed_urls(),
            vec![
                "https://shop.example.com/c/1",
                "https://shop.example.com/c/2",
                "https://shop.example.com/c/SALE",
            ]
        );
        assert_eq!(config.extraction.sku_mode, SkuMode::Paired);
        assert_eq!(config.crawler.download_delay, 250);
        assert!(!config.crawler.obey_robots_txt);
        assert_eq!(config.output.format, RecordFormat::Json);
    }

    #[test]
    fn test_default_seeds_cover_ids_then_names() {
        let file = create_temp_config(MINIMAL);
        let config = load_config(file.path()).unwrap();
        let seeds = config.site.seed_urls();

        assert_eq!(seeds.len(), 108 + 3);
        assert!(seeds[0].contains("cgid=01&"));
        assert!(seeds[107].contains("cgid=0108&"));
        assert!(seeds[108].contains("cgid=0BIENESTAR&"));
        assert!(seeds[110].contains("cgid=0NOVEDADES&"));
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let content = format!("{}\n[crawler]\nmax-concurrent-requests = 0\n", MINIMAL);
        let file = create_temp_config(&content);
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_unknown_sku_mode_is_rejected() {
        let content = format!("{}\n[extraction]\nsku-mode = \"fuzzy\"\n", MINIMAL);
        let file = create_temp_config(&content);
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
