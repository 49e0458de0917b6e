//! Runtime configuration read from the environment.

use std::env;
use std::path::PathBuf;

use url::Url;

/// Default number of items per page in paginated listings.
pub const DEFAULT_PAGE_SIZE: u32 = 6;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Public base URL, used to build absolute media, pagination and
    /// short link URLs.
    pub base_url: Url,
    /// Directory uploaded images are written to.
    pub media_root: PathBuf,
    pub page_size: u32,
}

impl AppConfig {
    /// Load configuration from the environment. Everything has a
    /// development default; only a malformed value is an error.
    pub fn from_env() -> Result<Self, String> {
        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| format!("invalid PORT value: {}", raw))?,
            Err(_) => 8080,
        };

        let base_url = match env::var("BASE_URL") {
            Ok(raw) => Url::parse(&raw).map_err(|e| format!("invalid BASE_URL: {}", e))?,
            Err(_) => Url::parse(&format!("http://localhost:{}", port))
                .map_err(|e| format!("failed to build default base URL: {}", e))?,
        };

        let media_root = env::var("MEDIA_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("media"));

        let page_size = match env::var("PAGE_SIZE") {
            Ok(raw) => raw
                .parse::<u32>()
                .map_err(|_| format!("invalid PAGE_SIZE value: {}", raw))?,
            Err(_) => DEFAULT_PAGE_SIZE,
        };

        Ok(Self {
            port,
            base_url,
            media_root,
            page_size,
        })
    }

    /// Absolute URL for a stored media path.
    pub fn media_url(&self, relative: &str) -> String {
        let mut url = self.base_url.clone();
        url.set_path(&format!("/media/{}", relative));
        url.to_string()
    }

    /// Absolute URL for a short link token.
    pub fn short_link_url(&self, token: &str) -> String {
        let mut url = self.base_url.clone();
        url.set_path(&format!("/s/{}/", token));
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        AppConfig {
            port: 8080,
            base_url: Url::parse("https://food.example.org").unwrap(),
            media_root: PathBuf::from("/tmp/media"),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    #[test]
    fn media_url_joins_base_and_path() {
        let config = test_config();
        assert_eq!(
            config.media_url("recipes/abc.png"),
            "https://food.example.org/media/recipes/abc.png"
        );
    }

    #[test]
    fn short_link_url_keeps_trailing_slash() {
        let config = test_config();
        assert_eq!(
            config.short_link_url("Ab3xYz"),
            "https://food.example.org/s/Ab3xYz/"
        );
    }
}
