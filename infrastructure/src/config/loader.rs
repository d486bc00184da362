//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "live-chat";
const PROJECT_FILES: [&str; 2] = ["live-chat.toml", ".live-chat.toml"];

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. Explicit config path (if provided)
    /// 2. Project root: `./live-chat.toml` or `./.live-chat.toml`
    /// 3. XDG config: `$XDG_CONFIG_HOME/live-chat/config.toml`
    /// 4. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        Self::load_from(
            Self::global_config_path().as_deref(),
            Self::project_config_path().as_deref(),
            config_path.map(PathBuf::as_path),
        )
    }

    /// Merge the given files over the defaults, lowest priority first.
    pub fn load_from(
        global: Option<&Path>,
        project: Option<&Path>,
        explicit: Option<&Path>,
    ) -> Result<FileConfig, Box<figment::Error>> {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        for path in [global, project].into_iter().flatten() {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }

        // An explicit path that does not exist is an error, not a silent skip
        if let Some(path) = explicit {
            figment = figment.merge(Toml::file_exact(path));
        }

        figment.extract().map_err(Box::new)
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/live-chat/config.toml if set,
    /// otherwise the platform config dir.
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Print the config file locations being used (for --show-config)
    pub fn print_config_sources(explicit: Option<&PathBuf>) {
        println!("Configuration sources (in priority order):");

        if let Some(path) = explicit {
            let mark = if path.exists() { "FOUND" } else { "MISSING" };
            println!("  [{mark:^7}] Explicit: {}", path.display());
        }

        if let Some(path) = Self::project_config_path() {
            println!("  [ FOUND ] Project:  {}", path.display());
        } else {
            println!("  [       ] Project:  ./live-chat.toml or ./.live-chat.toml");
        }

        if let Some(path) = Self::global_config_path() {
            if path.exists() {
                println!("  [ FOUND ] Global:   {}", path.display());
            } else {
                println!("  [       ] Global:   {}", path.display());
            }
        }

        println!("  [       ] Default:  built-in defaults");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert_eq!(config.timeouts.connect_seconds, 10);
        assert!(config.repl.show_progress);
    }

    #[test]
    fn test_global_config_path_returns_some() {
        // Should return a path (even if file doesn't exist)
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("live-chat"));
    }

    #[test]
    fn test_load_without_files_gives_defaults() {
        let config = ConfigLoader::load_from(None, None, None).unwrap();
        assert_eq!(config.timeouts.reply_seconds, 30);
        assert_eq!(config.session.model, FileConfig::default().session.model);
    }

    #[test]
    fn test_priority_order() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("global.toml");
        let project = dir.path().join("project.toml");
        let explicit = dir.path().join("explicit.toml");

        fs::write(
            &global,
            "[timeouts]\nconnect_seconds = 1\nsession_ack_seconds = 2\nreply_seconds = 3\n",
        )
        .unwrap();
        fs::write(&project, "[timeouts]\nsession_ack_seconds = 20\nreply_seconds = 30\n").unwrap();
        fs::write(&explicit, "[timeouts]\nreply_seconds = 300\n").unwrap();

        let config =
            ConfigLoader::load_from(Some(&global), Some(&project), Some(&explicit)).unwrap();
        assert_eq!(config.timeouts.connect_seconds, 1);
        assert_eq!(config.timeouts.session_ack_seconds, 20);
        assert_eq!(config.timeouts.reply_seconds, 300);
    }

    #[test]
    fn test_missing_global_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let config =
            ConfigLoader::load_from(Some(&dir.path().join("nope.toml")), None, None).unwrap();
        assert_eq!(config.timeouts.connect_seconds, 10);
    }

    #[test]
    fn test_missing_explicit_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConfigLoader::load_from(None, None, Some(&dir.path().join("nope.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("live-chat.toml");
        fs::write(&project, "[timeouts]\nreply_seconds = \"soon\"\n").unwrap();
        assert!(ConfigLoader::load_from(None, Some(&project), None).is_err());
    }
}
