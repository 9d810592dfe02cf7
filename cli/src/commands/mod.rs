//! CLI command definitions and dispatch.

mod image_tag;
mod images;
mod resolve;
mod rmi;
mod save_name;
mod untag;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use repotag_core::config::{default_config_path, ImageConfig};
use repotag_image::ImageStore;

/// repotag: resolve and name local container images.
#[derive(Parser)]
#[command(name = "repotag", version, about)]
pub struct Cli {
    /// Configuration file (default: ~/.repotag/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Image store directory, overriding the configuration file
    #[arg(long, global = true)]
    pub store_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Load the configuration file and apply command-line overrides.
    pub fn load_config(&self) -> repotag_core::Result<ImageConfig> {
        let path = self.config.clone().unwrap_or_else(default_config_path);
        let mut config = ImageConfig::load(&path)?;
        if let Some(ref dir) = self.store_dir {
            config.store_dir = dir.clone();
        }
        Ok(config)
    }
}

/// Available commands.
#[derive(Subcommand)]
pub enum Command {
    /// List local images and their names
    Images(images::ImagesArgs),
    /// Show which image a name refers to
    Resolve(resolve::ResolveArgs),
    /// Add a name to an image
    Tag(image_tag::ImageTagArgs),
    /// Remove names from an image
    Untag(untag::UntagArgs),
    /// Remove one or more images
    Rmi(rmi::RmiArgs),
    /// Print the name an image would be saved under
    SaveName(save_name::SaveNameArgs),
}

/// Open the image store described by `config`.
pub(crate) fn open_image_store(
    config: &ImageConfig,
) -> Result<ImageStore, Box<dyn std::error::Error>> {
    let store = ImageStore::open(config)?;
    Ok(store)
}

/// Dispatch a parsed CLI to the appropriate command handler.
pub async fn dispatch(cli: Cli, config: ImageConfig) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Images(args) => images::execute(args, &config).await,
        Command::Resolve(args) => resolve::execute(args, &config).await,
        Command::Tag(args) => image_tag::execute(args, &config).await,
        Command::Untag(args) => untag::execute(args, &config).await,
        Command::Rmi(args) => rmi::execute(args, &config).await,
        Command::SaveName(args) => save_name::execute(args, &config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_resolve() {
        let cli = Cli::try_parse_from(["repotag", "resolve", "app:v1", "--json"]).unwrap();
        match cli.command {
            Command::Resolve(args) => {
                assert_eq!(args.image, "app:v1");
                assert!(args.json);
            }
            _ => panic!("expected resolve"),
        }
    }

    #[test]
    fn test_parse_save_name() {
        let cli = Cli::try_parse_from(["repotag", "save-name", "foo"]).unwrap();
        assert!(matches!(cli.command, Command::SaveName(_)));
    }

    #[test]
    fn test_rmi_requires_image() {
        assert!(Cli::try_parse_from(["repotag", "rmi"]).is_err());
    }

    #[test]
    fn test_load_config_with_overrides() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.yaml");
        std::fs::write(&config_path, "default_local_registry: local.dev\n").unwrap();

        let cli = Cli::try_parse_from([
            "repotag",
            "--config",
            config_path.to_str().unwrap(),
            "--store-dir",
            "/tmp/store",
            "images",
        ])
        .unwrap();
        let config = cli.load_config().unwrap();
        assert_eq!(config.default_local_registry, "local.dev");
        assert_eq!(config.store_dir, PathBuf::from("/tmp/store"));
    }

    #[tokio::test]
    async fn test_dispatch_against_temp_store() {
        let tmp = TempDir::new().unwrap();
        let config = ImageConfig {
            store_dir: tmp.path().to_path_buf(),
            ..Default::default()
        };
        let store = open_image_store(&config).unwrap();
        store
            .add(repotag_image::LocalImage::new(
                "abc123def456",
                vec!["app".to_string()],
                false,
            ))
            .await
            .unwrap();
        drop(store);

        let cli = Cli::try_parse_from(["repotag", "tag", "app", "app:v2"]).unwrap();
        dispatch(cli, config.clone()).await.unwrap();

        // Both names share the repository, so a name lookup is ambiguous.
        let cli = Cli::try_parse_from(["repotag", "resolve", "app:v2"]).unwrap();
        assert!(dispatch(cli, config.clone()).await.is_err());

        let cli = Cli::try_parse_from(["repotag", "save-name", "abc123def456"]).unwrap();
        dispatch(cli, config.clone()).await.unwrap();

        let cli = Cli::try_parse_from(["repotag", "rmi", "nothing-here"]).unwrap();
        assert!(dispatch(cli, config.clone()).await.is_err());

        let store = open_image_store(&config).unwrap();
        let image = store.get("abc123def456").await.unwrap();
        assert_eq!(
            image.names,
            vec!["localhost/app:latest", "localhost/app:v2"]
        );
    }
}
