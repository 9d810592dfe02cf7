//! `repotag resolve` command.

use clap::Args;
use repotag_core::config::ImageConfig;
use repotag_image::Resolver;

#[derive(Args)]
pub struct ResolveArgs {
    /// Name to resolve (e.g., "app", "org/app:v1")
    pub image: String,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: ResolveArgs, config: &ImageConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::open_image_store(config)?;
    let images = store.list().await;

    let resolution = Resolver::from_config(config).resolve(&args.image, &images)?;
    if resolution.skipped > 0 {
        tracing::warn!(
            skipped = resolution.skipped,
            "Some stored names could not be parsed and were ignored"
        );
    }

    if args.json {
        let out = serde_json::json!({
            "id": resolution.image.id,
            "name": resolution.name,
            "read_only": resolution.image.read_only,
            "skipped_names": resolution.skipped,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}\t{}", resolution.image.short_id(), resolution.name);
    }
    Ok(())
}
