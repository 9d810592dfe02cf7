//! `repotag tag` command.

use clap::Args;
use repotag_core::config::ImageConfig;

#[derive(Args)]
pub struct ImageTagArgs {
    /// Source image (name, ID or ID prefix)
    pub source: String,

    /// New name for the image
    pub target: String,
}

pub async fn execute(
    args: ImageTagArgs,
    config: &ImageConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::open_image_store(config)?;

    let source = store.lookup(&args.source).await?;
    let name = store.tag(&source.id, &args.target).await?;

    println!("{name}");
    Ok(())
}
