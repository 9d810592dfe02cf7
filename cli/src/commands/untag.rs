//! `repotag untag` command.

use clap::Args;
use repotag_core::config::ImageConfig;

#[derive(Args)]
pub struct UntagArgs {
    /// Image (name, ID or ID prefix)
    pub image: String,

    /// Names to remove
    #[arg(required = true)]
    pub names: Vec<String>,
}

pub async fn execute(args: UntagArgs, config: &ImageConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::open_image_store(config)?;
    let image = store.lookup(&args.image).await?;

    for name in &args.names {
        store.untag(&image.id, name).await?;
        println!("Untagged: {name}");
    }
    Ok(())
}
