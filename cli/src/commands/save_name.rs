//! `repotag save-name` command.

use clap::Args;
use repotag_core::config::ImageConfig;
use repotag_image::save_destination_name;

#[derive(Args)]
pub struct SaveNameArgs {
    /// Image as the user would pass it to save
    pub image: String,
}

pub async fn execute(
    args: SaveNameArgs,
    config: &ImageConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::open_image_store(config)?;
    let image = store.lookup(&args.image).await?;

    match save_destination_name(&image, &args.image, &config.default_local_registry) {
        Some(name) => println!("{name}"),
        None => println!("<none>"),
    }
    Ok(())
}
