//! `repotag rmi` command.

use clap::Args;
use repotag_core::config::ImageConfig;

#[derive(Args)]
pub struct RmiArgs {
    /// Images to remove (name, ID or ID prefix)
    #[arg(required = true)]
    pub images: Vec<String>,

    /// Ignore images that cannot be found
    #[arg(short, long)]
    pub force: bool,
}

pub async fn execute(args: RmiArgs, config: &ImageConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::open_image_store(config)?;

    let mut errors: Vec<String> = Vec::new();

    for reference in &args.images {
        let result = match store.lookup(reference).await {
            Ok(image) => store.remove(&image.id).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(image) => println!("Deleted: {}", image.id),
            Err(repotag_core::ImageError::NotFound { .. }) if args.force => continue,
            Err(e) => errors.push(format!("{reference}: {e}")),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        let msg = errors.join("\n");
        Err(format!("Failed to remove image(s):\n{msg}").into())
    }
}
