//! `repotag images` command.

use clap::Args;
use repotag_core::config::ImageConfig;
use repotag_image::{ImageReference, LocalImage};

use crate::output;

const HEADERS: [&str; 5] = ["IMAGE ID", "REPOSITORY", "TAG", "READ-ONLY", "CREATED"];

#[derive(Args)]
pub struct ImagesArgs {
    /// Only show image IDs (one per line)
    #[arg(short, long)]
    pub quiet: bool,

    /// Format output using placeholders: {{.ID}}, {{.Repository}}, {{.Tag}},
    /// {{.ReadOnly}}, {{.Created}}
    #[arg(long)]
    pub format: Option<String>,
}

pub async fn execute(args: ImagesArgs, config: &ImageConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = super::open_image_store(config)?;
    let images = store.list().await;

    // --quiet: print only IDs
    if args.quiet {
        for image in &images {
            println!("{}", image.id);
        }
        return Ok(());
    }

    let rows: Vec<ImageRow> = images.iter().flat_map(ImageRow::from_image).collect();

    if let Some(ref fmt) = args.format {
        for row in &rows {
            println!("{}", row.apply_format(fmt));
        }
        return Ok(());
    }

    let mut table = output::new_table(&HEADERS);
    for row in &rows {
        table.add_row(&[
            &row.id,
            &row.repository,
            &row.tag,
            &row.read_only,
            &row.created,
        ]);
    }

    println!("{table}");
    Ok(())
}

/// Display fields for one name of one image.
struct ImageRow {
    id: String,
    repository: String,
    tag: String,
    read_only: String,
    created: String,
}

impl ImageRow {
    /// One row per name; a nameless image gets a single `<none>` row.
    fn from_image(image: &LocalImage) -> Vec<Self> {
        let row = |repository: String, tag: String| Self {
            id: image.short_id().to_string(),
            repository,
            tag,
            read_only: image.read_only.to_string(),
            created: output::format_ago(&image.created_at),
        };

        if image.names.is_empty() {
            return vec![row("<none>".to_string(), "<none>".to_string())];
        }

        image
            .names
            .iter()
            .map(|name| match ImageReference::parse(name) {
                Ok(r) => {
                    let tag = r.tag.clone().unwrap_or_else(|| "<none>".to_string());
                    row(r.name(), tag)
                }
                Err(_) => row(name.clone(), "<none>".to_string()),
            })
            .collect()
    }

    /// Apply a format template, replacing `{{.Field}}` placeholders.
    fn apply_format(&self, fmt: &str) -> String {
        fmt.replace("{{.ID}}", &self.id)
            .replace("{{.Repository}}", &self.repository)
            .replace("{{.Tag}}", &self.tag)
            .replace("{{.ReadOnly}}", &self.read_only)
            .replace("{{.Created}}", &self.created)
    }
}
