use clap::{Parser, Subcommand};
use galerie::config::GalleryConfig;
use galerie::gallery::Gallery;
use galerie::moderation::Upload;
use galerie::rename;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "galerie")]
#[command(version)]
#[command(about = "Media catalog and moderation core for a private event gallery")]
#[command(long_about = "\
Media catalog and moderation core for a private event gallery

Your filesystem is the data source. Two directory levels under the media
root form the catalog:

  media/
  ├── Photos Professionnelles/     # category (audience from name markers)
  │   └── Cérémonie/               # folder
  │       ├── 001.jpg              # image → AVIF thumbnail + web rendition
  │       └── entrée.mp4           # video → rendered placeholder thumbnail
  ├── Photos Invités/
  │   └── Téléversements/          # default destination for approved uploads
  └── Pending/                     # moderation staging — never published,
      └── guest-upload.jpg         #   never exported, never optimized

Derived artifacts live under the cache root, keyed by a hash of the logical
path, and are regenerated whenever the source is newer. All commands read
the same TOML config (missing file = defaults).")]
struct Cli {
    /// Config file
    #[arg(long, default_value = "galerie.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the media tree and print the catalog as JSON
    Catalog,
    /// Generate or refresh every derived artifact
    Optimize,
    /// Delete cached artifacts that no longer match any media file
    CleanCache,
    /// Export originals as a ZIP archive
    Export {
        /// Limit to one folder, addressed as "Category/Folder"
        #[arg(long)]
        folder: Option<String>,
        /// Where to write the archive
        #[arg(long, default_value = "gallery.zip")]
        output: PathBuf,
    },
    /// Moderation queue operations
    #[command(subcommand)]
    Pending(PendingCommand),
    /// Prefix image filenames with their EXIF capture date (one-shot)
    RenameExif {
        /// Directory to process; defaults to the media root
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum PendingCommand {
    /// List uploads awaiting moderation, newest first
    List,
    /// Stage files (media or ZIP archives) for moderation
    Ingest { files: Vec<PathBuf> },
    /// Publish pending uploads into the configured destination
    Approve { names: Vec<String> },
    /// Delete pending uploads permanently
    Reject { names: Vec<String> },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = GalleryConfig::load(&cli.config)?;
    let gallery = Gallery::new(config)?;

    match cli.command {
        Command::Catalog => {
            let view = gallery.catalog()?;
            let body = serde_json::json!({
                "cached": view.cached,
                "categories": &view.catalog.categories,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Command::Optimize => {
            let stats = gallery.optimize_all()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::CleanCache => {
            let stats = gallery.sweep_cache()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Export { folder, output } => {
            let sink = std::fs::File::create(&output)?;
            let written = match folder {
                Some(path) => gallery.export_folder(&path, sink)?,
                None => gallery.export_all(sink)?,
            };
            println!("{} files → {}", written, output.display());
        }
        Command::Pending(pending) => run_pending(&gallery, pending)?,
        Command::RenameExif { dir } => {
            let target = dir.unwrap_or_else(|| gallery.config().media_root.clone());
            let stats = rename::rename_with_exif_dates(&target)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}

fn run_pending(gallery: &Gallery, command: PendingCommand) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        PendingCommand::List => {
            let pending = gallery.pending_list()?;
            println!("{}", serde_json::to_string_pretty(&pending)?);
        }
        PendingCommand::Ingest { files } => {
            let uploads = files
                .into_iter()
                .map(|source| {
                    let original_name = source
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .ok_or_else(|| format!("not a file path: {}", source.display()))?;
                    Ok(Upload {
                        source,
                        original_name,
                    })
                })
                .collect::<Result<Vec<_>, String>>()?;
            let report = gallery.ingest_uploads(uploads)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        PendingCommand::Approve { names } => match names.as_slice() {
            [single] => {
                gallery.approve(single)?;
                println!("approved {single}");
            }
            _ => {
                let outcome = gallery.batch_approve(&names);
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            }
        },
        PendingCommand::Reject { names } => match names.as_slice() {
            [single] => {
                gallery.reject(single)?;
                println!("rejected {single}");
            }
            _ => {
                let outcome = gallery.batch_reject(&names);
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            }
        },
    }
    Ok(())
}
