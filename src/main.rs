/// memomo command line entry point for native builds
#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::path::{Path, PathBuf};

    use clap::{Parser, Subcommand};
    use memomo::config::MemomoConfig;
    use memomo::persist::{
        FileStore, PersistError, export_to_bytes, read_import, write_export,
    };
    use memomo::{Preferences, Session};

    #[derive(Parser)]
    #[command(name = "memomo")]
    #[command(author, version, about)]
    #[command(long_about = "Sticky notes pinned to a deck of images.\n\n\
        Examples:\n  \
        memomo info deck.json            Summarize an export\n  \
        memomo layout deck.json          Print layout as JSON\n  \
        memomo import deck.json          Replace the local store\n  \
        memomo export out.json           Export the local store")]
    #[command(propagate_version = true)]
    pub struct Cli {
        #[command(subcommand)]
        pub command: Commands,
    }

    #[derive(Subcommand)]
    pub enum Commands {
        /// Summarize an exported document
        Info {
            /// Export file to read
            file: PathBuf,
        },

        /// Lay out every page on the print sheet and print it as JSON
        Layout {
            /// Export file to read
            file: PathBuf,
        },

        /// Replace the local store with an exported document
        Import {
            /// Export file to read
            file: PathBuf,

            /// Store directory (defaults to the configured one)
            #[arg(long)]
            store: Option<PathBuf>,
        },

        /// Write the local store out as a portable document
        Export {
            /// Output file
            out: PathBuf,

            /// Store directory (defaults to the configured one)
            #[arg(long)]
            store: Option<PathBuf>,
        },
    }

    fn init_logging(config: &MemomoConfig) {
        env_logger::Builder::new()
            .filter_level(config.preferences.log_level.into())
            .parse_default_env()
            .init();
    }

    fn open_store(flag: Option<PathBuf>, prefs: &Preferences) -> Result<FileStore, String> {
        flag.or_else(|| prefs.store_dir.clone())
            .map(FileStore::new)
            .or_else(FileStore::default_location)
            .ok_or_else(|| "could not determine a store directory, pass --store".to_string())
    }

    fn info(file: &Path) -> Result<(), PersistError> {
        let imported = read_import(file)?;
        let doc = imported.to_document();
        println!("version: {}", imported.version);
        println!("mode:    {}", doc.mode().name());
        println!("pages:   {}", doc.len());
        for (i, page) in doc.pages().iter().enumerate() {
            let marker = if i == doc.index() { '*' } else { ' ' };
            let dims = page
                .dimensions()
                .map(|(w, h)| format!("{}x{}", w, h))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "{} {:>3}  {:<32} {:>11}  {} note(s)",
                marker,
                i + 1,
                page.name,
                dims,
                page.notes.len()
            );
        }
        Ok(())
    }

    fn layout(file: &Path, prefs: &Preferences) -> Result<(), PersistError> {
        let doc = read_import(file)?.to_document();
        let sheets = memomo::render::project_print(&doc, prefs.print_sheet);
        println!("{}", serde_json::to_string_pretty(&sheets)?);
        Ok(())
    }

    async fn import(file: &Path, store: FileStore, prefs: Preferences) -> Result<(), PersistError> {
        let bytes = std::fs::read(file)?;
        let mut session = Session::new(store, prefs);
        session.import_document(&bytes).await?;
        session.flush().await?;
        log::info!(
            "Imported {} page(s) into {:?}",
            session.document().len(),
            session.store().root()
        );
        Ok(())
    }

    async fn export(out: &Path, store: FileStore, prefs: Preferences) -> Result<(), PersistError> {
        let mut session = Session::new(store, prefs);
        session.restore().await?;
        let export = session.export_document().await?;
        if out == Path::new("-") {
            let bytes = export_to_bytes(&export)?;
            println!("{}", String::from_utf8_lossy(&bytes));
        } else {
            write_export(out, &export)?;
            log::info!("Exported {} page(s) to {:?}", export.pack.pages.len(), out);
        }
        Ok(())
    }

    pub fn run() -> Result<(), String> {
        let cli = Cli::parse();
        let config = MemomoConfig::load_from_default_path().unwrap_or_default();
        init_logging(&config);
        let prefs = config.preferences;

        let result = match cli.command {
            Commands::Info { file } => info(&file),
            Commands::Layout { file } => layout(&file, &prefs),
            Commands::Import { file, store } => {
                let store = open_store(store, &prefs)?;
                pollster::block_on(import(&file, store, prefs))
            }
            Commands::Export { out, store } => {
                let store = open_store(store, &prefs)?;
                pollster::block_on(export(&out, store, prefs))
            }
        };
        result.map_err(|e| e.to_string())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(e) = cli::run() {
        eprintln!("memomo: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}
