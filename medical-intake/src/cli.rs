use clap::{Parser, Subcommand};
use intake_flow::DEFAULT_SERVICE_URL;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "medical-intake",
    version,
    about = "Send a medical document to the extraction service and display what it found"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "EXTRACTOR_URL",
        default_value = DEFAULT_SERVICE_URL,
        help = "Base URL of the extraction service"
    )]
    pub service_url: String,
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Pick a document to extract. When several are given only the first is sent.
    Extract {
        files: Vec<PathBuf>,
        #[arg(long, help = "Declared media type, instead of guessing from the extension")]
        media_type: Option<String>,
    },
    /// Interactive drop zone: drag files into the terminal, one drop per line
    Session {
        #[arg(long, help = "Declared media type, instead of guessing from the extension")]
        media_type: Option<String>,
    },
    /// Check that the extraction service is up
    Health,
}
