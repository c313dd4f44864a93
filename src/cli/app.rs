use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "smsdb")]
#[command(about = "Palm OS SMS database toolkit")]
#[command(version)]
pub struct Cli {
    /// Control colored output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Write output to a file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<String>,

    /// Append NDJSON audit events for write operations to this file
    #[arg(long = "audit-log", global = true)]
    pub audit_log: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Text,
    Json,
    Csv,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show database header, categories and per-folder counts
    Info {
        /// Path to SMS database (.pdb)
        #[arg(short, long)]
        file: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List messages, one per line
    List {
        /// Path to SMS database (.pdb)
        #[arg(short, long)]
        file: String,

        /// Only show this folder (inbox, sent, pending, or a number)
        #[arg(long)]
        folder: Option<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show every decoded field of one message
    Show {
        /// Path to SMS database (.pdb)
        #[arg(short, long)]
        file: String,

        /// Record index (0-based, file order)
        #[arg(short, long)]
        record: usize,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Hex dump of a raw record
    Dump {
        /// Path to SMS database (.pdb)
        #[arg(short, long)]
        file: String,

        /// Record index (0-based, file order)
        #[arg(short, long)]
        record: usize,

        /// Output raw binary bytes (no formatting)
        #[arg(long)]
        raw: bool,
    },

    /// Export all messages as text, JSON or CSV
    Export {
        /// Path to SMS database (.pdb)
        #[arg(short, long)]
        file: String,

        /// Output format
        #[arg(long, default_value = "text")]
        format: ExportFormat,

        /// Only export this folder (inbox, sent, pending, or a number)
        #[arg(long)]
        folder: Option<String>,
    },

    /// Check that every record re-encodes to its original bytes
    Verify {
        /// Path to SMS database (.pdb)
        #[arg(short, long)]
        file: String,

        /// Show every record, not only failures
        #[arg(short, long)]
        verbose: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Decode and re-encode every record, then rewrite the database
    Repack {
        /// Path to SMS database (.pdb)
        #[arg(short, long)]
        file: String,

        /// Write to this path instead of replacing the input
        #[arg(long = "out")]
        out: Option<String>,

        /// Skip creating a backup before writing in place
        #[arg(long = "no-backup")]
        no_backup: bool,

        /// Show what would be written without modifying anything
        #[arg(long = "dry-run")]
        dry_run: bool,

        /// Rewrite even when some records would not come out byte-identical
        #[arg(long)]
        force: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Append a new message
    Add {
        /// Path to SMS database (.pdb); created if missing
        #[arg(short, long)]
        file: String,

        /// Phone number
        #[arg(long)]
        phone: String,

        /// Message body
        #[arg(long)]
        text: String,

        /// Contact last name
        #[arg(long)]
        name: Option<String>,

        /// Contact first name
        #[arg(long = "first-name")]
        first_name: Option<String>,

        /// Target folder (new Inbox records only round-trip with device data)
        #[arg(long, default_value = "sent")]
        folder: String,

        /// Unix timestamp to store (default: now)
        #[arg(long)]
        timestamp: Option<i64>,

        /// Skip creating a backup before writing
        #[arg(long = "no-backup")]
        no_backup: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
