use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Tailor a requirements catalog to a project")]
pub struct Cli {
    /// Path to the configuration file (defaults to TAILOR_CONFIG or the user config dir)
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check a master catalog for structural violations
    Validate {
        /// Path to the catalog file
        #[clap(long)]
        catalog: PathBuf,
    },

    /// Tailor a catalog for a project and save the snapshot
    Run {
        /// Path to the master catalog file
        #[clap(long)]
        catalog: PathBuf,

        /// Path to the project profile (phases, vector, screening tags)
        #[clap(long)]
        project: PathBuf,

        /// Where to write the tailored snapshot
        #[clap(long, short = 'o')]
        output: PathBuf,

        /// Snapshot format (yaml or json); must agree with the file extension
        #[clap(long)]
        format: Option<String>,
    },

    /// Re-run tailoring of a snapshot with a new project profile
    Retailor {
        /// Path to the tailored snapshot
        #[clap(long)]
        snapshot: PathBuf,

        /// Path to the master catalog file
        #[clap(long)]
        catalog: PathBuf,

        /// Path to the new project profile
        #[clap(long)]
        project: PathBuf,
    },

    /// List the DRDs due for a tailored snapshot
    Drds {
        /// Path to the tailored snapshot
        #[clap(long)]
        snapshot: PathBuf,

        /// Include DRDs of unselected requirements
        #[clap(long)]
        all: bool,

        /// Also write the list as JSON
        #[clap(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Select or deselect every requirement under a chapter
    Select {
        /// Path to the tailored snapshot
        #[clap(long)]
        snapshot: PathBuf,

        /// Chapter number (e.g. 5.2)
        #[clap(long)]
        chapter: String,

        /// Desired selection
        #[clap(long, action = clap::ArgAction::Set)]
        value: bool,
    },

    /// Update the text or selection of one requirement
    Update {
        /// Path to the tailored snapshot
        #[clap(long)]
        snapshot: PathBuf,

        /// Chapter number
        #[clap(long)]
        chapter: String,

        /// Requirement position within the chapter
        #[clap(long)]
        position: String,

        /// New requirement text
        #[clap(long)]
        text: Option<String>,

        /// New selection
        #[clap(long)]
        selected: Option<bool>,
    },

    /// Insert a project-specific requirement after an existing one
    Insert {
        /// Path to the tailored snapshot
        #[clap(long)]
        snapshot: PathBuf,

        /// Chapter number
        #[clap(long)]
        chapter: String,

        /// Position of the requirement to insert after
        #[clap(long)]
        after: String,

        /// Requirement text
        #[clap(long)]
        text: String,

        /// DRD numbers referenced by the new requirement
        #[clap(long = "drd")]
        drds: Vec<String>,
    },

    /// Show per-chapter selection figures
    Report {
        /// Path to the tailored snapshot
        #[clap(long)]
        snapshot: PathBuf,
    },

    /// Export a tailored snapshot
    Export {
        /// Path to the tailored snapshot
        #[clap(long)]
        snapshot: PathBuf,

        /// Output file
        #[clap(long, short = 'o')]
        output: PathBuf,

        /// Export format (yaml or json)
        #[clap(long)]
        format: Option<String>,
    },
}
