use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "reqpolicy",
    about = "Reqpolicy: validate dependency declarations against a global requirements policy",
    version
)]
pub struct Cli {
    /// Path to the configuration file (default: reqpolicy.toml when present)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check upper-constraints against global-requirements
    ValidateConstraints {
        /// Global requirements file
        #[arg(long)]
        global: Option<String>,

        /// Upper-constraints file
        #[arg(long)]
        constraints: Option<String>,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Check one project's requirements against the global list
    ValidateProject {
        /// Project root directory
        project: String,

        /// Global requirements file
        #[arg(long)]
        global: Option<String>,

        /// Blacklist file
        #[arg(long)]
        blacklist: Option<String>,

        /// Lower-constraints file (default: <project>/lower-constraints.txt when present)
        #[arg(long)]
        lower_constraints: Option<String>,

        /// Report duplicates and missing trailing newlines
        #[arg(long)]
        strict: bool,

        /// Marker matching for lower-constraints: literal or evaluate
        #[arg(long)]
        marker_matching: Option<String>,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that every global package is constrained or blacklisted
    CheckCoverage {
        #[arg(long)]
        global: Option<String>,

        #[arg(long)]
        constraints: Option<String>,

        #[arg(long)]
        blacklist: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Check that a project's packages exist in the global lists
    CheckExists {
        /// Project root directory
        project: String,

        #[arg(long)]
        global: Option<String>,

        #[arg(long)]
        constraints: Option<String>,

        #[arg(long)]
        blacklist: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Check that changed global requirements overlap the parent revision
    CheckOverlap {
        /// Parent global requirements file
        parent: String,

        /// Head global requirements file
        head: String,

        #[arg(long)]
        json: bool,
    },

    /// Cap uncapped requirements at the frozen version
    Cap {
        /// Requirements file to cap
        requirements: String,

        /// `pip freeze` snapshot
        freeze: String,
    },

    /// Combine per-interpreter freezes into one constraints list
    MergeConstraints {
        /// PYVER:PATH of one interpreter's freeze (repeatable)
        #[arg(long = "constraints", short = 'c', required = true)]
        constraints: Vec<String>,

        /// File of package names to exclude
        #[arg(long, short = 'b')]
        blacklist: Option<String>,

        /// SOURCE:TARGET, reuse SOURCE's freeze for a missing TARGET (repeatable)
        #[arg(long = "version-map")]
        version_map: Vec<String>,
    },

    /// Rewrite a project's requirements to the global spelling
    Update {
        /// Project root directory
        project: String,

        /// Directory holding global-requirements.txt
        #[arg(long, default_value = ".")]
        source: String,

        /// Write to <file>.<suffix> instead of replacing the file
        #[arg(long, short = 'o')]
        output_suffix: Option<String>,

        /// Keep packages the global list does not know
        #[arg(long, short = 's')]
        soft_update: bool,

        /// Also sync hacking
        #[arg(long = "hacking", short = 'H')]
        hacking: bool,

        /// Drop unknown packages with a warning instead of failing
        #[arg(long)]
        allow_non_standard: bool,
    },

    /// Sort a global requirements file within its sections
    Sort {
        /// File to sort in place
        file: String,
    },
}
