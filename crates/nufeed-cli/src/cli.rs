use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand, ValueHint};

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}",
    arg_required_else_help = true
)]
pub struct Args {
    /// Set output verbosity
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress outputs
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output logs as json
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Provide custom config file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[clap(subcommand)]
    pub command: Commands,
}

/// Options shared by the listing commands.
#[derive(ClapArgs, Clone, Debug, Default)]
pub struct QueryArgs {
    /// OData `$filter` expression, e.g. "Id eq 'Foo' and IsLatestVersion"
    #[arg(required = false, short, long)]
    pub filter: Option<String>,

    /// Free-text search over id, title, description and tags
    #[arg(required = false, short, long)]
    pub search: Option<String>,

    /// Number of matching packages to skip
    #[arg(required = false, long)]
    pub skip: Option<String>,

    /// Maximum number of packages to return
    #[arg(required = false, long)]
    pub top: Option<String>,

    /// Only the latest stable version of each package
    #[arg(required = false, long)]
    pub latest: bool,

    /// Only the latest version of each package, prereleases included
    #[arg(required = false, long)]
    pub absolute_latest: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the configuration file to stdout
    Config,

    /// Generate default config with documentation
    #[clap(name = "defconfig")]
    DefConfig,

    /// Publish package archives
    #[command(arg_required_else_help = true)]
    #[clap(name = "push", visible_alias = "publish")]
    Push {
        /// Package archives to publish
        #[arg(required = true, value_hint = ValueHint::FilePath)]
        archives: Vec<String>,
    },

    /// Delete a package version and its archive
    #[command(arg_required_else_help = true)]
    #[clap(name = "delete", visible_alias = "rm")]
    Delete {
        /// Package id
        id: String,

        /// Package version
        version: String,
    },

    /// List packages in the feed
    #[clap(name = "list", visible_alias = "ls")]
    List {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Render a package listing as a feed document
    #[clap(name = "query")]
    Query {
        #[command(flatten)]
        query: QueryArgs,

        /// Render every listed version of one package instead
        #[arg(
            required = false,
            long,
            conflicts_with_all = ["filter", "search", "skip", "top", "latest", "absolute_latest"]
        )]
        id: Option<String>,

        /// Render as an Atom feed instead of JSON
        #[arg(required = false, short, long)]
        atom: bool,
    },

    /// Render a single package entry
    #[command(arg_required_else_help = true)]
    Entry {
        /// Package id, or a key such as "Packages(Id='Foo',Version='1.0.0')"
        key: String,

        /// Package version, when `key` is a plain id
        version: Option<String>,

        /// Render as an Atom entry instead of JSON
        #[arg(required = false, short, long)]
        atom: bool,
    },

    /// Copy a package archive out of the feed
    #[command(arg_required_else_help = true)]
    #[clap(name = "fetch", visible_alias = "download")]
    Fetch {
        /// Package id
        id: String,

        /// Package version
        version: String,

        /// Output file or directory
        #[arg(required = false, short, long, value_hint = ValueHint::AnyPath)]
        output: Option<String>,
    },

    /// Print the OData service document
    Service,

    /// Print the OData $metadata document
    Metadata,
}
