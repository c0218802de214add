use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "edo",
    about = "edo - local repository for mainframe source elements",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log at debug level (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a new repository
    Init(InitArgs),
    /// Switch the working directory to a stage or index
    Checkout(CheckoutArgs),
    /// Show working directory and synchronization status
    Status(StatusArgs),
    /// Show changes as unified patches
    Diff(DiffArgs),
    /// Merge a remote index into a local stage
    Merge(MergeArgs),
    /// Record working directory changes in the local stage
    Commit(CommitArgs),
    /// Show the index history of a stage
    Log(LogArgs),
    /// Print a raw object
    CatFile(CatFileArgs),
    /// Show an index, an element version or its history
    Show(ShowArgs),
    /// Move the local stage back in its history
    Reset(ResetArgs),
    /// Rewrite working files from the checked-out index
    Restore(RestoreArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    pub path: Option<String>,
    /// Base URL of the upstream repository
    #[arg(long, default_value = "")]
    pub url: String,
    #[arg(long)]
    pub instance: Option<String>,
    /// Maximum number of concurrent element operations
    #[arg(long)]
    pub concurrency: Option<usize>,
}

#[derive(Args)]
pub struct CheckoutArgs {
    /// Stage name (ENV-STGNUM-SYSTEM-SUBSYSTEM) or index key
    pub target: String,
}

#[derive(Args)]
pub struct StatusArgs {}

#[derive(Args)]
pub struct DiffArgs {
    /// Compare against base versions instead of current ones
    #[arg(long)]
    pub base: bool,
    /// Compare the checked-out index with the remote instead of the working directory
    #[arg(long)]
    pub cached: bool,
    /// Limit the diff to these elements (TYPE/NAME)
    pub elements: Vec<String>,
}

#[derive(Args)]
pub struct MergeArgs {
    /// Remote index to merge (default: remote ref of the stage)
    pub remote: Option<String>,
    /// Local stage or index key (default: checked-out stage)
    #[arg(long)]
    pub into: Option<String>,
}

#[derive(Args)]
pub struct CommitArgs {
    #[arg(short, long)]
    pub message: String,
    /// Also add new files and drop deleted ones
    #[arg(short, long)]
    pub all: bool,
    /// Limit the commit to these elements (TYPE/NAME)
    pub elements: Vec<String>,
}

#[derive(Args)]
pub struct LogArgs {
    /// Stage, remote/stage or index key (default: checked-out stage)
    pub name: Option<String>,
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
}

#[derive(Args)]
pub struct CatFileArgs {
    pub key: String,
    /// Print the object kind instead of its payload
    #[arg(short = 't', long = "type")]
    pub kind: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Stage, remote/stage or index key
    pub name: String,
    /// Element to show from the index (TYPE/NAME)
    pub element: Option<String>,
    /// Reconstruct the element at this change level from its history
    #[arg(long, value_name = "LEVEL", requires = "element")]
    pub logs: Option<String>,
}

#[derive(Args)]
pub struct ResetArgs {
    /// Number of indexes to move back
    #[arg(short = 'n', default_value = "1")]
    pub steps: usize,
    /// Also rewrite working files
    #[arg(long)]
    pub hard: bool,
}

#[derive(Args)]
pub struct RestoreArgs {
    #[arg(required = true)]
    pub elements: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_commit_and_show() {
        let cli = Cli::try_parse_from(["edo", "commit", "-m", "fix", "--all", "COBOL/A"]).unwrap();
        match cli.command {
            Command::Commit(args) => {
                assert_eq!(args.message, "fix");
                assert!(args.all);
                assert_eq!(args.elements, vec!["COBOL/A"]);
            }
            _ => panic!("expected commit"),
        }

        assert!(Cli::try_parse_from(["edo", "show", "DEV-1-SYS-SUB", "--logs", "0100"]).is_err());
        let cli = Cli::try_parse_from(["edo", "show", "DEV-1-SYS-SUB", "COBOL/A", "--logs", "0100"])
            .unwrap();
        assert!(matches!(cli.command, Command::Show(ShowArgs { logs: Some(_), .. })));
    }
}
