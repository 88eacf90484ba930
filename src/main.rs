use anyhow::Result;
use clap::Parser;
use gpm::commands::{self, Options};
use gpm::resolver::Libc;
use std::path::PathBuf;

/// gpm - GitHub release asset installer
///
/// Install prebuilt executables straight from release assets and link them
/// into a bin directory.
///
/// If the GITHUB_TOKEN environment variable is set, it will be used for authentication.
/// This is useful for accessing private repositories or avoiding rate limits.
///
/// Examples:
///   gpm install junegunn/fzf              # Highest release, best asset for this platform
///   gpm install fzf@latest                # Guess the owner, use the latest release
///   gpm install acme/tool@v1.2.0:tool-linux-amd64 --name tool
///   gpm install BurntSushi/ripgrep --libc musl
///   gpm search ripgrep
///   gpm list
#[derive(Parser, Debug)]
#[command(author, version = env!("GPM_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Store directory for downloaded assets (default ~/.local/share/gpm)
    #[arg(long = "store", env = "GPM_STORE", value_name = "PATH", global = true)]
    pub store_root: Option<PathBuf>,

    /// Directory that receives the executable links (default ~/.local/bin)
    #[arg(long = "bin", env = "GPM_BIN", value_name = "PATH", global = true)]
    pub bin_root: Option<PathBuf>,

    /// GitHub API URL (defaults to https://api.github.com)
    #[arg(long = "api-url", value_name = "URL", global = true)]
    pub api_url: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Install one or more release assets
    #[command(visible_alias = "i")]
    Install(InstallArgs),

    /// List stored assets and the links pointing at them
    #[command(visible_aliases = ["l", "ls"])]
    List,

    /// Search GitHub repositories, most starred first
    #[command(visible_alias = "s")]
    Search {
        /// Search terms
        query: String,
    },
}

#[derive(clap::Args, Debug)]
pub struct InstallArgs {
    /// Assets to install
    #[arg(
        value_name = "[SITE://][OWNER/]REPOSITORY[@VERSION][:ARTIFACT[,ARTIFACT...]]",
        required = true
    )]
    pub references: Vec<String>,

    /// Link name to use instead of the repository name (single artifact only)
    #[arg(long, short = 'n', value_name = "NAME")]
    pub name: Option<String>,

    /// Longest file extension treated as a plain executable suffix
    #[arg(long, value_name = "N")]
    pub max_extension_len: Option<usize>,

    /// Operating system to pick artifacts for (default: this one)
    #[arg(long, value_name = "OS")]
    pub os: Option<String>,

    /// Architecture to pick artifacts for (default: this one)
    #[arg(long, value_name = "ARCH")]
    pub arch: Option<String>,

    /// Only pick artifacts built for this C library
    #[arg(long, value_enum)]
    pub libc: Option<Libc>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = gpm::runtime::RealRuntime;

    let mut options = Options {
        store_root: cli.store_root,
        bin_root: cli.bin_root,
        api_url: cli.api_url,
        ..Default::default()
    };

    match cli.command {
        Commands::Install(args) => {
            options.max_extension_len = args.max_extension_len;
            options.os = args.os;
            options.arch = args.arch;
            options.libc = args.libc;
            commands::install(runtime, &args.references, args.name, options).await?
        }
        Commands::List => commands::list(runtime, options)?,
        Commands::Search { query } => commands::search(runtime, &query, options).await?,
    }
    Ok(())
}
