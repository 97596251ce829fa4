use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "freeshare")]
#[command(about = "Share documents through expiring, optionally protected links")]
#[command(version)]
struct Cli {
    /// Output format
    #[arg(long, global = true)]
    json: bool,

    /// Backend URL
    #[arg(long, global = true, env = "FREESHARE_BACKEND_URL")]
    server: Option<String>,

    /// Directory holding the local database
    #[arg(long, global = true, env = "FREESHARE_DATA_DIR")]
    data_dir: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a document and print its share link
    Upload(commands::files::UploadArgs),
    /// List your uploaded files
    Files,
    /// Delete one of your files
    Delete {
        /// File id as shown by `freeshare files`
        file_id: String,
    },
    /// Show what a share link needs before downloading
    Inspect {
        /// Share link token
        link: String,
    },
    /// Download a shared file
    Get(commands::share::GetArgs),
    /// Print the public URL of a share link
    ShareUrl {
        /// Share link token
        link: String,
    },
    /// Sign in and remember the session
    Login(commands::account::Credentials),
    /// Create an account and sign in
    Register(commands::account::Credentials),
    /// Forget the stored session
    Logout,
    /// Show the current session
    Whoami,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    freeshare_core::init_logging(if cli.verbose { "debug" } else { "warn" });

    let ctx = commands::Context {
        json_output: cli.json,
        server_override: cli.server,
        data_dir_override: cli.data_dir,
    };

    match cli.command {
        Commands::Upload(args) => commands::files::upload(args, &ctx).await,
        Commands::Files => commands::files::list(&ctx).await,
        Commands::Delete { file_id } => commands::files::delete(file_id, &ctx).await,
        Commands::Inspect { link } => commands::share::inspect(link, &ctx).await,
        Commands::Get(args) => commands::share::get(args, &ctx).await,
        Commands::ShareUrl { link } => commands::share::url(link, &ctx),
        Commands::Login(creds) => commands::account::login(creds, &ctx).await,
        Commands::Register(creds) => commands::account::register(creds, &ctx).await,
        Commands::Logout => commands::account::logout(&ctx),
        Commands::Whoami => commands::account::whoami(&ctx),
    }
}
