use anyhow::Result;
use clap::{Parser, Subcommand};
use botcomod::cli;

/// botcomod - residents' bot of the neighbourhood
#[derive(Parser)]
#[command(name = "botcomod")]
#[command(about = "Residents' bot: registration, car owners and neighbours", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the webhook server
    Serve {
        /// Server host address (overrides config file)
        #[arg(long)]
        host: Option<String>,

        /// Server port (overrides config file)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run database migrations
    Migrate,
    /// Drop database if exists and recreate with migrations
    Reset,
    /// Manage houses
    House {
        #[command(subcommand)]
        command: HouseCommands,
    },
    /// Inspect users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Subcommand)]
enum HouseCommands {
    /// Add a house or update the one with the same number
    Add {
        number: String,
        rooms_min: i64,
        rooms_max: i64,
        #[arg(long)]
        construction: Option<String>,
    },
    /// List houses
    List,
}

#[derive(Subcommand)]
enum UserCommands {
    /// Print the replayed user
    Show { id: i64 },
    /// Erase the whole event history of a user
    ClearEvents { id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = botcomod::Config::load(cli.config.clone())?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    // Initialize observability (tracing + logging)
    botcomod::observability::init_observability(&config.observability)?;

    match cli.command {
        Commands::Serve { host, port } => cli::server::serve(config, host, port).await,
        Commands::Migrate => cli::migrate::migrate(&config).await,
        Commands::Reset => cli::migrate::reset(&config).await,
        Commands::House { command } => match command {
            HouseCommands::Add {
                number,
                rooms_min,
                rooms_max,
                construction,
            } => cli::house::add(&config, number, rooms_min, rooms_max, construction).await,
            HouseCommands::List => cli::house::list(&config).await,
        },
        Commands::User { command } => match command {
            UserCommands::Show { id } => cli::user::show(&config, id).await,
            UserCommands::ClearEvents { id } => cli::user::clear_events(&config, id).await,
        },
    }
}
