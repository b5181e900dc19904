use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use authkeep::cli::{self, commands, Cli, Commands};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "authkeep=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Init { path } => commands::init(&path).await,
        Commands::Serve { host, port } => commands::serve(config, host, port).await,
        Commands::Migrate => commands::migrate(config).await,
        Commands::CreateAdmin {
            username,
            name,
            age,
            password,
        } => commands::create_admin(config, &username, &name, age, &password).await,
    };

    if let Err(e) = result {
        cli::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
