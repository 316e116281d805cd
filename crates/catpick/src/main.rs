use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use catpick::infra::config::Config;
use catpick::ui::app::{PickOptions, UiApp};

#[derive(Parser)]
#[command(author, version, about = "Pick files from a directory tree and concatenate them", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the file picker pages and endpoints
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        /// Directory whose files are offered for selection
        #[arg(long)]
        base_dir: Option<PathBuf>,
    },
    /// Open the terminal file picker against a running server
    Pick {
        /// Server URL, e.g. http://127.0.0.1:8000
        #[arg(long)]
        server: Option<String>,
    },
    /// Print shell completions
    Completions { shell: Shell },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load()?;

    match cli.command {
        Commands::Serve {
            host,
            port,
            base_dir,
        } => {
            catpick::init();
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(dir) = base_dir {
                config.scan.set_base_dir(dir.display().to_string());
            }
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(catpick::server::run(&config))
        }
        Commands::Pick { server } => {
            let storage_dir = config.client.storage_dir();
            let log_path = storage_dir
                .parent()
                .map(|dir| dir.join("catpick.log"))
                .unwrap_or_else(|| PathBuf::from("catpick.log"));
            catpick::init_to_file(&log_path)?;
            let options = PickOptions {
                request_timeout: config.client.request_timeout(),
                server_url: server.unwrap_or(config.client.server_url),
                storage_dir,
            };
            UiApp::new(options)?.run()
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            let name = command.get_name().to_string();
            clap_complete::generate(shell, &mut command, name, &mut io::stdout());
            Ok(())
        }
    }
}
