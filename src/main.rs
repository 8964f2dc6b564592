use clap::{
    ArgAction, CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use expgate::{
    api, concur, config::GatewayConfig, config, error, info, server, server::AppState, success,
    utils, warning,
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[clap(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serve expense entries over HTTP
    Serve(ServeOptions),

    /// Fetch expense entries once and print them
    Fetch(ConnectivityOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct ServeOptions {
    /// Address to listen on (overrides SERVER_ADDRESS)
    #[clap(long)]
    addr: Option<String>,

    /// Open the expenses page in the default browser once listening
    #[clap(long)]
    open: bool,

    #[clap(flatten)]
    connectivity: ConnectivityOptions,
}

#[derive(Parser, Debug, Clone)]
pub struct ConnectivityOptions {
    /// Directory holding the destination files
    #[clap(long)]
    destinations: Option<String>,

    /// Internet proxy host (overrides HTTP_PROXY_HOST)
    #[clap(long)]
    proxy_host: Option<String>,

    /// Internet proxy port (overrides HTTP_PROXY_PORT)
    #[clap(long)]
    proxy_port: Option<String>,

    /// Consumer account for on-premise destinations (overrides EXPGATE_TENANT_ACCOUNT)
    #[clap(long)]
    tenant: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

fn init_tracing(verbose: u8) {
    let log_level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .init();
}

fn load_config(opts: &ConnectivityOptions) -> GatewayConfig {
    let mut config = match GatewayConfig::from_env() {
        Ok(config) => config,
        Err(e) => error!("Invalid configuration. Err: {}", e),
    };

    if let Some(dir) = &opts.destinations {
        config.destinations_dir = dir.into();
    }
    if opts.proxy_host.is_some() {
        config.proxy.internet.host = opts.proxy_host.clone();
    }
    if opts.proxy_port.is_some() {
        config.proxy.internet.port = opts.proxy_port.clone();
    }
    if opts.tenant.is_some() {
        config.tenant_account = opts.tenant.clone();
    }
    config
}

async fn serve(opts: ServeOptions) {
    let mut config = load_config(&opts.connectivity);
    if let Some(addr) = opts.addr {
        config.server_addr = addr;
    }

    info!(
        "Serving expenses on http://{}/expenses (destinations in {})",
        config.server_addr,
        config.destinations_dir.display()
    );

    let state = AppState::from_config(&config);
    let addr = config.server_addr.clone();
    let server = tokio::spawn(async move { server::start_api_server(&addr, state).await });

    if opts.open {
        let url = format!("http://{}/expenses", config.server_addr);
        if webbrowser::open(&url).is_err() {
            warning!(
                "Failed to open browser. Please navigate to the following URL manually:\n{}",
                url
            )
        }
    }

    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Server stopped. Err: {}", e),
        Err(e) => error!("Server task failed. Err: {}", e),
    }
}

async fn fetch(opts: ConnectivityOptions) {
    let config = load_config(&opts);
    let state = AppState::from_config(&config);
    let session = utils::generate_session_id();

    info!("Requesting token from destination {}", concur::AUTH_DESTINATION);
    match api::handle(&state, &session).await {
        Ok(json) => {
            println!("{}", json);
            success!("Fetched expense entries from {}", concur::API_DESTINATION);
        }
        Err(e) => error!("{}", e.message()),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    match cli.command {
        Command::Serve(opts) => serve(opts).await,
        Command::Fetch(opts) => fetch(opts).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
