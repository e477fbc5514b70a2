use anyhow::Result;
use clap::Parser;

mod app;
mod cli;
mod config;
mod shell;

use app::App;
use cli::Cli;
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut app = App::new(Config::from_env());

    match cli.command {
        Some(command) => app.run(command).await,
        None => shell::run(&mut app).await,
    }
}
