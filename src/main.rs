mod app;
mod cli;
mod config;
mod db;
mod filters;
mod http;
mod library;
mod logging;
mod movie;
mod omdb;
mod paths;
mod storage;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    app::run(cli)
}
