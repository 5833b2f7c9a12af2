mod activation;
mod config;
mod error;
mod filter;
mod interface;
mod source;
mod term;
mod yamlrw;

use std::fs::File;

use simplelog::{Config as LogConfig, WriteLogger};

use config::Config;
use error::Error;
use interface::Submit;

async fn app() -> Result<Submit, Error> {
    let path = std::env::args().nth(1).unwrap_or_else(|| config::DEFAULT_PATH.to_string());
    let config = Config::load_or_init(&path)?;

    let log_file = File::create(&config.log_file)?;
    WriteLogger::init(config.level_filter()?, LogConfig::default(), log_file)?;
    log::info!("using config {path}: {config:?}");

    interface::app(&config).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    better_panic::install();

    match app().await {
        Ok(Submit::Tags(tags)) => tags.iter().for_each(|tag| println!("{tag}")),
        Ok(Submit::Query(query)) => println!("{query}"),
        Ok(Submit::Quit) => (),
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        },
    }
}
