// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use env_logger::Env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

use moneydesk::commands::{self, Ctx};
use moneydesk::config::Config;
use moneydesk::store::{DataStore, RestStore, SqliteStore};
use moneydesk::{cli, db};

fn main() -> Result<()> {
    let matches = cli::build_cli().get_matches();

    let config_arg = matches.get_one::<String>("config").map(PathBuf::from);
    let (config, config_err) = Config::load_or_default(config_arg.as_deref(), |k| std::env::var(k).ok());
    env_logger::Builder::from_env(Env::default().default_filter_or(config.logging.level.as_str()))
        .init();
    if let Some(e) = &config_err {
        log::error!("configuration: {}", e);
        eprintln!("Configuration error: {}", e);
    }

    let local = matches
        .get_flag("local")
        .then(|| matches.get_one::<String>("db").cloned().unwrap_or_default());
    let rt = Runtime::new()?;
    let result = rt.block_on(run(config, local, &matches));
    // Stdin readers of the live view may still be parked on a blocking read.
    rt.shutdown_timeout(Duration::from_millis(200));
    result
}

async fn run(config: Config, local: Option<String>, matches: &clap::ArgMatches) -> Result<()> {
    let sqlite = match &local {
        Some(path) => Some(open_local(path).map(Arc::new)),
        None => None,
    };
    let store: std::result::Result<Arc<dyn DataStore>, String> = match &sqlite {
        Some(Ok(s)) => Ok(s.clone() as Arc<dyn DataStore>),
        Some(Err(e)) => Err(e.clone()),
        None => remote_store(&config),
    };
    if let Err(e) = &store {
        log::error!("store unavailable: {}", e);
        eprintln!("Data store unavailable: {}", e);
    }
    let ctx = Ctx::new(config, store);

    match matches.subcommand() {
        Some(("overview", sub)) => commands::overview::handle(&ctx, sub).await?,
        Some(("tx", sub)) => commands::transactions::handle(&ctx, sub).await?,
        Some(("users", sub)) => commands::users::handle(&ctx, sub).await?,
        Some(("budgets", sub)) => commands::budgets::handle(&ctx, sub).await?,
        Some(("goals", sub)) => commands::goals::handle(&ctx, sub).await?,
        Some(("watch", sub)) => commands::watch::handle(&ctx, sub).await?,
        Some(("doctor", _)) => commands::doctor::handle(&ctx).await?,
        Some(("import", sub)) => match &sqlite {
            Some(Ok(s)) => commands::importer::handle(s, sub)?,
            Some(Err(_)) => {}
            None => eprintln!("import only works with the local store; pass --local"),
        },
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}

/// Without `--db` the store lives in the platform data dir.
fn open_local(path: &str) -> std::result::Result<SqliteStore, String> {
    let path = if path.trim().is_empty() {
        db::local_store_path().map_err(|e| e.to_string())?
    } else {
        PathBuf::from(path.trim())
    };
    log::info!("using local store at {}", path.display());
    SqliteStore::open(Path::new(&path)).map_err(|e| e.to_string())
}

fn remote_store(config: &Config) -> std::result::Result<Arc<dyn DataStore>, String> {
    let creds = config.credentials().map_err(|e| e.to_string())?;
    let store = RestStore::new(&creds, config.poll_interval()).map_err(|e| e.to_string())?;
    log::debug!("using hosted store at {}", creds.url);
    Ok(Arc::new(store))
}
