use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use lenstore::config::StoreConfig;
use lenstore::logging::init_tracing;
use lenstore::todo::{parse_line, Effect, ListItem, TodoApp};
use lenstore::{StateStore, Subscription};

/// Drives the to-do sample from line commands.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (default: <config dir>/lenstore/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset (overrides the config file)
    #[arg(long)]
    log_level: Option<String>,

    /// Read commands from this file instead of stdin
    #[arg(short, long)]
    script: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => StoreConfig::load_from(path)?,
        None => StoreConfig::load()?,
    };
    init_tracing(args.log_level.as_deref().unwrap_or(&config.logging.level));

    let store: StateStore<Vec<ListItem>> = StateStore::builder()
        .with_config(&config)?
        .build(Vec::new());
    let app = TodoApp::new(store);

    let lists = app.lists().subscribe(|lists: Vec<ListItem>| {
        let titles: Vec<String> = lists.iter().map(ToString::to_string).collect();
        println!("lists: [{}]", titles.join(", "));
    });
    app.flush();
    let mut todos: HashMap<String, Subscription> = HashMap::new();

    let input: Box<dyn BufRead> = match &args.script {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening script {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    for (number, line) in input.lines().enumerate() {
        let line = line.context("reading commands")?;
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                eprintln!("line {}: {err}", number + 1);
                continue;
            }
        };
        match app.execute(command) {
            Ok(Effect::ListAdded { id }) => {
                let subscription = app.todos(&id).subscribe(|todos| println!("{todos}"));
                app.flush();
                todos.insert(id, subscription);
            }
            Ok(Effect::ListRemoved { id }) => {
                if let Some(subscription) = todos.remove(&id) {
                    subscription.unsubscribe();
                }
            }
            Ok(Effect::TodosChanged { .. }) => {}
            Ok(Effect::Show(rendered)) => println!("{rendered}"),
            Err(err) => eprintln!("line {}: {err}", number + 1),
        }
    }

    app.flush();
    lists.unsubscribe();
    for subscription in todos.into_values() {
        subscription.unsubscribe();
    }
    Ok(())
}
