use std::env;

use ragdex_cli::{init_tracing, print_results, App, Args};

const USAGE: &str = "Usage: ragdex-search <query> [--limit N] [--snapshot PATH]";

fn main() -> anyhow::Result<()> {
    init_tracing();
    let app = App::load()?;
    let args = Args::parse(env::args().skip(1), &["--limit", "-n", "--snapshot"])?;
    if args.positional.is_empty() || args.has(&["--help", "-h"]) {
        eprintln!("{USAGE}");
        std::process::exit(1);
    }
    let query = args.positional.join(" ");
    let limit = args.usize(&["--limit", "-n"])?.unwrap_or(app.settings.scoring.default_limit);

    let facade = app.facade(app.source(None, None), args.path(&["--snapshot"]));
    let results = facade.try_retrieve(&query, limit)?;
    if let Some(stats) = facade.store().stats() {
        println!("Index: {} chunks from {:?}", stats.chunks, stats.origin);
    }
    println!("Query: {query}\n");
    print_results(&results);
    Ok(())
}
