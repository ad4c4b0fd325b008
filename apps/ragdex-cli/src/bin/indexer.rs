use std::env;
use std::path::PathBuf;

use ragdex_cli::{build_snapshot, init_tracing, App, Args};

const USAGE: &str = "Usage: ragdex-indexer [docs_dir] [--json FILE] [--out SNAPSHOT]";

fn main() -> anyhow::Result<()> {
    init_tracing();
    let app = App::load()?;
    let args = Args::parse(env::args().skip(1), &["--json", "--out", "-o"]).map_err(|e| {
        eprintln!("Error: {e}\n{USAGE}");
        e
    })?;
    if args.has(&["--help", "-h"]) {
        println!("{USAGE}");
        return Ok(());
    }

    let docs_dir = args.positional.first().map(PathBuf::from);
    let source = app.source(docs_dir, args.path(&["--json"]));
    let Some(out) = app.snapshot_path(args.path(&["--out", "-o"])) else {
        eprintln!("Error: no snapshot path; pass --out or set data.snapshot_path");
        std::process::exit(1);
    };

    println!("ragdex indexer\n==============");
    println!("Snapshot: {}", out.display());
    let documents = source.documents()?;
    println!("Loaded {} documents", documents.len());

    let settings = app.settings.index_settings();
    let snapshot = build_snapshot(&documents, &settings)?;
    snapshot.write_atomic(&out)?;

    println!("\nIndexing completed.");
    println!("Documents: {} ({} skipped)", snapshot.document_count, documents.len().saturating_sub(snapshot.document_count));
    println!("Chunks:    {}", snapshot.chunk_count);
    println!("Terms:     {}", snapshot.index.vocabulary_size());
    println!("Hash:      {}", snapshot.content_hash);
    println!("\nTo search, use: cargo run --bin ragdex-search '<query>'");
    Ok(())
}
