use std::env;
use std::path::PathBuf;

use ragdex_cli::{build_snapshot, display, init_tracing, print_results, verify_snapshot, App, Args};
use ragdex_store::Snapshot;

const USAGE: &str = "Usage: ragdex <build|query|stats|verify|context> [args...]
  build   [docs_dir] [--json FILE] [--out SNAPSHOT]
  query   <query> [--limit N] [--snapshot PATH]
  context <query> [--limit N] [--snapshot PATH]
  stats   [--snapshot PATH] [--json-output]
  verify  [docs_dir] [--json FILE] [--snapshot PATH]";

const VALUED: &[&str] = &["--json", "--out", "-o", "--limit", "-n", "--snapshot"];

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("{USAGE}");
        std::process::exit(1);
    }
    let cmd = args.remove(0);
    (cmd, args)
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let (cmd, rest) = parse_args();
    let args = Args::parse(rest, VALUED)?;
    let app = App::load()?;

    match cmd.as_str() {
        "build" => {
            let source = app.source(args.positional.first().map(PathBuf::from), args.path(&["--json"]));
            let Some(out) = app.snapshot_path(args.path(&["--out", "-o"])) else {
                anyhow::bail!("no snapshot path; pass --out or set data.snapshot_path");
            };
            let documents = source.documents()?;
            let snapshot = build_snapshot(&documents, &app.settings.index_settings())?;
            snapshot.write_atomic(&out)?;
            println!("Wrote {} chunks from {} documents to {}", snapshot.chunk_count, snapshot.document_count, out.display());
        }
        "query" | "context" => {
            if args.positional.is_empty() {
                eprintln!("Usage: ragdex {cmd} \"<query>\" [--limit N]");
                std::process::exit(1);
            }
            let query = args.positional.join(" ");
            let limit = args.usize(&["--limit", "-n"])?.unwrap_or(app.settings.scoring.default_limit);
            let facade = app.facade(app.source(None, None), args.path(&["--snapshot"]));
            let results = facade.try_retrieve(&query, limit)?;
            if cmd == "query" {
                print_results(&results);
            } else {
                println!("{}", facade.format_context(&results));
            }
        }
        "stats" => {
            let facade = app.facade(app.source(None, None), args.path(&["--snapshot"]));
            facade.store().load()?;
            let Some(stats) = facade.store().stats() else {
                anyhow::bail!("index not loaded");
            };
            if args.has(&["--json-output"]) {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Snapshot:   {}", display(facade.store().snapshot_path()));
                println!("Origin:     {:?}", stats.origin);
                println!("Documents:  {}", stats.documents);
                println!("Chunks:     {}", stats.chunks);
                println!("Vocabulary: {}", stats.vocabulary);
                println!("Hash:       {}", stats.content_hash);
                println!("Built at:   {}", stats.built_at.to_rfc3339());
            }
        }
        "verify" => {
            let Some(path) = app.snapshot_path(args.path(&["--snapshot"])) else {
                anyhow::bail!("no snapshot path; pass --snapshot or set data.snapshot_path");
            };
            let snapshot = Snapshot::read(&path)?;
            let source = app.source(args.positional.first().map(PathBuf::from), args.path(&["--json"]));
            let documents = source.documents()?;
            let problems = verify_snapshot(&snapshot, &documents, &app.settings.index_settings())?;
            if problems.is_empty() {
                println!("Snapshot {} matches a fresh build ({} chunks)", path.display(), snapshot.chunk_count);
            } else {
                for problem in &problems {
                    eprintln!("mismatch: {problem}");
                }
                eprintln!("Snapshot {} is out of date ({} problems)", path.display(), problems.len());
                std::process::exit(2);
            }
        }
        "-h" | "--help" | "help" => println!("{USAGE}"),
        _ => {
            eprintln!("Unknown command: {cmd}\n{USAGE}");
            std::process::exit(1);
        }
    }
    Ok(())
}
