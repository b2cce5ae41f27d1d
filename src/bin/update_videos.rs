use chartvid::{load_chart, Config, FetchController, LookupOutcome, MatchStore, StoredMatch};
use std::env;
use std::path::PathBuf;
use std::process;

fn print_usage() {
    println!("Update Videos - Find official videos for every song in a chart file");
    println!();
    println!("Usage: update_videos <CHART_JSON> [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --store <PATH>        Match store (default: ~/.state/chartvid/matches.db)");
    println!("  --retry-missing       Search again for songs recorded as not found");
    println!("  --limit <N>           Only process the first N chart positions");
    println!("  --help, -h            Show this help message");
}

#[derive(Default)]
struct Summary {
    matched: usize,
    not_found: usize,
    failed: usize,
    skipped: usize,
    pending: usize,
}

fn main() {
    chartvid::init_logging();

    let args: Vec<String> = env::args().collect();
    let mut chart_file: Option<PathBuf> = None;
    let mut store_override: Option<PathBuf> = None;
    let mut retry_missing = false;
    let mut limit: Option<usize> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            "--store" => {
                match args.get(i + 1) {
                    Some(p) => store_override = Some(PathBuf::from(p)),
                    None => {
                        eprintln!("Error: --store requires a path");
                        process::exit(1);
                    }
                }
                i += 1;
            }
            "--limit" => {
                limit = args.get(i + 1).and_then(|v| v.parse().ok());
                if limit.is_none() {
                    eprintln!("Error: --limit requires a number");
                    process::exit(1);
                }
                i += 1;
            }
            "--retry-missing" => retry_missing = true,
            arg if !arg.starts_with("--") => chart_file = Some(PathBuf::from(arg)),
            _ => {
                eprintln!("Error: Unknown option: {}", args[i]);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    let Some(chart_file) = chart_file else {
        eprintln!("Error: No chart file specified");
        print_usage();
        process::exit(1);
    };

    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: Could not load config: {}", e);
            process::exit(1);
        }
    };
    if store_override.is_some() {
        config.store_path = store_override;
    }

    let mut entries = match load_chart(&chart_file) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Error: Could not read {}: {}", chart_file.display(), e);
            process::exit(1);
        }
    };
    if let Some(limit) = limit {
        entries.truncate(limit);
    }

    let store_path = match config.store_path() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    let mut store = match MatchStore::open(&store_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: Could not open {}: {}", store_path.display(), e);
            process::exit(1);
        }
    };

    let controller = match FetchController::from_config(&config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    log::info!("Processing {} chart entries from {}", entries.len(), chart_file.display());
    let mut summary = Summary::default();

    for (n, entry) in entries.iter().enumerate() {
        let (artist, song) = (entry.artist.as_str(), entry.song_name.as_str());

        if let Some(existing) = store.get(artist, song) {
            if !existing.is_empty() || !retry_missing {
                log::debug!("#{} {} - {}: already stored, skipping", entry.position, artist, song);
                summary.skipped += 1;
                continue;
            }
        }

        let stored = match controller.lookup(artist, song) {
            LookupOutcome::Matched(best) => {
                log::info!("#{} {} - {}: {} ({:.2})", entry.position, artist, song, best.video_id, best.score);
                summary.matched += 1;
                StoredMatch::from(&best)
            }
            LookupOutcome::NoCandidates => {
                log::info!("#{} {} - {}: no video found", entry.position, artist, song);
                summary.not_found += 1;
                StoredMatch::default()
            }
            LookupOutcome::QuotaExhausted => {
                summary.pending = entries.len() - n;
                log::warn!("API quota exhausted, stopping with {} songs left", summary.pending);
                break;
            }
            LookupOutcome::Failed(e) => {
                log::error!("#{} {} - {}: {}", entry.position, artist, song, e);
                summary.failed += 1;
                continue;
            }
        };

        if let Err(e) = store.put(artist, song, stored) {
            eprintln!("Error: Could not write {}: {}", store_path.display(), e);
            process::exit(1);
        }
    }

    if let Err(e) = store.compact() {
        log::warn!("Could not compact {}: {}", store_path.display(), e);
    }

    println!("Matched:    {}", summary.matched);
    println!("Not found:  {}", summary.not_found);
    println!("Failed:     {}", summary.failed);
    println!("Skipped:    {}", summary.skipped);
    if summary.pending > 0 {
        println!("Pending:    {} (quota exhausted)", summary.pending);
        process::exit(3);
    }
}
