use chartvid::{is_improvement, load_chart, Config, FetchController, FetchOutcome, MatchStore, StoredMatch};
use std::env;
use std::path::PathBuf;
use std::process;

const SHOWN_CANDIDATES: usize = 5;

fn print_usage() {
    println!("Analyze Top - Re-check stored videos for the top chart positions");
    println!();
    println!("Usage: analyze_top <CHART_JSON> [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --limit <N>           Chart positions to check (default: 10)");
    println!("  --min-score <S>       Ignore best candidates scoring below S (default: 0)");
    println!("  --min-delta <D>       Score gain needed to replace a match (default: min_improvement)");
    println!("  --apply               Write improved matches to the store");
    println!("  --store <PATH>        Match store (default: ~/.state/chartvid/matches.db)");
    println!("  --help, -h            Show this help message");
}

fn parse_value<T: std::str::FromStr>(args: &[String], i: usize, name: &str) -> T {
    match args.get(i + 1).and_then(|v| v.parse().ok()) {
        Some(v) => v,
        None => {
            eprintln!("Error: {} requires a numeric argument", name);
            process::exit(1);
        }
    }
}

fn main() {
    chartvid::init_logging();

    let args: Vec<String> = env::args().collect();
    let mut chart_file: Option<PathBuf> = None;
    let mut store_override: Option<PathBuf> = None;
    let mut top: usize = 10;
    let mut min_score: f64 = 0.0;
    let mut min_delta: Option<f64> = None;
    let mut apply = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            "--limit" => {
                top = parse_value(&args, i, "--limit");
                i += 1;
            }
            "--min-score" => {
                min_score = parse_value(&args, i, "--min-score");
                i += 1;
            }
            "--min-delta" => {
                min_delta = Some(parse_value(&args, i, "--min-delta"));
                i += 1;
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
            "--apply" => apply = true,
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
    let min_delta = min_delta.unwrap_or_else(|| config.min_improvement());
    let hits = config.analysis_limit();

    let mut entries = match load_chart(&chart_file) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Error: Could not read {}: {}", chart_file.display(), e);
            process::exit(1);
        }
    };
    entries.truncate(top);

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

    let mut improved = 0;
    for entry in &entries {
        let (artist, song) = (entry.artist.as_str(), entry.song_name.as_str());
        println!("#{} {} - {}", entry.position, artist, song);

        let current = store.get(artist, song).cloned();
        match &current {
            Some(m) if !m.is_empty() => {
                println!("  current: {} {:.2} {:?}", m.video_id, m.confidence_score, m.title)
            }
            _ => println!("  current: none"),
        }

        let ranked = match controller.fetch_candidates(artist, song, hits) {
            FetchOutcome::Candidates(candidates) => controller.rank(artist, song, candidates),
            FetchOutcome::NoCandidates => {
                println!("  no candidates");
                continue;
            }
            FetchOutcome::QuotaExhausted => {
                println!("  API quota exhausted, stopping");
                break;
            }
            FetchOutcome::Failed(e) => {
                println!("  lookup failed: {}", e);
                continue;
            }
        };

        for scored in ranked.iter().take(SHOWN_CANDIDATES) {
            println!("  {:7.2} {} {:?} [{}]", scored.score, scored.candidate.video_id,
                     scored.candidate.title, scored.candidate.channel_title);
            println!("          {}", scored.reason_strings().join(", "));
        }

        let best = &ranked[0];
        if best.score < min_score {
            println!("  best score {:.2} below minimum {:.2}", best.score, min_score);
            continue;
        }
        if !is_improvement(current.as_ref(), best, min_delta) {
            continue;
        }

        improved += 1;
        println!("  -> better match: {} ({:.2})", best.candidate.video_id, best.score);
        if apply {
            if let Err(e) = store.put(artist, song, StoredMatch::from(best)) {
                eprintln!("Error: Could not write {}: {}", store_path.display(), e);
                process::exit(1);
            }
        }
    }

    println!();
    if apply {
        println!("{} match(es) updated", improved);
    } else {
        println!("{} possible improvement(s); run with --apply to store them", improved);
    }
}
