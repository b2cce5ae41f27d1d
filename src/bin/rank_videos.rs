use chartvid::{Config, FetchController, FetchOutcome};
use std::env;
use std::process;

fn print_usage() {
    println!("Rank Videos - Show every scored YouTube candidate for a song");
    println!();
    println!("Usage: rank_videos <ARTIST> <SONG> [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --limit <N>           Search hits to fetch (default: analysis_limit, max 50)");
    println!("  --help, -h            Show this help message");
}

fn main() {
    chartvid::init_logging();

    let args: Vec<String> = env::args().collect();
    let mut positional: Vec<String> = Vec::new();
    let mut limit: Option<u32> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            "--limit" => {
                limit = args.get(i + 1).and_then(|v| v.parse().ok());
                if limit.is_none() {
                    eprintln!("Error: --limit requires a number");
                    process::exit(1);
                }
                i += 1;
            }
            arg if !arg.starts_with("--") => positional.push(arg.to_string()),
            _ => {
                eprintln!("Error: Unknown option: {}", args[i]);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    if positional.len() != 2 {
        eprintln!("Error: ARTIST and SONG are required");
        print_usage();
        process::exit(1);
    }
    let (artist, song) = (&positional[0], &positional[1]);

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: Could not load config: {}", e);
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

    let limit = limit.unwrap_or_else(|| config.analysis_limit());
    let ranked = match controller.fetch_candidates(artist, song, limit) {
        FetchOutcome::Candidates(candidates) => controller.rank(artist, song, candidates),
        FetchOutcome::NoCandidates => {
            println!("No candidates for {} - {}", artist, song);
            process::exit(2);
        }
        FetchOutcome::QuotaExhausted => {
            eprintln!("Error: All API keys are out of quota");
            process::exit(3);
        }
        FetchOutcome::Failed(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    println!("{} candidates for {} - {}", ranked.len(), artist, song);
    println!();
    for (rank, scored) in ranked.iter().enumerate() {
        let c = &scored.candidate;
        let duration = c.duration_seconds.map(|s| format!("{}:{:02}", s / 60, s % 60)).unwrap_or_else(|| "?".into());
        println!("{:2}. {:7.2}  {}  {}", rank + 1, scored.score, c.video_id, c.title);
        println!("             channel={} views={} duration={}", c.channel_title, c.view_count, duration);
        println!("             {}", scored.reason_strings().join(", "));
    }
}
