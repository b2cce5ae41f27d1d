use chartvid::{Config, FetchController, LookupOutcome};
use std::env;
use std::process;

fn print_usage() {
    println!("Find Video - Find the official YouTube video for a song");
    println!();
    println!("Usage: find_video <ARTIST> <SONG> [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --max-results <N>     Search hits to score (default: 15)");
    println!("  --save-config         Store --max-results in the config file");
    println!("  --show-config         Print the effective configuration");
    println!("  --help, -h            Show this help message");
    println!();
    println!("API keys are read from YOUTUBE_API_KEYS (comma-separated) or the config file.");
    println!();
    println!("Examples:");
    println!("  find_video \"Taylor Swift\" \"Cardigan\"");
}

fn main() {
    chartvid::init_logging();

    let args: Vec<String> = env::args().collect();
    let mut positional: Vec<String> = Vec::new();
    let mut overrides = Config::new();
    let mut save_config = false;
    let mut show_config = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            "--max-results" => {
                match args.get(i + 1).and_then(|v| v.parse::<u32>().ok()) {
                    Some(n) => overrides.max_results = Some(n),
                    None => {
                        eprintln!("Error: --max-results requires a number");
                        process::exit(1);
                    }
                }
                i += 1;
            }
            "--save-config" => save_config = true,
            "--show-config" => show_config = true,
            arg if !arg.starts_with("--") => positional.push(arg.to_string()),
            _ => {
                eprintln!("Error: Unknown option: {}", args[i]);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: Could not load config: {}", e);
            process::exit(1);
        }
    };

    if save_config {
        let mut stored = config.clone();
        stored.merge(&overrides);
        match stored.save() {
            Ok(()) => println!("Configuration saved"),
            Err(e) => eprintln!("Warning: Could not save config: {}", e),
        }
    }
    config.merge(&overrides);

    if show_config {
        config.print("Configuration");
        println!();
    }

    if positional.len() != 2 {
        if show_config || save_config {
            process::exit(0);
        }
        eprintln!("Error: ARTIST and SONG are required");
        print_usage();
        process::exit(1);
    }
    let (artist, song) = (&positional[0], &positional[1]);

    let controller = match FetchController::from_config(&config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    match controller.lookup(artist, song) {
        LookupOutcome::Matched(best) => {
            println!("Video ID: {}", best.video_id);
            println!("URL:      https://www.youtube.com/watch?v={}", best.video_id);
            println!("Title:    {}", best.title);
            println!("Channel:  {}", best.channel_title);
            println!("Score:    {:.2}", best.score);
            println!("Reasons:  {}", best.reasons.join(", "));
        }
        LookupOutcome::NoCandidates => {
            println!("No video found for {} - {}", artist, song);
            process::exit(2);
        }
        LookupOutcome::QuotaExhausted => {
            eprintln!("Error: All API keys are out of quota");
            process::exit(3);
        }
        LookupOutcome::Failed(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
