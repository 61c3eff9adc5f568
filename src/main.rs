// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use songbook::config::{AppConfig, ConflictPolicy, DEFAULT_CONFIG_FILE};
use songbook::exchange::{
    bundle_to_json, encode_share_code, export_bundle, import_bundle, import_share_code,
    inspect_bundle, Conflict, ConflictChoice, ImportDecider, ImportReport,
};
use songbook::music::FingeringChart;
use songbook::store::{CatalogueStore, FileStore};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{debug, Level};

fn print_usage() {
    println!("songbook - Ocarina song catalogue");
    println!();
    println!("Usage: songbook [--config <path>] <command> [args]");
    println!();
    println!("Commands:");
    println!("  list                      List saved songs with their categories");
    println!("  show <song>               Print a song's notes with its transpose applied");
    println!("  export <file> [category]  Write all songs (or one category) to a bundle file");
    println!("  import <file>             Import songs from a bundle file");
    println!("  share <song>              Print a share code for one song");
    println!("  receive <code>            Import the song in a share code");
    println!("  help                      Show this help message");
}

/// Answers import questions from the configured policy, or on stdin
struct PromptDecider {
    policy: ConflictPolicy,
    lines: Lines<BufReader<Stdin>>,
}

impl PromptDecider {
    fn new(policy: ConflictPolicy) -> Self {
        Self {
            policy,
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    async fn ask(&mut self, prompt: &str) -> Option<String> {
        print!("{}", prompt);
        if let Err(e) = std::io::stdout().flush() {
            debug!("could not flush prompt: {}", e);
        }
        match self.lines.next_line().await {
            Ok(line) => line,
            Err(e) => {
                debug!("stdin closed: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl ImportDecider for PromptDecider {
    async fn resolve_conflict(&mut self, conflict: &Conflict) -> ConflictChoice {
        if let Some(choice) = self.policy.fixed_choice() {
            return choice;
        }
        println!("\"{}\" already exists with different notes.", conflict.name);
        println!("  current:  {}", conflict.existing_line());
        println!("  incoming: {}", conflict.incoming_line());
        loop {
            let Some(answer) = self.ask("[s]kip, [o]verwrite or save [a]s? ").await else {
                return ConflictChoice::Skip;
            };
            match answer.trim().to_ascii_lowercase().as_str() {
                "s" | "skip" => return ConflictChoice::Skip,
                "o" | "overwrite" => return ConflictChoice::Overwrite,
                "a" | "save as" | "save_as" => return ConflictChoice::SaveAs,
                _ => println!("Please answer s, o or a."),
            }
        }
    }

    async fn choose_name(&mut self, suggested: &str) -> Option<String> {
        if self.policy != ConflictPolicy::Ask {
            return Some(suggested.to_string());
        }
        let answer = self.ask(&format!("New name [{}]: ", suggested)).await?;
        if answer.trim().is_empty() {
            Some(suggested.to_string())
        } else {
            Some(answer)
        }
    }
}

fn print_report(report: &ImportReport) {
    println!(
        "Imported {}, overwritten {}, saved as new {}, identical {}, skipped {}, malformed {}",
        report.imported,
        report.overwritten,
        report.renamed,
        report.identical,
        report.skipped,
        report.malformed
    );
    if report.failed > 0 {
        eprintln!("Warning: {} songs could not be written", report.failed);
    }
}

fn init_logging(config: &AppConfig) {
    let level: Level = config.log_level.parse().unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn list_songs(catalogue: &mut CatalogueStore<FileStore>) {
    let songs = catalogue.list_songs();
    if songs.is_empty() {
        println!("No songs saved.");
        return;
    }
    for song in songs {
        match (song.category.is_empty(), song.subcategory.is_empty()) {
            (true, _) => println!("{}", song.name),
            (false, true) => println!("{}  [{}]", song.name, song.category),
            (false, false) => println!("{}  [{} / {}]", song.name, song.category, song.subcategory),
        }
    }
}

fn show_song(catalogue: &mut CatalogueStore<FileStore>, name: &str) -> Result<()> {
    let song = catalogue
        .load(name)
        .ok_or_else(|| anyhow!("Song not found: {}", name))?;
    let chart = FingeringChart::load(catalogue.store());
    let shown = song.document.display(song.transpose, &chart);
    println!("{} (transpose {:+})", name, song.transpose);
    for instance in song.document.arrangement() {
        let Some(section) = song.document.section(&instance.section_id) else {
            continue;
        };
        let notes: Vec<String> = shown
            .iter()
            .filter(|d| d.instance_id == instance.id)
            .map(|d| d.shown.to_string())
            .collect();
        println!("  {}: {}", section.name, notes.join(" "));
    }
    Ok(())
}

async fn export_songs(
    catalogue: &mut CatalogueStore<FileStore>,
    file: &str,
    category: Option<&str>,
) -> Result<()> {
    let songs = catalogue.read_catalogue();
    let scope: Option<Vec<String>> = category.map(|c| {
        let wanted = catalogue.normalize_category(c);
        songs
            .iter()
            .filter(|(_, e)| e.category == wanted)
            .map(|(name, _)| name.clone())
            .collect()
    });
    let bundle = export_bundle(&songs, scope.as_deref());
    let json = bundle_to_json(&bundle).context("Failed to serialize bundle")?;
    tokio::fs::write(file, json)
        .await
        .with_context(|| format!("Failed to write bundle: {}", file))?;
    println!("Exported {} songs to {}", bundle.songs.len(), file);
    Ok(())
}

async fn import_file(
    catalogue: &mut CatalogueStore<FileStore>,
    file: &str,
    policy: ConflictPolicy,
) -> Result<()> {
    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read bundle: {}", file))?;
    let summary = inspect_bundle(&text).with_context(|| format!("Invalid file: {}", file))?;
    println!(
        "Bundle version {} with {} songs",
        summary.version_label, summary.song_count
    );
    let mut decider = PromptDecider::new(policy);
    let report = import_bundle(catalogue, &text, &mut decider).await?;
    print_report(&report);
    Ok(())
}

fn share_song(catalogue: &mut CatalogueStore<FileStore>, name: &str, compress: bool) -> Result<()> {
    let entry = catalogue
        .entry(name)
        .ok_or_else(|| anyhow!("Song not found: {}", name))?;
    let code = encode_share_code(name, &entry, compress).context("Failed to encode share code")?;
    println!("{}", code);
    Ok(())
}

fn require<'a>(args: &'a [String], index: usize, what: &str) -> Result<&'a str> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("Missing {}. Run with help for usage information", what))
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut args: Vec<String> = env::args().skip(1).collect();

    let mut config_path = PathBuf::from(DEFAULT_CONFIG_FILE);
    if let Some(pos) = args.iter().position(|a| a == "--config") {
        if pos + 1 >= args.len() {
            bail!("--config requires a path");
        }
        config_path = PathBuf::from(args.remove(pos + 1));
        args.remove(pos);
    }

    if args.is_empty() {
        println!("songbook - Ocarina song catalogue");
        println!("Run with help for usage information");
        return Ok(());
    }
    if matches!(args[0].as_str(), "help" | "--help" | "-h") {
        print_usage();
        return Ok(());
    }

    let config = AppConfig::load_or_default(&config_path)?;
    config.validate()?;
    init_logging(&config);

    let store = FileStore::open(&config.store_dir)
        .with_context(|| format!("Failed to open store: {:?}", config.store_dir))?;
    let mut catalogue = CatalogueStore::new(store);

    match args[0].as_str() {
        "list" => list_songs(&mut catalogue),
        "show" => show_song(&mut catalogue, require(&args, 1, "song name")?)?,
        "export" => {
            let file = require(&args, 1, "output file")?;
            export_songs(&mut catalogue, file, args.get(2).map(String::as_str)).await?;
        }
        "import" => {
            let file = require(&args, 1, "bundle file")?;
            import_file(&mut catalogue, file, config.import.on_conflict).await?;
        }
        "share" => share_song(
            &mut catalogue,
            require(&args, 1, "song name")?,
            config.share_code.compress,
        )?,
        "receive" => {
            let code = args[1..].join("");
            let mut decider = PromptDecider::new(config.import.on_conflict);
            let report = import_share_code(&mut catalogue, &code, &mut decider).await?;
            print_report(&report);
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            std::process::exit(1);
        }
    }

    Ok(())
}
