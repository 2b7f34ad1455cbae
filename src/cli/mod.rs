use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config;
use crate::domain::track::Track;
use crate::http::server::HttpServer;
use crate::storage::operations::Storage;

#[derive(Parser)]
#[command(name = "tag-genius")]
#[command(version = "0.1")]
#[command(about = "Music track catalog served over a JSON HTTP API")]
pub struct Cli {
    /// Path to the config TOML file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Drop and recreate the tracks table, then insert the sample track
    InitDb,
    /// Run http server exposing the tracks
    Serve,
    /// List tracks in the database
    List {
        /// Print each track's tags one per line
        #[arg(short, long)]
        tags: bool,
    },
}

/// Entrypoint for CLI
pub fn run() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let cfg = config::Config::load(&cli.config)?;

    match &cli.command {
        Commands::InitDb => {
            let mut storage =
                Storage::new(&cfg.database).with_context(|| "Failed to open database")?;
            let track = storage
                .reset_and_seed()
                .with_context(|| "Failed to initialize database")?;

            println!("Database initialized, seeded track:");
            print_track(&track, true);
        }

        Commands::Serve => {
            println!("Starting HTTP server...");

            let storage =
                Storage::new(&cfg.database).with_context(|| "Failed to initialize storage")?;

            let http_server = HttpServer::new(storage, cfg.http, cfg.uploads);

            println!(
                "HTTP server running at http://{}:{}",
                http_server.config.bind_addr, http_server.config.port
            );
            http_server.run();
        }

        Commands::List { tags } => {
            let storage =
                Storage::new(&cfg.database).with_context(|| "Failed to initialize storage")?;

            let tracks = storage.list_tracks()?;
            if tracks.is_empty() {
                println!("No tracks found. Run \"init-db\" to seed the database.");
            }

            for track in &tracks {
                print_track(track, *tags);
            }
        }
    }

    Ok(())
}

fn print_track(track: &Track, with_tags: bool) {
    println!("{}", describe_track(track));

    if let Some(description) = &track.description {
        println!("  {description}");
    }

    if with_tags {
        let tags = track.tag_list();
        if tags.is_empty() {
            println!("  No tags");
        } else {
            println!("  Tags:");
            for tag in tags {
                println!("    - {tag}");
            }
        }
    }
}

/// one-line summary, e.g. `#1 One More Time (123.5 BPM, A Major)`
fn describe_track(track: &Track) -> String {
    let details = [
        track.bpm.map(|bpm| format!("{bpm} BPM")),
        track.track_key.clone(),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>();

    if details.is_empty() {
        format!("#{} {}", track.id, track.name)
    } else {
        format!("#{} {} ({})", track.id, track.name, details.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::domain::id::TrackId;

    fn track(bpm: Option<f64>, track_key: Option<&str>) -> Track {
        Track {
            id: TrackId(1),
            name: "One More Time".to_string(),
            description: None,
            bpm,
            track_key: track_key.map(str::to_string),
            tags: None,
        }
    }

    #[test]
    fn test_describe_track() {
        assert_eq!(
            describe_track(&track(Some(123.5), Some("A Major"))),
            "#1 One More Time (123.5 BPM, A Major)"
        );
        assert_eq!(
            describe_track(&track(None, Some("A Major"))),
            "#1 One More Time (A Major)"
        );
        assert_eq!(describe_track(&track(None, None)), "#1 One More Time");
    }

    #[test]
    fn test_parse_cli() {
        let cli = Cli::parse_from(["tag-genius", "--config", "/etc/tg.toml", "list", "--tags"]);
        assert_eq!(cli.config, PathBuf::from("/etc/tg.toml"));
        assert!(matches!(cli.command, Commands::List { tags: true }));

        let cli = Cli::parse_from(["tag-genius", "init-db"]);
        assert_eq!(cli.config, PathBuf::from("config.toml"));
        assert!(matches!(cli.command, Commands::InitDb));
    }
}
