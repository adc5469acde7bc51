use clap::{Parser, Subcommand, ValueEnum};
use melodeck::models::sort_tracks;
use melodeck::{
    ApiConfig, DryRunBackend, Melodeck, PlayerConfig, PlayerSnapshot, SaavnApi, SortOrder, Track,
};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "melodeck-cli")]
#[command(about = "CLI for Melodeck - browse the catalog and drive the player", long_about = None)]
struct Cli {
    /// Catalog API base URL
    #[arg(long, env = "MELODECK_API_URL", default_value = melodeck::config::DEFAULT_API_URL)]
    api_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Preferred stream tier
    #[arg(short, long, env = "MELODECK_QUALITY", default_value = melodeck::config::DEFAULT_STREAM_QUALITY)]
    quality: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the catalog
    Search {
        /// Search query
        query: String,

        /// Kind of result (song, album, artist)
        #[arg(short, long, value_enum, default_value_t = SearchKind::Song)]
        kind: SearchKind,

        /// Limit results
        #[arg(short, long, default_value_t = 10)]
        limit: u32,

        /// Order song results
        #[arg(short, long, value_enum)]
        sort: Option<Sort>,
    },
    /// Show a song
    Song { id: String },
    /// Show an album and its songs
    Album { id: String },
    /// Show an artist and their top songs
    Artist { id: String },
    /// Load a song and its suggestions into the player (no audio output)
    Play {
        id: String,

        /// Skip forward this many times after starting
        #[arg(long, default_value_t = 0)]
        skip: u32,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum SearchKind {
    Song,
    Album,
    Artist,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Sort {
    Asc,
    Desc,
    Artist,
    Album,
    Year,
}

impl From<Sort> for SortOrder {
    fn from(s: Sort) -> Self {
        match s {
            Sort::Asc => SortOrder::Ascending,
            Sort::Desc => SortOrder::Descending,
            Sort::Artist => SortOrder::Artist,
            Sort::Album => SortOrder::Album,
            Sort::Year => SortOrder::Year,
        }
    }
}

fn print_track(position: usize, track: &Track) {
    println!(
        "{}. {} - {} [{}] (ID: {})",
        position,
        track.artists_string(", "),
        track.title,
        track.duration_formatted(),
        track.id
    );
}

fn print_snapshot(snapshot: &PlayerSnapshot) {
    println!("State: {:?} (playing: {})", snapshot.state, snapshot.is_playing);
    for (i, track) in snapshot.queue.iter().enumerate() {
        let marker = if Some(i) == snapshot.current_index { "▶" } else { " " };
        print!("{} ", marker);
        print_track(i + 1, track);
    }
    if !snapshot.recently_played.is_empty() {
        println!("Recently played:");
        for track in &snapshot.recently_played {
            println!("   {} - {}", track.artists_string(", "), track.title);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("melodeck=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let api = SaavnApi::new(
        ApiConfig::new()
            .with_base_url(&cli.api_url)
            .with_timeout(Duration::from_secs(cli.timeout)),
    )?;

    match &cli.command {
        Commands::Search {
            query,
            kind,
            limit,
            sort,
        } => {
            println!("Searching for '{}'...", query);
            match kind {
                SearchKind::Song => {
                    let mut results = api.search_songs(query, 1, *limit).await?;
                    if let Some(sort) = sort {
                        sort_tracks(&mut results, (*sort).into());
                    }
                    for (i, track) in results.iter().enumerate() {
                        print_track(i + 1, track);
                    }
                }
                SearchKind::Album => {
                    let results = api.search_albums(query, *limit).await?;
                    for (i, album) in results.iter().enumerate() {
                        println!(
                            "{}. {} - {} (ID: {})",
                            i + 1,
                            album.artists_string(", "),
                            album.name,
                            album.id
                        );
                    }
                }
                SearchKind::Artist => {
                    let results = api.search_artists(query, *limit).await?;
                    for (i, artist) in results.iter().enumerate() {
                        println!("{}. {} (ID: {})", i + 1, artist.name, artist.id);
                    }
                }
            }
        }
        Commands::Song { id } => {
            let track = api.get_song(id).await?;
            print_track(1, &track);
            if let Some(album) = &track.album {
                println!("   Album: {} (ID: {})", album.name, album.id);
            }
            if let Some(url) = track.artwork_url() {
                println!("   Artwork: {}", url);
            }
            for stream in &track.streams {
                println!("   Stream {}: {}", stream.quality, stream.url);
            }
        }
        Commands::Album { id } => {
            let album = api.get_album(id).await?;
            println!(
                "{} - {} ({} songs)",
                album.artists_string(", "),
                album.name,
                album.song_count
            );
            for (i, track) in album.songs.iter().enumerate() {
                print_track(i + 1, track);
            }
        }
        Commands::Artist { id } => {
            let artist = api.get_artist(id).await?;
            println!(
                "{}{}",
                artist.name,
                if artist.is_verified { " ✔" } else { "" }
            );
            if let Some(followers) = artist.follower_count {
                println!("   Followers: {}", followers);
            }
            for (i, track) in artist.top_songs.iter().enumerate() {
                print_track(i + 1, track);
            }
        }
        Commands::Play { id, skip } => {
            let config = PlayerConfig::new().with_preferred_quality(&cli.quality);
            let (player, mut events) = Melodeck::new(api, DryRunBackend::new(), config);

            player.play_track(id).await?;
            for _ in 0..*skip {
                if !player.playback().play_next().await? {
                    break;
                }
            }
            player.playback().drain_status(&mut events).await;

            for url in player.playback().backend().loaded_urls().await {
                println!("Loaded stream: {}", url);
            }
            print_snapshot(&player.playback().snapshot());
        }
    }

    Ok(())
}
