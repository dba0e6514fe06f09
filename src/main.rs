use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use spoplcli::{cli, config, error};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authorize with Spotify API
    Auth,

    /// Create a playlist from a free-form song list
    Create(CreateOptions),

    /// Resolve a single song reference against the catalog
    Search(SearchOptions),

    /// Inspect and edit existing playlists
    Playlist(PlaylistOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct CreateOptions {
    /// Playlist name (a default is used when omitted)
    #[clap(long)]
    pub name: Option<String>,

    /// File with one song reference per line
    #[clap(long)]
    pub file: Option<String>,

    /// Reuse the most recent playlist with the same name instead of
    /// creating a new one
    #[clap(long)]
    pub reuse_recent: bool,

    /// Song references ("Artist - Title"); read from stdin when neither
    /// arguments nor --file are given
    pub songs: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct SearchOptions {
    /// Song reference to resolve
    pub query: String,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Inspect and edit existing playlists")]
pub struct PlaylistOptions {
    #[command(subcommand)]
    pub command: PlaylistSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum PlaylistSubcommand {
    /// Show name, URL and tracks of a playlist
    Show { id: String },

    /// List your playlists
    List,

    /// Rename a playlist
    Rename { id: String, name: String },

    /// Append tracks (URIs or track ids) to a playlist
    Add { id: String, tracks: Vec<String> },

    /// Remove all occurrences of the given tracks from a playlist
    Remove { id: String, tracks: Vec<String> },

    /// Move a contiguous range of tracks to a new position
    Reorder {
        id: String,

        /// Index of the first track to move
        #[clap(long)]
        range_start: u32,

        /// Index the moved range is inserted before
        #[clap(long)]
        insert_before: u32,

        /// Number of tracks to move
        #[clap(long, default_value_t = 1)]
        range_length: u32,
    },

    /// Remove a playlist from your library
    Delete { id: String },
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Auth => cli::auth().await,

        Command::Create(opt) => cli::create(opt.name, opt.file, opt.songs, opt.reuse_recent).await,

        Command::Search(opt) => cli::search(opt.query).await,

        Command::Playlist(opt) => match opt.command {
            PlaylistSubcommand::Show { id } => cli::show_playlist(id).await,
            PlaylistSubcommand::List => cli::list_playlists().await,
            PlaylistSubcommand::Rename { id, name } => cli::rename_playlist(id, name).await,
            PlaylistSubcommand::Add { id, tracks } => cli::add_tracks(id, tracks).await,
            PlaylistSubcommand::Remove { id, tracks } => cli::remove_tracks(id, tracks).await,
            PlaylistSubcommand::Reorder {
                id,
                range_start,
                insert_before,
                range_length,
            } => cli::reorder_playlist(id, range_start, insert_before, range_length).await,
            PlaylistSubcommand::Delete { id } => cli::delete_playlist(id).await,
        },

        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
