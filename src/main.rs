use clap::{
    CommandFactory, Parser, Subcommand, ValueEnum,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};
use tracing_subscriber::EnvFilter;

use playall::{
    catalog::{ArtistOrder, BatchFailurePolicy, Backoff, FlushStrategy, WalkOptions},
    cli, config, error,
};

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
    /// Authorize with Spotify API and cache the token
    Auth,

    /// Create a playlist with every album and single of your followed artists
    Build(BuildArgs),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum OrderArg {
    /// Lexicographic by artist name
    #[default]
    Name,
    /// As returned by Spotify
    Api,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum FlushArg {
    /// Append each album's tracks right after reading it
    #[default]
    Eager,
    /// Read everything first, append once at the end
    Collect,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum FailureArg {
    /// Stop the run and report what was written
    #[default]
    Abort,
    /// Report the chunk and continue
    Skip,
}

#[derive(Parser, Debug, Clone)]
pub struct BuildArgs {
    /// Playlist name [default: current time as YYYY-MM-DD HH:MM]
    #[clap(long)]
    name: Option<String>,

    /// Playlist description
    #[clap(long, default_value = "Play all")]
    description: String,

    /// Make the playlist public
    #[clap(long)]
    public: bool,

    /// Make the playlist collaborative
    #[clap(long)]
    collaborative: bool,

    /// Artist processing order
    #[clap(long, value_enum, default_value_t)]
    order: OrderArg,

    /// When tracks are written to the playlist
    #[clap(long, value_enum, default_value_t)]
    flush: FlushArg,

    /// Also add every saved library album
    #[clap(long)]
    saved_albums: bool,

    /// Skip followed artists (use with --saved-albums)
    #[clap(long)]
    no_followed: bool,

    /// What to do when a batch append fails
    #[clap(long, value_enum, default_value_t)]
    on_write_failure: FailureArg,

    /// Attempts per remote call, 0 retries forever [default: PLAYALL_MAX_ATTEMPTS or 6]
    #[clap(long)]
    max_attempts: Option<u32>,

    /// First backoff wait in milliseconds [default: PLAYALL_BACKOFF_MS or 1000]
    #[clap(long)]
    backoff_ms: Option<u64>,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

impl BuildArgs {
    fn into_options(self, defaults: playall::catalog::RetryPolicy) -> cli::BuildOptions {
        let (default_initial, default_max) = match defaults.backoff {
            Backoff::Fixed(d) => (d, d),
            Backoff::Exponential { initial, max } => (initial, max),
        };
        let retry = if self.max_attempts.is_some() || self.backoff_ms.is_some() {
            config::build_retry_policy(
                self.max_attempts
                    .unwrap_or_else(|| defaults.max_attempts.unwrap_or(0)),
                self.backoff_ms
                    .unwrap_or(default_initial.as_millis() as u64),
                default_max.as_millis() as u64,
            )
        } else {
            defaults
        };

        cli::BuildOptions {
            name: self.name,
            description: self.description,
            public: self.public,
            collaborative: self.collaborative,
            walk: WalkOptions {
                artist_order: match self.order {
                    OrderArg::Name => ArtistOrder::Name,
                    OrderArg::Api => ArtistOrder::Api,
                },
                flush: match self.flush {
                    FlushArg::Eager => FlushStrategy::Eager,
                    FlushArg::Collect => FlushStrategy::CollectThenFlush,
                },
                followed_artists: !self.no_followed,
                saved_albums: self.saved_albums,
            },
            on_write_failure: match self.on_write_failure {
                FailureArg::Abort => BatchFailurePolicy::Abort,
                FailureArg::Skip => BatchFailurePolicy::Skip,
            },
            retry,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("playall=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Command::Completions(opt) = &cli.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
        return;
    }

    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }
    let settings = match config::Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => error!("{}", e),
    };

    let result = match cli.command {
        Command::Auth => cli::auth(&settings).await,
        Command::Build(args) => {
            let opts = args.into_options(settings.retry);
            cli::build(&settings, opts).await
        }
        Command::Completions(_) => Ok(()),
    };

    if let Err(e) = result {
        error!("{}", e);
    }
}
