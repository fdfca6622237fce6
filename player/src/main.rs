use std::{path::PathBuf, process::ExitCode, sync::Arc};

use bili_api::{BiliClient, VideoId};
use bv_player::{
    config::Config,
    console::{format_comment, ConsoleDanmakuRenderer, ConsolePlayer},
    ContentId, LoadPhase, PlayerSession,
};
use clap::{Args, Parser, Subcommand};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

#[derive(Parser)]
#[command(name = "bv-player", version, about = "Play bilibili videos from the terminal")]
struct Cli {
    /// Config file, defaults to Conf.toml in the user config dir
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve streams and danmaku of a video page
    Play {
        #[arg(long)]
        avid: i64,
        #[arg(long)]
        cid: i64,
        /// Number of danmaku to print
        #[arg(long, default_value_t = 10)]
        preview: usize,
    },
    /// Fetch and decode the danmaku document of a page
    Danmaku {
        #[arg(long)]
        cid: i64,
        #[arg(long, default_value_t = 10)]
        preview: usize,
    },
    /// List popular videos
    Popular {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        size: u32,
    },
    /// Show video details
    Info(VideoArgs),
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct VideoArgs {
    #[arg(long)]
    aid: Option<i64>,
    #[arg(long)]
    bvid: Option<String>,
}

impl VideoArgs {
    fn video_id(self) -> Option<VideoId> {
        match (self.aid, self.bvid) {
            (Some(aid), _) => Some(VideoId::Aid(aid)),
            (None, Some(bvid)) => Some(VideoId::Bvid(bvid)),
            (None, None) => None,
        }
    }
}

fn init_logger(config: &Config) {
    let log_config = ConfigBuilder::new()
        .add_filter_ignore_str("reqwest")
        .add_filter_ignore_str("hyper")
        .build();
    if let Err(e) = TermLogger::init(
        config.log_level(),
        log_config,
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ) {
        eprintln!("Failed to init logger: {e}");
    }
}

async fn play(
    client: BiliClient,
    config: &Config,
    content: ContentId,
    preview: usize,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let player = Arc::new(ConsolePlayer::default());
    let renderer = Arc::new(ConsoleDanmakuRenderer::new(preview));
    let session = PlayerSession::new(
        Arc::new(client),
        player.clone(),
        renderer.clone(),
        config.session_options(),
    );

    session.resolve_session(content).await;
    let state = session.join().await;
    if state.load_phase == LoadPhase::Failed {
        eprintln!(
            "Play {content} failed: {}",
            state.error_detail.unwrap_or_default()
        );
        return Ok(ExitCode::FAILURE);
    }

    if let Some(streams) = &state.resolved_streams {
        for (code, label) in streams.quality_options.iter() {
            let mark = if code == streams.quality { "*" } else { " " };
            println!("{mark} {code:>4} {label}");
        }
        println!("video: {}", streams.video_uri);
        println!("audio: {}", streams.audio_uri);
    }
    if let Some(source) = player.current() {
        for (name, value) in &source.headers {
            println!("header: {name}: {value}");
        }
    }
    println!("danmaku: {}", renderer.count());
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match cli.config.or_else(Config::default_path) {
        Some(path) => Config::load(&path),
        None => Config::default(),
    };
    init_logger(&config);

    let client = BiliClient::new(config.client_config())?;
    match cli.command {
        Command::Play { avid, cid, preview } => {
            return play(client, &config, ContentId { avid, cid }, preview).await;
        }
        Command::Danmaku { cid, preview } => {
            let resp = client.get_danmaku_xml(cid).await?;
            println!(
                "chat {} on {} ({}), max {}, {} danmaku, {} skipped",
                resp.chat_id,
                resp.chat_server,
                resp.source,
                resp.max_limit,
                resp.data.len(),
                resp.skipped
            );
            for comment in resp.comments().iter().take(preview) {
                println!("{}", format_comment(comment));
            }
        }
        Command::Popular { page, size } => {
            let videos = client.get_popular_videos(page, size).await?;
            println!("{}", serde_json::to_string_pretty(&videos)?);
        }
        Command::Info(args) => {
            let Some(id) = args.video_id() else {
                return Ok(ExitCode::FAILURE);
            };
            let info = client.get_video_info(&id).await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    }
    Ok(ExitCode::SUCCESS)
}
