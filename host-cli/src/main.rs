//! # lyric-cli
//!
//! 歌词动画播放器的无窗口宿主。
//!
//! ## 用法
//!
//! ```bash
//! # 检查 SRT 文件
//! cargo run -p lyric-cli -- check lyrics.srt
//!
//! # 逐帧运行并输出摘要
//! cargo run -p lyric-cli -- play lyrics.srt --strategy words --effect city_pop
//!
//! # 输出 JSON 帧，1.5 秒时切换透明背景
//! cargo run -p lyric-cli -- play lyrics.srt --format json --key 1500:b
//! ```

mod config;
mod measure;
mod output;
mod session;
mod settings;
mod transport;

use std::fs;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::{Parser as ClapParser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lyric_runtime::{
    CueTrack, Diagnostic, Granularity, KeyAction, LyricPlayer, Parser, TextEffect, Transport,
    format_timecode,
};

use config::{AppConfig, Overrides};
use measure::EstimatingMeasurer;
use output::{FrameSink, OutputFormat};
use session::{KeyPress, PlaySession, run_to_end};
use settings::SettingsStore;
use transport::SimulatedTransport;

/// 最后一条歌词结束后继续运行的时长，让淡出和粒子播完
const TAIL_MS: f64 = 3000.0;

#[derive(ClapParser)]
#[command(name = "lyric-cli")]
#[command(about = "歌词动画播放器 - 无窗口宿主")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 日志详细程度（-v info，-vv debug，-vvv trace；RUST_LOG 优先）
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// 写出默认配置文件
    InitConfig {
        /// 输出路径（默认：lyric-config.json）
        #[arg(default_value = "lyric-config.json")]
        path: PathBuf,

        /// 覆盖已存在的文件
        #[arg(long)]
        force: bool,
    },

    /// 解析 SRT 文件，打印诊断和歌词表
    Check {
        /// SRT 文件路径
        srt: PathBuf,
    },

    /// 运行逐帧循环并输出每帧的绘制描述
    Play {
        /// SRT 文件路径
        srt: PathBuf,

        /// 配置文件（默认：lyric-config.json）
        #[arg(short, long, default_value = "lyric-config.json")]
        config: PathBuf,

        /// 用户设置文件（覆盖配置文件中的路径）
        #[arg(long)]
        settings: Option<PathBuf>,

        /// 帧率
        #[arg(long)]
        fps: Option<u32>,

        /// 起始播放位置（毫秒）
        #[arg(long, default_value_t = 0.0)]
        from: f64,

        /// 结束播放位置（毫秒，默认：最后一条歌词结束后 3 秒）
        #[arg(long)]
        until: Option<f64>,

        /// 切分策略（line, two_rows, words, chars, current_words, current_chars）
        #[arg(long)]
        strategy: Option<Granularity>,

        /// 文字特效（simple, jitter, city_pop, city_pop_star）
        #[arg(long)]
        effect: Option<TextEffect>,

        /// 输出格式
        #[arg(long, value_enum, default_value_t = OutputFormat::Summary)]
        format: OutputFormat,

        /// 随机种子（固定后输出可复现）
        #[arg(long)]
        seed: Option<u64>,

        /// 按键脚本 AT_MS:KEY，可重复（s 开始/暂停，r 重置，b 背景，m 静音）
        #[arg(long = "key")]
        keys: Vec<KeyPress>,

        /// 不自动开始，等待按键脚本中的 s
        #[arg(long)]
        wait: bool,

        /// 资源目录；给出时检查字体和音频文件是否存在
        #[arg(long)]
        assets: Option<PathBuf>,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_srt(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("无法读取 SRT 文件: {}", path.display()))
}

fn check(srt: &Path) -> anyhow::Result<()> {
    eprintln!("==> 解析 {}", srt.display());
    let text = read_srt(srt)?;
    let outcome = Parser::new().parse(&text);

    for d in &outcome.diagnostics {
        eprintln!("{d}");
    }

    if outcome.records.is_empty() {
        eprintln!("{}", Diagnostic::error(0, "文件中没有可用的歌词记录"));
        bail!("{} 没有可用的歌词记录", srt.display());
    }

    let track = CueTrack::build(outcome.records, Default::default(), 0.0);
    println!("{:>6}  {:<12}  {:<12}  文本", "编号", "开始", "结束");
    for cue in track.iter() {
        println!(
            "{:>6}  {:<12}  {:<12}  {}",
            cue.id,
            format_timecode(cue.start_ms as f64),
            format_timecode(cue.end_ms as f64),
            cue.text.replace('\n', " / ")
        );
    }

    eprintln!(
        "==> {} 条歌词，丢弃 {} 条记录",
        track.len(),
        outcome.diagnostics.len()
    );
    Ok(())
}

fn init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!("{} 已存在（使用 --force 覆盖）", path.display());
    }
    AppConfig::default()
        .save(path)
        .with_context(|| format!("无法写入配置文件: {}", path.display()))?;
    eprintln!("==> 已写入 {}", path.display());
    Ok(())
}

/// 检查资源文件，返回第一个缺失项的描述
fn missing_asset(assets: &Path, config: &AppConfig) -> Option<String> {
    let style = &config.player.style;
    let song = &config.player.song;
    [
        ("字体", &style.font_filename),
        ("音频", &song.audio_filename),
    ]
    .into_iter()
    .map(|(kind, name)| (kind, assets.join(name)))
    .find(|(_, path)| !path.is_file())
    .map(|(kind, path)| format!("{}文件不存在: {}", kind, path.display()))
}

struct PlayArgs {
    srt: PathBuf,
    config: PathBuf,
    overrides: Overrides,
    from: f64,
    until: Option<f64>,
    format: OutputFormat,
    seed: Option<u64>,
    keys: Vec<KeyPress>,
    wait: bool,
    assets: Option<PathBuf>,
}

fn play(args: PlayArgs) -> anyhow::Result<()> {
    let mut config = AppConfig::load(&args.config);
    config.apply(&args.overrides);
    config.validate().context("配置无效")?;

    let text = read_srt(&args.srt)?;
    let player_config = config.player.clone();
    let (track, diagnostics) = CueTrack::from_srt(
        &text,
        player_config.strategy(),
        player_config.lyrics.warmup_ms,
    );
    for d in &diagnostics {
        eprintln!("{d}");
    }

    let until_ms = args.until.unwrap_or_else(|| {
        track
            .iter()
            .map(|cue| cue.end_ms as f64)
            .fold(0.0, f64::max)
            + TAIL_MS
    });

    let store = SettingsStore::new(&config.settings_path);
    let settings = store.load();
    info!(path = %store.path().display(), ?settings, "用户设置");
    info!(
        strategy = player_config.lyrics.granularity.name(),
        effect = player_config.lyrics.effect.name(),
        cues = track.len(),
        until_ms,
        "准备播放"
    );

    let mut transport = SimulatedTransport::new(Some(until_ms));
    transport.seek(args.from);

    let mut player = LyricPlayer::new(
        player_config,
        track,
        transport,
        EstimatingMeasurer::new(),
        settings,
    )?;
    if let Some(seed) = args.seed {
        player = player.with_seed(seed);
    }

    let failure = if player.track().is_empty() {
        Some("没有可用的歌词记录".to_string())
    } else {
        args.assets
            .as_deref()
            .and_then(|dir| missing_asset(dir, &config))
    };
    match &failure {
        Some(message) => player.fail(message.clone()),
        None => player.mark_ready(),
    }

    let mut keys = args.keys;
    if !args.wait {
        keys.insert(
            0,
            KeyPress {
                at_ms: 0.0,
                action: KeyAction::StartOrToggle,
            },
        );
    }

    let stdout = io::stdout();
    let sink = FrameSink::new(args.format, BufWriter::new(stdout.lock()));
    let mut session = PlaySession::new(player, store, keys, config.frame_interval_ms());
    let (_, stats) = run_to_end(&mut session, until_ms, sink)?;

    if let Some(message) = failure {
        bail!("启动失败: {}", message);
    }
    if session.player().transport().position_ms() < until_ms {
        warn!(
            position_ms = session.player().transport().position_ms(),
            until_ms, "播放在到达结束位置前停止"
        );
    }
    info!(frames = stats.frames, peak = stats.peak_commands, "完成");
    Ok(())
}

fn real_main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::InitConfig { path, force } => init_config(&path, force),
        Commands::Check { srt } => check(&srt),
        Commands::Play {
            srt,
            config,
            settings,
            fps,
            from,
            until,
            strategy,
            effect,
            format,
            seed,
            keys,
            wait,
            assets,
        } => play(PlayArgs {
            srt,
            config,
            overrides: Overrides {
                fps,
                settings_path: settings,
                granularity: strategy,
                effect,
            },
            from,
            until,
            format,
            seed,
            keys,
            wait,
            assets,
        }),
    }
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("lyric-cli error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}
