use std::{
    fmt::Write as _,
    io::{self, BufRead, Write},
    path::PathBuf,
    sync::mpsc::{self, RecvTimeoutError},
    thread,
    time::{Duration, Instant},
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell as CompletionShell;
use colored::Colorize;
use image::{RgbImage, imageops::FilterType};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use vidshelf::{
    Backend, CatalogBrowser, FfmpegLogLevel, Frame, FrameSink, Playback, PlaybackEngine,
    PreviewGenerator, PreviewOutcome, Shell, ShelfOptions, SourceProbe,
};

const CLI_AFTER_HELP: &str = "Examples:\n  vidshelf add https://example.com/clip.mp4 \"Clip\"\n  vidshelf list\n  vidshelf play 1\n  vidshelf play Clip --backend subprocess\n  vidshelf open rtsp://camera.local/stream --headless --duration 10\n  vidshelf completions zsh > _vidshelf";

const PLAYBACK_HELP: &str =
    "controls: [enter]/p play-pause  + faster  - slower  r reset speed  q quit";

#[derive(Debug, Parser)]
#[command(
    name = "vidshelf",
    version,
    about = "Register, browse, and play videos",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Catalog file (default: videos.json).
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Thumbnail directory (default: thumbnails).
    #[arg(long, global = true)]
    thumbnails: Option<PathBuf>,

    /// Thumbnail image extension (jpg, png, bmp, ...).
    #[arg(long, global = true)]
    thumbnail_ext: Option<String>,

    /// Playback backend (pump, subprocess, player).
    #[arg(long, global = true)]
    backend: Option<String>,

    /// ffmpeg program used by the subprocess backend.
    #[arg(long, global = true)]
    ffmpeg: Option<String>,

    /// Player program used by the player backend.
    #[arg(long, global = true)]
    player: Option<String>,

    /// FFmpeg log level (quiet, fatal, error, warning, info, debug).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate a thumbnail preview for a URL.
    #[command(
        about = "Generate a preview still",
        after_help = "Examples:\n  vidshelf preview input.mp4 \"Holiday\""
    )]
    Preview {
        /// Video URL or path.
        url: String,
        /// Display name (also names the thumbnail file).
        name: String,
    },

    /// Register a video in the catalog.
    #[command(
        about = "Save a video to the catalog",
        visible_alias = "save",
        after_help = "Examples:\n  vidshelf add input.mp4 \"Holiday\"\n  vidshelf add rtsp://cam/stream \"Porch\" --no-preview"
    )]
    Add {
        /// Video URL or path.
        url: String,
        /// Display name.
        name: String,
        /// Do not generate a preview before saving.
        #[arg(long)]
        no_preview: bool,
    },

    /// Show the catalog as a grid.
    #[command(about = "List saved videos", visible_alias = "start")]
    List {
        /// Output the catalog as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Play a catalog entry by number (1-based) or name.
    #[command(about = "Play a saved video")]
    Play {
        entry: String,
        #[command(flatten)]
        playback: PlaybackArgs,
    },

    /// Play a URL directly, without saving it.
    #[command(about = "Play a URL")]
    Open {
        url: String,
        #[command(flatten)]
        playback: PlaybackArgs,
    },

    /// Print source metadata.
    #[command(about = "Inspect a source", visible_alias = "probe")]
    Info {
        url: String,
        /// Output metadata as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Regenerate thumbnails whose files have gone missing.
    #[command(about = "Regenerate stale previews")]
    RefreshPreviews,

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Debug, Clone, clap::Args)]
struct PlaybackArgs {
    /// Do not draw frames; only report progress.
    #[arg(long)]
    headless: bool,

    /// Close playback automatically after this many seconds.
    #[arg(long, value_parser = parse_seconds)]
    duration: Option<Duration>,

    /// Width of the terminal frame area in character cells.
    #[arg(long, default_value_t = 80)]
    width: u32,
}

/// One playback control read from the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    TogglePlayPause,
    Faster,
    Slower,
    ResetSpeed,
    Quit,
}

fn parse_control(line: &str) -> Option<Control> {
    match line.trim().to_ascii_lowercase().as_str() {
        "" | "p" | "pause" | "play" => Some(Control::TogglePlayPause),
        "+" | "f" | "faster" => Some(Control::Faster),
        "-" | "s" | "slower" => Some(Control::Slower),
        "r" | "reset" => Some(Control::ResetSpeed),
        "q" | "quit" | "exit" => Some(Control::Quit),
        _ => None,
    }
}

/// Parse a positive number of seconds that fits in a [`Duration`].
fn parse_seconds(value: &str) -> Result<Duration, String> {
    let seconds: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("`{value}` is not a number of seconds"))?;
    if seconds <= 0.0 {
        return Err(format!("duration must be positive, got {value}"));
    }
    Duration::try_from_secs_f64(seconds).map_err(|error| format!("duration `{value}`: {error}"))
}

/// Resolve a `play` argument to a tile index: a 1-based number or a name.
fn resolve_entry(browser: &CatalogBrowser, entry: &str) -> Option<usize> {
    if let Ok(number) = entry.trim().parse::<usize>() {
        return (number >= 1 && number <= browser.len()).then(|| number - 1);
    }
    browser.find(entry.trim())
}

fn shelf_options(global: &GlobalOptions) -> Result<ShelfOptions, Box<dyn std::error::Error>> {
    let mut options = ShelfOptions::new();
    if let Some(path) = &global.catalog {
        options = options.with_catalog_path(path);
    }
    if let Some(directory) = &global.thumbnails {
        options = options.with_thumbnail_directory(directory);
    }
    if let Some(extension) = &global.thumbnail_ext {
        options = options.with_thumbnail_extension(extension);
    }
    if let Some(backend) = &global.backend {
        options = options.with_backend(backend.parse::<Backend>()?);
    }
    if let Some(program) = &global.ffmpeg {
        options = options.with_ffmpeg_program(program);
    }
    if let Some(program) = &global.player {
        options = options.with_player_program(program);
    }
    Ok(options)
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    let default_filter = if global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let level = match &global.log_level {
        Some(level) => level.parse::<FfmpegLogLevel>()?,
        None => FfmpegLogLevel::Error,
    };
    vidshelf::set_ffmpeg_log_level(level);
    Ok(())
}

fn spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Draws frames into the terminal with upper-half-block cells, two pixel
/// rows per character row.
struct TerminalSink {
    columns: u32,
    output: String,
}

impl TerminalSink {
    fn new(columns: u32) -> Self {
        Self {
            columns: columns.max(8),
            output: String::new(),
        }
    }

    fn render(&mut self, frame: &Frame) -> Option<()> {
        let source = RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())?;
        // Character cells are roughly twice as tall as wide; each holds two
        // pixel rows, so one pixel per cell horizontally keeps proportions.
        let width = self.columns;
        let height = ((frame.height() as f64 * width as f64 / frame.width().max(1) as f64)
            .round() as u32)
            .max(2)
            / 2
            * 2;
        let scaled = image::imageops::resize(&source, width, height, FilterType::Nearest);

        self.output.clear();
        self.output.push_str("\x1b[H");
        for y in (0..height).step_by(2) {
            for x in 0..width {
                let top = scaled.get_pixel(x, y).0;
                let bottom = scaled.get_pixel(x, y + 1).0;
                let _ = write!(
                    self.output,
                    "{}",
                    "\u{2580}"
                        .truecolor(top[0], top[1], top[2])
                        .on_truecolor(bottom[0], bottom[1], bottom[2])
                );
            }
            self.output.push('\n');
        }

        let mut stdout = io::stdout().lock();
        stdout.write_all(self.output.as_bytes()).ok()?;
        stdout.flush().ok()
    }
}

impl FrameSink for TerminalSink {
    fn present(&mut self, frame: &Frame) {
        if self.render(frame).is_none() {
            log::debug!("Dropped a frame the terminal could not draw");
        }
    }
}

fn print_status(engine: &PlaybackEngine) {
    let state = if engine.is_playing() { "Playing" } else { "Paused" };
    eprintln!(
        "{} {}  speed {}  frames {}",
        state.cyan().bold(),
        engine.url(),
        engine.speed_label().yellow(),
        engine.frames_presented()
    );
}

/// Drive an engine from terminal input until quit, end of input, or the
/// optional time limit. Runs on the main thread; stdin is read on a helper
/// thread that only forwards lines.
fn run_controls(engine: &mut PlaybackEngine, step: f64, limit: Option<Duration>) {
    let (sender, receiver) = mpsc::channel::<Option<String>>();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if sender.send(Some(line)).is_err() {
                return;
            }
        }
        let _ = sender.send(None);
    });

    let deadline = limit.and_then(|limit| Instant::now().checked_add(limit));
    let mut input_open = true;
    loop {
        let wait = match deadline {
            Some(deadline) => match deadline.checked_duration_since(Instant::now()) {
                Some(remaining) => remaining,
                None => break,
            },
            None => Duration::from_secs(3600),
        };

        let line = if input_open {
            match receiver.recv_timeout(wait) {
                Ok(Some(line)) => line,
                Ok(None) | Err(RecvTimeoutError::Disconnected) => {
                    input_open = false;
                    if deadline.is_none() {
                        break;
                    }
                    continue;
                }
                Err(RecvTimeoutError::Timeout) => continue,
            }
        } else {
            thread::sleep(wait);
            continue;
        };

        match parse_control(&line) {
            Some(Control::TogglePlayPause) => {
                engine.toggle_play_pause();
            }
            Some(Control::Faster) => {
                engine.change_speed(step);
            }
            Some(Control::Slower) => {
                engine.change_speed(-step);
            }
            Some(Control::ResetSpeed) => engine.reset_speed(),
            Some(Control::Quit) => break,
            None => {
                eprintln!("{}", PLAYBACK_HELP.dimmed());
                continue;
            }
        }
        print_status(engine);
    }

    engine.close();
}

fn play(shell: &Shell, url: &str, args: &PlaybackArgs) -> Result<(), Box<dyn std::error::Error>> {
    let opening = spinner(format!("opening {url}"));
    let playback = if args.headless {
        shell.play(url, |_frame: &Frame| {})
    } else {
        shell.play(url, TerminalSink::new(args.width))
    };
    opening.finish_and_clear();

    match playback? {
        Playback::Engine(mut engine) => {
            if !args.headless {
                print!("\x1b[2J");
            }
            eprintln!("{}", PLAYBACK_HELP.dimmed());
            print_status(&engine);
            run_controls(&mut engine, shell.options().playback().speed_step, args.duration);
            println!(
                "{} {} ({} frame(s), {} loop(s))",
                "closed".green().bold(),
                url,
                engine.frames_presented(),
                engine.loops_completed()
            );
        }
        Playback::Handoff(child) => {
            println!(
                "{} {} -> {} (pid {})",
                "handed off".green().bold(),
                url,
                shell.options().player_program(),
                child.id()
            );
        }
    }
    Ok(())
}

fn print_grid(browser: &CatalogBrowser) {
    if browser.is_empty() {
        println!("{}", "No videos saved yet. Add one with `vidshelf add <url> <name>`.".dimmed());
        return;
    }

    let cell_width = browser
        .tiles()
        .iter()
        .map(|tile| tile.name.chars().count())
        .max()
        .unwrap_or(0)
        .clamp(8, 28)
        + 6;

    let mut number = 1;
    for row in browser.rows() {
        let mut line = String::new();
        for tile in row {
            let marker = if tile.preview.is_some() { "\u{25a3}" } else { "\u{25a1}" };
            let label = format!("{number:>2}. {marker} {}", tile.name);
            let _ = write!(line, "{label:<cell_width$}  ");
            number += 1;
        }
        println!("{}", line.trim_end());
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;
    let shell = Shell::new(shelf_options(&cli.global)?);

    match cli.command {
        Commands::Preview { url, name } => {
            let settings = shell.settings();
            let working = spinner(format!("decoding first frame of {url}"));
            let outcome = settings.generate_preview(&url, &name);
            working.finish_and_clear();

            match outcome {
                PreviewOutcome::Saved(path) => {
                    let shown = PreviewGenerator::display_thumbnail(&path)
                        .map(|image| format!(" ({}x{} shown)", image.width(), image.height()))
                        .unwrap_or_default();
                    println!("{} {}{shown}", "saved".green().bold(), path.display());
                }
                PreviewOutcome::Unavailable => {
                    println!("{}", "preview unavailable".yellow());
                }
            }
        }
        Commands::Add {
            url,
            name,
            no_preview,
        } => {
            let settings = shell.settings();
            if !no_preview {
                let working = spinner(format!("decoding first frame of {url}"));
                let outcome = settings.generate_preview(&url, &name);
                working.finish_and_clear();
                if !outcome.is_saved() {
                    eprintln!("{} {}", "warning:".yellow().bold(), "preview unavailable".yellow());
                }
            }

            if settings.save(&url, &name) {
                println!("{} {}", "saved".green().bold(), name);
            } else {
                println!("{}", "nothing saved".yellow());
            }
        }
        Commands::List { json } => {
            let browser = shell.start();
            if json {
                let payload: Vec<_> = browser
                    .tiles()
                    .iter()
                    .enumerate()
                    .map(|(index, tile)| {
                        json!({
                            "number": index + 1,
                            "name": tile.name,
                            "url": tile.url,
                            "preview": tile.preview.as_ref().map(|path| path.display().to_string()),
                            "row": tile.row,
                            "column": tile.column,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print_grid(&browser);
            }
        }
        Commands::Play { entry, playback } => {
            let browser = shell.start();
            let index = resolve_entry(&browser, &entry)
                .ok_or(format!("no catalog entry matches `{entry}`"))?;
            let url = browser
                .activate(index)
                .ok_or(format!("no catalog entry matches `{entry}`"))?
                .to_string();
            play(&shell, &url, &playback)?;
        }
        Commands::Open { url, playback } => {
            play(&shell, &url, &playback)?;
        }
        Commands::Info { url, json } => {
            let probing = spinner(format!("probing {url}"));
            let result = SourceProbe::probe(&url);
            probing.finish_and_clear();
            let info = result?;

            if json {
                let payload = json!({
                    "format": info.format,
                    "duration_seconds": info.duration.as_secs_f64(),
                    "width": info.width,
                    "height": info.height,
                    "fps": info.frames_per_second,
                    "codec": info.codec,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Format: {}", info.format);
                println!("Duration: {:?}", info.duration);
                println!(
                    "Video: {}x{} @ {:.2} fps [{}]",
                    info.width, info.height, info.frames_per_second, info.codec,
                );
            }
        }
        Commands::RefreshPreviews => {
            let records = shell.catalog().load();
            let settings = shell.settings();
            let working = spinner("regenerating stale previews".to_string());
            let results = settings.previews().refresh_stale(&records);
            working.finish_and_clear();

            if results.is_empty() {
                println!("{}", "all previews present".green());
            }
            for (name, outcome) in results {
                match outcome {
                    PreviewOutcome::Saved(path) => {
                        println!("{} {} -> {}", "saved".green().bold(), name, path.display())
                    }
                    PreviewOutcome::Unavailable => {
                        println!("{} {}", "unavailable".yellow().bold(), name)
                    }
                }
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "vidshelf", &mut io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use vidshelf::{CatalogBrowser, VideoRecord};

    use std::time::Duration;

    use super::{Control, parse_control, parse_seconds, resolve_entry};

    #[test]
    fn parse_seconds_accepts_positive_values() {
        assert_eq!(parse_seconds("10"), Ok(Duration::from_secs(10)));
        assert_eq!(parse_seconds(" 0.5 "), Ok(Duration::from_millis(500)));
    }

    #[test]
    fn parse_seconds_rejects_out_of_range_values() {
        for value in ["inf", "1e30", "NaN", "0", "-3", "soon"] {
            assert!(parse_seconds(value).is_err(), "{value}");
        }
    }

    #[test]
    fn parse_control_aliases() {
        assert_eq!(parse_control(""), Some(Control::TogglePlayPause));
        assert_eq!(parse_control("P"), Some(Control::TogglePlayPause));
        assert_eq!(parse_control("+"), Some(Control::Faster));
        assert_eq!(parse_control(" slower "), Some(Control::Slower));
        assert_eq!(parse_control("r"), Some(Control::ResetSpeed));
        assert_eq!(parse_control("quit"), Some(Control::Quit));
        assert_eq!(parse_control("rewind"), None);
    }

    #[test]
    fn resolve_entry_by_number_or_name() {
        let records = vec![
            VideoRecord::new("a.mp4", "Alpha"),
            VideoRecord::new("b.mp4", "Beta"),
        ];
        let browser = CatalogBrowser::new(&records);
        assert_eq!(resolve_entry(&browser, "1"), Some(0));
        assert_eq!(resolve_entry(&browser, "2"), Some(1));
        assert_eq!(resolve_entry(&browser, "0"), None);
        assert_eq!(resolve_entry(&browser, "3"), None);
        assert_eq!(resolve_entry(&browser, "beta"), Some(1));
        assert_eq!(resolve_entry(&browser, "Gamma"), None);
    }
}
