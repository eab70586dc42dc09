use std::{
    fs::File,
    io::{self, Read},
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use framesalvage::{
    ConsumeOptions, FfmpegLogLevel, ProgressSink, ProgressUpdate, ReaderSource, SessionStore,
    StreamConsumer, set_ffmpeg_log_level, sniff_format,
};
use indicatif::{ProgressBar, ProgressStyle};

const CLI_AFTER_HELP: &str = "Examples:\n  framesalvage consume capture.bin --stream-id camera-7 --frames 10\n  cat capture.bin | framesalvage consume - --progress\n  framesalvage sniff capture.bin\n  framesalvage completions zsh > _framesalvage";

#[derive(Debug, Parser)]
#[command(
    name = "framesalvage",
    version,
    about = "Recover still frames from container-agnostic video byte streams",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Consume a byte stream and recover frames from it.
    #[command(
        after_help = "Examples:\n  framesalvage consume capture.bin --frames 5 --timeout 30\n  cat capture.bin | framesalvage consume - --json"
    )]
    Consume {
        /// Input file, or '-' to read the stream from stdin.
        input: String,

        /// Stream identifier used for the session directory and summary.
        #[arg(long)]
        stream_id: Option<String>,

        /// Root directory for session output.
        #[arg(long, default_value = "data/raw")]
        out: PathBuf,

        /// Stop after recovering this many frames.
        #[arg(long, default_value_t = 10)]
        frames: u32,

        /// Session timeout in seconds.
        #[arg(long, default_value_t = 60)]
        timeout: u64,

        /// Bytes per stream read.
        #[arg(long, default_value_t = 64 * 1024)]
        chunk_size: usize,

        /// Print the summary as machine-readable JSON.
        #[arg(long)]
        json: bool,

        /// Show a live progress spinner.
        #[arg(long)]
        progress: bool,
    },

    /// Sniff the format of a captured byte stream.
    Sniff {
        /// Input file to inspect.
        input: PathBuf,
    },

    /// Generate shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

struct SpinnerSink {
    bar: ProgressBar,
}

impl ProgressSink for SpinnerSink {
    fn on_progress(&self, update: &ProgressUpdate) {
        self.bar.set_message(format!(
            "{:.1}s | {} frame(s) | {} bytes | {} chunks",
            update.elapsed.as_secs_f64(),
            update.frames_extracted,
            update.bytes_read,
            update.chunks_processed,
        ));
        self.bar.tick();
    }
}

fn main() {
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Consume {
            input,
            stream_id,
            out,
            frames,
            timeout,
            chunk_size,
            json,
            progress,
        } => consume(
            &input, stream_id, &out, frames, timeout, chunk_size, json, progress,
        ),
        Commands::Sniff { input } => sniff(&input),
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            let name = command.get_name().to_string();
            clap_complete::generate(shell, &mut command, name, &mut io::stdout());
            0
        }
    };

    std::process::exit(exit_code);
}

#[allow(clippy::too_many_arguments)]
fn consume(
    input: &str,
    stream_id: Option<String>,
    out: &std::path::Path,
    frames: u32,
    timeout: u64,
    chunk_size: usize,
    json: bool,
    progress: bool,
) -> i32 {
    // The scanners feed FFmpeg malformed data constantly; silence its
    // stderr chatter.
    set_ffmpeg_log_level(FfmpegLogLevel::Quiet);

    let stream_id = stream_id.unwrap_or_else(|| {
        if input == "-" {
            "stdin".to_string()
        } else {
            PathBuf::from(input)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "stream".to_string())
        }
    });

    let store = match SessionStore::create(out, &stream_id) {
        Ok(store) => store,
        Err(error) => {
            eprintln!("{} {error}", "error:".red().bold());
            return 1;
        }
    };

    let options = ConsumeOptions::new()
        .with_target_frames(frames)
        .with_timeout(Duration::from_secs(timeout))
        .with_chunk_size(chunk_size);

    let mut consumer = StreamConsumer::new(store, options);

    let bar = if progress {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner} {msg}").expect("static template is valid"),
        );
        consumer = consumer.with_progress(Arc::new(SpinnerSink { bar: bar.clone() }));
        Some(bar)
    } else {
        None
    };

    let result = if input == "-" {
        consumer.run(ReaderSource::new(io::stdin().lock()))
    } else {
        match File::open(input) {
            Ok(file) => consumer.run(ReaderSource::new(file)),
            Err(error) => {
                eprintln!("{} cannot open {input}: {error}", "error:".red().bold());
                return 1;
            }
        }
    };

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    match result {
        Ok(summary) => {
            if json {
                match serde_json::to_string_pretty(&summary) {
                    Ok(rendered) => println!("{rendered}"),
                    Err(error) => {
                        eprintln!("{} {error}", "error:".red().bold());
                        return 1;
                    }
                }
            } else {
                println!("{}", "Consumption summary".bold());
                println!("  Frames extracted: {}", summary.frames_extracted);
                println!("  Chunks processed: {}", summary.chunks_processed);
                println!("  Bytes read:       {}", summary.bytes_read);
                println!("  Elapsed:          {:.1}s", summary.elapsed_seconds);
                println!("  Stream:           {}", summary.stream_id);
                println!("  Stopped because:  {}", summary.termination_reason);
                println!("  Session dir:      {}", summary.session_dir.display());

                if summary.frames_extracted > 0 {
                    println!(
                        "{}",
                        "Check the frame_*.jpg files for recovered images".green()
                    );
                } else {
                    println!(
                        "{}",
                        "No frames recovered - check stream format and connectivity".yellow()
                    );
                }
            }
            0
        }
        Err(error) => {
            eprintln!("{} {error}", "error:".red().bold());
            1
        }
    }
}

fn sniff(input: &std::path::Path) -> i32 {
    let mut window = vec![0u8; 64];
    let read = match File::open(input).and_then(|mut file| file.read(&mut window)) {
        Ok(read) => read,
        Err(error) => {
            eprintln!(
                "{} cannot read {}: {error}",
                "error:".red().bold(),
                input.display()
            );
            return 1;
        }
    };
    window.truncate(read);

    println!("{}", sniff_format(&window));
    0
}
