//! speechclip main entry point
//!
//! The console front-end's loop watches two sources:
//! 1. stdin lines (text to voice, or `:` commands) from a reader thread
//! 2. speech engine events, drained on every tick along with playback progress

use crossbeam_channel::{select, Receiver};
use log::{debug, error, info};
use speechclip::notice::NoticeLevel;
use speechclip::state::config::Config;
use speechclip::state::Studio;
use speechclip::voices::{Language, VOICES};
use speechclip::{Result, SpeechClipError};
use std::io::{self, BufRead, Write};
use std::process;
use std::thread;
use std::time::{Duration, Instant};

/// How often engine events are drained while waiting for input
const TICK: Duration = Duration::from_millis(50);

const SPARK: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let debug_mode = args.iter().any(|arg| arg == "--debug" || arg == "-d");

    if debug_mode {
        // Debug mode: write to speechclip.log
        use std::fs::OpenOptions;
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open("speechclip.log")
        {
            Ok(log_file) => {
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Debug)
                    .target(env_logger::Target::Pipe(Box::new(log_file)))
                    .init();
            }
            Err(e) => {
                eprintln!("Warning: Failed to open speechclip.log for debug logging: {}", e);
                eprintln!("Continuing without file logging...");
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Warn)
                    .init();
            }
        }

        info!(
            "speechclip version {} starting (debug mode, logging to speechclip.log)",
            speechclip::VERSION
        );
    } else {
        // Normal mode: only errors, to stderr
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Error)
            .init();
    }

    if let Err(e) = run() {
        error!("Fatal error: {}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// What the loop should do after a line
enum Flow {
    Continue,
    Quit,
}

fn run() -> Result<()> {
    let config = Config::load()?;
    let mut studio = Studio::new(config);
    info!("Studio ready - config from {:?}", studio.config.path());

    println!("{} {}", speechclip::APP_NAME, speechclip::VERSION);
    println!("Type text to voice it, or :help for commands");
    print_status(&studio);

    let lines = spawn_stdin_reader()?;
    let mut last_tick = Instant::now();

    loop {
        select! {
            recv(lines) -> line => match line {
                Ok(line) => {
                    if let Flow::Quit = handle_line(&mut studio, line.trim_end()) {
                        break;
                    }
                }
                Err(_) => {
                    debug!("stdin closed");
                    break;
                }
            },
            default(TICK) => {}
        }
        let now = Instant::now();
        studio.tick(now - last_tick);
        last_tick = now;
        print_notices(&mut studio);
    }

    if studio.is_playing() {
        let _ = studio.toggle_playback();
    }
    info!("Exiting");
    Ok(())
}

/// Forward stdin lines over a channel so the loop can keep polling
fn spawn_stdin_reader() -> Result<Receiver<String>> {
    let (tx, rx) = crossbeam_channel::unbounded();
    thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Failed to read stdin: {}", e);
                        break;
                    }
                }
            }
        })?;
    Ok(rx)
}

fn handle_line(studio: &mut Studio, line: &str) -> Flow {
    if line.is_empty() {
        return Flow::Continue;
    }
    let Some(command) = line.strip_prefix(':') else {
        studio.set_text(line);
        println!(
            "Text set ({} chars, ~{:.1}s)",
            line.chars().count(),
            studio.estimated_duration()
        );
        return Flow::Continue;
    };

    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    let result = match name {
        "quit" | "q" => return Flow::Quit,
        "help" | "h" => {
            print_help();
            Ok(())
        }
        "voices" => {
            print_voices(studio);
            Ok(())
        }
        "voice" => match args.first() {
            Some(id) => studio.select_voice(id).map(|voice| {
                println!("Voice: {} {} ({})", voice.gender.symbol(), voice.name, voice.language);
            }),
            None => Err(SpeechClipError::Other("usage: :voice <id>".into())),
        },
        "rate" => parse_arg(&args).map(|v| println!("Rate: {:.2}", studio.set_rate(v))),
        "pitch" => parse_arg(&args).map(|v| println!("Pitch: {:.2}", studio.set_pitch(v))),
        "volume" => parse_arg(&args).map(|v| println!("Volume: {:.2}", studio.set_volume(v))),
        "speak" | "play" | "stop" => {
            if name == "speak" || name == "play" || studio.is_playing() {
                studio.toggle_playback()
            } else {
                Ok(())
            }
        }
        "edit" => {
            let on = studio.toggle_edit_mode();
            println!("Edit mode {}", if on { "on" } else { "off" });
            Ok(())
        }
        "trim" => trim_command(studio, &args),
        "download" => studio.save_download().map(|_| ()),
        "clear" => {
            studio.clear_clip();
            println!("Recording cleared");
            Ok(())
        }
        "save" => studio.save_project().map(|_| ()),
        "projects" => {
            for (i, project) in studio.projects().iter().enumerate() {
                println!(
                    "{:>3}. {} [{}] {} - {}",
                    i + 1,
                    project.name,
                    project.voice_id,
                    project.created.format("%Y-%m-%d %H:%M"),
                    preview(&project.text, 40)
                );
            }
            Ok(())
        }
        "load" => match args.first().and_then(|n| n.parse::<usize>().ok()) {
            Some(n) if n > 0 => studio.load_project(n - 1).map(|_| print_status(studio)),
            _ => Err(SpeechClipError::Other("usage: :load <number>".into())),
        },
        "wave" => {
            println!("{}", sparkline(&studio.waveform(), 64));
            Ok(())
        }
        "status" => {
            print_status(studio);
            Ok(())
        }
        other => Err(SpeechClipError::Other(format!(
            "unknown command ':{}' (try :help)",
            other
        ))),
    };

    if let Err(e) = result {
        debug!("Command '{}' failed: {}", name, e);
        println!("Error: {}", e);
    }
    Flow::Continue
}

fn parse_arg(args: &[&str]) -> Result<f32> {
    args.first()
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| SpeechClipError::Other("expected a number".into()))
}

fn trim_command(studio: &mut Studio, args: &[&str]) -> Result<()> {
    let values: Vec<f64> = args.iter().filter_map(|v| v.parse().ok()).collect();
    let [start, end] = values[..] else {
        return Err(SpeechClipError::Other("usage: :trim <start%> <end%>".into()));
    };
    if !studio.edit_mode() {
        studio.toggle_edit_mode();
    }
    // Reset start so the new end is only bounded by 1%
    studio.set_trim_start(0.0);
    studio.set_trim_end(end);
    let range = studio.set_trim_start(start);
    println!(
        "Trim {:.0}%..{:.0}% (~{}s)",
        range.start_pct(),
        range.end_pct(),
        studio.trimmed_duration()
    );
    Ok(())
}

fn print_notices(studio: &mut Studio) {
    for notice in studio.take_notices() {
        match notice.level {
            NoticeLevel::Error => eprintln!("{}", notice),
            _ => println!("{}", notice),
        }
    }
    let _ = io::stdout().flush();
}

fn print_status(studio: &Studio) {
    let voice = studio.voice();
    let prosody = studio.prosody();
    println!(
        "Voice {} ({}), rate {:.2}, pitch {:.2}, volume {:.2}",
        voice.name,
        voice.id,
        prosody.rate(),
        prosody.pitch(),
        prosody.volume()
    );
    if !studio.text().is_empty() {
        println!("Text: {}", preview(studio.text(), 60));
    }
    if studio.is_playing() || studio.progress() > 0.0 {
        println!(
            "Playback {:.0}% ({}s / {}s)",
            studio.progress(),
            studio.elapsed_seconds(),
            studio.total_seconds()
        );
    }
}

fn print_voices(studio: &Studio) {
    for language in [Language::Russian, Language::English] {
        println!("{}:", language);
        for voice in VOICES.iter().filter(|v| v.language == language) {
            let marker = if voice.id == studio.voice().id { '>' } else { ' ' };
            println!(
                "{} {:<6} {} {:<10} {}",
                marker,
                voice.id,
                voice.gender.symbol(),
                voice.name,
                voice.description
            );
        }
    }
}

fn print_help() {
    println!("Any line without ':' becomes the text to voice.");
    println!("  :voices              list voices");
    println!("  :voice <id>          choose a voice");
    println!("  :rate|:pitch|:volume <value>");
    println!("  :speak / :stop       start or stop playback (recorded)");
    println!("  :edit                toggle edit mode");
    println!("  :trim <start> <end>  keep a percentage window");
    println!("  :download            write the recording");
    println!("  :clear               discard the recording");
    println!("  :save / :projects / :load <n>");
    println!("  :wave                show the live waveform");
    println!("  :quit");
}

fn preview(text: &str, max: usize) -> String {
    let mut out: String = text.chars().take(max).collect();
    if text.chars().count() > max {
        out.push_str("...");
    }
    out
}

/// Peak per column, drawn with block characters
fn sparkline(samples: &[f32], width: usize) -> String {
    if samples.is_empty() {
        return "(no signal)".to_string();
    }
    let per_column = ((samples.len() + width - 1) / width).max(1);
    samples
        .chunks(per_column)
        .map(|chunk| {
            let peak = chunk.iter().fold(0.0f32, |acc, s| acc.max(s.abs())).min(1.0);
            SPARK[(peak * (SPARK.len() - 1) as f32).round() as usize]
        })
        .collect()
}
