//! Command-line driver for the segmented recorder.
//!
//! Reads commands from stdin: `start`, `pause`, `resume`, `stop`, `devices`,
//! `quit`. Exits 0 on success, nonzero when a spawn or finalize failed.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;

use log::{error, info};

use segrec::config::AppConfig;
use segrec::constants::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use segrec::devices;
use segrec::error::RecorderError;
use segrec::events::RecorderEvents;
use segrec::ffmpeg::command::{AudioMode, CaptureRegion, RecordingOptions, SyncFilter};
use segrec::ffmpeg::controller::{RecorderState, RecordingController};
use segrec::ffmpeg::encoder::VideoEncoder;

struct ConsoleEvents;

impl RecorderEvents for ConsoleEvents {
    fn on_started(&self) {
        info!("recording started");
    }
    fn on_stopped(&self, code: i32) {
        info!("recording stopped (code {code})");
    }
    fn on_error(&self, err: &RecorderError) {
        error!("[{}] {err}", err.kind());
    }
    fn on_log(&self, line: &str) {
        info!("{line}");
    }
    fn on_state_changed(&self, state: RecorderState) {
        info!("state: {state}");
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load();
    let controller = RecordingController::new(Arc::new(ConsoleEvents));
    let mut exit = ExitCode::SUCCESS;

    let stdin = io::stdin();
    print_prompt();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };
        match line.trim() {
            "" => {}
            "start" => match build_options(&config) {
                Ok(options) => {
                    if controller.start(options).is_err() {
                        exit = ExitCode::FAILURE;
                    }
                }
                Err(message) => {
                    error!("{message}");
                    exit = ExitCode::FAILURE;
                }
            },
            "pause" => {
                let _ = controller.pause();
            }
            "resume" => {
                let _ = controller.resume();
            }
            "stop" => match controller.stop() {
                Ok(path) => info!("saved: {}", path.display()),
                Err(_) => exit = ExitCode::FAILURE,
            },
            "devices" => print_devices(&config),
            "quit" | "exit" => break,
            other => error!("unknown command: {other}"),
        }
        print_prompt();
    }

    // Leave nothing recording behind.
    if controller.state() != RecorderState::Idle && controller.stop().is_err() {
        exit = ExitCode::FAILURE;
    }
    exit
}

fn print_prompt() {
    print!("> ");
    let _ = io::stdout().flush();
}

fn print_devices(config: &AppConfig) {
    let catalog = devices::list_audio_devices(&config.recording.ffmpeg_path);
    if catalog.is_empty() {
        println!("no audio capture devices found");
        return;
    }
    for device in &catalog {
        if device.alternate_name.is_empty() {
            println!("  {}", device.display_name);
        } else {
            println!("  {}  [{}]", device.display_name, device.alternate_name);
        }
    }
    if let Some(pick) = devices::pick_virtual_audio(&catalog) {
        println!("auto-pick: {}", pick.display_name);
    }
}

/// Resolves the audio device and assembles per-session options from config.
fn build_options(config: &AppConfig) -> Result<RecordingOptions, String> {
    let recording = &config.recording;
    let catalog = devices::list_audio_devices(&recording.ffmpeg_path);

    let picked = match recording.audio_device.as_deref() {
        Some(target) if !target.trim().is_empty() => {
            match devices::find_by_name(&catalog, target) {
                Some(device) => Some(device),
                None => return Err(format!("audio device not found: {target}")),
            }
        }
        _ => devices::pick_virtual_audio(&catalog),
    };
    let audio_arg = picked.and_then(devices::device_input_arg);
    let audio_mode = if audio_arg.is_some() { AudioMode::CaptureInput } else { AudioMode::None };

    let sync_filter = match recording.sync_filter.as_str() {
        "resample" => SyncFilter::Resample,
        _ => SyncFilter::None,
    };

    Ok(RecordingOptions {
        ffmpeg_path: recording.ffmpeg_path.clone(),
        output_dir: recording.output_dir.clone().into(),
        framerate: recording.framerate,
        preset: recording.preset.clone(),
        region: CaptureRegion { x: 0, y: 0, width: DEFAULT_WIDTH, height: DEFAULT_HEIGHT },
        audio_mode,
        audio_arg,
        encoder: VideoEncoder::from_name(&recording.encoder),
        audio_delay_ms: recording.audio_delay_ms,
        video_delay_ms: recording.video_delay_ms,
        sync_filter,
    })
}
