//! Encoder command construction.
//!
//! [`build_args`] is a pure mapping from recording options and a target
//! output path to the encoder argument list; it performs no I/O and consults
//! no state beyond its inputs.

use std::path::{Path, PathBuf};

use crate::constants::{
    AUDIO_BITRATE, AUDIO_CHANNELS, AUDIO_CODEC, AUDIO_SAMPLE_RATE, AUDIO_THREAD_QUEUE_SIZE,
    CAPTURE_BACKEND, RESAMPLE_FILTER, VIDEO_INPUT_FORMAT, VIDEO_INPUT_SOURCE,
};
use crate::ffmpeg::encoder::VideoEncoder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioMode {
    None,
    CaptureInput,
}

/// Drift-correction filter applied to the audio stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncFilter {
    #[default]
    None,
    Resample,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Immutable per-segment recording configuration.
#[derive(Debug, Clone)]
pub struct RecordingOptions {
    pub ffmpeg_path: String,
    pub output_dir: PathBuf,
    pub framerate: u32,
    pub preset: String,
    pub region: CaptureRegion,
    pub audio_mode: AudioMode,
    /// Resolved capture input argument, e.g. `audio=@device_cm_{...}\wave_{...}`.
    pub audio_arg: Option<String>,
    pub encoder: VideoEncoder,
    pub audio_delay_ms: i64,
    pub video_delay_ms: i64,
    pub sync_filter: SyncFilter,
}

impl RecordingOptions {
    fn has_audio(&self) -> bool {
        self.audio_mode == AudioMode::CaptureInput
            && self.audio_arg.as_deref().is_some_and(|a| !a.is_empty())
    }
}

/// Builds the full encoder argument list for one segment.
pub fn build_args(options: &RecordingOptions, out_file: &Path) -> Vec<String> {
    let region = &options.region;
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-hide_banner".into(),
        "-v".into(),
        "info".into(),
        // Video capture input.
        "-f".into(),
        VIDEO_INPUT_FORMAT.into(),
        "-framerate".into(),
        options.framerate.to_string(),
        "-offset_x".into(),
        region.x.to_string(),
        "-offset_y".into(),
        region.y.to_string(),
        "-video_size".into(),
        format!("{}x{}", region.width, region.height),
    ];
    push_delay(&mut args, options.video_delay_ms);
    args.push("-i".into());
    args.push(VIDEO_INPUT_SOURCE.into());

    let has_audio = options.has_audio();
    if has_audio {
        args.push("-thread_queue_size".into());
        args.push(AUDIO_THREAD_QUEUE_SIZE.into());
        args.push("-f".into());
        args.push(CAPTURE_BACKEND.into());
        push_delay(&mut args, options.audio_delay_ms);
        args.push("-i".into());
        // has_audio already checked the argument is present and non-empty.
        args.push(options.audio_arg.clone().unwrap_or_default());
    }

    // Video encode.
    args.push("-c:v".into());
    args.push(options.encoder.as_ffmpeg_codec().into());
    args.push("-preset".into());
    args.push(
        options
            .encoder
            .fixed_preset()
            .unwrap_or(options.preset.as_str())
            .into(),
    );
    args.push("-pix_fmt".into());
    args.push("yuv420p".into());

    // Audio encode.
    if has_audio {
        args.extend([
            "-c:a".into(),
            AUDIO_CODEC.into(),
            "-b:a".into(),
            AUDIO_BITRATE.into(),
            "-ar".into(),
            AUDIO_SAMPLE_RATE.into(),
            "-ac".into(),
            AUDIO_CHANNELS.into(),
        ]);
        if options.sync_filter == SyncFilter::Resample {
            args.push("-af".into());
            args.push(RESAMPLE_FILTER.into());
        }
    } else {
        args.push("-an".into());
    }

    // Output compatibility flags, then the target path last.
    args.push("-movflags".into());
    args.push("+faststart".into());
    args.push(out_file.to_string_lossy().into_owned());
    args
}

/// Inserts a time-offset argument ahead of the next input when the delay is
/// non-zero.
fn push_delay(args: &mut Vec<String>, delay_ms: i64) {
    if delay_ms != 0 {
        args.push("-itsoffset".into());
        args.push(format!("{:.3}", delay_ms as f64 / 1000.0));
    }
}
