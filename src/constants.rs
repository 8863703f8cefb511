// Output Naming
pub const OUTPUT_PREFIX: &str = "record_";
pub const OUTPUT_EXTENSION: &str = "mp4";
pub const SEGMENT_DIR_PREFIX: &str = ".segments_";
pub const SEGMENT_FILE_PREFIX: &str = "seg";
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
pub const CONCAT_LIST_NAME: &str = "concat.txt";

// Capture Defaults
pub const DEFAULT_FRAMERATE: u32 = 30;
pub const DEFAULT_VIDEO_PRESET: &str = "veryfast";
pub const DEFAULT_WIDTH: u32 = 1920;
pub const DEFAULT_HEIGHT: u32 = 1080;
pub const VIDEO_INPUT_FORMAT: &str = "gdigrab";
pub const VIDEO_INPUT_SOURCE: &str = "desktop";

// Audio Encode Defaults
pub const AUDIO_CODEC: &str = "aac";
pub const AUDIO_BITRATE: &str = "192k";
pub const AUDIO_SAMPLE_RATE: &str = "48000";
pub const AUDIO_CHANNELS: &str = "2";
pub const AUDIO_THREAD_QUEUE_SIZE: &str = "1024";
pub const RESAMPLE_FILTER: &str = "aresample=async=1";

// Hardware Encoder Presets (vendor preset names differ per encoder family)
pub const HW_PRESET_NVENC: &str = "p4";
pub const HW_PRESET_QSV: &str = "veryfast";
pub const HW_PRESET_AMF: &str = "balanced";

// Process Supervision
pub const START_CONFIRM_WINDOW_MS: u64 = 500;
pub const GRACEFUL_STOP_TIMEOUT_MS: u64 = 3000;
pub const TERMINATE_TIMEOUT_MS: u64 = 3000;
pub const KILL_WAIT_TIMEOUT_MS: u64 = 2000;
pub const EXIT_POLL_INTERVAL_MS: u64 = 50;
pub const ENCODER_SUCCESS_EXIT: i32 = 0;

// Probe Tool
pub const DEFAULT_FFMPEG: &str = "ffmpeg";
pub const CAPTURE_BACKEND: &str = "dshow";
pub const AUDIO_SECTION_HEADER: &str = "DirectShow audio devices";
pub const VIDEO_SECTION_HEADER: &str = "DirectShow video devices";
