//! Probing and sample extraction through the external media tools.

pub mod ffmpeg;
pub mod probe;
pub mod types;

pub use ffmpeg::{extract_with_timeout, ffmpeg_args, Extractor, FfmpegExtractor};
pub use probe::{
    parse_frame_rate, parse_probe_json, probe_with_timeout, select_stream, FfprobeProber, Prober,
    StreamChoice, DEFAULT_PROBE_TIMEOUT,
};
pub use types::{
    s16le_first_channel, ExtractError, ExtractRequest, ExtractResult, PcmFormat, ProbeError,
    ProbeResult, SampleWindow, DEFAULT_MIN_OUTPUT_BYTES,
};
