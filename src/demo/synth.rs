use crate::common::types::now_ms;
use crate::demo::engine::TranscodeEngine;
use crate::demo::error::DemoError;

/// Fixed synthesis parameters. None of these are user-configurable: the
/// clip is capped at 60 seconds, re-encoded at a reduced bitrate, faded in
/// and out, and amplitude-modulated so it has no standalone listening value
/// while staying recognizable.
pub const CLIP_SECONDS: u32 = 60;
pub const AUDIO_BITRATE: &str = "96k";
pub const SAMPLE_RATE: u32 = 44_100;
pub const CHANNELS: u32 = 2;

/// Volume oscillates between roughly 30% and 80% on a 4-second cycle,
/// under a 5-second fade-in and a fade-out over the last 5 seconds; short
/// inputs are padded out to the full clip length.
const FILTER_CHAIN: &str = "volume=0.3+0.5*sin(2*PI*t/4):eval=frame,\
afade=t=in:ss=0:d=5,afade=t=out:st=55:d=5,apad=pad_len=60";

/// Per-invocation scratch file names. Time-based so back-to-back jobs can
/// never collide on the engine's filesystem.
#[derive(Debug, Clone)]
pub struct ScratchNames {
    pub input: String,
    pub output: String,
}

impl ScratchNames {
    pub fn next() -> Self {
        Self::for_timestamp(now_ms())
    }

    pub fn for_timestamp(ts_ms: u64) -> Self {
        Self {
            input: format!("input_{}.mp3", ts_ms),
            output: format!("output_{}.mp3", ts_ms),
        }
    }
}

/// The full engine argv for one demo synthesis.
pub fn demo_args(names: &ScratchNames) -> Vec<String> {
    vec![
        "-i".into(),
        names.input.clone(),
        "-t".into(),
        CLIP_SECONDS.to_string(),
        "-ss".into(),
        "0".into(),
        "-c:a".into(),
        "libmp3lame".into(),
        "-b:a".into(),
        AUDIO_BITRATE.into(),
        "-ar".into(),
        SAMPLE_RATE.to_string(),
        "-ac".into(),
        CHANNELS.to_string(),
        "-af".into(),
        FILTER_CHAIN.into(),
        "-threads".into(),
        "2".into(),
        names.output.clone(),
    ]
}

/// Download name handed to the user: original base name plus a demo marker.
pub fn demo_filename(original: &str) -> String {
    let base = match original.rfind('.') {
        Some(idx) if idx > 0 => &original[..idx],
        _ => original,
    };
    format!("{} - Demo.mp3", base)
}

/// Run the transcode invocation. On failure the job's scratch files are
/// abandoned (best-effort removal); the engine handle itself stays usable
/// for the next job.
pub async fn synthesize(
    engine: &dyn TranscodeEngine,
    names: &ScratchNames,
) -> Result<(), DemoError> {
    let result = engine.exec(&demo_args(names)).await;
    if result.is_err() {
        engine.remove(&names.input).await;
        engine.remove(&names.output).await;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argv_pins_the_clip_to_sixty_seconds() {
        let names = ScratchNames::for_timestamp(1_700_000_000_000);
        let args = demo_args(&names);

        let t = args.iter().position(|a| a == "-t").expect("-t present");
        assert_eq!(args[t + 1], "60");

        let bitrate = args.iter().position(|a| a == "-b:a").expect("-b:a present");
        assert_eq!(args[bitrate + 1], "96k");

        let af = args.iter().position(|a| a == "-af").expect("-af present");
        assert!(args[af + 1].contains("afade=t=in:ss=0:d=5"));
        assert!(args[af + 1].contains("afade=t=out:st=55:d=5"));
        assert!(args[af + 1].contains("volume=0.3+0.5*sin(2*PI*t/4)"));
        assert!(args[af + 1].contains("apad=pad_len=60"));

        assert_eq!(args.first().map(String::as_str), Some("-i"));
        assert_eq!(args[1], "input_1700000000000.mp3");
        assert_eq!(args.last().map(String::as_str), Some("output_1700000000000.mp3"));
    }

    #[test]
    fn scratch_names_differ_per_timestamp() {
        let a = ScratchNames::for_timestamp(1);
        let b = ScratchNames::for_timestamp(2);
        assert_ne!(a.input, b.input);
        assert_ne!(a.output, b.output);
        assert_ne!(a.input, a.output);
    }

    #[test]
    fn download_name_keeps_the_base_and_swaps_the_extension() {
        assert_eq!(demo_filename("My Track.wav"), "My Track - Demo.mp3");
        assert_eq!(demo_filename("mix.final.flac"), "mix.final - Demo.mp3");
        assert_eq!(demo_filename("no_extension"), "no_extension - Demo.mp3");
        assert_eq!(demo_filename(".hidden"), ".hidden - Demo.mp3");
    }
}
