pub mod engine;
pub mod error;
pub mod fetcher;
pub mod limiter;
pub mod pipeline;
pub mod progress;
pub mod single_flight;
pub mod synth;

pub use engine::{EngineRegistry, EngineState, FfmpegLoader, TranscodeEngine};
pub use error::DemoError;
pub use fetcher::RemoteFileFetcher;
pub use limiter::ResourceLimiter;
pub use pipeline::{DemoClip, DemoPipeline};
pub use progress::ProgressReporter;
pub use single_flight::SingleFlight;
