use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct EngineConfig {
  /// Path to the ffmpeg binary. Resolved from PATH when unset.
  pub ffmpeg_path: Option<String>,
  /// Scratch directory for per-job input/output files. Defaults to the
  /// system temp directory.
  pub scratch_dir: Option<String>,
}
