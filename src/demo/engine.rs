use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::configs::EngineConfig;
use crate::demo::error::DemoError;

/// The media transcoder, treated as a black box: scratch files in, an argv
/// invocation, scratch files out.
#[async_trait]
pub trait TranscodeEngine: Send + Sync + std::fmt::Debug {
    /// Human-readable engine identification, e.g. "ffmpeg version 6.1.1".
    fn describe(&self) -> String;

    async fn write_input(&self, name: &str, bytes: &[u8]) -> Result<(), DemoError>;

    async fn exec(&self, args: &[String]) -> Result<(), DemoError>;

    async fn read_output(&self, name: &str) -> Result<Vec<u8>, DemoError>;

    /// Best-effort scratch cleanup; failures are logged and swallowed.
    async fn remove(&self, name: &str);
}

#[async_trait]
pub trait EngineLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn TranscodeEngine>, DemoError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    Unloaded,
    Loading,
    Ready,
}

/// Loads the engine exactly once and hands the same handle to every job.
/// Concurrent callers during a load wait for its outcome; a failed load
/// returns the registry to `Unloaded` so a later call can retry.
pub struct EngineRegistry {
    loader: Box<dyn EngineLoader>,
    slot: tokio::sync::Mutex<Option<Arc<dyn TranscodeEngine>>>,
    state: parking_lot::Mutex<EngineState>,
}

impl EngineRegistry {
    pub fn new(loader: Box<dyn EngineLoader>) -> Self {
        Self {
            loader,
            slot: tokio::sync::Mutex::new(None),
            state: parking_lot::Mutex::new(EngineState::Unloaded),
        }
    }

    pub fn state(&self) -> EngineState {
        *self.state.lock()
    }

    pub async fn acquire(&self) -> Result<Arc<dyn TranscodeEngine>, DemoError> {
        let mut slot = self.slot.lock().await;
        if let Some(engine) = slot.as_ref() {
            return Ok(engine.clone());
        }

        *self.state.lock() = EngineState::Loading;
        match self.loader.load().await {
            Ok(engine) => {
                *slot = Some(engine.clone());
                *self.state.lock() = EngineState::Ready;
                info!("Transcode engine ready: {}", engine.describe());
                Ok(engine)
            }
            Err(err) => {
                *self.state.lock() = EngineState::Unloaded;
                Err(err)
            }
        }
    }
}

/// Loads an external `ffmpeg` binary: verifies it answers a version probe
/// and prepares the scratch directory.
pub struct FfmpegLoader {
    config: EngineConfig,
}

impl FfmpegLoader {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl EngineLoader for FfmpegLoader {
    async fn load(&self) -> Result<Arc<dyn TranscodeEngine>, DemoError> {
        let binary = PathBuf::from(self.config.ffmpeg_path.as_deref().unwrap_or("ffmpeg"));

        let probe = Command::new(&binary)
            .arg("-version")
            .output()
            .await
            .map_err(|e| DemoError::EngineLoadFailed(format!("{}: {}", binary.display(), e)))?;
        if !probe.status.success() {
            return Err(DemoError::EngineLoadFailed(format!(
                "{} -version exited with {}",
                binary.display(),
                probe.status
            )));
        }
        let version = String::from_utf8_lossy(&probe.stdout)
            .lines()
            .next()
            .unwrap_or("ffmpeg (unknown version)")
            .to_string();

        let scratch = self
            .config
            .scratch_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("demoforge"));
        tokio::fs::create_dir_all(&scratch)
            .await
            .map_err(|e| {
                DemoError::EngineLoadFailed(format!("scratch dir {}: {}", scratch.display(), e))
            })?;

        debug!("Engine scratch directory: {}", scratch.display());
        Ok(Arc::new(FfmpegEngine {
            binary,
            scratch,
            version,
        }))
    }
}

#[derive(Debug)]
pub struct FfmpegEngine {
    binary: PathBuf,
    scratch: PathBuf,
    version: String,
}

#[async_trait]
impl TranscodeEngine for FfmpegEngine {
    fn describe(&self) -> String {
        self.version.clone()
    }

    async fn write_input(&self, name: &str, bytes: &[u8]) -> Result<(), DemoError> {
        tokio::fs::write(self.scratch.join(name), bytes)
            .await
            .map_err(|e| DemoError::TranscodeFailed(format!("writing {}: {}", name, e)))
    }

    async fn exec(&self, args: &[String]) -> Result<(), DemoError> {
        debug!("ffmpeg {}", args.join(" "));
        let output = Command::new(&self.binary)
            .args(args)
            .current_dir(&self.scratch)
            .output()
            .await
            .map_err(|e| DemoError::TranscodeFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail = stderr.lines().next_back().unwrap_or("no output");
            return Err(DemoError::TranscodeFailed(format!(
                "engine exited with {}: {}",
                output.status, tail
            )));
        }
        Ok(())
    }

    async fn read_output(&self, name: &str) -> Result<Vec<u8>, DemoError> {
        let bytes = tokio::fs::read(self.scratch.join(name))
            .await
            .map_err(|e| DemoError::TranscodeFailed(format!("reading {}: {}", name, e)))?;
        if bytes.is_empty() {
            return Err(DemoError::TranscodeFailed(format!("{} is empty", name)));
        }
        Ok(bytes)
    }

    async fn remove(&self, name: &str) {
        if let Err(e) = tokio::fs::remove_file(self.scratch.join(name)).await {
            warn!("Could not remove scratch file {}: {}", name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FlakyLoader {
        calls: AtomicUsize,
        fail_first: usize,
    }

    #[derive(Debug)]
    struct NullEngine;

    #[async_trait]
    impl TranscodeEngine for NullEngine {
        fn describe(&self) -> String {
            "null".to_string()
        }
        async fn write_input(&self, _name: &str, _bytes: &[u8]) -> Result<(), DemoError> {
            Ok(())
        }
        async fn exec(&self, _args: &[String]) -> Result<(), DemoError> {
            Ok(())
        }
        async fn read_output(&self, _name: &str) -> Result<Vec<u8>, DemoError> {
            Ok(vec![0])
        }
        async fn remove(&self, _name: &str) {}
    }

    #[async_trait]
    impl EngineLoader for FlakyLoader {
        async fn load(&self) -> Result<Arc<dyn TranscodeEngine>, DemoError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                Err(DemoError::EngineLoadFailed("asset fetch failed".into()))
            } else {
                Ok(Arc::new(NullEngine))
            }
        }
    }

    fn registry(fail_first: usize) -> Arc<EngineRegistry> {
        Arc::new(EngineRegistry::new(Box::new(FlakyLoader {
            calls: AtomicUsize::new(0),
            fail_first,
        })))
    }

    #[tokio::test]
    async fn loads_once_and_memoizes_the_handle() {
        let registry = registry(0);
        assert_eq!(registry.state(), EngineState::Unloaded);

        let first = registry.acquire().await.expect("loads");
        assert_eq!(registry.state(), EngineState::Ready);
        let second = registry.acquire().await.expect("memoized");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_load() {
        let registry = registry(0);
        let (a, b) = tokio::join!(registry.acquire(), registry.acquire());
        let (a, b) = (a.expect("loads"), b.expect("loads"));
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn failed_load_resets_to_unloaded_and_allows_retry() {
        let registry = registry(1);

        let err = registry.acquire().await.expect_err("first load fails");
        assert!(matches!(err, DemoError::EngineLoadFailed(_)));
        assert_eq!(registry.state(), EngineState::Unloaded);

        registry.acquire().await.expect("retry succeeds");
        assert_eq!(registry.state(), EngineState::Ready);
    }
}
