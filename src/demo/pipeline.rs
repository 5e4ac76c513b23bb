use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use crate::common::types::FileId;
use crate::demo::engine::EngineRegistry;
use crate::demo::error::DemoError;
use crate::demo::fetcher::RemoteFileFetcher;
use crate::demo::limiter::ResourceLimiter;
use crate::demo::progress::{self as phases, ProgressReporter};
use crate::demo::single_flight::SingleFlight;
use crate::demo::synth::{self, ScratchNames};
use crate::storage::StorageBackend;

/// The finished preview, ready to hand to the user.
#[derive(Debug, Clone)]
pub struct DemoClip {
    pub bytes: Bytes,
    pub filename: String,
    pub original_name: String,
}

/// Progress as exposed to the UI poller.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ProgressSnapshot {
    pub active: bool,
    pub progress: u8,
}

/// Runs one demo job end to end: fetch, engine acquisition, synthesis,
/// read-back. One job at a time; progress is fabricated phase by phase and
/// pinned to the real boundaries.
pub struct DemoPipeline {
    fetcher: RemoteFileFetcher,
    engines: Arc<EngineRegistry>,
    single_flight: SingleFlight,
    progress: parking_lot::Mutex<Option<watch::Receiver<u8>>>,
    completed: AtomicU64,
    failed: AtomicU64,
}

impl DemoPipeline {
    pub fn new(
        storage: Arc<dyn StorageBackend>,
        engines: Arc<EngineRegistry>,
        limiter: Arc<ResourceLimiter>,
    ) -> Self {
        Self {
            fetcher: RemoteFileFetcher::new(storage, limiter),
            engines,
            single_flight: SingleFlight::default(),
            progress: parking_lot::Mutex::new(None),
            completed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let progress = self
            .progress
            .lock()
            .as_ref()
            .map(|rx| *rx.borrow())
            .unwrap_or(0);
        ProgressSnapshot {
            active: self.single_flight.is_busy(),
            progress,
        }
    }

    pub fn jobs_completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn jobs_failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub async fn generate(&self, file_id: &FileId) -> Result<DemoClip, DemoError> {
        let slot = self.single_flight.begin()?;
        let job_id = Uuid::new_v4();
        info!("Job {} started for file {}", job_id, file_id);

        let (reporter, rx) = ProgressReporter::channel();
        *self.progress.lock() = Some(rx);

        let result = self.run(&reporter, file_id).await;
        match &result {
            Ok(clip) => {
                self.completed.fetch_add(1, Ordering::Relaxed);
                info!(
                    "Job {} done: '{}' ({} bytes)",
                    job_id,
                    clip.filename,
                    clip.bytes.len()
                );
            }
            Err(err) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                warn!("Job {} for file {} failed: {}", job_id, file_id, err);
            }
        }

        // The slot drops here on both paths and frees itself after the
        // grace window; the abandoned progress value stays where it was.
        drop(slot);
        result
    }

    async fn run(
        &self,
        reporter: &ProgressReporter,
        file_id: &FileId,
    ) -> Result<DemoClip, DemoError> {
        // Phase A: download, ramping while the transfer is outstanding.
        let fetched = {
            let _ramp = reporter.ramp(phases::FETCH_START, phases::FETCH_CEILING, phases::FETCH_TICK);
            self.fetcher.fetch(file_id).await?
        };
        reporter.set(phases::FETCH_CEILING);

        // Phase B: engine acquisition (instant after the first job).
        let engine = {
            let _ramp =
                reporter.ramp(phases::ENGINE_START, phases::ENGINE_CEILING, phases::ENGINE_TICK);
            self.engines.acquire().await?
        };
        reporter.set(phases::ENGINE_CEILING);

        // Phase C: stage the input under a per-job name, then transcode.
        let names = ScratchNames::next();
        reporter
            .steps(phases::PREPARE_START, phases::PREPARE_CEILING, phases::PREPARE_TICK)
            .await;
        engine.write_input(&names.input, &fetched.bytes).await?;

        {
            let _ramp = reporter.ramp(
                phases::TRANSCODE_START,
                phases::TRANSCODE_CEILING,
                phases::TRANSCODE_TICK,
            );
            synth::synthesize(engine.as_ref(), &names).await?;
        }
        reporter.set(phases::TRANSCODE_DONE);

        // Phase D: read the result back and finish the curve.
        reporter
            .steps(phases::READ_START, phases::READ_CEILING, phases::READ_TICK)
            .await;
        let output = engine.read_output(&names.output).await;
        engine.remove(&names.input).await;
        let bytes = match output {
            Ok(bytes) => bytes,
            Err(err) => {
                engine.remove(&names.output).await;
                return Err(err);
            }
        };
        engine.remove(&names.output).await;

        reporter
            .steps(phases::FINALIZE_START, phases::DONE, phases::FINALIZE_TICK)
            .await;

        Ok(DemoClip {
            bytes: Bytes::from(bytes),
            filename: synth::demo_filename(&fetched.file.name),
            original_name: fetched.file.name.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::common::types::DriveId;
    use crate::demo::engine::{EngineLoader, TranscodeEngine};
    use crate::demo::single_flight::RELEASE_GRACE;
    use crate::storage::{DriveItem, RemoteFile, SharedDrive, StorageError};

    struct FakeStorage {
        mime: &'static str,
        body: Vec<u8>,
        delay: Duration,
    }

    impl FakeStorage {
        fn audio() -> Self {
            Self {
                mime: "audio/mpeg",
                body: b"mp3 frames".to_vec(),
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl StorageBackend for FakeStorage {
        async fn file_info(&self, file: &FileId) -> Result<RemoteFile, StorageError> {
            Ok(RemoteFile {
                id: file.clone(),
                name: "Sunset Groove.wav".to_string(),
                mime_type: self.mime.to_string(),
                size: Some(self.body.len() as u64),
                drive_id: None,
            })
        }

        async fn download(&self, _file: &FileId, _max: u64) -> Result<Bytes, StorageError> {
            tokio::time::sleep(self.delay).await;
            Ok(Bytes::from(self.body.clone()))
        }

        async fn list_drives(&self) -> Result<Vec<SharedDrive>, StorageError> {
            Ok(Vec::new())
        }

        async fn list_folders(&self, _d: &DriveId) -> Result<Vec<DriveItem>, StorageError> {
            Ok(Vec::new())
        }

        async fn list_files(
            &self,
            _f: &str,
            _d: Option<&DriveId>,
        ) -> Result<Vec<DriveItem>, StorageError> {
            Ok(Vec::new())
        }

        async fn search(
            &self,
            _q: &str,
            _d: Option<&DriveId>,
        ) -> Result<Vec<DriveItem>, StorageError> {
            Ok(Vec::new())
        }
    }

    #[derive(Default, Debug)]
    struct MockEngine {
        files: parking_lot::Mutex<HashMap<String, Vec<u8>>>,
        fail_exec: bool,
    }

    #[async_trait]
    impl TranscodeEngine for MockEngine {
        fn describe(&self) -> String {
            "mock engine".to_string()
        }

        async fn write_input(&self, name: &str, bytes: &[u8]) -> Result<(), DemoError> {
            self.files.lock().insert(name.to_string(), bytes.to_vec());
            Ok(())
        }

        async fn exec(&self, args: &[String]) -> Result<(), DemoError> {
            if self.fail_exec {
                return Err(DemoError::TranscodeFailed("mock failure".into()));
            }
            let output = args.last().expect("argv has an output name").clone();
            self.files.lock().insert(output, b"demo clip".to_vec());
            Ok(())
        }

        async fn read_output(&self, name: &str) -> Result<Vec<u8>, DemoError> {
            self.files
                .lock()
                .get(name)
                .cloned()
                .ok_or_else(|| DemoError::TranscodeFailed(format!("{} missing", name)))
        }

        async fn remove(&self, name: &str) {
            self.files.lock().remove(name);
        }
    }

    struct MockLoader {
        engine: Arc<MockEngine>,
    }

    #[async_trait]
    impl EngineLoader for MockLoader {
        async fn load(&self) -> Result<Arc<dyn TranscodeEngine>, DemoError> {
            Ok(self.engine.clone())
        }
    }

    struct Harness {
        pipeline: Arc<DemoPipeline>,
        limiter: Arc<ResourceLimiter>,
        engine: Arc<MockEngine>,
    }

    fn harness(storage: FakeStorage, fail_exec: bool) -> Harness {
        let engine = Arc::new(MockEngine {
            fail_exec,
            ..MockEngine::default()
        });
        let limiter = Arc::new(ResourceLimiter::default());
        let registry = Arc::new(EngineRegistry::new(Box::new(MockLoader {
            engine: engine.clone(),
        })));
        Harness {
            pipeline: Arc::new(DemoPipeline::new(
                Arc::new(storage),
                registry,
                limiter.clone(),
            )),
            limiter,
            engine,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn a_job_runs_end_to_end() {
        let h = harness(FakeStorage::audio(), false);

        let clip = h
            .pipeline
            .generate(&FileId::from("f1"))
            .await
            .expect("generates");

        assert_eq!(clip.filename, "Sunset Groove - Demo.mp3");
        assert_eq!(clip.original_name, "Sunset Groove.wav");
        assert_eq!(&clip.bytes[..], b"demo clip");

        let snapshot = h.pipeline.snapshot();
        assert_eq!(snapshot.progress, 100);
        assert_eq!(h.pipeline.jobs_completed(), 1);
        assert_eq!(h.limiter.available(), h.limiter.capacity());

        // Scratch files are gone once the clip is out.
        assert!(h.engine.files.lock().is_empty());

        // The slot stays taken through the grace window, then frees.
        assert!(h.pipeline.snapshot().active);
        tokio::time::sleep(RELEASE_GRACE * 2).await;
        assert!(!h.pipeline.snapshot().active);
    }

    #[tokio::test(start_paused = true)]
    async fn a_second_job_is_rejected_while_one_runs() {
        let mut storage = FakeStorage::audio();
        storage.delay = Duration::from_secs(5);
        let h = harness(storage, false);

        let pipeline = h.pipeline.clone();
        let first = tokio::spawn(async move { pipeline.generate(&FileId::from("f1")).await });

        // Let the first job reach its download await.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(h.pipeline.snapshot().active);

        let err = h
            .pipeline
            .generate(&FileId::from("f1"))
            .await
            .expect_err("second job rejected");
        assert!(matches!(err, DemoError::Busy));

        first.await.expect("join").expect("first job finishes");
    }

    #[tokio::test(start_paused = true)]
    async fn a_failed_transcode_freezes_progress_and_frees_the_slot() {
        let h = harness(FakeStorage::audio(), true);

        let err = h
            .pipeline
            .generate(&FileId::from("f1"))
            .await
            .expect_err("exec fails");
        assert!(matches!(err, DemoError::TranscodeFailed(_)));
        assert_eq!(h.pipeline.jobs_failed(), 1);

        // Scratch input was abandoned and cleaned up by the synthesis step.
        assert!(h.engine.files.lock().is_empty());

        // Progress stopped inside the transcode band and never reached 100.
        let frozen = h.pipeline.snapshot().progress;
        assert!(frozen >= 61 && frozen < 100, "frozen={frozen}");
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(h.pipeline.snapshot().progress, frozen);

        assert!(!h.pipeline.snapshot().active);
        assert_eq!(h.limiter.available(), h.limiter.capacity());
    }

    #[tokio::test(start_paused = true)]
    async fn a_stalled_download_times_out_and_releases_everything() {
        let mut storage = FakeStorage::audio();
        storage.delay = Duration::from_secs(45);
        let h = harness(storage, false);

        let err = h
            .pipeline
            .generate(&FileId::from("f1"))
            .await
            .expect_err("times out");
        assert!(matches!(err, DemoError::Timeout));

        tokio::time::sleep(RELEASE_GRACE * 2).await;
        assert!(!h.pipeline.snapshot().active);
        assert_eq!(h.limiter.available(), h.limiter.capacity());
    }
}
