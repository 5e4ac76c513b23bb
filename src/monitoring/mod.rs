use serde::Serialize;
use sysinfo::System;

use crate::server::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub uptime_ms: u64,
    pub memory: MemoryStats,
    pub jobs: JobStats,
    pub fetch_slots: SlotStats,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStats {
    pub used: u64,
    pub total: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStats {
    pub active: bool,
    pub completed: u64,
    pub failed: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotStats {
    pub available: usize,
    pub capacity: usize,
}

pub fn collect_stats(state: &AppState) -> Stats {
    let mut sys = System::new();
    sys.refresh_memory();

    Stats {
        uptime_ms: state.started_at.elapsed().as_millis() as u64,
        memory: MemoryStats {
            used: sys.used_memory(),
            total: sys.total_memory(),
        },
        jobs: JobStats {
            active: state.pipeline.snapshot().active,
            completed: state.pipeline.jobs_completed(),
            failed: state.pipeline.jobs_failed(),
        },
        fetch_slots: SlotStats {
            available: state.limiter.available(),
            capacity: state.limiter.capacity(),
        },
    }
}
