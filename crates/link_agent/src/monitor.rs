//! Host Monitor – CPU, memória e processos via `sysinfo`.

use chrono::{Local, Timelike};
use link_core::sampler::{RawReading, SystemSampler};
use link_core::types::Sample;
use std::sync::{Mutex, PoisonError};
use sysinfo::{
    CpuRefreshKind, MemoryRefreshKind, ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System,
};
use tracing::debug;

/// Monitor de host usado pelo loop de publicação.
pub struct HostMonitor {
    sys: Mutex<System>,
}

impl HostMonitor {
    pub fn new() -> Self {
        let mut sys = System::new_with_specifics(
            RefreshKind::nothing()
                .with_cpu(CpuRefreshKind::nothing().with_cpu_usage())
                .with_memory(MemoryRefreshKind::nothing().with_ram()),
        );

        // Primeira leitura para inicializar contadores de CPU
        sys.refresh_cpu_usage();

        Self {
            sys: Mutex::new(sys),
        }
    }

    /// Atualiza os subsistemas e devolve a leitura bruta.
    pub fn read(&self) -> RawReading {
        let mut sys = self.sys.lock().unwrap_or_else(PoisonError::into_inner);

        sys.refresh_cpu_usage();
        sys.refresh_memory();
        sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().without_tasks(),
        );
        // No Linux as threads aparecem como entradas com `thread_kind`
        let processes = sys
            .processes()
            .values()
            .filter(|p| p.thread_kind().is_none())
            .count();

        let reading = RawReading {
            cpu_load: f64::from(sys.global_cpu_usage()) / 100.0,
            mem_total_bytes: sys.total_memory(),
            mem_available_bytes: sys.available_memory(),
            process_count: u32::try_from(processes).unwrap_or(u32::MAX),
        };
        debug!(?reading, "Leitura do host");
        reading
    }
}

impl Default for HostMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemSampler for HostMonitor {
    fn sample(&self) -> Sample {
        let now = Local::now().time();
        let timestamp = now.with_nanosecond(0).unwrap_or(now);
        self.read().into_sample(timestamp)
    }
}
