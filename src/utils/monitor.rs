use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportPhase {
    Extract,
    Transform,
    Load,
}

impl ImportPhase {
    /// 該階段計數的單位
    pub fn unit(self) -> &'static str {
        match self {
            ImportPhase::Extract => "rows",
            ImportPhase::Transform => "records",
            ImportPhase::Load => "imported",
        }
    }
}

impl fmt::Display for ImportPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImportPhase::Extract => "Extract",
            ImportPhase::Transform => "Transform",
            ImportPhase::Load => "Load",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhaseStats {
    pub phase: ImportPhase,
    pub items: usize,
    pub duration: Duration,
    pub cpu_usage: Option<f32>,
    pub memory_mb: Option<u64>,
}

impl PhaseStats {
    /// 每秒處理筆數
    pub fn throughput(&self) -> f64 {
        let seconds = self.duration.as_secs_f64();
        if seconds > 0.0 {
            self.items as f64 / seconds
        } else {
            self.items as f64
        }
    }
}

/// 記錄匯入各階段的筆數、耗時與行程資源用量
pub struct ImportMonitor {
    enabled: bool,
    started: Instant,
    last_mark: Mutex<Instant>,
    phases: Mutex<Vec<PhaseStats>>,
    probe: Option<probe::ProcessProbe>,
}

impl ImportMonitor {
    pub fn new(enabled: bool) -> Self {
        let now = Instant::now();
        Self {
            enabled,
            started: now,
            last_mark: Mutex::new(now),
            phases: Mutex::new(Vec::new()),
            probe: if enabled { probe::ProcessProbe::new() } else { None },
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// 結束一個階段；停用時回傳 None
    pub fn record(&self, phase: ImportPhase, items: usize) -> Option<PhaseStats> {
        if !self.enabled {
            return None;
        }

        let now = Instant::now();
        let duration = {
            let mut last_mark = self.last_mark.lock().ok()?;
            let elapsed = now.duration_since(*last_mark);
            *last_mark = now;
            elapsed
        };
        let (cpu_usage, memory_mb) = match self.probe.as_ref().and_then(probe::ProcessProbe::sample) {
            Some((cpu, memory)) => (Some(cpu), Some(memory)),
            None => (None, None),
        };

        let stats = PhaseStats {
            phase,
            items,
            duration,
            cpu_usage,
            memory_mb,
        };
        tracing::info!(
            "📊 {} - {} {} in {:?} ({:.0}/s){}",
            stats.phase,
            stats.items,
            stats.phase.unit(),
            stats.duration,
            stats.throughput(),
            resource_suffix(&stats)
        );

        self.phases.lock().ok()?.push(stats.clone());
        Some(stats)
    }

    pub fn phases(&self) -> Vec<PhaseStats> {
        self.phases
            .lock()
            .map(|phases| phases.clone())
            .unwrap_or_default()
    }

    pub fn log_summary(&self) {
        if !self.enabled {
            return;
        }

        let phases = self.phases();
        let peak_memory = phases.iter().filter_map(|p| p.memory_mb).max();
        let breakdown = phases
            .iter()
            .map(|p| format!("{} {:?}", p.phase, p.duration))
            .collect::<Vec<_>>()
            .join(", ");

        match peak_memory {
            Some(peak) => tracing::info!(
                "📊 Import took {:?} ({}), peak memory {}MB",
                self.started.elapsed(),
                breakdown,
                peak
            ),
            None => tracing::info!("📊 Import took {:?} ({})", self.started.elapsed(), breakdown),
        }
    }
}

impl Default for ImportMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

fn resource_suffix(stats: &PhaseStats) -> String {
    match (stats.cpu_usage, stats.memory_mb) {
        (Some(cpu), Some(memory)) => format!(", CPU: {:.1}%, Memory: {}MB", cpu, memory),
        _ => String::new(),
    }
}

#[cfg(feature = "cli")]
mod probe {
    use std::sync::Mutex;
    use sysinfo::{Pid, System};

    pub struct ProcessProbe {
        system: Mutex<System>,
        pid: Pid,
    }

    impl ProcessProbe {
        pub fn new() -> Option<Self> {
            let pid = sysinfo::get_current_pid().ok()?;
            let mut system = System::new();
            system.refresh_all();
            Some(Self {
                system: Mutex::new(system),
                pid,
            })
        }

        /// (CPU %, 記憶體 MB)
        pub fn sample(&self) -> Option<(f32, u64)> {
            let mut system = self.system.lock().ok()?;
            system.refresh_all();
            let process = system.process(self.pid)?;
            Some((process.cpu_usage(), process.memory() / 1024 / 1024))
        }
    }
}

// 非 CLI 建置不取樣行程資源
#[cfg(not(feature = "cli"))]
mod probe {
    pub struct ProcessProbe;

    impl ProcessProbe {
        pub fn new() -> Option<Self> {
            None
        }

        pub fn sample(&self) -> Option<(f32, u64)> {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_monitor_records_nothing() {
        let monitor = ImportMonitor::new(false);

        assert!(monitor.record(ImportPhase::Extract, 120).is_none());
        assert!(monitor.phases().is_empty());
    }

    #[test]
    fn test_phases_keep_counts_in_order() {
        let monitor = ImportMonitor::new(true);

        let extract = monitor.record(ImportPhase::Extract, 120).unwrap();
        monitor.record(ImportPhase::Transform, 118);
        monitor.record(ImportPhase::Load, 100);

        assert_eq!(extract.items, 120);
        let phases = monitor.phases();
        assert_eq!(
            phases.iter().map(|p| (p.phase, p.items)).collect::<Vec<_>>(),
            vec![
                (ImportPhase::Extract, 120),
                (ImportPhase::Transform, 118),
                (ImportPhase::Load, 100)
            ]
        );
        monitor.log_summary();
    }

    #[test]
    fn test_throughput() {
        let stats = PhaseStats {
            phase: ImportPhase::Load,
            items: 50,
            duration: Duration::from_millis(500),
            cpu_usage: None,
            memory_mb: None,
        };
        assert_eq!(stats.throughput(), 100.0);
        assert_eq!(resource_suffix(&stats), "");
        assert_eq!(ImportPhase::Transform.to_string(), "Transform");
    }
}
