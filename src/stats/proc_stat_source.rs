use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::traits::stat_source::StatSource;

/// Reads resource counters straight from procfs.
pub struct ProcStatSource {
    proc_root: PathBuf,
}

impl ProcStatSource {
    pub fn new() -> Self {
        Self::with_root("/proc")
    }

    pub fn with_root(proc_root: impl AsRef<Path>) -> Self {
        Self {
            proc_root: proc_root.as_ref().to_owned(),
        }
    }

    async fn read(&self, name: &str) -> String {
        let path = self.proc_root.join(name);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) => {
                log::debug!("Failed to read {}: {:?}", path.display(), e);
                String::new()
            }
        }
    }
}

impl Default for ProcStatSource {
    fn default() -> Self {
        Self::new()
    }
}

impl StatSource for ProcStatSource {
    async fn cpu(&self) -> String {
        let stat = self.read("stat").await;
        stat.lines()
            .find(|line| line.starts_with("cpu "))
            .map(|line| format!("{}\n", line))
            .unwrap_or_default()
    }

    async fn memory(&self) -> String {
        let meminfo = self.read("meminfo").await;
        render_mem_line(&meminfo).unwrap_or_default()
    }

    async fn network(&self) -> String {
        self.read("net/dev").await
    }
}

/// Renders /proc/meminfo as the `Mem:` row of `free -m`:
/// total used free shared buff/cache available, all in MiB.
pub fn render_mem_line(meminfo: &str) -> Option<String> {
    let fields: HashMap<&str, u64> = meminfo
        .lines()
        .filter_map(|line| {
            let (key, rest) = line.split_once(':')?;
            let kib = rest.split_whitespace().next()?.parse().ok()?;
            Some((key.trim(), kib))
        })
        .collect();

    let total = *fields.get("MemTotal")?;
    let free = fields.get("MemFree").copied().unwrap_or(0);
    let shared = fields.get("Shmem").copied().unwrap_or(0);
    let buff_cache = ["Buffers", "Cached", "SReclaimable"]
        .iter()
        .map(|k| fields.get(k).copied().unwrap_or(0))
        .sum::<u64>();
    let available = fields.get("MemAvailable").copied().unwrap_or(free);
    let used = total.saturating_sub(free).saturating_sub(buff_cache);

    let mib = |kib: u64| kib / 1024;
    Some(format!(
        "Mem:    {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}\n",
        mib(total),
        mib(used),
        mib(free),
        mib(shared),
        mib(buff_cache),
        mib(available)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEMINFO: &str = "MemTotal:        8192000 kB\n\
MemFree:         2048000 kB\n\
MemAvailable:    4096000 kB\n\
Buffers:          102400 kB\n\
Cached:          1024000 kB\n\
Shmem:             51200 kB\n\
SReclaimable:      97600 kB\n";

    #[test]
    fn mem_line_matches_free_layout() {
        let line = render_mem_line(MEMINFO).unwrap();
        let cols: Vec<&str> = line.split_whitespace().collect();
        // 8192000 - 2048000 - 1224000 = 4920000 kB used
        assert_eq!(cols, vec!["Mem:", "8000", "4804", "2000", "50", "1195", "4000"]);
    }

    #[test]
    fn mem_line_needs_total() {
        assert!(render_mem_line("MemFree: 10 kB\n").is_none());
    }

    #[tokio::test]
    async fn missing_proc_files_yield_empty_strings() {
        let source = ProcStatSource::with_root("/nonexistent-proc-root");
        assert_eq!(source.cpu().await, "");
        assert_eq!(source.memory().await, "");
        assert_eq!(source.network().await, "");
    }
}
