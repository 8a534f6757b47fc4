//! Progress reported by a fetcher while a transfer is running

/// Byte counters for one transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransferProgress {
    pub downloaded_bytes: u64,
    /// Exact size or an estimate; `None` when the source does not say
    pub total_bytes: Option<u64>,
}

impl TransferProgress {
    pub fn new(downloaded_bytes: u64, total_bytes: Option<u64>) -> Self {
        Self {
            downloaded_bytes,
            total_bytes,
        }
    }

    /// Whole percentage in `0..=100`.
    ///
    /// Stays at 0 while the total is unknown (or reported as zero).
    pub fn percent(&self) -> u8 {
        match self.total_bytes {
            Some(total) if total > 0 => {
                let pct = (self.downloaded_bytes as f64 / total as f64) * 100.0;
                pct.clamp(0.0, 100.0) as u8
            }
            _ => 0,
        }
    }
}
