use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Counters for one transfer, owned by the receiving task.
#[derive(Debug)]
pub struct TransferSession {
    destination: PathBuf,
    bytes_received: u64,
    chunk_count: u64,
    started_at: Instant,
}

/// Final figures of a completed transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferSummary {
    pub path: PathBuf,
    pub chunks: u64,
    pub bytes: u64,
    pub elapsed: Duration,
}

impl TransferSummary {
    /// Average throughput over the whole transfer, in bytes per second.
    pub fn bytes_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.bytes as f64 / secs
    }
}

impl TransferSession {
    pub fn new(destination: PathBuf) -> Self {
        Self {
            destination,
            bytes_received: 0,
            chunk_count: 0,
            started_at: Instant::now(),
        }
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn bytes_received(&self) -> u64 {
        self.bytes_received
    }

    pub fn chunk_count(&self) -> u64 {
        self.chunk_count
    }

    /// Records one non-empty chunk.
    ///
    /// Returns the 1-based chunk index and the cumulative byte count.
    pub fn record_chunk(&mut self, size: usize) -> (u64, u64) {
        self.chunk_count += 1;
        self.bytes_received += size as u64;
        (self.chunk_count, self.bytes_received)
    }

    pub fn summary(&self) -> TransferSummary {
        TransferSummary {
            path: self.destination.clone(),
            chunks: self.chunk_count,
            bytes: self.bytes_received,
            elapsed: self.started_at.elapsed(),
        }
    }
}
