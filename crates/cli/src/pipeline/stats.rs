//! Pipeline statistics and metrics.

use std::time::Duration;

use observability::FrameMetricsAggregator;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Raw frames pulled from the video source
    pub frames_read: u64,

    /// Processed frames emitted to the sink
    pub frames_written: u64,

    /// Scheduler frames executed
    pub scheduler_frames: u64,

    /// Calculator visits across all frames
    pub scheduler_ticks: u64,

    /// Packets dropped on the external input port (stale + capacity)
    pub packets_dropped: u64,

    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Number of filters in the chain
    pub active_filters: usize,

    /// Frame loop metrics aggregator
    pub frame_metrics: FrameMetricsAggregator,
}

impl PipelineStats {
    /// Emitted frames per second over the whole run
    pub fn fps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.frames_written as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Input packets lost before reaching the chain, as a percentage
    pub fn drop_rate(&self) -> f64 {
        if self.frames_read > 0 {
            (self.packets_dropped as f64 / self.frames_read as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary to stderr (stdout carries frame bytes)
    pub fn print_summary(&self) {
        eprintln!("\n=== Pipeline Statistics ===");
        eprintln!("  Duration: {:.2}s", self.duration.as_secs_f64());
        eprintln!("  Frames read: {}", self.frames_read);
        eprintln!("  Frames written: {}", self.frames_written);
        eprintln!("  Throughput: {:.2} fps", self.fps());
        eprintln!("  Active filters: {}", self.active_filters);
        eprintln!("  Scheduler frames: {}", self.scheduler_frames);
        eprintln!("  Calculator ticks: {}", self.scheduler_ticks);
        eprintln!(
            "  Input packets dropped: {} ({:.2}%)",
            self.packets_dropped,
            self.drop_rate()
        );
        eprintln!();
        eprint!("{}", self.frame_metrics.summary());
    }
}
