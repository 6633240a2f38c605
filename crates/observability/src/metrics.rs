//! 帧循环指标收集模块
//!
//! 收集和统计调度器帧循环的运行指标。

use metrics::{counter, gauge, histogram};

/// 记录一帧完成
///
/// 每次 `Scheduler::run()` 返回后调用。
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_frame;
///
/// scheduler.run()?;
/// record_frame(scheduler.stats().frames, delta_ms);
/// ```
pub fn record_frame(frame_id: u64, delta_ms: f64) {
    // 帧计数器
    counter!("calcgraph_frames_total").increment(1);

    // 帧 ID (用于检测跳帧)
    gauge!("calcgraph_last_frame_id").set(frame_id as f64);

    // 帧间隔 (毫秒)
    histogram!("calcgraph_frame_delta_ms").record(delta_ms);
}

/// 记录外部输入端口收包
pub fn record_packet_written(port: &str) {
    counter!(
        "calcgraph_packets_written_total",
        "port" => port.to_string()
    )
    .increment(1);
}

/// 记录外部输出端口出包
pub fn record_packet_read(port: &str) {
    counter!(
        "calcgraph_packets_read_total",
        "port" => port.to_string()
    )
    .increment(1);
}

/// 记录丢包（过期或容量淘汰）
pub fn record_packet_dropped(port: &str, reason: &str) {
    counter!(
        "calcgraph_packets_dropped_total",
        "port" => port.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// 记录端口深度
pub fn record_port_depth(port: &str, depth: usize) {
    gauge!(
        "calcgraph_port_depth",
        "port" => port.to_string()
    )
    .set(depth as f64);
}

/// 帧指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct FrameMetricsAggregator {
    /// 总帧数
    pub total_frames: u64,

    /// 总输入包数
    pub total_packets_in: u64,

    /// 总输出包数
    pub total_packets_out: u64,

    /// 丢包总数
    pub total_dropped: u64,

    /// 帧间隔统计 (毫秒)
    pub delta_stats: DeltaStats,
}

impl FrameMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一帧
    pub fn record_frame(&mut self, delta_ms: f64) {
        self.total_frames += 1;
        self.delta_stats.push(delta_ms);
    }

    /// 记录一个输入包
    pub fn record_packet_in(&mut self) {
        self.total_packets_in += 1;
    }

    /// 记录一个输出包
    pub fn record_packet_out(&mut self) {
        self.total_packets_out += 1;
    }

    /// 记录丢包
    pub fn record_dropped(&mut self, count: u64) {
        self.total_dropped += count;
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_frames: self.total_frames,
            total_packets_in: self.total_packets_in,
            total_packets_out: self.total_packets_out,
            total_dropped: self.total_dropped,
            drop_rate: if self.total_packets_in > 0 {
                self.total_dropped as f64 / self.total_packets_in as f64 * 100.0
            } else {
                0.0
            },
            frame_delta_ms: self.delta_stats.clone(),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_frames: u64,
    pub total_packets_in: u64,
    pub total_packets_out: u64,
    pub total_dropped: u64,
    pub drop_rate: f64,
    pub frame_delta_ms: DeltaStats,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Frame Metrics Summary ===")?;
        writeln!(f, "Total frames: {}", self.total_frames)?;
        writeln!(f, "Packets in: {}", self.total_packets_in)?;
        writeln!(f, "Packets out: {}", self.total_packets_out)?;
        writeln!(
            f,
            "Dropped packets: {} ({:.2}%)",
            self.total_dropped, self.drop_rate
        )?;
        writeln!(f, "Frame delta (ms): {}", self.frame_delta_ms)?;
        Ok(())
    }
}

/// 帧间隔在线统计
///
/// 聚合器只需要均值、极值和抖动幅度，所以这里累加 sum / sum²
/// 即可，不保留样本。帧间隔都是毫秒量级，精度足够。
#[derive(Debug, Clone, Default)]
pub struct DeltaStats {
    count: u64,
    sum: f64,
    sum_squares: f64,
    min: f64,
    max: f64,
}

impl DeltaStats {
    /// 添加一个帧间隔样本
    pub fn push(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum += value;
        self.sum_squares += value * value;
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        let n = self.count as f64;
        // 浮点舍入可能产生微小负值，截到零
        ((self.sum_squares - self.sum * self.sum / n) / (n - 1.0)).max(0.0)
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// 最小值
    pub fn min(&self) -> f64 {
        self.min
    }

    /// 最大值
    pub fn max(&self) -> f64 {
        self.max
    }
}

impl std::fmt::Display for DeltaStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min,
                self.max,
                self.mean(),
                self.std_dev(),
                self.count
            )
        }
    }
}
