//! # Scheduler
//!
//! 帧驱动的协作式调度器。
//!
//! 负责：
//! - 持有 calculator 序列与各自的 context
//! - tag 传播连线（上游输出端口即下游输入端口）
//! - 帧预算内的循环调度
//! - 通过回调桥接外部输入/输出
//!
//! ## 使用示例
//!
//! ```ignore
//! use scheduler::Scheduler;
//!
//! let mut scheduler = Scheduler::new();
//! scheduler.register_calculator(Box::new(my_calculator), side_parameters)?;
//! scheduler.connect_calculators()?;
//!
//! loop {
//!     scheduler.run()?;
//! }
//! ```

mod scheduler;

pub use crate::scheduler::{Scheduler, SchedulerState, SchedulerStats, DEFAULT_FRAME_RATE};

// Re-export contracts types
pub use contracts::{Calculator, CalculatorContext, GraphError, Packet, SideParameters};
