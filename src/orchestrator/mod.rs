//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `pipeline_controller` - 流水线控制器
//! - 持有 `PipelineState` 和摄像头资源
//! - 驱动状态转换，丢弃过期的异步结果
//! - 生成交接数据
//!
//! ### `handoff` - 交接目标
//! - 把生成结果交给下游复核页面
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::PipelineController
//!     ↓
//! workflow (PipelineState / WordCountPolicy)
//!     ↓
//! services (能力层：ExtractionGateway / GenerationGateway)
//!     ↓
//! infrastructure (基础设施：CameraResource)
//! ```

pub mod handoff;
pub mod pipeline_controller;

pub use handoff::{ChannelHandoff, Handoff, HandoffTarget};
pub use pipeline_controller::{
    Commit, ExtractionJob, GenerationJob, PipelineController, PipelineView, RetryOutcome,
};
