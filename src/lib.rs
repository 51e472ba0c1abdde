//! # Snap Quiz
//!
//! 拍一张书页照片，识别文字，自动生成测验题目
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（摄像头流），只暴露能力
//! - `CameraResource` - 唯一的摄像头持有者，提供获取 / 拍照 / 释放
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单帧画面或单段文本
//! - `ExtractionGateway` - 文字识别能力
//! - `GenerationGateway` - 题目生成能力（完整 / 部分 / 失败）
//! - `clients/` - 协作方的具体实现（HTTP OCR、LLM）
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 一次拍摄会话的状态与约束
//! - `PipelineState` - 会话唯一的可变状态
//! - `WordCountPolicy` - 根据词数约束题目数量
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/pipeline_controller` - 驱动状态机，丢弃过期结果，交接给下游
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{
    CameraError, ExtractionError, GenerationError, PipelineError, PipelineResult, ValidationError,
};
pub use infrastructure::{CameraResource, Facing, StillImageDevice};
pub use models::{GenerationParameters, HandoffPayload, Question};
pub use orchestrator::{ChannelHandoff, Commit, Handoff, PipelineController};
pub use services::{ExtractionGateway, GenerationGateway, GenerationOutcome};
pub use workflow::{PipelinePhase, WordCountPolicy};
