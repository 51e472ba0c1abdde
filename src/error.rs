//! 错误类型
//!
//! 领域错误全部可 `Clone`，以便保存在 `PipelineState` 中供界面层展示，
//! 适配层（HTTP、LLM、配置加载）仍然使用 `anyhow`，在网关处统一转换。

use thiserror::Error;

/// 摄像头错误
///
/// `Busy` 与 `Denied` 必须区分：前者提示用户关闭其他会话，后者只给出通用提示。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    /// 设备已被其他会话占用
    #[error("摄像头已被占用: {0}")]
    Busy(String),
    /// 权限被拒绝或设备不可用
    #[error("摄像头访问被拒绝或不可用: {0}")]
    Denied(String),
    /// 没有已绑定的预览流
    #[error("摄像头未就绪，没有可用的预览画面")]
    NotReady,
}

impl CameraError {
    /// 面向用户的提示语
    pub fn user_message(&self) -> &'static str {
        match self {
            CameraError::Busy(_) => {
                "Camera is already in use by another tab or application. Please close other camera sessions and try again."
            }
            CameraError::Denied(_) => "Camera access denied or unavailable.",
            CameraError::NotReady => "Camera is not ready. Please start the camera and try again.",
        }
    }
}

/// 文字识别错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("文字识别失败: {0}")]
    Failed(String),
}

impl ExtractionError {
    pub fn user_message(&self) -> &'static str {
        "Failed to extract text from image."
    }
}

/// 本地前置校验错误，永远不会发送给协作方
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// 尚未拍照
    #[error("尚未拍摄照片")]
    NoFrame,
    /// 识别文本为空
    #[error("照片中没有识别出文字")]
    NoText,
    /// 文本字数不足
    #[error("识别文本过短: {word_count} 词，至少需要 {min_words} 词")]
    TextTooShort { word_count: usize, min_words: usize },
    /// 题目数量非法
    #[error("题目数量必须大于 0 (收到 {requested})")]
    InvalidCount { requested: u32 },
}

impl ValidationError {
    pub fn user_message(&self) -> String {
        match self {
            ValidationError::NoFrame => "No photo captured.".to_string(),
            ValidationError::NoText => "No text extracted from photo.".to_string(),
            ValidationError::TextTooShort { min_words, .. } => format!(
                "Extracted text is too short. Minimum {} words required.",
                min_words
            ),
            ValidationError::InvalidCount { .. } => {
                "Please choose how many questions to generate.".to_string()
            }
        }
    }
}

/// 题目生成错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// 携带可读的失败原因
    #[error("题目生成失败: {0}")]
    Failed(String),
}

impl GenerationError {
    pub fn user_message(&self) -> String {
        match self {
            GenerationError::Failed(cause) if !cause.trim().is_empty() => cause.clone(),
            GenerationError::Failed(_) => "Unexpected error occurred.".to_string(),
        }
    }
}

/// 流水线错误（聚合所有领域错误）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    /// 当前阶段不允许该操作
    #[error("当前阶段 {phase} 不允许执行 {action}")]
    InvalidTransition {
        phase: &'static str,
        action: &'static str,
    },
    /// 交接目标拒收
    #[error("交接失败: {0}")]
    Handoff(String),
}

impl PipelineError {
    /// 创建非法状态转换错误
    pub fn invalid_transition(phase: &'static str, action: &'static str) -> Self {
        PipelineError::InvalidTransition { phase, action }
    }

    /// 创建交接失败错误
    pub fn handoff_failed(reason: impl Into<String>) -> Self {
        PipelineError::Handoff(reason.into())
    }

    /// 面向用户的提示语
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::Camera(e) => e.user_message().to_string(),
            PipelineError::Extraction(e) => e.user_message().to_string(),
            PipelineError::Validation(e) => e.user_message(),
            PipelineError::Generation(e) => e.user_message(),
            PipelineError::InvalidTransition { .. } => {
                "Please wait for the current step to finish.".to_string()
            }
            PipelineError::Handoff(_) => "Unexpected error occurred.".to_string(),
        }
    }
}

/// 流水线结果类型
pub type PipelineResult<T> = Result<T, PipelineError>;
