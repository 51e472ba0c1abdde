//! 流水线状态
//!
//! 一次拍摄会话只有一个 `PipelineState`，所有可变数据都集中在这里，
//! 只能通过下面的转换方法修改。

use std::fmt::Display;

use uuid::Uuid;

use crate::error::PipelineError;
use crate::models::{CapturedFrame, ExtractedText, GenerationParameters, GenerationResult};

/// 流水线阶段
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelinePhase {
    Idle,
    CameraReady,
    Captured,
    Extracting,
    ExtractedReady,
    Generating,
    Error(PipelineError),
}

impl PipelinePhase {
    pub fn name(&self) -> &'static str {
        match self {
            PipelinePhase::Idle => "Idle",
            PipelinePhase::CameraReady => "CameraReady",
            PipelinePhase::Captured => "Captured",
            PipelinePhase::Extracting => "Extracting",
            PipelinePhase::ExtractedReady => "ExtractedReady",
            PipelinePhase::Generating => "Generating",
            PipelinePhase::Error(_) => "Error",
        }
    }

    /// 是否有异步调用在进行中
    pub fn is_in_flight(&self) -> bool {
        matches!(self, PipelinePhase::Extracting | PipelinePhase::Generating)
    }
}

/// 发起异步调用时的会话标记
///
/// 迟到的结果必须与当前会话和拍摄轮次都一致才会被提交
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTicket {
    pub session_id: Uuid,
    pub epoch: u64,
}

impl Display for SessionTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[会话 {} 轮次 #{}]", self.session_id, self.epoch)
    }
}

/// 一次拍摄会话的全部状态
#[derive(Debug, Clone)]
pub struct PipelineState {
    session_id: Uuid,
    /// 每次拍摄加一
    epoch: u64,
    phase: PipelinePhase,
    frame: Option<CapturedFrame>,
    text: Option<ExtractedText>,
    parameters: GenerationParameters,
    last_result: Option<GenerationResult>,
    last_error: Option<PipelineError>,
}

impl PipelineState {
    pub fn new(parameters: GenerationParameters) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            epoch: 0,
            phase: PipelinePhase::Idle,
            frame: None,
            text: None,
            parameters,
            last_result: None,
            last_error: None,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn phase(&self) -> &PipelinePhase {
        &self.phase
    }

    pub fn frame(&self) -> Option<&CapturedFrame> {
        self.frame.as_ref()
    }

    pub fn text(&self) -> Option<&ExtractedText> {
        self.text.as_ref()
    }

    pub fn parameters(&self) -> &GenerationParameters {
        &self.parameters
    }

    pub fn last_result(&self) -> Option<&GenerationResult> {
        self.last_result.as_ref()
    }

    pub fn last_error(&self) -> Option<&PipelineError> {
        self.last_error.as_ref()
    }

    /// 当前会话标记
    pub fn ticket(&self) -> SessionTicket {
        SessionTicket {
            session_id: self.session_id,
            epoch: self.epoch,
        }
    }

    /// 标记是否仍对应当前状态
    pub fn is_current(&self, ticket: &SessionTicket) -> bool {
        *ticket == self.ticket()
    }

    pub fn parameters_mut(&mut self) -> &mut GenerationParameters {
        &mut self.parameters
    }

    /// 根据已有数据回到对应的静止阶段
    pub fn settle(&mut self, camera_live: bool) {
        self.phase = if self.text.is_some() {
            PipelinePhase::ExtractedReady
        } else if self.frame.is_some() {
            PipelinePhase::Captured
        } else if camera_live {
            PipelinePhase::CameraReady
        } else {
            PipelinePhase::Idle
        };
    }

    pub fn enter(&mut self, phase: PipelinePhase) {
        self.phase = phase;
    }

    /// 记录错误并进入 Error 阶段，已有的画面和文本保持不变
    pub fn fail(&mut self, error: PipelineError) {
        self.last_error = Some(error.clone());
        self.phase = PipelinePhase::Error(error);
    }

    /// 记录错误但不改变阶段（本地校验失败）
    pub fn note_error(&mut self, error: PipelineError) {
        self.last_error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// 新的拍摄：替换画面，清空文本和生成结果，开始新的轮次
    pub fn record_capture(&mut self, frame: CapturedFrame) {
        self.epoch += 1;
        self.frame = Some(frame);
        self.text = None;
        self.last_result = None;
        self.last_error = None;
        self.phase = PipelinePhase::Captured;
    }

    /// 提交识别文本；文本必须来自当前画面
    pub fn record_text(&mut self, text: ExtractedText) -> bool {
        let matches_frame = self
            .frame
            .as_ref()
            .is_some_and(|frame| frame.id() == text.frame_id());
        if matches_frame {
            self.text = Some(text);
            self.last_error = None;
            self.phase = PipelinePhase::ExtractedReady;
        }
        matches_frame
    }

    pub fn record_result(&mut self, result: GenerationResult) {
        self.last_result = Some(result);
    }

    /// 丢弃已生成的结果（生成参数已改变）
    pub fn discard_result(&mut self) -> bool {
        self.last_result.take().is_some()
    }
}
