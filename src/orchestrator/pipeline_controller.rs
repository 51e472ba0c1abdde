//! 流水线控制器 - 编排层
//!
//! ## 职责
//!
//! 把摄像头、文字识别、题目数量策略和题目生成串成一条流水线：
//!
//! ```text
//! CameraResource → CapturedFrame → ExtractionGateway → ExtractedText
//!     → WordCountPolicy（约束参数）→ GenerationGateway → HandoffTarget
//! ```
//!
//! ## 设计特点
//!
//! - **单一状态**：所有可变数据都在 `PipelineState` 中
//! - **资源所有者**：唯一持有 `CameraResource` 的模块，交接、重置、销毁时都会释放
//! - **过期保护**：每个异步调用都带着发起时的 `SessionTicket`，迟到的结果直接丢弃
//! - **不自动重试**：所有恢复都由用户发起

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{
    CameraError, ExtractionError, GenerationError, PipelineError, PipelineResult, ValidationError,
};
use crate::infrastructure::{CameraResource, Facing, StreamHandle};
use crate::models::{
    CapturedFrame, Difficulty, ExtractedText, GenerationParameters, HandoffPayload, QuestionType,
};
use crate::orchestrator::handoff::{Handoff, HandoffTarget};
use crate::services::{ExtractionGateway, GenerationGateway, GenerationOutcome};
use crate::utils::logging::log_handoff;
use crate::workflow::{
    PipelinePhase, PipelineState, QuestionConstraints, SessionTicket, WordCountPolicy,
};

/// 异步结果的提交情况
#[derive(Debug, Clone, PartialEq)]
pub enum Commit<T> {
    /// 结果已写入当前状态
    Applied(T),
    /// 结果属于已经过去的会话或画面，已丢弃
    Stale,
}

impl<T> Commit<T> {
    pub fn applied(self) -> Option<T> {
        match self {
            Commit::Applied(value) => Some(value),
            Commit::Stale => None,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Commit::Stale)
    }
}

/// 一次进行中的文字识别
#[derive(Debug, Clone)]
pub struct ExtractionJob {
    pub ticket: SessionTicket,
    pub frame: CapturedFrame,
}

/// 一次进行中的题目生成
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub ticket: SessionTicket,
    pub text: ExtractedText,
    pub parameters: GenerationParameters,
}

/// 重试结果
#[derive(Debug, Clone, PartialEq)]
pub enum RetryOutcome {
    CameraStarted(StreamHandle),
    Captured,
    Extracted(Commit<QuestionConstraints>),
    Generated(Commit<Handoff>),
}

/// 给界面层的只读快照
#[derive(Debug, Clone, Serialize)]
pub struct PipelineView {
    pub session_id: Uuid,
    pub phase: &'static str,
    pub camera_live: bool,
    /// 当前画面的显示引用
    pub frame_ref: Option<String>,
    pub extracted_text: Option<String>,
    pub constraints: QuestionConstraints,
    pub parameters: GenerationParameters,
    pub error_message: Option<String>,
    pub loading_text: bool,
    pub loading_questions: bool,
}

/// 流水线控制器
pub struct PipelineController {
    camera: CameraResource,
    extraction: ExtractionGateway,
    generation: GenerationGateway,
    handoff: Arc<dyn HandoffTarget>,
    policy: WordCountPolicy,
    facing: Facing,
    defaults: GenerationParameters,
    state: PipelineState,
}

impl PipelineController {
    pub fn new(
        camera: CameraResource,
        extraction: ExtractionGateway,
        generation: GenerationGateway,
        handoff: Arc<dyn HandoffTarget>,
        config: &Config,
    ) -> Self {
        let policy = WordCountPolicy::from_config(config);
        let requested_count = policy.clamp_selection(
            config.default_question_count.max(1),
            policy.max_questions(0),
        );
        let defaults = GenerationParameters {
            question_type: config.default_question_type,
            requested_count,
            difficulty: config.default_difficulty,
        };

        Self {
            camera,
            extraction,
            generation,
            handoff,
            policy,
            facing: config.camera_facing,
            defaults,
            state: PipelineState::new(defaults),
        }
    }

    // ========== 查询 ==========

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn phase(&self) -> &PipelinePhase {
        self.state.phase()
    }

    pub fn policy(&self) -> &WordCountPolicy {
        &self.policy
    }

    pub fn camera_live(&self) -> bool {
        self.camera.is_live()
    }

    /// 当前文本对应的题目数量约束（没有文本时按 0 词计算）
    pub fn constraints(&self) -> QuestionConstraints {
        let words = self.state.text().map_or(0, |t| t.word_count());
        self.policy.constraints(words)
    }

    pub fn view(&self) -> PipelineView {
        PipelineView {
            session_id: self.state.session_id(),
            phase: self.state.phase().name(),
            camera_live: self.camera.is_live(),
            frame_ref: self.state.frame().map(|f| f.display_ref()),
            extracted_text: self.state.text().map(|t| t.as_str().to_string()),
            constraints: self.constraints(),
            parameters: *self.state.parameters(),
            error_message: self.state.last_error().map(|e| e.user_message()),
            loading_text: self.state.phase() == &PipelinePhase::Extracting,
            loading_questions: self.state.phase() == &PipelinePhase::Generating,
        }
    }

    // ========== 摄像头 ==========

    /// 获取摄像头（已有的流会先释放）
    pub async fn start_camera(&mut self) -> PipelineResult<StreamHandle> {
        self.ensure_not_in_flight("start_camera")?;

        match self.camera.acquire(self.facing).await {
            Ok(handle) => {
                self.state.clear_error();
                self.state.settle(true);
                Ok(handle)
            }
            Err(e) => {
                error!("[Pipeline] ❌ 摄像头启动失败: {}", e);
                Err(self.fail(e.into()))
            }
        }
    }

    /// 拍照
    ///
    /// 任何阶段都可以重新拍照，旧的文本和生成结果随之作废，
    /// 进行中的识别或生成结果回来时会被丢弃
    pub fn capture(&mut self) -> PipelineResult<CapturedFrame> {
        let frame = match self.camera.capture() {
            Ok(frame) => frame,
            Err(e) => return Err(self.fail(e.into())),
        };

        if self.state.phase().is_in_flight() {
            info!(
                "[Pipeline] 在 {} 阶段重新拍照，进行中的结果将被丢弃",
                self.state.phase().name()
            );
        }
        if let Some(previous) = self.state.frame() {
            debug!("[Pipeline] 显示引用 {} 已失效", previous.display_ref());
        }

        self.state.record_capture(frame.clone());
        Ok(frame)
    }

    // ========== 文字识别 ==========

    /// 识别当前画面中的文字
    pub async fn extract_text(&mut self) -> PipelineResult<Commit<QuestionConstraints>> {
        let job = self.begin_extraction()?;
        let result = self.extraction.extract(&job.frame).await;
        self.apply_extraction(job, result)
    }

    /// 进入 Extracting 阶段，返回需要交给识别网关的任务
    pub fn begin_extraction(&mut self) -> PipelineResult<ExtractionJob> {
        self.ensure_not_in_flight("extract")?;

        let frame = match self.state.frame().cloned() {
            Some(frame) => frame,
            None => return Err(self.reject(ValidationError::NoFrame.into())),
        };

        self.state.clear_error();
        self.state.enter(PipelinePhase::Extracting);
        let ticket = self.state.ticket();
        debug!("[Pipeline] {} 开始识别", ticket);

        Ok(ExtractionJob { ticket, frame })
    }

    /// 提交识别结果
    pub fn apply_extraction(
        &mut self,
        job: ExtractionJob,
        result: Result<ExtractedText, ExtractionError>,
    ) -> PipelineResult<Commit<QuestionConstraints>> {
        if !self.state.is_current(&job.ticket) {
            info!("[Pipeline] 丢弃过期的识别结果 {}", job.ticket);
            return Ok(Commit::Stale);
        }

        match result {
            Ok(text) => {
                let words = text.word_count();
                if !self.state.record_text(text) {
                    warn!("[Pipeline] 识别结果与当前画面不符，已丢弃");
                    self.state.settle(self.camera.is_live());
                    return Ok(Commit::Stale);
                }
                let constraints = self.refresh_constraints();
                info!(
                    "[Pipeline] ✓ 识别完成: {} 词，最多 {} 道题，可选 {:?}",
                    words, constraints.max_questions, constraints.selectable_counts
                );
                Ok(Commit::Applied(constraints))
            }
            Err(e) => {
                error!("[Pipeline] ❌ {}", e);
                Err(self.fail(e.into()))
            }
        }
    }

    // ========== 生成参数 ==========

    /// 设置题目数量
    ///
    /// 只接受可选列表中的数量：不在列表中的值取不超过它的最大可选值，
    /// 超过上限时取最大可选值。返回实际生效的数量
    pub fn set_requested_count(&mut self, count: u32) -> PipelineResult<u32> {
        self.ensure_not_generating("set_requested_count")?;
        if count == 0 {
            return Err(self.reject(ValidationError::InvalidCount { requested: count }.into()));
        }

        let max_questions = self.constraints().max_questions;
        let effective = self.policy.clamp_selection(count, max_questions);
        if effective != count {
            info!(
                "[Pipeline] 题目数量 {} 不可选 (上限 {})，已调整为 {}",
                count, max_questions, effective
            );
        }
        self.update_parameters(|p| p.requested_count = effective);
        Ok(effective)
    }

    pub fn set_question_type(&mut self, question_type: QuestionType) -> PipelineResult<()> {
        self.ensure_not_generating("set_question_type")?;
        self.update_parameters(|p| p.question_type = question_type);
        Ok(())
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) -> PipelineResult<()> {
        self.ensure_not_generating("set_difficulty")?;
        self.update_parameters(|p| p.difficulty = difficulty);
        Ok(())
    }

    /// 修改生成参数；参数变化后旧的生成结果不再对应，随之丢弃
    fn update_parameters(&mut self, change: impl FnOnce(&mut GenerationParameters)) {
        let before = *self.state.parameters();
        change(self.state.parameters_mut());
        if *self.state.parameters() != before && self.state.discard_result() {
            debug!("[Pipeline] 生成参数已改变，丢弃上一次的生成结果");
        }
    }

    // ========== 题目生成 ==========

    /// 生成题目并交接给下游
    pub async fn generate_questions(&mut self) -> PipelineResult<Commit<Handoff>> {
        let job = self.begin_generation()?;
        let result = self.generation.generate(&job.text, &job.parameters).await;
        self.apply_generation(job, result)
    }

    /// 本地校验通过后进入 Generating 阶段
    pub fn begin_generation(&mut self) -> PipelineResult<GenerationJob> {
        self.ensure_not_in_flight("generate")?;

        let text = match self.state.text().filter(|t| !t.is_blank()).cloned() {
            Some(text) => text,
            None => return Err(self.reject(ValidationError::NoText.into())),
        };
        if let Err(e) = self.policy.check_generation_allowed(text.word_count()) {
            return Err(self.reject(e.into()));
        }

        self.refresh_constraints();
        let parameters = *self.state.parameters();
        self.state.clear_error();
        self.state.enter(PipelinePhase::Generating);
        let ticket = self.state.ticket();
        debug!(
            "[Pipeline] {} 开始生成 {} 道题",
            ticket, parameters.requested_count
        );

        Ok(GenerationJob {
            ticket,
            text,
            parameters,
        })
    }

    /// 提交生成结果；成功（含部分成功）时交接并结束本次会话
    pub fn apply_generation(
        &mut self,
        job: GenerationJob,
        result: Result<GenerationOutcome, GenerationError>,
    ) -> PipelineResult<Commit<Handoff>> {
        if !self.state.is_current(&job.ticket) {
            info!("[Pipeline] 丢弃过期的生成结果 {}", job.ticket);
            return Ok(Commit::Stale);
        }

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("[Pipeline] ❌ {}", e);
                return Err(self.fail(e.into()));
            }
        };

        self.state.record_result(outcome.result().clone());
        self.hand_off(outcome, job.text.as_str(), &job.parameters)
    }

    /// 把生成结果交给下游；成功后结束本次会话，失败时保留结果以便重新交接
    fn hand_off(
        &mut self,
        outcome: GenerationOutcome,
        text: &str,
        parameters: &GenerationParameters,
    ) -> PipelineResult<Commit<Handoff>> {
        let warning = outcome.warning();
        let payload = HandoffPayload::new(outcome.into_result(), text, parameters);
        if let Err(e) = self.handoff.deliver(payload.clone()) {
            error!("[Pipeline] ❌ {}", e);
            return Err(self.fail(e));
        }

        if let Some(message) = &warning {
            warn!("[Pipeline] ⚠️ {}", message);
        }
        log_handoff(&payload, warning.as_deref());
        self.discard_session();

        Ok(Commit::Applied(Handoff { payload, warning }))
    }

    /// 重新交接上一次已生成的结果，不再调用出题协作方
    ///
    /// 没有可交接的结果时返回 None
    fn redeliver(&mut self) -> Option<PipelineResult<Commit<Handoff>>> {
        let result = self.state.last_result()?.clone();
        let text = self.state.text()?.clone();
        let parameters = *self.state.parameters();

        info!("[Pipeline] 重新交接已生成的 {} 道题", result.actual_count);
        Some(self.hand_off(GenerationOutcome::from(result), text.as_str(), &parameters))
    }

    // ========== 恢复与清理 ==========

    /// 重试失败的那一步
    pub async fn retry(&mut self) -> PipelineResult<RetryOutcome> {
        let failed = match self.state.phase() {
            PipelinePhase::Error(e) => e.clone(),
            other => return Err(PipelineError::invalid_transition(other.name(), "retry")),
        };
        info!("[Pipeline] 🔄 用户重试: {}", failed);

        match failed {
            PipelineError::Camera(CameraError::NotReady) if self.camera.is_live() => {
                self.capture()?;
                Ok(RetryOutcome::Captured)
            }
            PipelineError::Camera(_) => Ok(RetryOutcome::CameraStarted(self.start_camera().await?)),
            PipelineError::Extraction(_) => Ok(RetryOutcome::Extracted(self.extract_text().await?)),
            PipelineError::Handoff(_) => match self.redeliver() {
                Some(commit) => Ok(RetryOutcome::Generated(commit?)),
                None => Ok(RetryOutcome::Generated(self.generate_questions().await?)),
            },
            PipelineError::Generation(_) => {
                Ok(RetryOutcome::Generated(self.generate_questions().await?))
            }
            other => {
                self.state.settle(self.camera.is_live());
                Err(other)
            }
        }
    }

    /// 放弃当前会话：释放摄像头并丢弃全部状态
    pub fn reset(&mut self) {
        info!("[Pipeline] 重置会话 {}", self.state.session_id());
        self.discard_session();
    }

    /// 离开页面
    pub fn shutdown(mut self) {
        info!("[Pipeline] 关闭会话 {}", self.state.session_id());
        self.camera.release();
    }

    // ========== 内部辅助 ==========

    fn discard_session(&mut self) {
        self.camera.release();
        self.state = PipelineState::new(self.defaults);
    }

    /// 上限变化后重新约束已选数量
    fn refresh_constraints(&mut self) -> QuestionConstraints {
        let constraints = self.constraints();
        let parameters = self.state.parameters_mut();
        let clamped = self
            .policy
            .clamp_selection(parameters.requested_count, constraints.max_questions);
        if clamped != parameters.requested_count {
            info!(
                "[Pipeline] 上限变为 {}，题目数量 {} 调整为 {}",
                constraints.max_questions, parameters.requested_count, clamped
            );
            parameters.requested_count = clamped;
        }
        constraints
    }

    fn fail(&mut self, error: PipelineError) -> PipelineError {
        self.state.fail(error.clone());
        error
    }

    fn reject(&mut self, error: PipelineError) -> PipelineError {
        warn!("[Pipeline] ⚠️ {}", error);
        self.state.note_error(error.clone());
        error
    }

    fn ensure_not_in_flight(&self, action: &'static str) -> PipelineResult<()> {
        if self.state.phase().is_in_flight() {
            return Err(PipelineError::invalid_transition(
                self.state.phase().name(),
                action,
            ));
        }
        Ok(())
    }

    fn ensure_not_generating(&self, action: &'static str) -> PipelineResult<()> {
        if self.state.phase() == &PipelinePhase::Generating {
            return Err(PipelineError::invalid_transition("Generating", action));
        }
        Ok(())
    }
}
