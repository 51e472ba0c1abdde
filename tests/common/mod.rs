#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use image::RgbImage;
use serde_json::json;

use snap_quiz::infrastructure::{CaptureDevice, DeviceError, Facing, PreviewStream};
use snap_quiz::models::{GenerationRequest, GenerationResponse, HandoffPayload, Question};
use snap_quiz::orchestrator::HandoffTarget;
use snap_quiz::services::{QuestionGenerator, TextExtractor};
use snap_quiz::{
    CameraResource, Config, ExtractionGateway, GenerationGateway, PipelineController,
    PipelineError,
};

pub fn words(n: usize) -> String {
    (0..n).map(|i| format!("word{}", i)).collect::<Vec<_>>().join(" ")
}

pub fn questions(n: usize) -> Vec<Question> {
    (0..n)
        .map(|i| Question(json!({ "question": format!("Q{}?", i), "answer": "A" })))
        .collect()
}

// ========== 摄像头 ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceMode {
    Ok,
    Busy,
    Denied,
}

/// 统计打开与停止次数的假设备
pub struct CountingDevice {
    pub opens: AtomicUsize,
    pub stops: Arc<AtomicUsize>,
    mode: Mutex<DeviceMode>,
}

impl CountingDevice {
    pub fn new() -> Self {
        Self {
            opens: AtomicUsize::new(0),
            stops: Arc::new(AtomicUsize::new(0)),
            mode: Mutex::new(DeviceMode::Ok),
        }
    }

    pub fn set_mode(&self, mode: DeviceMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

struct CountingStream {
    stops: Arc<AtomicUsize>,
}

impl PreviewStream for CountingStream {
    fn current_frame(&self) -> Option<RgbImage> {
        Some(RgbImage::from_pixel(16, 12, image::Rgb([240, 240, 235])))
    }

    fn stop(&mut self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CaptureDevice for CountingDevice {
    async fn open(&self, _facing: Facing) -> Result<Box<dyn PreviewStream>, DeviceError> {
        let mode = *self.mode.lock().unwrap();
        match mode {
            DeviceMode::Busy => Err(DeviceError::InUse("NotReadableError".into())),
            DeviceMode::Denied => Err(DeviceError::PermissionDenied("NotAllowedError".into())),
            DeviceMode::Ok => {
                self.opens.fetch_add(1, Ordering::SeqCst);
                Ok(Box::new(CountingStream {
                    stops: self.stops.clone(),
                }))
            }
        }
    }
}

// ========== OCR ==========

/// 按顺序返回预设结果的 OCR
#[derive(Default)]
pub struct ScriptedExtractor {
    replies: Mutex<VecDeque<Result<String, String>>>,
    calls: AtomicUsize,
}

impl ScriptedExtractor {
    pub fn push_text(&self, text: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(text.into()));
    }

    pub fn push_failure(&self, reason: &str) {
        self.replies.lock().unwrap().push_back(Err(reason.to_string()));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextExtractor for ScriptedExtractor {
    async fn extract_text(&self, _jpeg: &[u8]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(reason)) => Err(anyhow::anyhow!(reason)),
            None => Err(anyhow::anyhow!("no scripted reply")),
        }
    }
}

// ========== 生成 ==========

/// 按顺序返回预设响应的出题协作方，并记录收到的请求
#[derive(Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<GenerationResponse>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn push(&self, response: GenerationResponse) {
        self.replies.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl QuestionGenerator for ScriptedGenerator {
    async fn generate_questions(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| GenerationResponse::failed(request.count, "no scripted reply")))
    }
}

// ========== 交接 ==========

#[derive(Default)]
pub struct RecordingHandoff {
    pub delivered: Mutex<Vec<HandoffPayload>>,
    refuse: Mutex<bool>,
}

impl RecordingHandoff {
    pub fn refuse(&self, refuse: bool) {
        *self.refuse.lock().unwrap() = refuse;
    }

    pub fn count(&self) -> usize {
        self.delivered.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<HandoffPayload> {
        self.delivered.lock().unwrap().last().cloned()
    }
}

impl HandoffTarget for RecordingHandoff {
    fn deliver(&self, payload: HandoffPayload) -> Result<(), PipelineError> {
        if *self.refuse.lock().unwrap() {
            return Err(PipelineError::handoff_failed("review view closed"));
        }
        self.delivered.lock().unwrap().push(payload);
        Ok(())
    }
}

// ========== 组装 ==========

pub struct Harness {
    pub controller: PipelineController,
    pub device: Arc<CountingDevice>,
    pub extractor: Arc<ScriptedExtractor>,
    pub generator: Arc<ScriptedGenerator>,
    pub handoff: Arc<RecordingHandoff>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    pub fn with_config(config: &Config) -> Self {
        let device = Arc::new(CountingDevice::new());
        let extractor = Arc::new(ScriptedExtractor::default());
        let generator = Arc::new(ScriptedGenerator::default());
        let handoff = Arc::new(RecordingHandoff::default());

        let controller = PipelineController::new(
            CameraResource::new(device.clone()),
            ExtractionGateway::new(extractor.clone()),
            GenerationGateway::new(generator.clone()),
            handoff.clone(),
            config,
        );

        Self {
            controller,
            device,
            extractor,
            generator,
            handoff,
        }
    }

    /// 启动摄像头、拍照并识别出给定文本
    pub async fn ready_with_text(&mut self, text: impl Into<String>) {
        self.extractor.push_text(text);
        self.controller.start_camera().await.unwrap();
        self.controller.capture().unwrap();
        self.controller.extract_text().await.unwrap();
    }
}
