//! 文字识别网关 - 业务能力层
//!
//! 只负责"把一帧画面交给 OCR 协作方"，不重试、不缓存

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::ExtractionError;
use crate::models::{CapturedFrame, ExtractedText};
use crate::utils::logging::truncate_text;

/// OCR 协作方
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// 输入 JPEG 数据，返回识别出的 UTF-8 文本
    async fn extract_text(&self, jpeg: &[u8]) -> Result<String>;
}

/// 文字识别网关
pub struct ExtractionGateway {
    extractor: Arc<dyn TextExtractor>,
}

impl ExtractionGateway {
    pub fn new(extractor: Arc<dyn TextExtractor>) -> Self {
        Self { extractor }
    }

    /// 识别一帧画面中的文字
    ///
    /// 每帧都要单独调用，结果记录来源画面 ID
    pub async fn extract(&self, frame: &CapturedFrame) -> Result<ExtractedText, ExtractionError> {
        debug!("[OCR] 开始识别 {}", frame);

        match self.extractor.extract_text(frame.jpeg()).await {
            Ok(text) => {
                let extracted = ExtractedText::new(text, frame.id());
                debug!(
                    "[OCR] 识别完成，{} 词: {}",
                    extracted.word_count(),
                    truncate_text(extracted.as_str(), 80)
                );
                Ok(extracted)
            }
            Err(e) => {
                warn!("[OCR] ⚠️ 识别失败: {:#}", e);
                Err(ExtractionError::Failed(format!("{:#}", e)))
            }
        }
    }
}
