//! 题目生成网关 - 业务能力层
//!
//! 把协作方的响应整理成明确的结果：完整成功、部分成功、失败。
//! 部分成功不是错误，由调用方给出警告后继续。

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::GenerationError;
use crate::models::{
    ExtractedText, GenerationParameters, GenerationRequest, GenerationResponse, GenerationResult,
};

/// 题目生成协作方
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate_questions(&self, request: &GenerationRequest) -> Result<GenerationResponse>;
}

/// 生成结果
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    /// 数量达到请求数量
    Complete(GenerationResult),
    /// 数量少于请求数量
    Partial(GenerationResult),
}

impl GenerationOutcome {
    pub fn result(&self) -> &GenerationResult {
        match self {
            GenerationOutcome::Complete(r) | GenerationOutcome::Partial(r) => r,
        }
    }

    pub fn into_result(self) -> GenerationResult {
        match self {
            GenerationOutcome::Complete(r) | GenerationOutcome::Partial(r) => r,
        }
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, GenerationOutcome::Partial(_))
    }

    /// 部分成功时给用户的非致命提示
    pub fn warning(&self) -> Option<String> {
        match self {
            GenerationOutcome::Complete(_) => None,
            GenerationOutcome::Partial(r) => Some(format!(
                "Generated {} questions instead of {}. Proceeding anyway.",
                r.actual_count, r.requested_count
            )),
        }
    }
}

impl From<GenerationResult> for GenerationOutcome {
    fn from(result: GenerationResult) -> Self {
        if result.is_partial() {
            GenerationOutcome::Partial(result)
        } else {
            GenerationOutcome::Complete(result)
        }
    }
}

/// 题目生成网关
pub struct GenerationGateway {
    generator: Arc<dyn QuestionGenerator>,
}

impl GenerationGateway {
    pub fn new(generator: Arc<dyn QuestionGenerator>) -> Self {
        Self { generator }
    }

    /// 调用协作方生成题目
    ///
    /// 词数下限由调用方保证
    pub async fn generate(
        &self,
        text: &ExtractedText,
        params: &GenerationParameters,
    ) -> Result<GenerationOutcome, GenerationError> {
        let request = GenerationRequest::new(text.as_str(), params);
        debug!(
            "[生成] 请求 {} 道 {} 题 (难度: {})",
            request.count,
            request.question_type.as_str(),
            request.difficulty.as_str()
        );

        let response = self
            .generator
            .generate_questions(&request)
            .await
            .map_err(|e| {
                warn!("[生成] ⚠️ 协作方调用失败: {:#}", e);
                GenerationError::Failed(format!("{:#}", e))
            })?;

        if !response.success {
            let cause = response
                .error
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| "Unexpected error occurred.".to_string());
            warn!("[生成] ⚠️ 协作方返回失败: {}", cause);
            return Err(GenerationError::Failed(cause));
        }

        if response.requested_count != 0 && response.requested_count != params.requested_count {
            debug!(
                "[生成] 协作方回报的请求数量 {} 与参数 {} 不一致，以参数为准",
                response.requested_count, params.requested_count
            );
        }
        let outcome = GenerationOutcome::from(GenerationResult::new(
            response.questions,
            params.requested_count,
        ));

        let result = outcome.result();
        if outcome.is_partial() {
            warn!(
                "[生成] ⚠️ 只生成了 {}/{} 道题",
                result.actual_count, result.requested_count
            );
        } else {
            info!("[生成] ✓ 生成了 {} 道题", result.actual_count);
        }
        Ok(outcome)
    }
}
