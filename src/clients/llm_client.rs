//! LLM 出题客户端
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 兼容 OpenAI API 的服务（如 Fireworks, Azure, Doubao 等）

use std::sync::LazyLock;

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{GenerationRequest, GenerationResponse, Question};
use crate::services::QuestionGenerator;

/// Markdown 代码块（可带 json 标记）
static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("代码块正则无效"));

/// LLM 出题客户端
///
/// 职责：
/// - 根据识别文本构建出题提示词
/// - 解析 LLM 返回的题目列表
/// - 失败时按协作方协议返回 `success: false`
pub struct LlmClient {
    client: Client<OpenAIConfig>,
    model_name: String,
    temperature: f32,
    max_tokens: u32,
}

impl LlmClient {
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
            temperature: config.llm_temperature,
            max_tokens: config.llm_max_tokens,
        }
    }

    /// 发送聊天请求，返回去掉首尾空白的回复内容
    pub async fn chat(&self, user_message: &str, system_message: Option<&str>) -> Result<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            anyhow::anyhow!("LLM API 调用失败: {}", e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("LLM 返回内容为空"))?;

        Ok(content.trim().to_string())
    }

    /// 构建出题消息，返回 (user_message, system_message)
    fn build_messages(request: &GenerationRequest) -> (String, String) {
        let system_message = "You are an experienced teacher who writes quiz questions strictly \
                              from the provided source text. You always answer with valid JSON only."
            .to_string();

        let user_message = format!(
            r#"Write exactly {count} {difficulty} {kind} based only on the text below.

Return a JSON array. Each element must be an object with the fields:
  "question": the question text,
  "options": an array of options (empty when not applicable),
  "answer": the correct answer,
  "explanation": one sentence explaining the answer.

Do not add any commentary outside the JSON array.

Text:
"""
{text}
""""#,
            count = request.count,
            difficulty = request.difficulty.as_str(),
            kind = request.question_type.describe(),
            text = request.text,
        );

        (user_message, system_message)
    }

    /// 从 LLM 回复中解析题目列表
    ///
    /// 支持 ```json 代码块包裹，以及 `{"questions": [...]}` 形式
    fn parse_questions(response: &str) -> Result<Vec<Question>> {
        let body = CODE_FENCE
            .captures(response)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .unwrap_or(response)
            .trim();

        let value: JsonValue = serde_json::from_str(body)
            .map_err(|e| anyhow::anyhow!("无法解析 LLM 返回的 JSON: {}", e))?;

        let items = match value {
            JsonValue::Array(items) => items,
            JsonValue::Object(mut map) => match map.remove("questions") {
                Some(JsonValue::Array(items)) => items,
                _ => anyhow::bail!("LLM 返回的对象中没有 questions 数组"),
            },
            _ => anyhow::bail!("LLM 返回的不是题目数组"),
        };

        Ok(items.into_iter().map(Question).collect())
    }
}

#[async_trait]
impl QuestionGenerator for LlmClient {
    async fn generate_questions(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        let (user_message, system_message) = Self::build_messages(request);

        let response = match self.chat(&user_message, Some(&system_message)).await {
            Ok(content) => content,
            Err(e) => return Ok(GenerationResponse::failed(request.count, e.to_string())),
        };

        match Self::parse_questions(&response) {
            Ok(mut questions) => {
                questions.truncate(request.count as usize);
                debug!("LLM 返回 {} 道题", questions.len());
                Ok(GenerationResponse::succeeded(questions, request.count))
            }
            Err(e) => {
                warn!("{}", e);
                Ok(GenerationResponse::failed(request.count, e.to_string()))
            }
        }
    }
}
