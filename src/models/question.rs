//! 题目生成相关的数据结构
//!
//! 与 AI 协作方之间的请求/响应格式，以及交接给下游页面的数据。

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// 题型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// 客观题（选择题）
    #[default]
    Objective,
    /// 主观题（简答题）
    Subjective,
    /// 判断题
    TrueFalse,
    /// 填空题
    FillInTheBlank,
}

impl QuestionType {
    /// 协作方使用的标识
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::Objective => "objective",
            QuestionType::Subjective => "subjective",
            QuestionType::TrueFalse => "true_false",
            QuestionType::FillInTheBlank => "fill_in_the_blank",
        }
    }

    /// 提示词中使用的描述
    pub fn describe(self) -> &'static str {
        match self {
            QuestionType::Objective => "multiple-choice questions with four options and one correct answer",
            QuestionType::Subjective => "short-answer questions with a model answer",
            QuestionType::TrueFalse => "true/false statements with the correct answer",
            QuestionType::FillInTheBlank => "fill-in-the-blank sentences with the missing word",
        }
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "objective" | "mcq" => Ok(QuestionType::Objective),
            "subjective" => Ok(QuestionType::Subjective),
            "true_false" | "truefalse" => Ok(QuestionType::TrueFalse),
            "fill_in_the_blank" | "fill" => Ok(QuestionType::FillInTheBlank),
            other => Err(format!("未知题型: {}", other)),
        }
    }
}

/// 难度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("未知难度: {}", other)),
        }
    }
}

/// 生成参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationParameters {
    pub question_type: QuestionType,
    /// 请求的题目数量，不超过当前文本的上限
    pub requested_count: u32,
    pub difficulty: Difficulty,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            question_type: QuestionType::Objective,
            requested_count: 10,
            difficulty: Difficulty::Medium,
        }
    }
}

/// 协作方返回的单道题目，内部结构不做解释
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Question(pub JsonValue);

impl From<JsonValue> for Question {
    fn from(value: JsonValue) -> Self {
        Question(value)
    }
}

/// 发给 AI 协作方的请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub text: String,
    pub question_type: QuestionType,
    pub count: u32,
    pub difficulty: Difficulty,
}

impl GenerationRequest {
    pub fn new(text: impl Into<String>, params: &GenerationParameters) -> Self {
        Self {
            text: text.into(),
            question_type: params.question_type,
            count: params.requested_count,
            difficulty: params.difficulty,
        }
    }
}

/// AI 协作方的响应
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    pub success: bool,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub requested_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerationResponse {
    pub fn succeeded(questions: Vec<Question>, requested_count: u32) -> Self {
        Self {
            success: true,
            questions,
            requested_count,
            error: None,
        }
    }

    pub fn failed(requested_count: u32, error: impl Into<String>) -> Self {
        Self {
            success: false,
            questions: Vec::new(),
            requested_count,
            error: Some(error.into()),
        }
    }
}

/// 一次生成的结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub questions: Vec<Question>,
    pub requested_count: u32,
    pub actual_count: u32,
}

impl GenerationResult {
    pub fn new(questions: Vec<Question>, requested_count: u32) -> Self {
        let actual_count = u32::try_from(questions.len()).unwrap_or(u32::MAX);
        Self {
            questions,
            requested_count,
            actual_count,
        }
    }

    /// 实际数量少于请求数量
    pub fn is_partial(&self) -> bool {
        self.actual_count < self.requested_count
    }
}

/// 交接给下游复核页面的数据，只在内存中传递
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoffPayload {
    pub questions: Vec<Question>,
    pub original_text: String,
    pub question_type: QuestionType,
    /// 请求数量
    pub count: u32,
    /// 实际生成数量
    pub generated_count: u32,
    pub difficulty: Difficulty,
}

impl HandoffPayload {
    pub fn new(result: GenerationResult, original_text: &str, params: &GenerationParameters) -> Self {
        Self {
            original_text: original_text.to_string(),
            question_type: params.question_type,
            count: result.requested_count,
            generated_count: result.actual_count,
            difficulty: params.difficulty,
            questions: result.questions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_format() {
        let params = GenerationParameters {
            question_type: QuestionType::Objective,
            requested_count: 20,
            difficulty: Difficulty::Hard,
        };
        let request = GenerationRequest::new("some text", &params);

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "text": "some text",
                "questionType": "objective",
                "count": 20,
                "difficulty": "hard"
            })
        );
    }

    #[test]
    fn test_response_without_optional_fields() {
        let response: GenerationResponse =
            serde_json::from_str(r#"{"success": false, "error": "rate limited"}"#).unwrap();

        assert!(!response.success);
        assert!(response.questions.is_empty());
        assert_eq!(response.error.as_deref(), Some("rate limited"));
    }

    #[test]
    fn test_handoff_payload_uses_requested_and_actual_counts() {
        let questions = vec![Question(json!({"q": 1})), Question(json!({"q": 2}))];
        let result = GenerationResult::new(questions, 10);
        assert!(result.is_partial());

        let payload = HandoffPayload::new(result, "origin", &GenerationParameters::default());
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(value["count"], 10);
        assert_eq!(value["generatedCount"], 2);
        assert_eq!(value["originalText"], "origin");
        assert_eq!(value["questionType"], "objective");
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("Hard".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert_eq!("objective".parse::<QuestionType>(), Ok(QuestionType::Objective));
        assert!("impossible".parse::<Difficulty>().is_err());
    }
}
