use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::infrastructure::Facing;
use crate::models::{Difficulty, QuestionType};

/// 指定配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "SNAP_QUIZ_CONFIG";

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 文字识别 ---
    pub ocr_api_url: String,
    pub ocr_api_key: Option<String>,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,
    /// 请求超时（秒）
    pub request_timeout_secs: u64,
    // --- 摄像头 ---
    pub camera_facing: Facing,
    /// 静态图片设备使用的图片路径
    pub camera_source: Option<String>,
    pub jpeg_quality: u8,
    // --- 题目数量策略 ---
    /// 生成题目所需的最少词数
    pub min_words_for_generation: usize,
    /// 每多少词允许一道题
    pub words_per_question: usize,
    pub min_question_ceiling: u32,
    pub max_question_ceiling: u32,
    /// 上限低于最小预设值时使用的数量
    pub fallback_question_count: u32,
    // --- 默认生成参数 ---
    pub default_question_type: QuestionType,
    pub default_difficulty: Difficulty,
    pub default_question_count: u32,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 未设置 RUST_LOG 时使用的过滤规则
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ocr_api_url: "http://127.0.0.1:8081/ocr".to_string(),
            ocr_api_key: None,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.fireworks.ai/inference/v1".to_string(),
            llm_model_name: "accounts/fireworks/models/llama-v3p1-70b-instruct".to_string(),
            llm_temperature: 0.7,
            llm_max_tokens: 4096,
            request_timeout_secs: 60,
            camera_facing: Facing::Environment,
            camera_source: None,
            jpeg_quality: 90,
            min_words_for_generation: 20,
            words_per_question: 10,
            min_question_ceiling: 10,
            max_question_ceiling: 50,
            fallback_question_count: 10,
            default_question_type: QuestionType::Objective,
            default_difficulty: Difficulty::Medium,
            default_question_count: 10,
            verbose_logging: false,
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// 默认值 + 环境变量覆盖
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载，缺失的字段使用默认值
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 如果设置了 `SNAP_QUIZ_CONFIG` 则先读取文件，再应用环境变量覆盖
    pub fn load() -> Result<Self> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Ok(Self::from_toml_file(path)?.with_env_overrides()),
            Err(_) => Ok(Self::from_env()),
        }
    }

    fn with_env_overrides(self) -> Self {
        Self {
            ocr_api_url: std::env::var("OCR_API_URL").unwrap_or(self.ocr_api_url),
            ocr_api_key: std::env::var("OCR_API_KEY").ok().or(self.ocr_api_key),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(self.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(self.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(self.llm_model_name),
            llm_temperature: env_or("LLM_TEMPERATURE", self.llm_temperature),
            llm_max_tokens: env_or("LLM_MAX_TOKENS", self.llm_max_tokens),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", self.request_timeout_secs),
            camera_facing: env_or("CAMERA_FACING", self.camera_facing),
            camera_source: std::env::var("CAMERA_SOURCE").ok().or(self.camera_source),
            jpeg_quality: env_or("JPEG_QUALITY", self.jpeg_quality),
            min_words_for_generation: env_or("MIN_WORDS_FOR_GENERATION", self.min_words_for_generation),
            words_per_question: env_or("WORDS_PER_QUESTION", self.words_per_question),
            min_question_ceiling: env_or("MIN_QUESTION_CEILING", self.min_question_ceiling),
            max_question_ceiling: env_or("MAX_QUESTION_CEILING", self.max_question_ceiling),
            fallback_question_count: env_or("FALLBACK_QUESTION_COUNT", self.fallback_question_count),
            default_question_type: env_or("DEFAULT_QUESTION_TYPE", self.default_question_type),
            default_difficulty: env_or("DEFAULT_DIFFICULTY", self.default_difficulty),
            default_question_count: env_or("DEFAULT_QUESTION_COUNT", self.default_question_count),
            verbose_logging: env_or("VERBOSE_LOGGING", self.verbose_logging),
            log_filter: std::env::var("LOG_FILTER").unwrap_or(self.log_filter),
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            llm_model_name = "test-model"
            camera_facing = "user"
            default_difficulty = "hard"
            max_question_ceiling = 40
            "#,
        )
        .unwrap();

        assert_eq!(config.llm_model_name, "test-model");
        assert_eq!(config.camera_facing, Facing::User);
        assert_eq!(config.default_difficulty, Difficulty::Hard);
        assert_eq!(config.max_question_ceiling, 40);
        assert_eq!(config.min_words_for_generation, 20);
        assert_eq!(config.default_question_type, QuestionType::Objective);
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        assert!(Config::from_toml_str("max_question_ceiling = \"many\"").is_err());
    }
}
