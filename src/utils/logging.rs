/// 日志工具模块
///
/// 提供日志初始化和格式化输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::HandoffPayload;

/// 初始化日志
///
/// `RUST_LOG` 优先于配置中的过滤规则；`verbose_logging` 打开时使用 debug 级别。
/// 重复调用不会报错（测试中会多次调用）。
pub fn init(config: &Config) {
    let fallback = if config.verbose_logging {
        "debug"
    } else {
        config.log_filter.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 拍照出题");
    info!(
        "启动时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("🔍 OCR 服务: {}", config.ocr_api_url);
    info!("🤖 LLM 模型: {}", config.llm_model_name);
    info!(
        "📏 出题条件: 至少 {} 词，每 {} 词一道题，最多 {} 道",
        config.min_words_for_generation, config.words_per_question, config.max_question_ceiling
    );
    info!("{}", "=".repeat(60));
}

/// 记录交接信息
pub fn log_handoff(payload: &HandoffPayload, warning: Option<&str>) {
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ 已交接到复核页面: {}/{} 道 {} 题 (难度: {})",
        payload.generated_count,
        payload.count,
        payload.question_type.as_str(),
        payload.difficulty.as_str()
    );
    info!("原文: {}", truncate_text(&payload.original_text, 60));
    if let Some(message) = warning {
        info!("⚠️ {}", message);
    }
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("短文本", 10), "短文本");
        assert_eq!(truncate_text("abcdefgh", 3), "abc...");
        assert_eq!(truncate_text("光合作用是植物", 4), "光合作用...");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        let config = Config::default();
        init(&config);
        init(&config);
    }
}
