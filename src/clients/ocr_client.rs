/// OCR HTTP 客户端
///
/// 把 JPEG 数据 POST 到配置的识别服务，解析返回的文本
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::services::TextExtractor;

#[derive(Debug, Deserialize)]
struct OcrResponse {
    #[serde(alias = "extractedText", alias = "ParsedText")]
    text: String,
}

/// OCR 客户端
pub struct HttpOcrClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpOcrClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("无法创建 HTTP 客户端")?;

        Ok(Self {
            http,
            endpoint: config.ocr_api_url.clone(),
            api_key: config.ocr_api_key.clone(),
        })
    }
}

#[async_trait]
impl TextExtractor for HttpOcrClient {
    async fn extract_text(&self, jpeg: &[u8]) -> Result<String> {
        debug!("正在调用 OCR 服务: {} ({} 字节)", self.endpoint, jpeg.len());

        let mut request = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "image/jpeg")
            .body(jpeg.to_vec());
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("OCR 请求失败: {}", self.endpoint))?
            .error_for_status()
            .context("OCR 服务返回错误状态")?;

        let body: OcrResponse = response.json().await.context("无法解析 OCR 响应")?;
        Ok(body.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_aliases() {
        let a: OcrResponse = serde_json::from_str(r#"{"text": "hello"}"#).unwrap();
        let b: OcrResponse = serde_json::from_str(r#"{"extractedText": "hello"}"#).unwrap();
        assert_eq!(a.text, b.text);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_an_error() {
        let config = Config {
            ocr_api_url: "http://127.0.0.1:9/ocr".to_string(),
            request_timeout_secs: 2,
            ..Config::default()
        };
        let client = HttpOcrClient::new(&config).unwrap();
        assert!(client.extract_text(&[0xFF, 0xD8]).await.is_err());
    }
}
