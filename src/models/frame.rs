//! 拍摄画面与识别文本

use std::fmt::Display;
use std::sync::Arc;

use chrono::{DateTime, Local};
use uuid::Uuid;

use crate::workflow::word_count_policy::word_count;

/// 拍摄得到的静态画面
///
/// 持有 JPEG 数据和一个本地可解析的显示引用。
/// 下一次拍摄会替换它，旧的显示引用随之失效。
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    id: Uuid,
    jpeg: Arc<[u8]>,
    width: u32,
    height: u32,
    captured_at: DateTime<Local>,
}

impl CapturedFrame {
    /// 创建新的画面
    pub fn new(jpeg: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            jpeg: Arc::from(jpeg),
            width,
            height,
            captured_at: Local::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// JPEG 编码后的图片数据
    pub fn jpeg(&self) -> &[u8] {
        &self.jpeg
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn captured_at(&self) -> DateTime<Local> {
        self.captured_at
    }

    /// 本地显示引用，只在该画面仍是当前画面时有效
    pub fn display_ref(&self) -> String {
        format!("frame://{}", self.id)
    }
}

impl Display for CapturedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[画面 {} {}x{} {} 字节]",
            self.id,
            self.width,
            self.height,
            self.jpeg.len()
        )
    }
}

/// 从某一帧画面中识别出的文本
///
/// 生成后不可变，并记录来源画面的 ID，保证文本总是对应当前画面。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    text: String,
    word_count: usize,
    frame_id: Uuid,
}

impl ExtractedText {
    pub fn new(text: impl Into<String>, frame_id: Uuid) -> Self {
        let text = text.into();
        let word_count = word_count(&text);
        Self {
            text,
            word_count,
            frame_id,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    /// 来源画面 ID
    pub fn frame_id(&self) -> Uuid {
        self.frame_id
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_ref_changes_per_capture() {
        let first = CapturedFrame::new(vec![0xFF, 0xD8], 4, 4);
        let second = CapturedFrame::new(vec![0xFF, 0xD8], 4, 4);

        assert!(first.display_ref().starts_with("frame://"));
        assert_ne!(first.display_ref(), second.display_ref());
    }

    #[test]
    fn test_extracted_text_counts_words() {
        let frame = CapturedFrame::new(vec![1, 2, 3], 1, 1);
        let text = ExtractedText::new("  photosynthesis converts\nlight   energy ", frame.id());

        assert_eq!(text.word_count(), 4);
        assert_eq!(text.frame_id(), frame.id());
        assert!(!text.is_blank());
        assert!(ExtractedText::new(" \n\t", frame.id()).is_blank());
    }
}
