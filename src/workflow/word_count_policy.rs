//! 题目数量策略
//!
//! 根据识别文本的词数决定最多能出多少道题，以及界面上可选的数量。
//! 纯函数，没有副作用。

use serde::Serialize;

use crate::config::Config;
use crate::error::ValidationError;

/// 可选的预设题目数量（升序）
pub const PRESET_COUNTS: [u32; 5] = [10, 20, 30, 40, 50];

/// 按空白分隔统计词数
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// 某段文本对应的题目数量约束
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionConstraints {
    pub word_count: usize,
    /// 题目数量上限
    pub max_questions: u32,
    /// 可选数量，非空且升序
    pub selectable_counts: Vec<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordCountPolicy {
    /// 生成题目所需的最少词数
    pub min_words: usize,
    pub words_per_question: usize,
    pub min_ceiling: u32,
    pub max_ceiling: u32,
    /// 没有任何预设值不超过上限时的兜底数量
    pub fallback_count: u32,
}

impl Default for WordCountPolicy {
    fn default() -> Self {
        Self {
            min_words: 20,
            words_per_question: 10,
            min_ceiling: 10,
            max_ceiling: 50,
            fallback_count: 10,
        }
    }
}

impl WordCountPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            min_words: config.min_words_for_generation,
            words_per_question: config.words_per_question,
            min_ceiling: config.min_question_ceiling,
            max_ceiling: config.max_question_ceiling,
            fallback_count: config.fallback_question_count,
        }
    }

    /// 题目数量上限
    ///
    /// 每 `words_per_question` 个词允许一道题，结果限制在
    /// `[min_ceiling, max_ceiling]` 之间，随词数单调不减。
    pub fn max_questions(&self, word_count: usize) -> u32 {
        let by_length = word_count / self.words_per_question.max(1);
        let by_length = u32::try_from(by_length).unwrap_or(u32::MAX);
        let upper = self.max_ceiling.max(self.min_ceiling);
        by_length.clamp(self.min_ceiling, upper)
    }

    /// 不超过上限的预设数量；一个都没有时返回兜底数量
    pub fn selectable_counts(&self, max_questions: u32) -> Vec<u32> {
        let counts: Vec<u32> = PRESET_COUNTS
            .iter()
            .copied()
            .filter(|&n| n <= max_questions)
            .collect();

        if counts.is_empty() {
            vec![self.fallback_count]
        } else {
            counts
        }
    }

    /// 把选择约束到可选值上
    ///
    /// 取不超过 `selected` 的最大可选值；比所有可选值都小时取最小的可选值。
    /// 已经是可选值的选择保持不变。
    pub fn clamp_selection(&self, selected: u32, max_questions: u32) -> u32 {
        let counts = self.selectable_counts(max_questions);
        counts
            .iter()
            .rev()
            .copied()
            .find(|&n| n <= selected)
            .or_else(|| counts.first().copied())
            .unwrap_or(self.fallback_count)
    }

    pub fn constraints(&self, word_count: usize) -> QuestionConstraints {
        let max_questions = self.max_questions(word_count);
        QuestionConstraints {
            word_count,
            max_questions,
            selectable_counts: self.selectable_counts(max_questions),
        }
    }

    /// 生成前的本地校验
    pub fn check_generation_allowed(&self, word_count: usize) -> Result<(), ValidationError> {
        if word_count < self.min_words {
            return Err(ValidationError::TextTooShort {
                word_count,
                min_words: self.min_words,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[test]
    fn test_word_count_whitespace_tokens() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   \n\t "), 0);
        assert_eq!(word_count("one two\tthree\nfour  five"), 5);

        let text = words(25);
        assert_eq!(word_count(&text), 25);
        assert_eq!(word_count(&text), word_count(&text));
    }

    #[test]
    fn test_max_questions_monotonic() {
        let policy = WordCountPolicy::default();
        let mut previous = policy.max_questions(0);
        for wc in 0..2000 {
            let current = policy.max_questions(wc);
            assert!(current >= previous, "上限在 {} 词处下降", wc);
            assert!(current <= 50);
            previous = current;
        }
    }

    #[test]
    fn test_max_questions_tiers() {
        let policy = WordCountPolicy::default();
        assert_eq!(policy.max_questions(0), 10);
        assert_eq!(policy.max_questions(25), 10);
        assert_eq!(policy.max_questions(350), 35);
        assert_eq!(policy.max_questions(10_000), 50);
    }

    #[test]
    fn test_selectable_counts_bounded_by_ceiling() {
        let policy = WordCountPolicy::default();
        assert_eq!(policy.selectable_counts(35), vec![10, 20, 30]);
        assert_eq!(policy.selectable_counts(50), vec![10, 20, 30, 40, 50]);
        assert_eq!(policy.selectable_counts(10), vec![10]);

        for ceiling in 0..=60 {
            let counts = policy.selectable_counts(ceiling);
            assert!(!counts.is_empty());
            assert!(counts.windows(2).all(|w| w[0] < w[1]));
            assert!(counts.iter().all(|c| PRESET_COUNTS.contains(c)));
        }
    }

    #[test]
    fn test_selectable_counts_fallback_below_smallest_preset() {
        let policy = WordCountPolicy::default();
        assert_eq!(policy.selectable_counts(5), vec![10]);
        assert_eq!(policy.selectable_counts(0), vec![10]);
        assert_eq!(policy.clamp_selection(40, 5), 10);
    }

    #[test]
    fn test_clamp_selection_to_largest_remaining() {
        let policy = WordCountPolicy::default();
        assert_eq!(policy.clamp_selection(40, 35), 30);
        assert_eq!(policy.clamp_selection(20, 35), 20);

        // 文本未变化时重新计算不改变选择
        let constraints = policy.constraints(350);
        let selected = policy.clamp_selection(30, constraints.max_questions);
        assert_eq!(policy.clamp_selection(selected, constraints.max_questions), selected);
    }

    #[test]
    fn test_clamp_selection_snaps_to_presets() {
        let policy = WordCountPolicy::default();
        assert_eq!(policy.clamp_selection(13, 35), 10);
        assert_eq!(policy.clamp_selection(29, 50), 20);
        assert_eq!(policy.clamp_selection(5, 50), 10);
        assert_eq!(policy.clamp_selection(50, 50), 50);
    }

    #[test]
    fn test_generation_threshold() {
        let policy = WordCountPolicy::default();
        assert!(policy.check_generation_allowed(25).is_ok());
        assert!(policy.check_generation_allowed(20).is_ok());
        assert_eq!(
            policy.check_generation_allowed(15),
            Err(ValidationError::TextTooShort {
                word_count: 15,
                min_words: 20
            })
        );
    }

    #[test]
    fn test_inverted_ceiling_config_does_not_panic() {
        let policy = WordCountPolicy {
            min_ceiling: 30,
            max_ceiling: 20,
            ..WordCountPolicy::default()
        };
        assert_eq!(policy.max_questions(0), 30);
    }
}
