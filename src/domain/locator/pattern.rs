use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::{DEFAULT_CONTEXT_BLOCKS, PositionLocator, context_window};
use crate::domain::document::{BlockKind, DocumentModel};
use crate::domain::insertion_point::InsertionPoint;

static NUMBERED_REQUIREMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[(（]\s*\d+\s*[)）]").expect("valid numbered requirement regex")
});
static NUMBERED_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[(（]?\d+[)）.、．]|[一二三四五六七八九十]+[、.．])")
        .expect("valid numbered clause regex")
});
static BLANK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_{3,}").expect("valid blank regex"));

const CLAUSE_MAX_CHARS: usize = 60;
const CLAUSE_KEYWORDS: &[&str] =
    &["实现", "编写", "分析", "设计", "implement", "write", "describe"];

/// A local rule deciding whether one paragraph asks for content.
pub trait PatternRule {
    fn name(&self) -> &'static str;

    /// Requirement description when `text` matches.
    fn describe(&self, text: &str) -> Option<String>;
}

/// Paragraph ending in a question mark.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuestionRule;

impl PatternRule for QuestionRule {
    fn name(&self) -> &'static str {
        "question"
    }

    fn describe(&self, text: &str) -> Option<String> {
        (text.ends_with('?') || text.ends_with('？')).then(|| text.to_string())
    }
}

/// Enumerated requirement such as `(1) ...` or `（2）...`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberedRequirementRule;

impl PatternRule for NumberedRequirementRule {
    fn name(&self) -> &'static str {
        "numbered-requirement"
    }

    fn describe(&self, text: &str) -> Option<String> {
        NUMBERED_REQUIREMENT.is_match(text).then(|| text.to_string())
    }
}

/// Short numbered clause that contains a requirement keyword.
#[derive(Debug, Clone)]
pub struct KeywordClauseRule {
    max_chars: usize,
    keywords: Vec<String>,
}

impl Default for KeywordClauseRule {
    fn default() -> Self {
        Self {
            max_chars: CLAUSE_MAX_CHARS,
            keywords: CLAUSE_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl KeywordClauseRule {
    pub fn new(max_chars: usize, keywords: Vec<String>) -> Self {
        Self { max_chars, keywords }
    }
}

impl PatternRule for KeywordClauseRule {
    fn name(&self) -> &'static str {
        "keyword-clause"
    }

    fn describe(&self, text: &str) -> Option<String> {
        if text.chars().count() > self.max_chars || !NUMBERED_CLAUSE.is_match(text) {
            return None;
        }
        let lowered = text.to_lowercase();
        self.keywords
            .iter()
            .any(|keyword| lowered.contains(&keyword.to_lowercase()))
            .then(|| text.to_string())
    }
}

/// Paragraph with an underscore blank (`___`) left for an answer.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlankRule;

impl PatternRule for BlankRule {
    fn name(&self) -> &'static str {
        "blank"
    }

    fn describe(&self, text: &str) -> Option<String> {
        BLANK.is_match(text).then(|| format!("填写空白处：{text}"))
    }
}

/// Deterministic locator applying ordered rules to every non-empty paragraph.
/// The first matching rule wins.
pub struct PatternLocator {
    rules: Vec<Box<dyn PatternRule>>,
    context_size: usize,
}

impl Default for PatternLocator {
    fn default() -> Self {
        Self::new(vec![
            Box::new(QuestionRule),
            Box::new(NumberedRequirementRule),
            Box::new(KeywordClauseRule::default()),
            Box::new(BlankRule),
        ])
    }
}

impl PatternLocator {
    pub fn new(rules: Vec<Box<dyn PatternRule>>) -> Self {
        Self { rules, context_size: DEFAULT_CONTEXT_BLOCKS }
    }

    pub fn with_context_size(mut self, size: usize) -> Self {
        self.context_size = size;
        self
    }
}

impl PositionLocator for PatternLocator {
    fn locate(&self, model: &DocumentModel) -> Vec<InsertionPoint> {
        let mut points = Vec::new();
        for block in model.blocks().filter(|block| block.kind == BlockKind::Paragraph) {
            let matched = self
                .rules
                .iter()
                .find_map(|rule| rule.describe(block.text).map(|description| (rule.name(), description)));

            if let Some((rule, description)) = matched {
                debug!(index = block.index, rule, "pattern match");
                let (before, after) = context_window(model, block.index, self.context_size);
                points.push(InsertionPoint::new(block.index, description).with_context(before, after));
            }
        }
        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::docx_fixture;

    fn model(paragraphs: &[&str]) -> DocumentModel {
        DocumentModel::from_bytes(docx_fixture::docx_bytes(paragraphs)).unwrap()
    }

    #[test]
    fn question_rule_accepts_both_question_marks() {
        assert!(QuestionRule.describe("What is BFS?").is_some());
        assert!(QuestionRule.describe("什么是广度优先搜索？").is_some());
        assert!(QuestionRule.describe("BFS is a search.").is_none());
    }

    #[test]
    fn numbered_requirement_rule_matches_parenthesised_numbers() {
        assert!(NumberedRequirementRule.describe("(1) 实现八数码问题").is_some());
        assert!(NumberedRequirementRule.describe("（2）给出实验结果").is_some());
        assert!(NumberedRequirementRule.describe("1 apple").is_none());
    }

    #[test]
    fn keyword_clause_rule_needs_number_keyword_and_short_text() {
        let rule = KeywordClauseRule::default();
        assert!(rule.describe("1. 编写排序算法").is_some());
        assert!(rule.describe("二、设计实验方案").is_some());
        assert!(rule.describe("3. Write a parser").is_some());
        assert!(rule.describe("1. 实验目的").is_none());
        assert!(rule.describe("编写排序算法").is_none());
        let long = format!("1. 编写{}", "很".repeat(CLAUSE_MAX_CHARS));
        assert!(rule.describe(&long).is_none());
    }

    #[test]
    fn blank_rule_needs_three_underscores() {
        assert_eq!(BlankRule.describe("姓名：____").as_deref(), Some("填写空白处：姓名：____"));
        assert!(BlankRule.describe("snake_case").is_none());
    }

    #[test]
    fn locator_yields_points_in_order_with_original_indices() {
        let model = model(&["Title", "", "What is BFS?", "Intro", "(1) 实现DFS", "Name: ___"]);
        let points = PatternLocator::default().locate(&model);

        let anchors: Vec<usize> = points.iter().map(|p| p.anchor_index).collect();
        assert_eq!(anchors, vec![2, 4, 5]);
        assert_eq!(points[0].description, "What is BFS?");
        assert_eq!(points[0].context_before, "Title");
        assert_eq!(points[0].context_after, "Intro\n(1) 实现DFS\nName: ___");
        assert!(points.iter().all(|p| !p.filled));
    }

    #[test]
    fn first_matching_rule_wins() {
        let model = model(&["(1) 为什么选择BFS？"]);
        let points = PatternLocator::default().locate(&model);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].description, "(1) 为什么选择BFS？");
    }

    #[test]
    fn custom_rule_set_is_respected() {
        let model = model(&["Why?", "(1) task"]);
        let locator = PatternLocator::new(vec![Box::new(NumberedRequirementRule)]);
        let anchors: Vec<usize> = locator.locate(&model).iter().map(|p| p.anchor_index).collect();
        assert_eq!(anchors, vec![1]);
    }
}
