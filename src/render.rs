//! Turns a `QuestionSet` into display blocks, one per question, in order.
//!
//! Rendering is pure: the iterator is lazy, finite and `Clone`, so the same
//! set can be rendered any number of times. It never fails; records with
//! missing pieces simply render fewer lines.

use std::fmt;

use serde::Serialize;

use crate::domain::{QuestionRecord, QuestionSet, QuestionShape};

/// One displayable line inside a block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Line {
    Question { text: String },
    Choice { label: String, text: String },
    CorrectAnswer { text: String },
    Answer { text: String },
    Keywords { text: String },
    Explanation { text: String },
}

/// Which display shape produced a block. Multiple-choice blocks always
/// carry an "Options:" heading, even with no options to list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockShape {
    MultipleChoice,
    Keyworded,
    PlainAnswer,
    PromptOnly,
}

/// A header (1-based position), the question and its body. The separator
/// is the block boundary itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RenderedBlock {
    pub position: usize,
    pub shape: BlockShape,
    pub lines: Vec<Line>,
}

/// Lazy rendering over a borrowed set.
#[derive(Clone)]
pub struct Render<'a> {
    records: std::iter::Enumerate<std::slice::Iter<'a, QuestionRecord>>,
}

impl Iterator for Render<'_> {
    type Item = RenderedBlock;

    fn next(&mut self) -> Option<RenderedBlock> {
        self.records.next().map(|(i, r)| render_record(i + 1, r))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.records.size_hint()
    }
}

impl ExactSizeIterator for Render<'_> {}

/// `None` and empty sets both render to nothing.
pub fn render(set: Option<&QuestionSet>) -> Render<'_> {
    let records: &[QuestionRecord] = set.map(|s| s.questions.as_slice()).unwrap_or(&[]);
    Render { records: records.iter().enumerate() }
}

/// 0 -> "A", 25 -> "Z"; past that the 1-based number is used.
pub fn option_label(index: usize) -> String {
    match u8::try_from(index) {
        Ok(i) if i < 26 => char::from(b'A' + i).to_string(),
        _ => (index + 1).to_string(),
    }
}

fn render_record(position: usize, record: &QuestionRecord) -> RenderedBlock {
    let mut lines = Vec::new();

    let shape = match record.shape() {
        QuestionShape::MultipleChoice { question, options, answer, explanation } => {
            lines.push(Line::Question { text: question.to_string() });
            lines.extend(options.iter().enumerate().map(|(j, o)| Line::Choice {
                label: option_label(j),
                text: o.clone(),
            }));
            if let Some(a) = answer {
                lines.push(Line::CorrectAnswer { text: a.to_string() });
            }
            push_explanation(&mut lines, explanation);
            BlockShape::MultipleChoice
        }
        QuestionShape::Keyworded { question, answer, keywords } => {
            lines.push(Line::Question { text: question.to_string() });
            if let Some(a) = answer {
                lines.push(Line::Answer { text: a.to_string() });
            }
            if !keywords.is_empty() {
                lines.push(Line::Keywords { text: keywords.join(", ") });
            }
            BlockShape::Keyworded
        }
        QuestionShape::PlainAnswer { question, answer, explanation } => {
            lines.push(Line::Question { text: question.to_string() });
            lines.push(Line::Answer { text: answer.to_string() });
            push_explanation(&mut lines, explanation);
            BlockShape::PlainAnswer
        }
        QuestionShape::PromptOnly { question, explanation } => {
            lines.push(Line::Question { text: question.to_string() });
            push_explanation(&mut lines, explanation);
            BlockShape::PromptOnly
        }
    };

    RenderedBlock { position, shape, lines }
}

fn push_explanation(lines: &mut Vec<Line>, explanation: Option<&str>) {
    if let Some(e) = explanation {
        lines.push(Line::Explanation { text: e.to_string() });
    }
}

impl fmt::Display for RenderedBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Question {}:", self.position)?;
        for line in &self.lines {
            match line {
                Line::Question { text } => {
                    writeln!(f, "**Question:** {text}")?;
                    if self.shape == BlockShape::MultipleChoice {
                        writeln!(f, "Options:")?;
                    }
                }
                Line::Choice { label, text } => writeln!(f, "   {label}. {text}")?,
                Line::CorrectAnswer { text } => writeln!(f, "**Correct Answer:** {text}")?,
                Line::Answer { text } => writeln!(f, "**Answer:** {text}")?,
                Line::Keywords { text } => writeln!(f, "**Keywords:** {text}")?,
                Line::Explanation { text } => writeln!(f, "**Explanation:** {text}")?,
            }
        }
        writeln!(f, "---")
    }
}

/// Concatenated text rendition of every block.
pub fn render_text<I: IntoIterator<Item = RenderedBlock>>(blocks: I) -> String {
    blocks.into_iter().map(|b| b.to_string()).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(json: &str) -> QuestionRecord {
        serde_json::from_str(json).expect("record")
    }

    fn one(r: QuestionRecord) -> RenderedBlock {
        let set = QuestionSet { questions: vec![r] };
        let mut blocks: Vec<_> = render(Some(&set)).collect();
        assert_eq!(blocks.len(), 1);
        blocks.remove(0)
    }

    #[test]
    fn multiple_choice_with_blank_explanation() {
        let b = one(rec(r#"{"question":"Capital of France?","options":["Paris","London","Rome"],"answer":"Paris","explanation":""}"#));
        assert_eq!(
            b.lines,
            vec![
                Line::Question { text: "Capital of France?".into() },
                Line::Choice { label: "A".into(), text: "Paris".into() },
                Line::Choice { label: "B".into(), text: "London".into() },
                Line::Choice { label: "C".into(), text: "Rome".into() },
                Line::CorrectAnswer { text: "Paris".into() },
            ]
        );
    }

    #[test]
    fn keywords_follow_the_answer() {
        let b = one(rec(r#"{"question":"q","answer":"a","keywords":["x","y"]}"#));
        assert_eq!(
            &b.lines[1..],
            &[Line::Answer { text: "a".into() }, Line::Keywords { text: "x, y".into() }]
        );
    }

    #[test]
    fn empty_keywords_render_no_keyword_line() {
        let b = one(rec(r#"{"question":"q","answer":"a","keywords":[]}"#));
        assert_eq!(b.lines.len(), 2);
    }

    #[test]
    fn prompt_only_is_just_the_question() {
        let b = one(rec(r#"{"question":"Discuss."}"#));
        assert_eq!(b.lines, vec![Line::Question { text: "Discuss.".into() }]);

        let b = one(rec(r#"{"question":"Discuss.","explanation":"Open ended"}"#));
        assert_eq!(b.lines[1], Line::Explanation { text: "Open ended".into() });
    }

    #[test]
    fn plain_answer_with_explanation() {
        let b = one(rec(r#"{"question":"q","answer":"True","explanation":"because"}"#));
        assert_eq!(
            &b.lines[1..],
            &[Line::Answer { text: "True".into() }, Line::Explanation { text: "because".into() }]
        );
    }

    #[test]
    fn options_beat_keywords() {
        let b = one(rec(r#"{"question":"q","options":["o"],"keywords":["k"],"answer":"o"}"#));
        assert!(b.lines.iter().any(|l| matches!(l, Line::Choice { .. })));
        assert!(!b.lines.iter().any(|l| matches!(l, Line::Keywords { .. })));
    }

    #[test]
    fn malformed_records_degrade() {
        let b = one(rec(r#"{"question":"q","options":[]}"#));
        assert_eq!(b.shape, BlockShape::MultipleChoice);
        assert_eq!(b.lines, vec![Line::Question { text: "q".into() }]);
        let b = one(rec(r#"{}"#));
        assert_eq!(b.lines, vec![Line::Question { text: String::new() }]);
    }

    #[test]
    fn none_and_empty_render_nothing() {
        assert_eq!(render(None).count(), 0);
        assert_eq!(render(Some(&QuestionSet::default())).count(), 0);
    }

    #[test]
    fn order_is_preserved_across_mixed_shapes() {
        let set = QuestionSet {
            questions: vec![
                rec(r#"{"question":"1","options":["a"],"answer":"a"}"#),
                rec(r#"{"question":"2","keywords":["k"],"answer":"b"}"#),
                rec(r#"{"question":"3","answer":"c"}"#),
                rec(r#"{"question":"4"}"#),
                rec(r#"{"question":"5","options":["x","y"]}"#),
            ],
        };
        let blocks: Vec<_> = render(Some(&set)).collect();
        let positions: Vec<_> = blocks.iter().map(|b| b.position).collect();
        assert_eq!(positions, vec![1, 2, 3, 4, 5]);
        for (i, b) in blocks.iter().enumerate() {
            assert_eq!(b.lines[0], Line::Question { text: (i + 1).to_string() });
        }
    }

    #[test]
    fn rendering_is_restartable() {
        let set = QuestionSet { questions: vec![rec(r#"{"question":"q","answer":"a"}"#)] };
        let it = render(Some(&set));
        let first: Vec<_> = it.clone().collect();
        let second: Vec<_> = it.collect();
        assert_eq!(first, second);
        assert_eq!(first, render(Some(&set)).collect::<Vec<_>>());
    }

    #[test]
    fn labels_past_z_fall_back_to_numbers() {
        assert_eq!(option_label(0), "A");
        assert_eq!(option_label(25), "Z");
        assert_eq!(option_label(26), "27");
    }

    #[test]
    fn text_rendition_matches_page_labels() {
        let b = one(rec(r#"{"question":"Capital?","options":["Paris","Rome"],"answer":"Paris","explanation":"It is."}"#));
        assert_eq!(
            b.to_string(),
            "Question 1:\n**Question:** Capital?\nOptions:\n   A. Paris\n   B. Rome\n**Correct Answer:** Paris\n**Explanation:** It is.\n---\n"
        );
    }

    #[test]
    fn multiple_choice_without_options_keeps_the_heading() {
        let b = one(rec(r#"{"question":"Pick one","options":[],"answer":"x"}"#));
        assert_eq!(
            b.to_string(),
            "Question 1:\n**Question:** Pick one\nOptions:\n**Correct Answer:** x\n---\n"
        );
    }

    #[test]
    fn shapes_other_than_multiple_choice_have_no_options_heading() {
        for (json, shape) in [
            (r#"{"question":"q","answer":"a","keywords":["k"]}"#, BlockShape::Keyworded),
            (r#"{"question":"q","answer":"a"}"#, BlockShape::PlainAnswer),
            (r#"{"question":"q"}"#, BlockShape::PromptOnly),
        ] {
            let b = one(rec(json));
            assert_eq!(b.shape, shape);
            assert!(!b.to_string().contains("Options:"), "{json}");
        }
    }
}
