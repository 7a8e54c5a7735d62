use crate::diagnostic::domain::{AnswerRecord, CategoryId, QuestionId};
use indexmap::IndexMap;
use serde::Serialize;

/// Raw sums for one submission. Category order is first appearance in the answers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreTotals {
    pub total: u32,
    pub per_category: IndexMap<CategoryId, u32>,
}

/// A running total left the `u32` range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AggregateError {
    #[error("score total overflowed while adding the answer to question {question_id}")]
    Overflow { question_id: QuestionId },
}

pub struct ScoreAggregator;

impl ScoreAggregator {
    pub fn aggregate(answers: &[AnswerRecord]) -> Result<ScoreTotals, AggregateError> {
        answers
            .iter()
            .try_fold(ScoreTotals::default(), |mut totals, answer| {
                let overflow = || AggregateError::Overflow {
                    question_id: answer.question_id,
                };
                totals.total = totals
                    .total
                    .checked_add(answer.score)
                    .ok_or_else(overflow)?;
                let category = totals.per_category.entry(answer.category_id).or_insert(0);
                *category = category.checked_add(answer.score).ok_or_else(overflow)?;
                Ok(totals)
            })
    }
}
