//! Question payloads shared by every quiz mode.

use serde::{Deserialize, Serialize};

/// A single quiz question as delivered by the remote services.
///
/// The wire format carries no discriminator: quote questions are recognised by
/// their `quote` field, option questions by `question` + `options`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Question {
    /// Multiple-choice question with its own option labels.
    Options(OptionsQuestion),
    /// "Guess who said it" question answered against a fixed roster.
    Quote(QuoteQuestion),
}

/// Prompt text plus the label of the correct answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteQuestion {
    /// Quote to attribute.
    pub quote: String,
    /// Label of the correct answer.
    pub correct_answer: String,
}

/// Prompt text, ordered option labels and the label of the correct answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsQuestion {
    /// Question text.
    pub question: String,
    /// Answer labels in display order.
    pub options: Vec<String>,
    /// Label of the correct answer.
    pub correct_answer: String,
}

impl Question {
    /// Text shown to the player.
    pub fn prompt(&self) -> &str {
        match self {
            Question::Options(q) => &q.question,
            Question::Quote(q) => &q.quote,
        }
    }

    /// Label that scores points when selected.
    pub fn correct_answer(&self) -> &str {
        match self {
            Question::Options(q) => &q.correct_answer,
            Question::Quote(q) => &q.correct_answer,
        }
    }

    /// Whether `label` is the correct answer. Comparison is exact.
    pub fn is_correct(&self, label: &str) -> bool {
        self.correct_answer() == label
    }

    /// Labels the player can pick from. Quote questions borrow `roster`.
    pub fn choices<'a>(&'a self, roster: &'a [&'a str]) -> Vec<&'a str> {
        match self {
            Question::Options(q) => q.options.iter().map(String::as_str).collect(),
            Question::Quote(_) => roster.to_vec(),
        }
    }

    /// Structural sanity check applied to every question received over the wire.
    pub fn check(&self) -> Result<(), String> {
        if self.prompt().trim().is_empty() {
            return Err("question prompt is empty".into());
        }
        if self.correct_answer().trim().is_empty() {
            return Err(format!("question `{}` has no correct answer", self.prompt()));
        }
        if let Question::Options(q) = self {
            if q.options.is_empty() {
                return Err(format!("question `{}` has no options", q.question));
            }
            if !q.options.iter().any(|option| option == &q.correct_answer) {
                return Err(format!(
                    "question `{}` does not list its correct answer among the options",
                    q.question
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_both_question_shapes() {
        let raw = json!([
            {
                "question": "What is Monica skilled at?",
                "options": ["Bricklaying", "Cooking", "American football", "Singing"],
                "correctAnswer": "Cooking"
            },
            { "quote": "Which team has won the most IPL titles?", "correctAnswer": "MI" }
        ]);

        let questions: Vec<Question> = serde_json::from_value(raw).unwrap();
        assert!(matches!(questions[0], Question::Options(_)));
        assert!(matches!(questions[1], Question::Quote(_)));
        assert_eq!(questions[0].correct_answer(), "Cooking");
        assert_eq!(questions[1].prompt(), "Which team has won the most IPL titles?");
    }

    #[test]
    fn quote_choices_come_from_roster() {
        let question = Question::Quote(QuoteQuestion {
            quote: "Lights out and away we go".into(),
            correct_answer: "Ferrari".into(),
        });
        let roster = ["Mercedes", "Ferrari"];
        assert_eq!(question.choices(&roster), vec!["Mercedes", "Ferrari"]);
        assert!(question.is_correct("Ferrari"));
        assert!(!question.is_correct("ferrari"));
    }

    #[test]
    fn check_rejects_missing_correct_option() {
        let question = Question::Options(OptionsQuestion {
            question: "Pick one".into(),
            options: vec!["A".into(), "B".into()],
            correct_answer: "C".into(),
        });
        assert!(question.check().is_err());
    }

    #[test]
    fn check_rejects_empty_prompt() {
        let question = Question::Quote(QuoteQuestion {
            quote: "  ".into(),
            correct_answer: "MI".into(),
        });
        assert!(question.check().is_err());
    }
}
