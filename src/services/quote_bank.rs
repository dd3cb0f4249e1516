//! "Guess the team" mode: bundled quotes answered against a fixed roster.

use rand::{rng, seq::SliceRandom};

use crate::dto::question::{Question, QuoteQuestion};

/// Answer labels offered for every quote question.
pub const TEAM_ROSTER: [&str; 6] = [
    "Mercedes", "Alpine", "Ferrari", "Williams", "Redbull", "McLaren",
];

/// Quotes drawn per run.
pub const QUOTE_RUN_LENGTH: usize = 6;

const QUOTES: &[(&str, &str)] = &[
    ("Which team races in papaya orange?", "McLaren"),
    ("Which team's car is famously nicknamed the Silver Arrow?", "Mercedes"),
    ("Which team is based in Maranello?", "Ferrari"),
    ("Which team grew out of the Benetton and Renault works outfits?", "Alpine"),
    ("Which team was founded by Sir Frank?", "Williams"),
    ("Which team is owned by an energy drink company?", "Redbull"),
    ("Which team's fans are known as the Tifosi?", "Ferrari"),
    ("Which team won eight consecutive constructors' titles from 2014?", "Mercedes"),
    ("Which team is headquartered in Woking?", "McLaren"),
    ("Which team runs out of Milton Keynes?", "Redbull"),
    ("Which team is based in Grove, Oxfordshire?", "Williams"),
    ("Which team races under the French flag from Enstone?", "Alpine"),
];

/// Every bundled quote, in bank order.
pub fn quote_bank() -> Vec<Question> {
    QUOTES
        .iter()
        .map(|(quote, answer)| {
            Question::Quote(QuoteQuestion {
                quote: (*quote).to_string(),
                correct_answer: (*answer).to_string(),
            })
        })
        .collect()
}

/// A shuffled selection of [`QUOTE_RUN_LENGTH`] quotes for one run.
pub fn draw_quotes() -> Vec<Question> {
    let mut bank = quote_bank();
    bank.shuffle(&mut rng());
    bank.truncate(QUOTE_RUN_LENGTH);
    bank
}
