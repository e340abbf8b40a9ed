//! Word bank builders shared by the unit tests.

use std::collections::HashSet;

use crate::random::SeededRandom;
use crate::slot::extract_slots;
use crate::template::GridTemplate;
use crate::word_index::{RawWord, Tier};

/// Letters that never count as rare, so planted words stay at the easy end of the scale.
const COMMON_LETTERS: [char; 20] = [
    'A', 'B', 'C', 'D', 'E', 'G', 'H', 'I', 'İ', 'K', 'L', 'M', 'N', 'O', 'P', 'R', 'S', 'T', 'U',
    'Y',
];

pub fn raw_word(id: &str, answer: &str, tier: Tier) -> RawWord {
    RawWord {
        id: id.to_string(),
        answer: answer.to_string(),
        difficulty: tier,
        level: None,
        category: String::new(),
        clue: format!("Clue for {answer}"),
        tags: vec![],
    }
}

pub fn cells_from_rows(rows: &[&str]) -> Vec<Vec<bool>> {
    rows.iter().map(|row| row.chars().map(|c| c == '.').collect()).collect()
}

/// A bank guaranteed to contain complete fills: for each template, `variants` grids of random
/// letters are laid down and every slot's word is added to the bank. Variants that would repeat
/// an answer within the grid are dropped, and answers already in the bank aren't added twice.
pub fn planted_bank(templates: &[&GridTemplate], variants: usize, seed: u64) -> Vec<RawWord> {
    let mut rng = SeededRandom::new(seed);
    let mut bank = vec![];
    let mut answers: HashSet<String> = HashSet::new();

    for template in templates {
        let slots = extract_slots(template);

        for _ in 0..variants {
            let letters: Vec<Vec<char>> = (0..template.size())
                .map(|_| {
                    (0..template.size())
                        .map(|_| COMMON_LETTERS[rng.next_int(COMMON_LETTERS.len())])
                        .collect()
                })
                .collect();

            let words: Vec<String> = slots
                .iter()
                .map(|slot| slot.cells.iter().map(|&(row, col)| letters[row][col]).collect())
                .collect();

            let distinct: HashSet<&String> = words.iter().collect();
            if distinct.len() != words.len() {
                continue;
            }

            for word in words {
                if answers.insert(word.clone()) {
                    bank.push(raw_word(&format!("w{}", bank.len()), &word, Tier::Easy));
                }
            }
        }
    }

    bank
}
