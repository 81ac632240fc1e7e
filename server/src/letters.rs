//! Letter bag for drawing a round's nine letters
//!
//! Draws come from two frequency-weighted piles, one of vowels and one of
//! consonants. Each pile is shuffled per draw and dealt without replacement,
//! so common letters (E, A, R, S, T) turn up more often and no letter can
//! appear more times than the pile holds.

use rand::seq::SliceRandom;
use rand::Rng;
use shared::LETTER_COUNT;

pub const VOWELS: &str = "AAAAAAAAAAAAAAAEEEEEEEEEEEEEEEEEEEEEIIIIIIIIIIIIIOOOOOOOOOOOOOUUUUU";
pub const CONSONANTS: &str =
    "BBCCCDDDDDDFFGGGHHJKLLLLLMMMMNNNNNNNNPPPPQRRRRRRRRRSSSSSSSSSTTTTTTTTTVWXYZ";

pub const MAX_CONSONANTS: usize = 6;
pub const MAX_VOWELS: usize = 5;

/// A single pile of letters dealt from the top after shuffling
struct Pile {
    letters: Vec<char>,
}

impl Pile {
    fn shuffled<R: Rng + ?Sized>(source: &str, rng: &mut R) -> Self {
        let mut letters: Vec<char> = source.chars().collect();
        letters.shuffle(rng);
        Self { letters }
    }

    fn deal(&mut self) -> Option<char> {
        self.letters.pop()
    }
}

/// Draws nine uppercase letters with at most six consonants and five vowels
///
/// Once either cap is reached the remaining letters are forced from the
/// other pile; until then each letter is a coin flip between the two.
pub fn generate_letters<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut vowels = Pile::shuffled(VOWELS, rng);
    let mut consonants = Pile::shuffled(CONSONANTS, rng);

    let mut letters = String::with_capacity(LETTER_COUNT);
    let mut vowel_count = 0;
    let mut consonant_count = 0;

    while vowel_count + consonant_count < LETTER_COUNT {
        let take_vowel = if consonant_count >= MAX_CONSONANTS {
            true
        } else if vowel_count >= MAX_VOWELS {
            false
        } else {
            rng.gen_bool(0.5)
        };

        // Piles hold far more than nine letters, so dealing never runs dry
        if take_vowel {
            if let Some(letter) = vowels.deal() {
                letters.push(letter);
                vowel_count += 1;
            }
        } else if let Some(letter) = consonants.deal() {
            letters.push(letter);
            consonant_count += 1;
        }
    }

    letters
}

pub fn is_vowel(letter: char) -> bool {
    matches!(letter.to_ascii_uppercase(), 'A' | 'E' | 'I' | 'O' | 'U')
}
