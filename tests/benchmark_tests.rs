//! Performance benchmarks for the dictionary, solver and letter draw

use rand::rngs::StdRng;
use rand::SeedableRng;
use server::dictionary::Dictionary;
use server::letters::generate_letters;
use server::solver::best_words;
use shared::BEST_WORDS_LIMIT;
use std::time::Instant;

/// Benchmarks building the trie from the built-in word list
#[test]
fn benchmark_dictionary_build() {
    let iterations = 10;
    let start = Instant::now();

    for _ in 0..iterations {
        let dictionary = Dictionary::embedded();
        assert!(!dictionary.is_empty());
    }

    let duration = start.elapsed();
    println!(
        "Dictionary build: {} iterations in {:?} ({:.2} ms/iter)",
        iterations,
        duration,
        duration.as_secs_f64() * 1000.0 / iterations as f64
    );

    // Generous bound so unoptimised test builds pass
    assert!(duration.as_millis() < 10_000);
}

/// Benchmarks word lookups against the trie
#[test]
fn benchmark_word_lookup() {
    let dictionary = Dictionary::embedded();
    let words = ["creation", "react", "zzzz", "cat", "actions"];

    let iterations = 100_000;
    let start = Instant::now();

    for i in 0..iterations {
        let _ = dictionary.is_word(words[i % words.len()]);
    }

    let duration = start.elapsed();
    println!(
        "Word lookup: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 1000);
}

/// Benchmarks solving random draws, as done at the end of every round
#[test]
fn benchmark_best_words() {
    let dictionary = Dictionary::embedded();
    let mut rng = StdRng::seed_from_u64(7);
    let draws: Vec<String> = (0..200).map(|_| generate_letters(&mut rng)).collect();

    let start = Instant::now();

    for letters in &draws {
        let words = best_words(&dictionary, letters, BEST_WORDS_LIMIT);
        assert!(words.len() <= BEST_WORDS_LIMIT);
    }

    let duration = start.elapsed();
    println!(
        "Best words: {} draws in {:?} ({:.2} μs/draw)",
        draws.len(),
        duration,
        duration.as_micros() as f64 / draws.len() as f64
    );

    // Generous bound so unoptimised test builds pass
    assert!(duration.as_secs() < 10);
}

/// Benchmarks drawing letters from the weighted piles
#[test]
fn benchmark_letter_generation() {
    let mut rng = StdRng::seed_from_u64(42);

    let iterations = 10_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let letters = generate_letters(&mut rng);
        assert_eq!(letters.len(), 9);
    }

    let duration = start.elapsed();
    println!(
        "Letter generation: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 2000);
}
