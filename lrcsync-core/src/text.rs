//! Word-level text helpers shared by the segmenter, the LRC codec and the
//! lyric file matcher.

/// Characters that mark a natural break when they end a word.
const BREAK_PUNCTUATION: &[char] = &[',', ';', ':', '.', '!', '?', '\u{2014}', '\u{2013}', '-'];

/// Words before which a phrase may be split.
const CONJUNCTIONS: &[&str] = &[
    "and", "but", "or", "so", "then", "when", "while", "if", "yet", "nor", "because",
];

/// Split lyric text into whitespace-separated words.
#[must_use]
pub fn split_words(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Whether the word ends with a phrase-breaking punctuation mark
/// (ignoring closing quotes and brackets).
#[must_use]
pub fn ends_with_break(word: &str) -> bool {
    word.trim_end_matches(['"', '\'', ')', ']', '\u{201d}', '\u{2019}'])
        .ends_with(BREAK_PUNCTUATION)
}

/// Whether the word ends with a comma.
#[must_use]
pub fn ends_with_comma(word: &str) -> bool {
    word.trim_end_matches(['"', '\'', ')']).ends_with(',')
}

/// Whether the word is a conjunction a phrase can be split in front of.
#[must_use]
pub fn is_conjunction(word: &str) -> bool {
    let bare = word
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    CONJUNCTIONS.contains(&bare.as_str())
}

/// Estimate the number of syllables in a word by counting vowel groups.
///
/// A trailing silent `e` is ignored, a consonant followed by `le` counts as its
/// own syllable, and every word has at least one.
#[must_use]
pub fn count_syllables(word: &str) -> usize {
    let lower = word
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    if lower.is_empty() {
        return 1;
    }

    let chars: Vec<char> = lower.chars().collect();
    let is_vowel = |c: char| "aeiouy".contains(c);

    let mut stem = chars.as_slice();
    let consonant_le = chars.len() > 2
        && chars.ends_with(&['l', 'e'])
        && !is_vowel(chars[chars.len() - 3]);
    if stem.last() == Some(&'e') {
        stem = &stem[..stem.len() - 1];
    }

    let mut count = 0;
    let mut previous_was_vowel = false;
    for &c in stem {
        let vowel = is_vowel(c);
        if vowel && !previous_was_vowel {
            count += 1;
        }
        previous_was_vowel = vowel;
    }
    if consonant_le {
        count += 1;
    }

    count.max(1)
}

/// Total syllable estimate for a phrase.
#[must_use]
pub fn phrase_syllables(text: &str) -> usize {
    split_words(text).iter().map(|w| count_syllables(w)).sum()
}

/// Normalize a name for loose file matching: lower-cased alphanumerics only.
#[must_use]
pub fn normalize_for_match(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_words() {
        assert_eq!(split_words("  hello   world "), vec!["hello", "world"]);
        assert!(split_words("").is_empty());
    }

    #[test]
    fn test_ends_with_break() {
        assert!(ends_with_break("world,"));
        assert!(ends_with_break("stop!"));
        assert!(ends_with_break("\"go.\""));
        assert!(!ends_with_break("world"));
        assert!(!ends_with_break("don't"));
    }

    #[test]
    fn test_is_conjunction() {
        assert!(is_conjunction("and"));
        assert!(is_conjunction("But"));
        assert!(is_conjunction("(while"));
        assert!(!is_conjunction("android"));
    }

    #[test]
    fn test_count_syllables() {
        assert_eq!(count_syllables("hello"), 2);
        assert_eq!(count_syllables("make"), 1);
        assert_eq!(count_syllables("table"), 2);
        assert_eq!(count_syllables("rhythm"), 1);
        assert_eq!(count_syllables("a"), 1);
        assert_eq!(count_syllables("..."), 1);
    }

    #[test]
    fn test_phrase_syllables() {
        assert_eq!(phrase_syllables("hello world"), 3);
    }

    #[test]
    fn test_normalize_for_match() {
        assert_eq!(normalize_for_match("The Band - Song (Live)"), "thebandsonglive");
    }
}
