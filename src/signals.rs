/// Derived text signals layered on top of the sentiment result
///
/// Emotion intensities, topical key phrases, frequency keywords, and the
/// compound tone label. All functions here are pure transforms over cleaned
/// text; they never fail.
use regex::Regex;
use std::collections::BTreeMap;

use crate::models::SentimentLabel;

/// The 8 fixed emotion categories with their keyword lists.
const EMOTION_TABLE: &[(&str, &[&str])] = &[
    ("joy", &["happy", "joy", "excited", "thrilled", "delighted", "pleased"]),
    ("sadness", &["sad", "disappointed", "upset", "depressed", "unhappy", "grief"]),
    ("anger", &["angry", "mad", "furious", "irritated", "annoyed", "frustrated"]),
    ("fear", &["afraid", "scared", "worried", "anxious", "terrified", "nervous"]),
    ("surprise", &["surprised", "shocked", "amazed", "astonished", "stunned"]),
    ("disgust", &["disgusted", "revolted", "appalled", "sickened"]),
    ("trust", &["trust", "confident", "reliable", "secure", "safe"]),
    ("anticipation", &["excited", "eager", "looking forward", "anticipate"]),
];

/// Intensity contributed by each matched keyword.
const EMOTION_KEYWORD_WEIGHT: f64 = 0.2;

/// Topic words that mark a sentence as a key phrase.
const TOPIC_KEYWORDS: &[&str] = &[
    "problem", "issue", "concern", "complaint", "request", "question",
    "help", "support", "service", "product", "price", "quality",
    "delivery", "refund", "cancel", "order", "payment", "account",
];

/// Maximum number of key phrases returned.
const MAX_KEY_PHRASES: usize = 5;

/// Minimum sentence length for a key phrase.
const MIN_PHRASE_LEN: usize = 10;

/// Sentiment score above which a tone is considered "very" polarized.
const STRONG_SENTIMENT_THRESHOLD: f64 = 0.7;

/// Dominant-emotion intensity required for a compound tone label.
const STRONG_EMOTION_THRESHOLD: f64 = 0.5;

/// Stop words excluded from frequency keywords.
const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for",
    "of", "with", "by", "is", "are", "was", "were", "be", "been", "being",
    "have", "has", "had", "do", "does", "did", "will", "would", "could",
    "should", "may", "might", "must", "can", "this", "that", "these", "those",
];

/// Keyword-based emotion intensities over all 8 fixed categories.
///
/// Intensity per category is `min(1.0, matches * 0.2)`; categories with no
/// matches stay at 0.0.
pub fn extract_emotions(text: &str) -> BTreeMap<String, f64> {
    let text_lower = text.to_lowercase();
    let mut emotions = BTreeMap::new();

    for (emotion, keywords) in EMOTION_TABLE {
        let count = keywords.iter().filter(|k| text_lower.contains(**k)).count();
        let intensity = (count as f64 * EMOTION_KEYWORD_WEIGHT).min(1.0);
        emotions.insert(emotion.to_string(), intensity);
    }

    emotions
}

/// The highest-intensity emotion, ties resolved in category-table order.
pub fn dominant_emotion(emotions: &BTreeMap<String, f64>) -> (String, f64) {
    let mut best = ("joy".to_string(), 0.0);
    for (emotion, _) in EMOTION_TABLE {
        if let Some(&intensity) = emotions.get(*emotion) {
            if intensity > best.1 {
                best = (emotion.to_string(), intensity);
            }
        }
    }
    best
}

/// Sentences containing a topic keyword, in original order, capped at 5.
pub fn extract_key_phrases(text: &str) -> Vec<String> {
    let sentence_splitter = Regex::new(r"[.!?]+").unwrap();
    let mut key_phrases = Vec::new();

    for sentence in sentence_splitter.split(text) {
        let trimmed = sentence.trim();
        if trimmed.len() <= MIN_PHRASE_LEN {
            continue;
        }

        let sentence_lower = trimmed.to_lowercase();
        if TOPIC_KEYWORDS.iter().any(|k| sentence_lower.contains(k)) {
            key_phrases.push(trimmed.to_string());
            if key_phrases.len() == MAX_KEY_PHRASES {
                break;
            }
        }
    }

    key_phrases
}

/// Top frequency keywords after stop-word filtering.
///
/// Ties are broken by first occurrence in the text, so output is stable.
pub fn extract_keywords(text: &str, max_keywords: usize) -> Vec<String> {
    let word_re = Regex::new(r"[a-zA-Z]+").unwrap();
    let text_lower = text.to_lowercase();

    let mut counts: Vec<(String, usize)> = Vec::new();
    for word in word_re.find_iter(&text_lower) {
        let word = word.as_str();
        if word.len() <= 2 || STOP_WORDS.contains(&word) {
            continue;
        }
        match counts.iter_mut().find(|(w, _)| w.as_str() == word) {
            Some((_, c)) => *c += 1,
            None => counts.push((word.to_string(), 1)),
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(max_keywords)
        .map(|(word, _)| word)
        .collect()
}

/// Compound tone label merging sentiment polarity/intensity with the dominant
/// emotion.
///
/// A strongly polarized sentiment (score > 0.7) with a strong dominant
/// emotion (intensity > 0.5) yields `very_<sentiment>_<emotion>`; the same
/// polarity with a weaker emotion yields `very_<sentiment>`; lower scores
/// yield the plain polarity; neutral stays "neutral".
pub fn determine_overall_tone(
    sentiment: SentimentLabel,
    score: f64,
    emotions: &BTreeMap<String, f64>,
) -> String {
    let (emotion, intensity) = dominant_emotion(emotions);

    match sentiment {
        SentimentLabel::Positive | SentimentLabel::Negative => {
            if score > STRONG_SENTIMENT_THRESHOLD {
                if intensity > STRONG_EMOTION_THRESHOLD {
                    format!("very_{}_{}", sentiment.as_str(), emotion)
                } else {
                    format!("very_{}", sentiment.as_str())
                }
            } else {
                sentiment.as_str().to_string()
            }
        }
        SentimentLabel::Neutral => "neutral".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emotions_cover_all_categories() {
        let emotions = extract_emotions("nothing emotional here");
        assert_eq!(emotions.len(), EMOTION_TABLE.len());
        assert!(emotions.values().all(|&v| v == 0.0));
    }

    #[test]
    fn test_emotion_intensity_scales_with_matches() {
        let emotions = extract_emotions("i am happy and thrilled and delighted");
        assert!((emotions["joy"] - 0.6).abs() < 1e-9);
        assert_eq!(emotions["anger"], 0.0);
    }

    #[test]
    fn test_emotion_intensity_is_capped() {
        let emotions =
            extract_emotions("happy joy excited thrilled delighted pleased beyond words");
        assert_eq!(emotions["joy"], 1.0);
    }

    #[test]
    fn test_excited_counts_for_joy_and_anticipation() {
        let emotions = extract_emotions("so excited for this");
        assert!(emotions["joy"] > 0.0);
        assert!(emotions["anticipation"] > 0.0);
    }

    #[test]
    fn test_key_phrases_keep_topical_sentences_in_order() {
        let text = "The delivery was late. I love the color. Please process my refund quickly!";
        let phrases = extract_key_phrases(text);
        assert_eq!(phrases.len(), 2);
        assert!(phrases[0].contains("delivery"));
        assert!(phrases[1].contains("refund"));
    }

    #[test]
    fn test_key_phrases_skip_short_sentences() {
        let phrases = extract_key_phrases("Help. This is a longer support request sentence.");
        assert_eq!(phrases.len(), 1);
    }

    #[test]
    fn test_key_phrases_capped_at_five() {
        let text = "There is a problem here. Another issue there. A big concern. \
                    One more complaint. A support request. Yet another question raised.";
        assert_eq!(extract_key_phrases(text).len(), 5);
    }

    #[test]
    fn test_keywords_filter_stop_words() {
        let keywords = extract_keywords("the pricing pricing is important and pricing wins", 3);
        assert_eq!(keywords[0], "pricing");
        assert!(!keywords.contains(&"the".to_string()));
        assert!(!keywords.contains(&"is".to_string()));
    }

    #[test]
    fn test_tone_compound_label() {
        let emotions = extract_emotions("happy thrilled delighted all around");
        let tone = determine_overall_tone(SentimentLabel::Positive, 0.9, &emotions);
        assert_eq!(tone, "very_positive_joy");
    }

    #[test]
    fn test_tone_without_strong_emotion() {
        let emotions = extract_emotions("nothing emotional");
        let tone = determine_overall_tone(SentimentLabel::Negative, 0.8, &emotions);
        assert_eq!(tone, "very_negative");
    }

    #[test]
    fn test_tone_plain_polarity_below_threshold() {
        let emotions = extract_emotions("nothing emotional");
        assert_eq!(
            determine_overall_tone(SentimentLabel::Positive, 0.6, &emotions),
            "positive"
        );
        assert_eq!(
            determine_overall_tone(SentimentLabel::Neutral, 0.9, &emotions),
            "neutral"
        );
    }
}
