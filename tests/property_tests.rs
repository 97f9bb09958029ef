/// Property-based tests using proptest
/// Tests invariants that should hold for all inputs: determinism, output
/// bounds, clamping, and chunk-word integrity
use proptest::prelude::*;

use rust_crm_intel::features::{extract_features, FEATURE_SCHEMA};
use rust_crm_intel::models::{Activity, LeadRecord};
use rust_crm_intel::preprocess::{chunk_text, clean_text};
use rust_crm_intel::scoring::{fallback_result, prediction_confidence};
use rust_crm_intel::sentiment::fallback_sentiment;
use rust_crm_intel::signals::extract_emotions;

prop_compose! {
    fn arb_lead()(
        email in proptest::option::of("[a-z]{1,8}@[a-z]{1,8}\\.com"),
        phone in proptest::option::of("[0-9]{8,12}"),
        company in proptest::option::of("[A-Za-z ]{0,24}"),
        job_title in proptest::option::of("[A-Za-z ]{0,16}"),
        source in proptest::option::of(prop::sample::select(vec![
            "website", "referral", "cold_call", "carrier_pigeon",
        ])),
        budget in proptest::option::of(-10_000.0..2_000_000.0f64),
        timeline in proptest::option::of(prop::sample::select(vec![
            "immediate", "within_30_days", "no_timeline", "someday",
        ])),
        activity_types in proptest::collection::vec(
            prop::sample::select(vec!["email", "call", "meeting", "demo", "proposal", "fax"]),
            0..6,
        ),
        activity_count in proptest::option::of(0.0..10_000.0f64),
        days in proptest::option::of(0.0..5_000.0f64),
        response_hours in proptest::option::of(0.0..5_000.0f64),
    ) -> LeadRecord {
        LeadRecord {
            email,
            phone,
            company,
            job_title,
            source: source.map(str::to_string),
            budget,
            timeline: timeline.map(str::to_string),
            activities: activity_types
                .into_iter()
                .map(|t| Activity { activity_type: t.to_string() })
                .collect(),
            activity_count,
            days_since_last_activity: days,
            avg_response_time_hours: response_hours,
            status: None,
        }
    }
}

// Property: feature extraction is total, deterministic, and schema-stable
proptest! {
    #[test]
    fn extraction_never_panics_and_is_deterministic(lead in arb_lead()) {
        let first = extract_features(&lead);
        let second = extract_features(&lead);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.schema(), FEATURE_SCHEMA.to_vec());
    }

    #[test]
    fn presence_flags_are_binary(lead in arb_lead()) {
        let features = extract_features(&lead);
        for flag in ["has_email", "has_phone", "has_company", "has_job_title"] {
            let value = features.get(flag).unwrap();
            prop_assert!(value == 0.0 || value == 1.0);
        }
    }
}

// Property: fallback scoring output is always within declared bounds
proptest! {
    #[test]
    fn fallback_result_is_bounded(lead in arb_lead()) {
        let result = fallback_result(&extract_features(&lead));
        prop_assert!((0.0..=100.0).contains(&result.lead_score));
        prop_assert!((0.0..=1.0).contains(&result.conversion_probability));
        prop_assert_eq!(result.confidence, 0.5);
    }

    #[test]
    fn prediction_confidence_is_bounded(lead in arb_lead()) {
        let confidence = prediction_confidence(&extract_features(&lead));
        prop_assert!((0.2..=1.0).contains(&confidence));
    }
}

// Property: chunking never splits a word and reconstructs the token sequence
proptest! {
    #[test]
    fn chunks_reconstruct_token_sequence(
        words in proptest::collection::vec("[a-z]{1,15}", 0..50),
        max_length in 5usize..200,
    ) {
        let text = words.join(" ");
        let chunks = chunk_text(&text, max_length);
        prop_assert_eq!(chunks.join(" "), text.trim());
    }

    #[test]
    fn chunks_respect_max_length(
        words in proptest::collection::vec("[a-z]{1,15}", 1..50),
        max_length in 20usize..200,
    ) {
        // All generated words fit within max_length, so every chunk must too
        let text = words.join(" ");
        for chunk in chunk_text(&text, max_length) {
            prop_assert!(chunk.len() <= max_length, "chunk too long: {:?}", chunk);
        }
    }

    #[test]
    fn overlong_words_stand_alone(word in "[a-z]{30,60}") {
        let chunks = chunk_text(&word, 10);
        prop_assert_eq!(chunks, vec![word]);
    }
}

// Property: text cleaning is idempotent and normalized
proptest! {
    #[test]
    fn clean_text_is_idempotent(text in "\\PC*") {
        let once = clean_text(&text);
        prop_assert_eq!(clean_text(&once), once.clone());
        prop_assert!(!once.contains("  "));
    }
}

// Property: sentiment and emotion outputs stay in range
proptest! {
    #[test]
    fn fallback_sentiment_score_in_range(text in "\\PC*") {
        let result = fallback_sentiment(&text);
        prop_assert!((0.0..=1.0).contains(&result.score));
        prop_assert!(result.score <= 0.9);
    }

    #[test]
    fn emotion_intensities_in_range(text in "\\PC*") {
        for (_, intensity) in extract_emotions(&text) {
            prop_assert!((0.0..=1.0).contains(&intensity));
        }
    }
}
