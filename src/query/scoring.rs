//! Pure scoring arithmetic for the Query Engine: keyword TF scoring,
//! multi-chunk coalescing boost, and the three relevancy boosts. Kept
//! free of I/O so worked examples can be asserted directly.

use crate::types::{MetaValue, Metadata};

/// `score = 0.6·coverage + 0.3·normTF + 0.1·lengthFactor`, clamped to
/// `[0,1]`; `0` if no term matched.
pub fn keyword_score(terms: &[String], content: &str) -> f32 {
    let n = terms.len();
    if n == 0 {
        return 0.0;
    }

    let content_lower = content.to_lowercase();
    let mut matched = 0usize;
    let mut tf_sum = 0f64;

    for term in terms {
        let term_lower = term.to_lowercase();
        if term_lower.is_empty() {
            continue;
        }
        let count = content_lower.matches(term_lower.as_str()).count();
        if count > 0 {
            matched += 1;
            tf_sum += 1.0 + (count as f64).ln();
        }
    }

    if matched == 0 {
        return 0.0;
    }

    let coverage = matched as f64 / n as f64;
    let norm_tf = (tf_sum / n as f64 / 3.0).min(1.0);
    let doc_length = (content.chars().count() as f64).max(2000.0);
    let length_factor = 1.0 / (1.0 + (doc_length / 2000.0).ln());

    let score = 0.6 * coverage + 0.3 * norm_tf + 0.1 * length_factor;
    score.clamp(0.0, 1.0) as f32
}

/// Boost the best chunk of a `k`-member coalescing group:
/// `score' = min(1, score · (1 + min(ln(k)·0.05, 0.15)))`.
pub fn coalesce_boost(score: f32, k: usize) -> f32 {
    if k <= 1 {
        return score;
    }
    let bonus = ((k as f64).ln() * 0.05).min(0.15);
    ((score as f64) * (1.0 + bonus)).min(1.0) as f32
}

/// `0.85 + 0.35·relevance_score` when metadata carries a numeric
/// `relevance_score`; else `1`.
pub fn relevance_blend(metadata: &Metadata) -> f32 {
    metadata
        .get("relevance_score")
        .and_then(MetaValue::as_f64)
        .map(|r| (0.85 + 0.35 * r) as f32)
        .unwrap_or(1.0)
}

/// Title/subject match boost against the query text.
pub fn title_boost(metadata: &Metadata, query: &str) -> f32 {
    let field = metadata
        .get("title")
        .or_else(|| metadata.get("subject"))
        .and_then(MetaValue::as_str);

    let field = match field {
        Some(f) => f,
        None => return 1.0,
    };

    let field_lower = field.to_lowercase();
    let query_lower = query.to_lowercase();

    if field_lower == query_lower {
        return 1.3;
    }

    let tokens: Vec<&str> = query_lower.split_whitespace().collect();
    if tokens.is_empty() {
        return 1.0;
    }

    let matched = tokens.iter().filter(|t| field_lower.contains(*t)).count();
    if matched == 0 {
        1.0
    } else {
        1.0 + 0.2 * (matched as f32 / tokens.len() as f32)
    }
}

/// Recency boost from `metadata.updatedAt` against a per-source
/// half-life in days; `1` if the field is absent or unparseable.
pub fn recency_boost(metadata: &Metadata, half_life_days: f64, now_ms: i64) -> f32 {
    let updated_at = match metadata.get("updatedAt").and_then(MetaValue::as_str) {
        Some(s) => s,
        None => return 1.0,
    };
    let ts = match crate::hashing::parse_timestamp_ms(updated_at) {
        Some(ts) => ts,
        None => return 1.0,
    };

    let days = ((now_ms - ts) as f64 / 86_400_000.0).max(0.0);
    let recency = 0.5f64.powf(days / half_life_days);
    (1.0 + 0.08 * recency) as f32
}

/// `finalScore = score · relevanceBlend · titleBoost · recencyBoost`,
/// clamped to `[0,1]`.
pub fn final_score(score: f32, relevance_blend: f32, title_boost: f32, recency_boost: f32) -> f32 {
    (score * relevance_blend * title_boost * recency_boost).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn keyword_score_no_match_is_zero() {
        assert_eq!(keyword_score(&["absent".to_string()], "nothing here"), 0.0);
    }

    #[test]
    fn keyword_score_single_term_exact_2000_char_doc_is_0_8() {
        let content = format!("word {}", "x".repeat(1995));
        assert_eq!(content.chars().count(), 2000);
        let score = keyword_score(&["word".to_string()], &content);
        assert!((score - 0.8).abs() < 1e-6, "expected ~0.8, got {score}");
    }

    #[test]
    fn coalesce_boost_matches_worked_example() {
        let boosted = coalesce_boost(0.8, 3);
        assert!((boosted - 0.8439).abs() < 1e-3, "expected ~0.8439, got {boosted}");
    }

    #[test]
    fn coalesce_boost_is_identity_for_singleton_groups() {
        assert_eq!(coalesce_boost(0.42, 1), 0.42);
    }

    #[test]
    fn relevance_blend_defaults_to_one_without_relevance_score() {
        assert_eq!(relevance_blend(&Metadata::new()), 1.0);
    }

    #[test]
    fn title_boost_exact_match_is_1_3() {
        let mut metadata = BTreeMap::new();
        metadata.insert("title".to_string(), MetaValue::Str("Bug report".to_string()));
        assert_eq!(title_boost(&metadata, "Bug report"), 1.3);
    }

    #[test]
    fn title_boost_partial_token_match_scales_with_coverage() {
        let mut metadata = BTreeMap::new();
        metadata.insert("title".to_string(), MetaValue::Str("the bug is fixed".to_string()));
        let boost = title_boost(&metadata, "bug missing");
        assert!((boost - 1.1).abs() < 1e-6, "expected ~1.1, got {boost}");
    }

    #[test]
    fn recency_boost_is_one_without_updated_at() {
        assert_eq!(recency_boost(&Metadata::new(), 7.0, 1_700_000_000_000), 1.0);
    }

    #[test]
    fn final_score_never_exceeds_one() {
        assert_eq!(final_score(1.0, 1.3, 1.3, 1.08), 1.0);
    }
}
