use crate::normalize::{normalize, normalize_opt};

/// Share of candidate tokens that must be found in the reference name.
pub const MATCH_THRESHOLD: f64 = 0.5;

/// Token-level agreement between a reference name and a candidate name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameScore {
    pub matched: usize,
    pub total: usize,
}

impl NameScore {
    pub fn ratio(&self) -> Option<f64> {
        (self.total > 0).then(|| self.matched as f64 / self.total as f64)
    }

    pub fn is_match(&self) -> bool {
        self.ratio().is_some_and(|r| r >= MATCH_THRESHOLD)
    }
}

/// Score `candidate` against `reference`.
///
/// Each candidate token counts once if it appears verbatim among the reference
/// tokens, or if it is a single character that starts some reference token
/// (an initial such as `J` for `John`).
pub fn score_names(reference: &str, candidate: &str) -> NameScore {
    score_normalized(&normalize(reference), &normalize(candidate))
}

fn score_normalized(reference: &str, candidate: &str) -> NameScore {
    let reference_tokens: Vec<&str> = reference.split_whitespace().collect();

    let mut score = NameScore {
        matched: 0,
        total: 0,
    };
    for token in candidate.split_whitespace() {
        score.total += 1;
        let found = reference_tokens.contains(&token)
            || (token.chars().count() == 1
                && reference_tokens.iter().any(|r| r.starts_with(token)));
        if found {
            score.matched += 1;
        }
    }
    score
}

/// Whether the document name is close enough to the master record name.
/// With either name missing, or nothing left after normalization, there is
/// no evidence, so no match.
pub fn names_match(reference: Option<&str>, candidate: Option<&str>) -> bool {
    let reference = normalize_opt(reference);
    let candidate = normalize_opt(candidate);
    if reference.is_empty() || candidate.is_empty() {
        return false;
    }
    score_normalized(&reference, &candidate).is_match()
}
