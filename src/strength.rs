//! Password strength scoring.
//!
//! Pure scoring of candidate passwords on a 0..=100 scale with advisory
//! feedback. Thresholds live in [`StrengthPolicy`], supplied by the caller;
//! the estimator itself takes no policy decisions.

use serde::{Deserialize, Serialize};

use crate::error::VaultError;

/// Passwords shorter than this earn no length points and cannot reach the
/// strong tier.
const MIN_USEFUL_LEN: usize = 8;

const LENGTH_CAP: i32 = 20;
const DIVERSITY_CAP: i32 = 15;
const SEQUENCE_PENALTY: i32 = 10;
const REPEAT_PENALTY: i32 = 10;
const CONTEXT_PENALTY: i32 = 20;

/// Result of scoring one candidate password. Ephemeral, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct StrengthVerdict {
    /// 0..=100; higher is stronger.
    pub score: u8,
    /// Advisory messages, strongest-signal first. The first entry always
    /// states the overall tier.
    pub feedback: Vec<String>,
}

/// Acceptance thresholds for new master passwords and item passwords.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StrengthPolicy {
    pub min_score: u8,
    pub min_length: usize,
}

impl Default for StrengthPolicy {
    fn default() -> Self {
        Self {
            min_score: 40,
            min_length: MIN_USEFUL_LEN,
        }
    }
}

impl StrengthPolicy {
    /// Scores `password` and rejects it with [`VaultError::WeakInput`] when
    /// it falls below this policy. The error carries the feedback, never the
    /// password.
    pub fn check(
        &self,
        password: &str,
        context: &[&str],
    ) -> Result<StrengthVerdict, VaultError> {
        let verdict = score(password, context);
        if password.chars().count() < self.min_length || verdict.score < self.min_score {
            return Err(VaultError::WeakInput(verdict.feedback.join(" ")));
        }
        Ok(verdict)
    }
}

/// Score a candidate password.
///
/// `context` holds related strings (username, email) the password should not
/// contain. Weighs length, character-class diversity, distinct characters,
/// ascending sequences, and repeats.
pub fn score(password: &str, context: &[&str]) -> StrengthVerdict {
    let chars: Vec<char> = password.chars().collect();
    let mut score: i32 = 0;
    let mut feedback: Vec<String> = Vec::new();

    if chars.len() < MIN_USEFUL_LEN {
        feedback.push("Use at least 8 characters.".into());
    } else {
        score += (chars.len() as i32 * 2).min(LENGTH_CAP);
    }

    if chars.iter().any(|c| c.is_ascii_lowercase()) {
        score += 10;
    }
    if chars.iter().any(|c| c.is_ascii_uppercase()) {
        score += 10;
    }
    if chars.iter().any(|c| c.is_ascii_digit()) {
        score += 10;
    }
    if chars.iter().any(|c| !c.is_ascii_alphanumeric()) {
        score += 15;
    }

    let mut distinct: Vec<char> = chars.clone();
    distinct.sort_unstable();
    distinct.dedup();
    score += (distinct.len() as i32 * 2).min(DIVERSITY_CAP);

    if has_ascending_run(&chars) {
        score -= SEQUENCE_PENALTY;
        feedback.push("Avoid sequences of consecutive characters.".into());
    }

    if has_repeat_run(&chars) {
        score -= REPEAT_PENALTY;
        feedback.push("Avoid repeating the same character.".into());
    }

    if contains_context(password, context) {
        score -= CONTEXT_PENALTY;
        feedback.push("Avoid using your name or email address.".into());
    }

    let score = score.clamp(0, 100) as u8;

    let tier = if score < 40 {
        "Weak password."
    } else if score < 70 {
        "Reasonable password."
    } else {
        "Strong password."
    };
    feedback.insert(0, tier.into());

    StrengthVerdict { score, feedback }
}

/// Three characters in a row with consecutive code points ("abc", "123").
fn has_ascending_run(chars: &[char]) -> bool {
    chars.windows(3).any(|w| {
        let (a, b, c) = (w[0] as u32, w[1] as u32, w[2] as u32);
        a + 1 == b && b + 1 == c
    })
}

/// The same character three times in a row ("aaa").
fn has_repeat_run(chars: &[char]) -> bool {
    chars.windows(3).any(|w| w[0] == w[1] && w[1] == w[2])
}

fn contains_context(password: &str, context: &[&str]) -> bool {
    let lowered = password.to_lowercase();
    context
        .iter()
        .map(|c| c.to_lowercase())
        .filter(|c| c.chars().count() >= 3)
        .any(|c| lowered.contains(&c))
}
