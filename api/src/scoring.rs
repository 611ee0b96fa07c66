/// Standard score: every minigame's raw points are rescaled so the whole
/// field shares the same total, which makes games comparable on the
/// cross-game leaderboard.
pub const STANDARD_TOTAL_SCORE: f64 = 15000.0;

/// Rescale raw scores to shares of [`STANDARD_TOTAL_SCORE`], keeping input order.
///
/// When nobody scored, the total is split evenly.
pub fn standard_scores<K: Clone>(raw: &[(K, i64)]) -> Vec<(K, f64)> {
    if raw.is_empty() {
        return Vec::new();
    }

    let total: i64 = raw.iter().map(|(_, points)| *points).sum();
    if total == 0 {
        let even = STANDARD_TOTAL_SCORE / raw.len() as f64;
        return raw.iter().map(|(key, _)| (key.clone(), even)).collect();
    }

    raw.iter()
        .map(|(key, points)| {
            let share = *points as f64 / total as f64 * STANDARD_TOTAL_SCORE;
            (key.clone(), round2(share))
        })
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
