// Fuzzy matching for "did you mean" hints on roles, stages and statuses

/// Levenshtein distance between two strings (single-character edits)
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Single rolling row
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for i in 1..=a.len() {
        let mut diagonal = row[0];
        row[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            let next = (row[j] + 1)
                .min(row[j - 1] + 1)
                .min(diagonal + cost);
            diagonal = row[j];
            row[j] = next;
        }
    }
    row[b.len()]
}

/// Closest candidate within `max_distance` edits (case-insensitive).
/// Separators are ignored so `in_production` suggests `in-production`.
pub fn suggest<'a>(input: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    let normalize = |s: &str| s.to_lowercase().replace(['-', '_', ' '], "");
    let needle = normalize(input);

    candidates
        .iter()
        .map(|candidate| (*candidate, levenshtein_distance(&needle, &normalize(candidate))))
        .filter(|(_, distance)| *distance <= max_distance)
        .min_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)))
        .map(|(candidate, _)| candidate)
}

/// Append a "did you mean" hint to an error message when a close candidate exists
pub fn with_suggestion(message: String, input: &str, candidates: &[&str]) -> String {
    match suggest(input, candidates, 2) {
        Some(hint) => format!("{} Did you mean '{}'?", message, hint),
        None => message,
    }
}
