//! Partial string similarity used by lab search.

/// Best similarity (0-100) between the shorter string and any equally long
/// window of the longer one.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let (shorter, longer) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };

    let width = shorter.chars().count();
    let longer: Vec<char> = longer.chars().collect();

    let mut best = 0.0_f64;
    for window in longer.windows(width) {
        let candidate: String = window.iter().collect();
        let score = strsim::normalized_levenshtein(shorter, &candidate);
        if score > best {
            best = score;
            if best >= 1.0 {
                break;
            }
        }
    }

    (best * 100.0).round()
}
