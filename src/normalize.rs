/// Canonical form for free-text name comparison: lower-cased, with runs of
/// commas, hyphens, and whitespace collapsed into single spaces, trimmed.
/// Applied identically to legacy location text and registry site names so
/// comparisons stay symmetric.
pub fn normalize(input: &str) -> String {
    let folded: String = input
        .to_lowercase()
        .chars()
        .map(|c| {
            if c == ',' || c == '-' || c.is_whitespace() {
                ' '
            } else {
                c
            }
        })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}
