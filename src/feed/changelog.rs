/// Extracts the notes of the newest version from a changelog.
///
/// Changelogs list versions newest first, each introduced by a line that
/// starts with `=`. The excerpt is everything between the first such line
/// and the next one, trimmed. A changelog without two delimiter lines
/// yields an empty excerpt.
///
/// ```
/// use buildfeed::feed::extract_excerpt;
///
/// let text = "=v2\nFixed bug A\nFixed bug B\n=v1\nInitial release\n";
/// assert_eq!(extract_excerpt(text), "Fixed bug A\nFixed bug B");
/// ```
pub fn extract_excerpt(changelog: &str) -> String {
    let mut lines = changelog.lines();

    if !lines.by_ref().any(|line| line.starts_with('=')) {
        return String::new();
    }

    let mut section = Vec::new();
    for line in lines {
        if line.starts_with('=') {
            return section.join("\n").trim().to_string();
        }
        section.push(line);
    }

    // No closing delimiter
    String::new()
}
