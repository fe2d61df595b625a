//! Identifier helpers.

const SUMMARY_LEN: usize = 12;

/// Abbreviate a container or image id the way `docker ps` does.
///
/// The API reports full 64 character ids; the first 12 are enough for a
/// human to tell them apart.
pub fn summarize_id(id: &str) -> &str {
    match id.char_indices().nth(SUMMARY_LEN) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

/// Turn arbitrary text into a lower case, dash separated slug.
///
/// "Some Random Text!" becomes "some-random-text".
pub fn slug(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_id() {
        let full = "4e3f0c7f2d1a9b8c7d6e5f4a3b2c1d0e9f8a7b6c5d4e3f2a1b0c9d8e7f6a5b4c";
        assert_eq!(summarize_id(full), "4e3f0c7f2d1a");
        assert_eq!(summarize_id("4e3f0c7f2d1a"), "4e3f0c7f2d1a");
        assert_eq!(summarize_id("abc"), "abc");
        assert_eq!(summarize_id(""), "");
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Some Random Text!"), "some-random-text");
        assert_eq!(slug("--web__server:latest--"), "web-server-latest");
        assert_eq!(slug("ubuntu:precise"), "ubuntu-precise");
        assert_eq!(slug("!!!"), "");
    }
}
