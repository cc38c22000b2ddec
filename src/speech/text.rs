//! Text cleanup before handing replies to a speech engine

/// Strip markup from a reply so the engine does not read tags aloud
///
/// Replies may carry inline HTML such as `<b>` emphasis. Tags are removed,
/// the handful of entities a backend typically emits are decoded, and
/// whitespace is collapsed.
pub fn speakable_text(text: &str) -> String {
    let mut stripped = String::with_capacity(text.len());
    let mut tag: Option<String> = None;

    for c in text.chars() {
        if let Some(name) = tag.as_mut() {
            if c == '>' {
                if breaks_words(name) {
                    stripped.push(' ');
                }
                tag = None;
            } else {
                name.push(c);
            }
        } else if c == '<' {
            tag = Some(String::new());
        } else {
            stripped.push(c);
        }
    }

    let entities = [
        ("&nbsp;", " "),
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&quot;", "\""),
        ("&#39;", "'"),
        ("&amp;", "&"),
    ];

    let mut result = stripped;
    for (entity, replacement) in entities {
        result = result.replace(entity, replacement);
    }

    result.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Block-level tags separate words; inline ones (`<b>`, `<i>`) do not
fn breaks_words(tag: &str) -> bool {
    let name = tag
        .trim_start_matches('/')
        .split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    matches!(name.as_str(), "br" | "p" | "div" | "li" | "ul" | "ol")
}
