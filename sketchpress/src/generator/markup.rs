//! Code extraction from generator answers

const FENCE: &str = "```";

/// Pull the page source out of a generator answer.
///
/// Takes the first ```` ```html ```` block, else the first fenced block of any
/// language, else the whole answer. The result is trimmed.
pub fn extract_code(answer: &str) -> String {
    fenced_block(answer, "```html")
        .or_else(|| fenced_block(answer, FENCE))
        .unwrap_or(answer)
        .trim()
        .to_string()
}

fn fenced_block<'a>(text: &'a str, opening: &str) -> Option<&'a str> {
    let start = text.find(opening)? + opening.len();
    let rest = &text[start..];

    // Drop a language tag on a bare fence
    let rest = if opening == FENCE {
        match rest.find('\n') {
            Some(eol) if rest[..eol].chars().all(|c| c.is_ascii_alphanumeric() || c == '-') => {
                &rest[eol..]
            }
            _ => rest,
        }
    } else {
        rest
    };

    let end = rest.find(FENCE)?;
    Some(&rest[..end])
}
