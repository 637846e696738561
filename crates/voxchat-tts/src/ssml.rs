//! SSML rate-adjustment document building.
//!
//! At a speech rate of 1.0 sentences are synthesized as plain text. Any
//! other rate wraps the sentence in a prosody directive of
//! `round((rate - 1) * 100)` percent applied to the whole sentence.

/// Percent adjustment encoded in the prosody directive for `speech_rate`.
pub fn rate_percent(speech_rate: f32) -> i32 {
    ((speech_rate - 1.0) * 100.0).round() as i32
}

/// Build the SSML document for `text` at `speech_rate`, or `None` when the
/// rate is 1.0 and plain text should be synthesized instead.
pub fn rate_adjusted_document(text: &str, voice: &str, speech_rate: f32) -> Option<String> {
    if speech_rate == 1.0 {
        return None;
    }
    let percent = rate_percent(speech_rate);
    Some(format!(
        concat!(
            r#"<speak version="1.0" xmlns="http://www.w3.org/2001/10/synthesis" xml:lang="en-US">"#,
            r#"<voice name="{voice}"><prosody rate="{percent}%">{text}</prosody></voice></speak>"#
        ),
        voice = escape_text(voice),
        percent = percent,
        text = escape_text(text),
    ))
}

/// Escape XML-significant characters in sentence text.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_rate_uses_plain_text() {
        assert!(rate_adjusted_document("Hello", "v1", 1.0).is_none());
    }

    #[test]
    fn faster_rate_is_positive_percent() {
        assert_eq!(rate_percent(1.5), 50);
        let doc = rate_adjusted_document("Hello", "v1", 1.5).unwrap();
        assert!(doc.contains(r#"<prosody rate="50%">Hello</prosody>"#));
        assert!(doc.contains(r#"<voice name="v1">"#));
    }

    #[test]
    fn slower_rate_is_negative_percent() {
        assert_eq!(rate_percent(0.8), -20);
        let doc = rate_adjusted_document("Hello", "v1", 0.8).unwrap();
        assert!(doc.contains(r#"rate="-20%""#));
    }

    #[test]
    fn sentence_text_is_escaped() {
        let doc = rate_adjusted_document("a < b & c", "v1", 1.2).unwrap();
        assert!(doc.contains("a &lt; b &amp; c"));
    }
}
