//! User ID packets (tag 13).

use std::fmt;

use crate::error::{PgpError, Result};
use crate::packet::PacketType;

const TAG: u8 = PacketType::UserId as u8;

/// A user id, conventionally `Name (Comment) <email>`.
///
/// The text is kept exactly as received and serialized unchanged. The
/// name/comment/email split is derived from it; text that matches none of the
/// conventional shapes has all three parts empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId {
    text: String,
    name: String,
    comment: String,
    email: String,
}

impl UserId {
    /// Wraps free-form user id text.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let (name, comment, email) = split(&text).unwrap_or_default();
        Self {
            name: name.trim().to_owned(),
            comment: comment.trim().to_owned(),
            email: email.trim().to_owned(),
            text,
        }
    }

    /// Builds `name (comment) <email>` from whichever parts are non-empty,
    /// joined by single spaces.
    ///
    /// This normalizes whitespace, so text rebuilt from the parts of a parsed
    /// user id can differ from the original.
    pub fn from_parts(name: &str, comment: &str, email: &str) -> Self {
        let mut parts = Vec::with_capacity(3);
        if !name.is_empty() {
            parts.push(name.to_owned());
        }
        if !comment.is_empty() {
            parts.push(format!("({})", comment));
        }
        if !email.is_empty() {
            parts.push(format!("<{}>", email));
        }
        Self::new(parts.join(" "))
    }

    /// The full user id text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Parse from packet body bytes
    pub fn from_bytes(body: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(body)
            .map_err(|e| PgpError::malformed_packet(TAG, format!("user id is not UTF-8: {}", e)))?;
        Ok(Self::new(text))
    }

    /// Serialize to packet body bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        self.text.as_bytes().to_vec()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Tries the conventional shapes in order: `name (comment) <email>`,
/// `name <email>`, `name`, `<email>`.
fn split(text: &str) -> Option<(&str, &str, &str)> {
    name_comment_email(text)
        .or_else(|| name_email(text).map(|(name, email)| (name, "", email)))
        .or_else(|| (!text.is_empty() && !text.contains('<')).then_some((text, "", "")))
        .or_else(|| bracketed_email(text).map(|email| ("", "", email)))
}

/// `<email>` at the very end of `text`, with no `>` inside.
fn bracketed_email(text: &str) -> Option<&str> {
    let email = text.strip_prefix('<')?.strip_suffix('>')?;
    (!email.is_empty() && !email.contains('>')).then_some(email)
}

fn name_comment_email(text: &str) -> Option<(&str, &str, &str)> {
    let open = text.find('(')?;
    let name = &text[..open];
    let rest = &text[open + 1..];
    let close = rest.find(')')?;
    let comment = &rest[..close];
    let rest = &rest[close + 1..];
    let trimmed = rest.trim_start();
    if name.is_empty() || comment.is_empty() || trimmed.len() == rest.len() {
        return None;
    }
    Some((name, comment, bracketed_email(trimmed)?))
}

fn name_email(text: &str) -> Option<(&str, &str)> {
    let lt = text.find('<')?;
    let before = &text[..lt];
    let name = before.strip_suffix(char::is_whitespace)?;
    if name.is_empty() {
        return None;
    }
    Some((name, bracketed_email(&text[lt..])?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(text: &str) -> (String, String, String) {
        let uid = UserId::new(text);
        (
            uid.name().to_owned(),
            uid.comment().to_owned(),
            uid.email().to_owned(),
        )
    }

    fn owned(name: &str, comment: &str, email: &str) -> (String, String, String) {
        (name.to_owned(), comment.to_owned(), email.to_owned())
    }

    #[test]
    fn test_conventional_shapes() {
        assert_eq!(
            parts("Alice Example (fixture) <alice@example.org>"),
            owned("Alice Example", "fixture", "alice@example.org")
        );
        assert_eq!(
            parts("Alice Example <alice@work.example>"),
            owned("Alice Example", "", "alice@work.example")
        );
        assert_eq!(parts("Alice"), owned("Alice", "", ""));
        assert_eq!(parts("<alice@example.org>"), owned("", "", "alice@example.org"));
    }

    #[test]
    fn test_non_matching_text_has_empty_parts() {
        assert_eq!(parts("Alice<alice@example.org>"), owned("", "", ""));
        assert_eq!(parts("Alice (no email)"), owned("Alice (no email)", "", ""));
        assert_eq!(parts("<a> <b>"), owned("", "", ""));
        assert_eq!(parts(""), owned("", "", ""));
    }

    #[test]
    fn test_extra_whitespace_is_stripped_but_kept_in_text() {
        let uid = UserId::new("  Bob   (work)   <bob@example.com>");
        assert_eq!(uid.name(), "Bob");
        assert_eq!(uid.comment(), "work");
        assert_eq!(uid.email(), "bob@example.com");
        assert_eq!(uid.to_bytes(), b"  Bob   (work)   <bob@example.com>");

        let rebuilt = UserId::from_parts(uid.name(), uid.comment(), uid.email());
        assert_eq!(rebuilt.text(), "Bob (work) <bob@example.com>");
    }

    #[test]
    fn test_from_parts_skips_empty() {
        assert_eq!(UserId::from_parts("Carol", "", "c@x.org").text(), "Carol <c@x.org>");
        assert_eq!(UserId::from_parts("", "", "c@x.org").text(), "<c@x.org>");
        assert_eq!(UserId::from_parts("Carol", "", "").text(), "Carol");
    }

    #[test]
    fn test_bytes_round_trip_and_utf8() {
        let body = "Zoë Example <zoe@example.org>".as_bytes();
        let uid = UserId::from_bytes(body).unwrap();
        assert_eq!(uid.name(), "Zoë Example");
        assert_eq!(uid.to_bytes(), body);

        assert!(matches!(
            UserId::from_bytes(&[0xff, 0xfe]),
            Err(PgpError::MalformedPacket { tag: 13, .. })
        ));
    }
}
