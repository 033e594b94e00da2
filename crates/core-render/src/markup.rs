//! Tokenizer for the page markup produced by `core_reader::markup`.
//!
//! Only the tags the reader emits are recognised. Unknown tags are skipped
//! (their text content is kept), a `<` with no closing `>` is plain text, and
//! unknown entities pass through verbatim.

use bitflags::bitflags;
use core_model::PageNumber;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct SpanFlags: u8 {
        const NOWRAP            = 0b0000_0001;
        const VISRAAM_MAIN      = 0b0000_0010;
        const VISRAAM_SECONDARY = 0b0000_0100;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Decoded text; may contain spaces.
    Text(String),
    CenterOpen,
    CenterClose,
    SpanOpen(SpanFlags),
    SpanClose,
    WordBreak,
    Separator(PageNumber),
}

pub fn tokenize(markup: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut rest = markup;
    while !rest.is_empty() {
        let Some(open) = rest.find('<') else {
            push_text(&mut tokens, rest);
            break;
        };
        push_text(&mut tokens, &rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('>') else {
            push_text(&mut tokens, &rest[open..]);
            break;
        };
        if let Some(token) = tag_token(after[..close].trim()) {
            tokens.push(token);
        }
        rest = &after[close + 1..];
    }
    tokens
}

fn push_text(tokens: &mut Vec<Token>, raw: &str) {
    if raw.is_empty() {
        return;
    }
    let decoded = decode_entities(raw);
    if let Some(Token::Text(previous)) = tokens.last_mut() {
        previous.push_str(&decoded);
    } else {
        tokens.push(Token::Text(decoded));
    }
}

fn tag_token(tag: &str) -> Option<Token> {
    if let Some(name) = tag.strip_prefix('/') {
        return match name.trim() {
            "center" => Some(Token::CenterClose),
            "span" => Some(Token::SpanClose),
            _ => None,
        };
    }
    let tag = tag.trim_end_matches('/').trim_end();
    let name = tag.split_whitespace().next().unwrap_or_default();
    match name {
        "center" => Some(Token::CenterOpen),
        "wbr" => Some(Token::WordBreak),
        "span" => Some(Token::SpanOpen(span_flags(attribute(tag, "class")))),
        "p" if has_class(attribute(tag, "class"), "page-separator") => attribute(tag, "data-page")
            .and_then(|page| page.parse().ok())
            .map(Token::Separator),
        _ => None,
    }
}

fn attribute<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!("{name}=\"");
    let start = tag.find(&needle)? + needle.len();
    let len = tag[start..].find('"')?;
    Some(&tag[start..start + len])
}

fn has_class(classes: Option<&str>, class: &str) -> bool {
    classes.is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
}

fn span_flags(classes: Option<&str>) -> SpanFlags {
    classes
        .into_iter()
        .flat_map(str::split_whitespace)
        .fold(SpanFlags::empty(), |flags, class| {
            flags
                | match class {
                    "nowrap" => SpanFlags::NOWRAP,
                    "visraam-main" => SpanFlags::VISRAAM_MAIN,
                    "visraam-yamki" => SpanFlags::VISRAAM_SECONDARY,
                    _ => SpanFlags::empty(),
                }
        })
}

fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    raw.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}
