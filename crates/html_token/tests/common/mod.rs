#![allow(dead_code)]

use std::fmt::Write;

use html_token::{
    ByteSource, InputSource, OwnedAttribute, OwnedTag, OwnedToken, PushSource, StrSource, TagId,
    TokenAssembler, TokenKind, Tokenizer, TokenizerConfig, TokenizerError,
};

pub fn config(window: usize) -> TokenizerConfig {
    TokenizerConfig::with_window(window)
}

/// Parses until the source is pending or EndOfFile was returned. Returns
/// whether EndOfFile was seen.
fn drain<S: InputSource>(
    tokenizer: &mut Tokenizer<S>,
    assembler: &mut TokenAssembler,
) -> Result<bool, TokenizerError> {
    while let Some(kind) = tokenizer.parse()? {
        assembler.push(tokenizer.view());
        if kind == TokenKind::EndOfFile {
            return Ok(true);
        }
    }
    Ok(false)
}

pub fn tokens_whole(input: &str, window: usize) -> Result<Vec<OwnedToken>, TokenizerError> {
    let mut tokenizer = Tokenizer::with_config(StrSource::new(input), config(window));
    let mut assembler = TokenAssembler::new();
    drain(&mut tokenizer, &mut assembler)?;
    Ok(assembler.into_tokens())
}

/// Feeds `chunks` one at a time through a [`PushSource`], parsing as far as
/// possible after each one.
pub fn tokens_pushed(chunks: &[&str], window: usize) -> Result<Vec<OwnedToken>, TokenizerError> {
    let mut tokenizer = Tokenizer::with_config(PushSource::new(), config(window));
    let mut assembler = TokenAssembler::new();
    for chunk in chunks {
        tokenizer.source_mut().push(chunk);
        drain(&mut tokenizer, &mut assembler)?;
    }
    tokenizer.source_mut().close();
    let finished = drain(&mut tokenizer, &mut assembler)?;
    assert!(finished, "closed push source did not reach end of file");
    Ok(assembler.into_tokens())
}

/// Same as [`tokens_pushed`] over raw bytes decoded by a [`ByteSource`].
pub fn tokens_from_bytes(chunks: &[&[u8]], window: usize) -> Result<Vec<OwnedToken>, TokenizerError> {
    let mut tokenizer = Tokenizer::with_config(ByteSource::default(), config(window));
    let mut assembler = TokenAssembler::new();
    for chunk in chunks {
        tokenizer.source_mut().push(chunk);
        drain(&mut tokenizer, &mut assembler)?;
    }
    tokenizer.source_mut().close();
    let finished = drain(&mut tokenizer, &mut assembler)?;
    assert!(finished, "closed byte source did not reach end of file");
    Ok(assembler.into_tokens())
}

/// One line per token, stable across runs.
pub fn snapshot(tokens: &[OwnedToken]) -> Vec<String> {
    tokens.iter().map(format_token).collect()
}

pub fn format_token(token: &OwnedToken) -> String {
    match token {
        OwnedToken::Text(text) => format!("TEXT \"{}\"", escape_text(text)),
        OwnedToken::Tag(tag) => format_tag(tag),
        OwnedToken::EndOfFile => "EOF".to_string(),
        OwnedToken::EncodingChange(name) => format!("ENCODING {name}"),
        OwnedToken::Restart => "RESTART".to_string(),
        OwnedToken::OverlappedClose(open) => format!("OVERLAPPED_CLOSE {open}"),
        OwnedToken::OverlappedReopen(open) => format!("OVERLAPPED_REOPEN {open}"),
    }
}

fn format_tag(tag: &OwnedTag) -> String {
    let unstructured = |label: &str| format!("{label} text=\"{}\"", escape_text(&tag.unstructured));
    match tag.id {
        TagId::Comment => return unstructured("COMMENT"),
        TagId::Doctype => return unstructured("DOCTYPE"),
        TagId::Bogus => return unstructured("BOGUS"),
        _ => {}
    }
    if tag.end_tag {
        return format!("END name={}", tag.name);
    }
    let mut line = format!("START name={} attrs=[", tag.name);
    for (index, attr) in tag.attributes.iter().enumerate() {
        if index > 0 {
            line.push(' ');
        }
        line.push_str(&format_attr(attr));
    }
    line.push(']');
    if tag.empty_element {
        line.push_str(" self_closing");
    }
    line
}

fn format_attr(attr: &OwnedAttribute) -> String {
    match &attr.value {
        None => attr.name.clone(),
        Some(value) => format!("{}=\"{}\"", attr.name, escape_text(value)),
    }
}

pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ch if ch < ' ' => {
                let _ = write!(&mut out, "\\u{{{:02X}}}", ch as u32);
            }
            _ => out.push(ch),
        }
    }
    out
}

/// First mismatching line with a little context.
pub fn diff_lines(expected: &[String], actual: &[String]) -> String {
    let max = expected.len().max(actual.len());
    let missing = "<missing>";
    let Some(first) = (0..max).find(|&i| expected.get(i) != actual.get(i)) else {
        return "no differences".to_string();
    };
    let mut out = String::new();
    let _ = writeln!(&mut out, "first mismatch at line {}:", first + 1);
    for i in first.saturating_sub(2)..(first + 3).min(max) {
        let left = expected.get(i).map_or(missing, String::as_str);
        let right = actual.get(i).map_or(missing, String::as_str);
        let marker = if left == right { ' ' } else { '>' };
        let _ = writeln!(&mut out, "{marker} {:>4} expected: {left}", i + 1);
        let _ = writeln!(&mut out, "{marker} {:>4} actual:   {right}", i + 1);
    }
    out
}
