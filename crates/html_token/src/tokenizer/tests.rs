use super::*;
use crate::names::{AttrId, TagId};
use crate::store::ReadMode;
use crate::token::{Major, OwnedAttribute, OwnedTag, OwnedToken, TokenAssembler};

fn owned_tokens<S: InputSource>(tokenizer: &mut Tokenizer<S>) -> Vec<OwnedToken> {
    let mut out = Vec::new();
    while let Some(kind) = tokenizer.parse().expect("parse") {
        out.push(tokenizer.view().to_owned_token());
        if kind == TokenKind::EndOfFile {
            break;
        }
    }
    out
}

fn tokens(html: &str) -> Vec<OwnedToken> {
    owned_tokens(&mut Tokenizer::for_str(html))
}

fn assembled<S: InputSource>(tokenizer: &mut Tokenizer<S>) -> Vec<OwnedToken> {
    let mut assembler = TokenAssembler::new();
    while let Some(kind) = tokenizer.parse().expect("parse") {
        assembler.push(tokenizer.view());
        if kind == TokenKind::EndOfFile {
            break;
        }
    }
    assembler.into_tokens()
}

fn text(s: &str) -> OwnedToken {
    OwnedToken::Text(s.to_string())
}

fn tag(id: TagId, name: &str) -> OwnedTag {
    OwnedTag {
        id,
        name: name.to_string(),
        ..OwnedTag::default()
    }
}

fn start(id: TagId, name: &str) -> OwnedToken {
    OwnedToken::Tag(tag(id, name))
}

fn end(id: TagId, name: &str) -> OwnedToken {
    OwnedToken::Tag(OwnedTag {
        end_tag: true,
        ..tag(id, name)
    })
}

fn attr(id: AttrId, name: &str, value: Option<&str>, quote: Option<char>) -> OwnedAttribute {
    OwnedAttribute {
        id,
        name: name.to_string(),
        value: value.map(str::to_string),
        quote,
    }
}

fn pseudo(id: TagId, content: &str) -> OwnedToken {
    OwnedToken::Tag(OwnedTag {
        id,
        unstructured: content.to_string(),
        ..OwnedTag::default()
    })
}

#[test]
fn tokenizes_text_and_tags() {
    assert_eq!(
        tokens("<p class=intro>Hi <b>there</b></p>"),
        vec![
            OwnedToken::Tag(OwnedTag {
                attributes: vec![attr(AttrId::Class, "class", Some("intro"), None)],
                ..tag(TagId::P, "p")
            }),
            text("Hi "),
            OwnedToken::Tag(OwnedTag {
                after_space: true,
                ..tag(TagId::B, "b")
            }),
            text("there"),
            end(TagId::B, "b"),
            end(TagId::P, "p"),
            OwnedToken::EndOfFile,
        ]
    );
}

#[test]
fn attribute_forms() {
    let out = tokens(r#"<input type="text" value='a b' disabled data-x=1 =odd>"#);
    let OwnedToken::Tag(input) = &out[0] else {
        panic!("expected a tag, got {:?}", out[0]);
    };
    assert_eq!(input.id, TagId::Input);
    assert_eq!(
        input.attributes,
        vec![
            attr(AttrId::Type, "type", Some("text"), Some('"')),
            attr(AttrId::Value, "value", Some("a b"), Some('\'')),
            attr(AttrId::Disabled, "disabled", None, None),
            attr(AttrId::Unknown, "data-x", Some("1"), None),
            attr(AttrId::Unknown, "=odd", None, None),
        ]
    );
}

#[test]
fn names_resolve_case_insensitively() {
    for html in ["<DIV>", "<div>", "<Div>"] {
        let out = tokens(html);
        let OwnedToken::Tag(div) = &out[0] else {
            panic!("expected a tag");
        };
        assert_eq!(div.id, TagId::Div, "{html}");
        assert_eq!(div.name, &html[1..4]);
    }
}

#[test]
fn self_closing_and_empty_values() {
    assert_eq!(
        tokens(r#"<br/><a href="">"#),
        vec![
            OwnedToken::Tag(OwnedTag {
                empty_element: true,
                ..tag(TagId::Br, "br")
            }),
            OwnedToken::Tag(OwnedTag {
                attributes: vec![attr(AttrId::Href, "href", Some(""), Some('"'))],
                ..tag(TagId::A, "a")
            }),
            OwnedToken::EndOfFile,
        ]
    );
}

#[test]
fn character_references_and_nul() {
    assert_eq!(
        tokens("a &amp; b &#60; &unknown; &#xD800; \0"),
        vec![text("a & b < &unknown; &#xD800; \u{fffd}"), OwnedToken::EndOfFile]
    );
    let out = tokens(r#"<a title="x&quot;y">"#);
    let OwnedToken::Tag(a) = &out[0] else {
        panic!("expected a tag");
    };
    assert_eq!(a.attributes[0].value.as_deref(), Some("x\"y"));
}

#[test]
fn comments_doctype_and_bogus_markup() {
    assert_eq!(
        tokens("<!DOCTYPE html><!-- c --><!----><!--><!--x--!><?php x?></ x>"),
        vec![
            pseudo(TagId::Doctype, "DOCTYPE html"),
            pseudo(TagId::Comment, " c "),
            pseudo(TagId::Comment, ""),
            pseudo(TagId::Comment, ""),
            pseudo(TagId::Comment, "x"),
            pseudo(TagId::Bogus, "?php x?"),
            pseudo(TagId::Bogus, " x"),
            OwnedToken::EndOfFile,
        ]
    );
}

#[test]
fn empty_end_tag_is_dropped_and_stray_lt_is_text() {
    assert_eq!(
        tokens("a</>b < c <"),
        vec![text("ab < c <"), OwnedToken::EndOfFile]
    );
}

#[test]
fn raw_text_and_rcdata() {
    assert_eq!(
        tokens("<script>if (a<b) x = '</p>'</script><title>&lt;T&gt;</title>"),
        vec![
            start(TagId::Script, "script"),
            text("if (a<b) x = '</p>'"),
            end(TagId::Script, "script"),
            start(TagId::Title, "title"),
            text("<T>"),
            end(TagId::Title, "title"),
            OwnedToken::EndOfFile,
        ]
    );
    assert_eq!(
        tokens("<style>&amp;</STYLE >"),
        vec![
            start(TagId::Style, "style"),
            text("&amp;"),
            end(TagId::Style, "STYLE"),
            OwnedToken::EndOfFile,
        ]
    );
}

#[test]
fn plaintext_swallows_the_rest() {
    assert_eq!(
        tokens("<plaintext><b>x</b>"),
        vec![
            start(TagId::Plaintext, "plaintext"),
            text("<b>x</b>"),
            OwnedToken::EndOfFile,
        ]
    );
}

#[test]
fn unterminated_tag_is_closed_at_end_of_input() {
    assert_eq!(
        tokens(r#"x<a href="y"#),
        vec![
            text("x"),
            OwnedToken::Tag(OwnedTag {
                attributes: vec![attr(AttrId::Href, "href", Some("y"), Some('"'))],
                ..tag(TagId::A, "a")
            }),
            OwnedToken::EndOfFile,
        ]
    );
    assert_eq!(
        tokens("<!-- open"),
        vec![pseudo(TagId::Comment, " open"), OwnedToken::EndOfFile]
    );
}

#[test]
fn end_of_file_is_returned_once() {
    let mut tokenizer = Tokenizer::for_str("x");
    assert_eq!(tokenizer.parse(), Ok(Some(TokenKind::Text)));
    assert_eq!(tokenizer.parse(), Ok(Some(TokenKind::EndOfFile)));
    assert_eq!(tokenizer.parse(), Ok(None));
    assert_eq!(tokenizer.parse(), Ok(None));
}

#[test]
fn attribute_cap_fails_the_parse() {
    let config = TokenizerConfig {
        max_attributes: 5,
        ..TokenizerConfig::default()
    };
    let mut ok = Tokenizer::with_config(StrSource::new("<p a b c d e>"), config);
    assert_eq!(ok.parse(), Ok(Some(TokenKind::Tag)));
    assert_eq!(ok.token().attributes().len(), 5);

    let mut over = Tokenizer::with_config(StrSource::new("<p a b c d e f>"), config);
    assert_eq!(
        over.parse(),
        Err(TokenizerError::AttributeLimitExceeded { limit: 5 })
    );
}

#[test]
fn push_source_waits_for_input() {
    let mut tokenizer = Tokenizer::new(PushSource::new());
    assert_eq!(tokenizer.parse(), Ok(None));

    tokenizer.source_mut().push("<di");
    assert_eq!(tokenizer.parse(), Ok(None));
    tokenizer.source_mut().push("v>te");
    assert_eq!(tokenizer.parse(), Ok(Some(TokenKind::Tag)));
    assert_eq!(tokenizer.token().tag_id(), TagId::Div);
    assert_eq!(tokenizer.parse(), Ok(None));

    tokenizer.source_mut().push("xt &am");
    assert_eq!(tokenizer.parse(), Ok(None));
    tokenizer.source_mut().push("p;");
    tokenizer.source_mut().close();
    assert_eq!(tokenizer.parse(), Ok(Some(TokenKind::Text)));
    assert_eq!(tokenizer.view().text(), "text &");
    assert_eq!(tokenizer.parse(), Ok(Some(TokenKind::EndOfFile)));
}

#[test]
fn whole_and_byte_at_a_time_agree() {
    let html = "<!doctype html><p id=a class='b c'>x &lt; y<br/>z</p><!-- c --></x >";
    let whole = tokens(html);

    let mut tokenizer = Tokenizer::new(PushSource::new());
    let mut chunked = Vec::new();
    for ch in html.chars() {
        tokenizer.source_mut().push(ch.encode_utf8(&mut [0; 4]));
        while let Some(_) = tokenizer.parse().expect("parse") {
            chunked.push(tokenizer.view().to_owned_token());
        }
    }
    tokenizer.source_mut().close();
    chunked.extend(owned_tokens(&mut tokenizer));
    assert_eq!(chunked, whole);
}

#[test]
fn long_text_is_split_at_the_window() {
    let html = "a".repeat(1000);
    let config = TokenizerConfig::with_window(256);
    let mut tokenizer = Tokenizer::with_config(StrSource::new(&html), config);
    let mut lens = Vec::new();
    while let Some(TokenKind::Text) = tokenizer.parse().expect("parse") {
        lens.push(tokenizer.view().text().len());
    }
    assert!(lens.len() >= 4, "{lens:?}");
    assert_eq!(lens.iter().sum::<usize>(), 1000);
    assert!(tokenizer.stats().compactions > 0);
}

#[test]
fn long_attribute_value_is_exposed_in_parts() {
    let value = "v".repeat(600);
    let html = format!(r#"<a title="{value}" href=x>"#);
    let mut tokenizer =
        Tokenizer::with_config(StrSource::new(&html), TokenizerConfig::with_window(256));

    let mut majors = Vec::new();
    let mut assembler = TokenAssembler::new();
    while let Some(kind) = tokenizer.parse().expect("parse") {
        if kind == TokenKind::Tag {
            majors.push(tokenizer.view().major());
        }
        assembler.push(tokenizer.view());
        if kind == TokenKind::EndOfFile {
            break;
        }
    }
    assert_eq!(majors.first(), Some(&Major::Begin));
    assert_eq!(majors.last(), Some(&Major::End));
    assert!(majors[1..majors.len() - 1].iter().all(|m| *m == Major::Continue));
    assert!(tokenizer.stats().partial_parts >= 2);

    let OwnedToken::Tag(a) = &assembler.tokens()[0] else {
        panic!("expected a tag");
    };
    assert_eq!(
        a.attributes,
        vec![
            attr(AttrId::Title, "title", Some(value.as_str()), Some('"')),
            attr(AttrId::Href, "href", Some("x"), None),
        ]
    );
}

#[test]
fn short_attribute_at_the_window_edge_is_carried_whole() {
    // Enough attributes to cross the 256 byte window, none of them long.
    let attrs: String = (0..40).map(|i| format!(" data-{i:02}=\"v{i:02}\"")).collect();
    let html = format!("<div{attrs}>");
    let mut tokenizer =
        Tokenizer::with_config(StrSource::new(&html), TokenizerConfig::with_window(256));

    let mut parts = 0;
    let mut seen = Vec::new();
    while let Some(TokenKind::Tag) = tokenizer.parse().expect("parse") {
        parts += 1;
        for attr in tokenizer.view().attributes() {
            assert_eq!(attr.progress().major(), Major::Complete);
            seen.push((attr.name().into_owned(), attr.value().map(|v| v.into_owned())));
        }
    }
    assert!(parts >= 2);
    assert_eq!(seen.len(), 40);
    for (i, (name, value)) in seen.iter().enumerate() {
        assert_eq!(name, &format!("data-{i:02}"));
        assert_eq!(value.as_deref(), Some(format!("v{i:02}").as_str()));
    }
}

#[test]
fn small_windows_assemble_like_a_large_one() {
    let body: String = (0..30)
        .map(|i| format!("<p class=\"c{i}\" title='{}'>text {i} &amp; more</p>\n", "t".repeat(i * 7)))
        .collect();
    let html = format!("<!doctype html><body>{body}<!-- {} --></body>", "-".repeat(300));
    let expected = assembled(&mut Tokenizer::for_str(&html));
    for window in [256, 300, 517] {
        let mut tokenizer =
            Tokenizer::with_config(StrSource::new(&html), TokenizerConfig::with_window(window));
        assert_eq!(assembled(&mut tokenizer), expected, "window {window}");
    }
}

#[test]
fn byte_source_switches_on_byte_order_mark() {
    let mut bytes = vec![0xff, 0xfe];
    for unit in "<b>é</b>".encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    let mut source = ByteSource::default();
    source.push(&bytes);
    source.close();
    let mut tokenizer = Tokenizer::new(source);
    assert_eq!(
        owned_tokens(&mut tokenizer),
        vec![
            OwnedToken::EncodingChange("UTF-16LE"),
            start(TagId::B, "b"),
            text("é"),
            end(TagId::B, "b"),
            OwnedToken::EndOfFile,
        ]
    );
}

#[test]
fn byte_source_decodes_split_sequences() {
    let html = "<p>naïve – ok</p>".as_bytes();
    let mut tokenizer = Tokenizer::new(ByteSource::default());
    let mut out = Vec::new();
    for byte in html {
        tokenizer.source_mut().push(&[*byte]);
        while let Some(_) = tokenizer.parse().expect("parse") {
            out.push(tokenizer.view().to_owned_token());
        }
    }
    tokenizer.source_mut().close();
    out.extend(owned_tokens(&mut tokenizer));
    assert_eq!(out, tokens("<p>naïve – ok</p>"));
}

#[test]
fn byte_source_decodes_multibyte_text_at_any_window() {
    for prefix in ["<p>", "a<p>", "ab<p>"] {
        let html = format!("{prefix}{}{}</p>", "\u{e9}".repeat(200), "\u{20ac}".repeat(100));
        let expected = assembled(&mut Tokenizer::for_str(&html));
        for window in [256, 257, 258, 300, 301, 511] {
            let mut source = ByteSource::default();
            source.push(html.as_bytes());
            source.close();
            let mut tokenizer = Tokenizer::with_config(source, TokenizerConfig::with_window(window));
            assert_eq!(assembled(&mut tokenizer), expected, "{prefix} window {window}");
        }
    }
}

#[test]
fn byte_source_history_is_bounded() {
    let mut tokenizer = Tokenizer::new(ByteSource::default().with_history_limit(16));
    tokenizer.source_mut().push(b"<p>0123456");
    assert_eq!(tokenizer.parse(), Ok(Some(TokenKind::Tag)));
    assert!(tokenizer.can_restart());

    tokenizer.source_mut().push(b"789</p>xyz");
    assert!(!tokenizer.can_restart());
    assert_eq!(tokenizer.restart(), Err(TokenizerError::RestartUnavailable));

    tokenizer.source_mut().close();
    let rest = assembled(&mut tokenizer);
    assert_eq!(
        rest,
        vec![
            text("0123456789"),
            end(TagId::P, "p"),
            text("xyz"),
            OwnedToken::EndOfFile,
        ]
    );
}

#[test]
fn restart_replays_the_input() {
    let mut tokenizer = Tokenizer::for_str("<i>x</i>");
    assert_eq!(tokenizer.parse(), Ok(Some(TokenKind::Tag)));
    assert_eq!(tokenizer.parse(), Ok(Some(TokenKind::Text)));
    assert!(tokenizer.can_restart());
    tokenizer.restart().expect("restart");
    assert_eq!(
        owned_tokens(&mut tokenizer),
        vec![
            OwnedToken::Restart,
            start(TagId::I, "i"),
            text("x"),
            end(TagId::I, "i"),
            OwnedToken::EndOfFile,
        ]
    );

    tokenizer.disable_restart();
    assert!(!tokenizer.can_restart());
    assert_eq!(tokenizer.restart(), Err(TokenizerError::RestartUnavailable));
}

#[test]
fn byte_source_restart_with_new_encoding() {
    let mut source = ByteSource::default();
    source.push(b"caf\xe9");
    source.close();
    let mut tokenizer = Tokenizer::new(source);
    assert_eq!(owned_tokens(&mut tokenizer), vec![text("caf\u{fffd}"), OwnedToken::EndOfFile]);

    tokenizer.source_mut().set_encoding(encoding_rs::WINDOWS_1252);
    tokenizer.restart().expect("restart");
    assert_eq!(
        owned_tokens(&mut tokenizer),
        vec![OwnedToken::Restart, text("café"), OwnedToken::EndOfFile]
    );
}

#[test]
fn push_source_cannot_restart() {
    let mut tokenizer = Tokenizer::new(PushSource::new());
    assert!(!tokenizer.can_restart());
    assert_eq!(tokenizer.restart(), Err(TokenizerError::RestartUnavailable));
}

#[test]
fn injected_markup_is_bracketed_by_overlapped_tokens() {
    let mut tokenizer = Tokenizer::for_str("<p>a</p><p>b</p>");
    let mut out = Vec::new();
    for _ in 0..3 {
        tokenizer.parse().expect("parse");
        out.push(tokenizer.view().to_owned_token());
    }
    tokenizer.inject("<hr>note<b>", 1).expect("inject");
    out.extend(owned_tokens(&mut tokenizer));
    assert_eq!(
        out,
        vec![
            start(TagId::P, "p"),
            text("a"),
            end(TagId::P, "p"),
            OwnedToken::OverlappedClose(1),
            start(TagId::Hr, "hr"),
            text("note"),
            start(TagId::B, "b"),
            OwnedToken::OverlappedReopen(1),
            start(TagId::P, "p"),
            text("b"),
            end(TagId::P, "p"),
            OwnedToken::EndOfFile,
        ]
    );
}

#[test]
fn injection_left_open_is_closed_at_its_end() {
    let mut tokenizer = Tokenizer::for_str("<p>");
    tokenizer.parse().expect("parse");
    tokenizer.inject("<a href='x", 0).expect("inject");
    let out = owned_tokens(&mut tokenizer);
    assert_eq!(out[0], OwnedToken::OverlappedClose(0));
    let OwnedToken::Tag(a) = &out[1] else {
        panic!("expected a tag, got {:?}", out[1]);
    };
    assert_eq!(a.attributes[0].value.as_deref(), Some("x"));
    assert_eq!(out[2], OwnedToken::OverlappedReopen(0));
    assert_eq!(out[3], OwnedToken::EndOfFile);
}

#[test]
fn injection_is_bounded_and_only_between_tokens() {
    let mut tokenizer =
        Tokenizer::with_config(StrSource::new("<script>x</script>"), TokenizerConfig::with_window(256));
    assert_eq!(
        tokenizer.inject(&"x".repeat(200), 0),
        Err(TokenizerError::InjectionTooLarge { len: 200, limit: 128 })
    );
    tokenizer.parse().expect("parse");
    assert_eq!(
        tokenizer.inject("<b>", 0),
        Err(TokenizerError::InjectionNotAtBoundary)
    );
}

#[test]
fn fragments_read_zero_copy_and_collapsed() {
    let mut tokenizer = Tokenizer::for_str("a \n\t b\u{a0}c<x>");
    tokenizer.parse().expect("parse");
    let view = tokenizer.view();
    assert_eq!(view.text_with(ReadMode::Source), "a \n\t b\u{a0}c");
    assert_eq!(view.text_with(ReadMode::Collapsed), "a b\u{a0}c");
    assert!(view.token().whole().run_count() > 1);
}
