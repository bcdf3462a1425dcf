use std::cell::RefCell;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use serde::Deserialize;

use html_token::chunker::{BoundaryPolicy, build_chunk_plans};
use html_token::{
    ByteSource, HtmlRewriter, HtmlWriter, InputSource, InvalidOperation, MIN_BUFFER_WINDOW,
    PushSource, RewriteError, RewriteStatus, RewriterConfig, StrSource, TagContext, TagId,
    TokenizerConfig,
};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
struct Policy {
    /// Tags dropped together with their end tags; content stays.
    unwrap_tags: Vec<String>,
    /// Tags dropped together with everything up to their end tags.
    remove_tags: Vec<String>,
    strip_attribute_prefix: Option<String>,
    keep_comments: bool,
}

#[derive(Debug, Deserialize)]
struct Case {
    name: String,
    #[serde(default)]
    policy: Policy,
    input: String,
    expected: String,
}

fn load_cases() -> Vec<Case> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/rewriter.json");
    let text = fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("failed to read {}: {err}", path.display()));
    serde_json::from_str(&text)
        .unwrap_or_else(|err| panic!("failed to parse {}: {err}", path.display()))
}

fn apply(
    policy: &Policy,
    ctx: &mut TagContext<'_>,
    writer: &mut HtmlWriter,
) -> Result<(), InvalidOperation> {
    let name = ctx.name()?.to_ascii_lowercase();
    if policy.remove_tags.contains(&name) {
        ctx.delete_inner_content()?;
        return ctx.delete_tag(false);
    }
    if policy.unwrap_tags.contains(&name) {
        return ctx.delete_tag(false);
    }
    ctx.write_tag(writer, false)?;
    for handle in ctx.attributes()? {
        let attr_name = ctx.attribute_name(handle)?.to_ascii_lowercase();
        let stripped = policy
            .strip_attribute_prefix
            .as_deref()
            .is_some_and(|prefix| attr_name.starts_with(prefix));
        if !stripped {
            ctx.write_attribute(writer, handle)?;
        }
    }
    Ok(())
}

fn rewriter_config(policy: &Policy, window: usize) -> RewriterConfig {
    RewriterConfig {
        tokenizer: TokenizerConfig::with_window(window),
        keep_comments: policy.keep_comments,
        ..RewriterConfig::default()
    }
}

fn install<S: InputSource>(rewriter: &mut HtmlRewriter<S>, policy: &Policy) {
    let policy = policy.clone();
    rewriter.set_callback(move |ctx, writer| apply(&policy, ctx, writer));
}

fn rewrite_whole(case: &Case) -> Result<String, RewriteError> {
    let config = rewriter_config(&case.policy, TokenizerConfig::default().buffer_window);
    let mut rewriter = HtmlRewriter::with_config(StrSource::new(&case.input), config);
    install(&mut rewriter, &case.policy);
    rewriter.finish()
}

fn rewrite_pushed(case: &Case, chunks: &[&str], window: usize) -> Result<String, RewriteError> {
    let mut rewriter =
        HtmlRewriter::with_config(PushSource::new(), rewriter_config(&case.policy, window));
    install(&mut rewriter, &case.policy);
    for chunk in chunks {
        rewriter.tokenizer_mut().source_mut().push(chunk);
        assert_eq!(rewriter.run()?, RewriteStatus::NeedInput, "{}", case.name);
    }
    rewriter.tokenizer_mut().source_mut().close();
    assert_eq!(rewriter.run()?, RewriteStatus::Finished, "{}", case.name);
    Ok(rewriter.take_output())
}

fn rewrite_bytes(case: &Case, chunks: &[&[u8]], window: usize) -> Result<String, RewriteError> {
    let mut rewriter =
        HtmlRewriter::with_config(ByteSource::default(), rewriter_config(&case.policy, window));
    install(&mut rewriter, &case.policy);
    for chunk in chunks {
        rewriter.tokenizer_mut().source_mut().push(chunk);
        rewriter.run()?;
    }
    rewriter.tokenizer_mut().source_mut().close();
    assert_eq!(rewriter.run()?, RewriteStatus::Finished, "{}", case.name);
    Ok(rewriter.take_output())
}

#[test]
fn fixture_cases_rewrite_whole_input() {
    for case in load_cases() {
        assert_eq!(
            rewrite_whole(&case).as_deref(),
            Ok(case.expected.as_str()),
            "case '{}'",
            case.name
        );
    }
}

#[test]
fn fixture_cases_rewrite_the_same_when_chunked() {
    for case in load_cases() {
        for plan in build_chunk_plans(&case.input, 3, 0xD1CE, BoundaryPolicy::Utf8Aligned) {
            let chunks = plan.plan.split_str(&case.input);
            assert_eq!(
                rewrite_pushed(&case, &chunks, MIN_BUFFER_WINDOW).as_deref(),
                Ok(case.expected.as_str()),
                "case '{}' {}",
                case.name,
                plan.label
            );
        }
        for plan in build_chunk_plans(&case.input, 2, 0xD1CE, BoundaryPolicy::ByteStream) {
            let chunks = plan.plan.split(&case.input);
            assert_eq!(
                rewrite_bytes(&case, &chunks, MIN_BUFFER_WINDOW).as_deref(),
                Ok(case.expected.as_str()),
                "case '{}' bytes {}",
                case.name,
                plan.label
            );
        }
    }
}

#[test]
fn end_tag_callback_sees_the_matching_end_tag() {
    let seen: Rc<RefCell<Vec<String>>> = Rc::default();
    let record = Rc::clone(&seen);
    let mut rewriter = HtmlRewriter::for_str("<ul><li>a<li>b</li></ul>");
    rewriter.set_callback(move |ctx, writer| {
        let end = ctx.is_end_tag()?;
        record
            .borrow_mut()
            .push(format!("{}{}", if end { "/" } else { "" }, ctx.name()?));
        if ctx.tag_id()? == TagId::Ul && !end {
            ctx.invoke_callback_for_end_tag()?;
        }
        if end {
            writer.write_raw("<!-- end of list -->");
            ctx.delete_tag(false)?;
        }
        Ok(())
    });
    let out = rewriter.finish().expect("rewrite");
    assert_eq!(out, "<ul><li>a<li>b</li><!-- end of list -->");
    assert_eq!(*seen.borrow(), ["ul", "li", "li", "/ul"]);
}

#[test]
fn callback_errors_stop_the_rewrite() {
    let mut rewriter = HtmlRewriter::for_str("<p>a</p><p>b</p>");
    rewriter.set_callback(|ctx, writer| {
        ctx.write_tag(writer, true)?;
        ctx.delete_tag(false)
    });
    assert_eq!(
        rewriter.run(),
        Err(RewriteError::Callback(InvalidOperation::AlreadyDecided))
    );
}

#[test]
fn restart_replays_a_byte_stream_from_the_start() {
    let html = "<p id=x>caf\u{e9}</p>";
    let mut rewriter = HtmlRewriter::new(ByteSource::default());
    rewriter.tokenizer_mut().source_mut().push(&html.as_bytes()[..8]);
    assert_eq!(rewriter.run(), Ok(RewriteStatus::NeedInput));
    assert!(rewriter.can_restart());
    rewriter.restart().expect("restart");
    rewriter.tokenizer_mut().source_mut().push(&html.as_bytes()[8..]);
    rewriter.tokenizer_mut().source_mut().close();
    assert_eq!(rewriter.run(), Ok(RewriteStatus::Finished));
    assert_eq!(rewriter.take_output(), "<p id=\"x\">caf\u{e9}</p>");
    assert!(!rewriter.can_restart());
}
