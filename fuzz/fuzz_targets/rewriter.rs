#![no_main]

use html_token::{
    HtmlRewriter, MIN_BUFFER_WINDOW, RewriteError, RewriterConfig, StrSource, TagId,
    TokenizerConfig,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(html) = std::str::from_utf8(data) else {
        return;
    };
    let config = RewriterConfig {
        tokenizer: TokenizerConfig::with_window(MIN_BUFFER_WINDOW),
        ..RewriterConfig::default()
    };
    let mut rewriter = HtmlRewriter::with_config(StrSource::new(html), config);
    rewriter.set_callback(|ctx, writer| {
        match ctx.tag_id()? {
            TagId::Script | TagId::Style => {
                ctx.delete_inner_content()?;
                ctx.delete_tag(false)
            }
            TagId::Font => ctx.delete_tag(false),
            _ => {
                ctx.write_tag(writer, false)?;
                for handle in ctx.attributes()? {
                    if !ctx.attribute_name(handle)?.to_ascii_lowercase().starts_with("on") {
                        ctx.write_attribute(writer, handle)?;
                    }
                }
                Ok(())
            }
        }
    });
    // The callback only uses handles of the current tag, so only resource
    // limits may fail.
    if let Err(RewriteError::Callback(err)) = rewriter.finish() {
        panic!("callback protocol rejected a valid call sequence: {err}");
    }
});
