#![no_main]

use html_token::{
    ByteSource, MIN_BUFFER_WINDOW, TokenAssembler, TokenKind, Tokenizer, TokenizerConfig,
    TokenizerError,
};
use libfuzzer_sys::fuzz_target;

/// Decodes `chunks` at the minimum window and returns the assembled tokens.
fn assemble(chunks: &[&[u8]]) -> Result<Vec<html_token::OwnedToken>, TokenizerError> {
    let config = TokenizerConfig::with_window(MIN_BUFFER_WINDOW);
    let mut tokenizer = Tokenizer::with_config(ByteSource::default(), config);
    let mut assembler = TokenAssembler::new();
    let mut drain = |tokenizer: &mut Tokenizer<ByteSource>| -> Result<bool, TokenizerError> {
        while let Some(kind) = tokenizer.parse()? {
            let view = tokenizer.view();
            if kind == TokenKind::Text {
                assert!(view.text().len() <= MIN_BUFFER_WINDOW);
            }
            assembler.push(view);
            if kind == TokenKind::EndOfFile {
                return Ok(true);
            }
        }
        Ok(false)
    };
    for chunk in chunks {
        tokenizer.source_mut().push(chunk);
        drain(&mut tokenizer)?;
    }
    tokenizer.source_mut().close();
    assert!(drain(&mut tokenizer)?, "closed source did not reach end of file");
    Ok(assembler.into_tokens())
}

// The first byte picks a chunk size; the rest is the document. Token
// streams must not depend on where the input was cut.
fuzz_target!(|data: &[u8]| {
    let Some((&size, doc)) = data.split_first() else {
        return;
    };
    let size = usize::from(size % 17) + 1;
    let whole = assemble(&[doc]);
    let chunks: Vec<&[u8]> = doc.chunks(size).collect();
    let chunked = assemble(&chunks);
    assert_eq!(whole, chunked);
});
