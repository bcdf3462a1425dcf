use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use html_token::{
    ByteSource, HtmlRewriter, MIN_BUFFER_WINDOW, StrSource, TagId, TokenKind, Tokenizer,
    TokenizerConfig, tokenize,
};

const SMALL_BLOCKS: usize = 64;
const LARGE_BLOCKS: usize = 20_000;

fn make_blocks(blocks: usize) -> String {
    let block = r#"<div class=box onclick="go()"><span title='a &amp; b'>hello &eacute;</span><img src=x alt=""></div>"#;
    let mut out = String::with_capacity(block.len() * blocks);
    for _ in 0..blocks {
        out.push_str(block);
    }
    out
}

/// Attribute values longer than small windows, so tags arrive in parts.
fn make_long_attributes(tags: usize, value_len: usize) -> String {
    let value = "v".repeat(value_len);
    let mut out = String::new();
    for i in 0..tags {
        out.push_str(&format!(r#"<a id=a{i} href="{value}" title="{value}">x</a>"#));
    }
    out
}

fn make_rawtext_adversarial(bytes: usize) -> String {
    let mut body = String::with_capacity(bytes + 32);
    body.push_str("<script>");
    while body.len() < bytes {
        body.push_str("</scri");
        body.push('<');
        body.push_str("pt");
    }
    body.push_str("</script>");
    body
}

fn count_tokens(input: &str, window: usize) -> usize {
    let mut tokenizer =
        Tokenizer::with_config(StrSource::new(input), TokenizerConfig::with_window(window));
    let mut count = 0;
    while let Some(kind) = tokenizer.parse().expect("tokenize") {
        count += 1;
        if kind == TokenKind::EndOfFile {
            break;
        }
    }
    count
}

fn bench_tokenize_small(c: &mut Criterion) {
    let input = make_blocks(SMALL_BLOCKS);
    c.bench_function("bench_tokenize_small", |b| {
        b.iter(|| {
            let tokens = tokenize(black_box(&input)).expect("tokenize");
            black_box(tokens.len());
        });
    });
}

fn bench_tokenize_windows(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    for window in [MIN_BUFFER_WINDOW, 4096, 64 * 1024] {
        c.bench_function(&format!("bench_tokenize_large_window_{window}"), |b| {
            b.iter(|| black_box(count_tokens(black_box(&input), window)));
        });
    }
}

fn bench_tokenize_split_tags(c: &mut Criterion) {
    let input = make_long_attributes(2_000, 600);
    c.bench_function("bench_tokenize_split_tags", |b| {
        b.iter(|| black_box(count_tokens(black_box(&input), MIN_BUFFER_WINDOW)));
    });
}

fn bench_streaming_bytes(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    let bytes = input.as_bytes();
    let chunk_sizes = [1usize, 2, 3, 7, 64, 128, 256, 1024];
    c.bench_function("bench_streaming_bytes", |b| {
        b.iter_batched(
            || Tokenizer::new(ByteSource::default()),
            |mut tokenizer| {
                let mut count = 0usize;
                let mut offset = 0usize;
                let mut size_idx = 0usize;
                while offset < bytes.len() {
                    let size = chunk_sizes[size_idx % chunk_sizes.len()];
                    let end = (offset + size).min(bytes.len());
                    tokenizer.source_mut().push(&bytes[offset..end]);
                    while tokenizer.parse().expect("tokenize").is_some() {
                        count += 1;
                    }
                    offset = end;
                    size_idx += 1;
                }
                tokenizer.source_mut().close();
                while let Some(kind) = tokenizer.parse().expect("tokenize") {
                    count += 1;
                    if kind == TokenKind::EndOfFile {
                        break;
                    }
                }
                black_box(count);
            },
            BatchSize::LargeInput,
        );
    });
}

fn bench_tokenize_rawtext_adversarial(c: &mut Criterion) {
    let input = make_rawtext_adversarial(512 * 1024);
    c.bench_function("bench_tokenize_rawtext_adversarial", |b| {
        b.iter(|| black_box(count_tokens(black_box(&input), 16 * 1024)));
    });
}

fn bench_rewrite_large(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    c.bench_function("bench_rewrite_large", |b| {
        b.iter(|| {
            let mut rewriter = HtmlRewriter::for_str(black_box(&input));
            rewriter.set_callback(|ctx, writer| {
                if ctx.tag_id()? == TagId::Img {
                    return ctx.delete_tag(false);
                }
                ctx.write_tag(writer, false)?;
                for handle in ctx.attributes()? {
                    if !ctx.attribute_name(handle)?.starts_with("on") {
                        ctx.write_attribute(writer, handle)?;
                    }
                }
                Ok(())
            });
            black_box(rewriter.finish().expect("rewrite").len());
        });
    });
}

criterion_group!(
    benches,
    bench_tokenize_small,
    bench_tokenize_windows,
    bench_tokenize_split_tags,
    bench_streaming_bytes,
    bench_tokenize_rawtext_adversarial,
    bench_rewrite_large
);
criterion_main!(benches);
