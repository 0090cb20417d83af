use std::sync::Arc;

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use textbox_core::{
    Coordinates, Document, HeadlessBackend, HotKeys, Language, MonospaceFont, Options, TextBox,
    Vec2, WrapMode,
};

fn large_text(line_count: usize) -> String {
    let mut out = String::with_capacity(line_count * 64);
    for i in 0..line_count {
        if i % 10 == 0 {
            out.push_str("fn block() {\n");
        }
        out.push_str(&format!(
            "\t{i:06} the quick brown fox jumps over the lazy dog // \"textbox\" line\n"
        ));
        if i % 10 == 9 {
            out.push_str("}\n");
        }
    }
    out.pop();
    out
}

fn language() -> Arc<Language> {
    let mut language = Language::new("bench");
    language
        .add_line_comment("//")
        .and_then(|l| l.add_string("\""))
        .and_then(|l| l.add_folding("{", "}"))
        .expect("bench language");
    Arc::new(language)
}

fn text_box(text: &str, options: Options) -> TextBox<HeadlessBackend> {
    let backend = HeadlessBackend::new(MonospaceFont::new(8.0, 14.0));
    let mut text_box = TextBox::with_language(backend, options, language());
    text_box.set_text(text);
    text_box
}

fn bench_set_text(c: &mut Criterion) {
    let text = large_text(50_000);
    c.bench_function("set_text/50k_lines", |b| {
        b.iter_batched(
            || TextBox::with_language(HeadlessBackend::default(), Options::default(), language()),
            |mut text_box| {
                text_box.set_text(black_box(&text));
                black_box(text_box.document().line_count());
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_tokenizer_rescan(c: &mut Criterion) {
    let text = large_text(20_000);
    c.bench_function("tokenizer/20k_lines", |b| {
        b.iter_batched(
            || {
                let mut doc = Document::new(Options::default(), language());
                doc.set_text(&text);
                doc
            },
            |mut doc| {
                doc.flush_tokens();
                black_box(doc.foldings().len());
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_wrapped_rows(c: &mut Criterion) {
    let text = large_text(5_000);
    let options = Options {
        wrap_mode: WrapMode::Word,
        ..Options::default()
    };
    c.bench_function("rows/word_wrap_5k_lines", |b| {
        b.iter_batched(
            || text_box(&text, options.clone()),
            |mut text_box| {
                text_box.render(Vec2::new(0.0, 0.0), Vec2::new(240.0, 600.0));
                black_box(text_box.row_count());
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_typing_with_undo(c: &mut Criterion) {
    let text = large_text(10_000);
    c.bench_function("typing/100_chars_then_undo", |b| {
        b.iter_batched(
            || text_box(&text, Options::default()),
            |mut text_box| {
                text_box.set_caret(Coordinates::new(5_000, 1));
                for _ in 0..100 {
                    text_box.input_chars(&['x']);
                }
                text_box.backend_mut().press(HotKeys::CTRL | HotKeys::Z);
                text_box.render(Vec2::new(0.0, 0.0), Vec2::new(800.0, 600.0));
                black_box(text_box.history().redo_len());
            },
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(
    benches,
    bench_set_text,
    bench_tokenizer_rescan,
    bench_wrapped_rows,
    bench_typing_with_undo
);
criterion_main!(benches);
