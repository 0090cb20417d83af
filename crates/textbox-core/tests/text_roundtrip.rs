use textbox_core::{EolMode, HeadlessBackend, MonospaceFont, Options, TabMode, TextBox};

fn text_box(options: Options) -> TextBox<HeadlessBackend> {
    let mut text_box = TextBox::new(HeadlessBackend::new(MonospaceFont::new(1.0, 10.0)));
    text_box.set_options(options);
    text_box
}

#[test]
fn test_line_endings_normalized() {
    let mut tb = text_box(Options::default());
    tb.set_text("a\r\nb\rc\n");
    assert_eq!(tb.text(), "a\nb\nc\n");
    assert_eq!(tb.document().line_count(), 4);
}

#[test]
fn test_crlf_mode_joins_with_crlf() {
    let options = Options {
        eol_mode: EolMode::Crlf,
        ..Options::default()
    };
    let mut tb = text_box(options.clone());
    let input = "one\ntwo\r\nthree";
    tb.set_text(input);
    assert_eq!(tb.text(), "one\r\ntwo\r\nthree");
    assert_eq!(tb.text(), options.normalize(input));
}

#[test]
fn test_space_mode_expands_tabs() {
    let options = Options {
        tab_mode: TabMode::Space,
        tab_size: 2,
        ..Options::default()
    };
    let mut tb = text_box(options);
    tb.set_text("\tx\n\t\ty");
    assert_eq!(tb.text(), "  x\n    y");
}

#[test]
fn test_tab_mode_contracts_spaces() {
    let mut tb = text_box(Options::default());
    tb.set_text("    x");
    assert_eq!(tb.text(), "\tx");
}

#[test]
fn test_set_text_then_text_is_idempotent() {
    let mut tb = text_box(Options::default());
    for input in ["", "\n", "a\r\n\r\nb", "x\ty\n        z", "日本語\nemoji 🎉"] {
        tb.set_text(input);
        let once = tb.text();
        tb.set_text(&once);
        assert_eq!(tb.text(), once, "input {input:?}");
        assert_eq!(once, tb.options().normalize(input));
    }
}

#[test]
fn test_paste_normalizes_like_set_text() {
    let mut tb = text_box(Options::default());
    tb.set_text("");
    tb.insert_text("a\r\n    b");
    assert_eq!(tb.text(), "a\n\tb");
}
