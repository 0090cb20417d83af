use std::sync::Arc;

use textbox_core::{
    Backend, DrawCall, HeadlessBackend, HotKeys, Language, MonospaceFont, Options, TabMode,
    TextBox, Theme, Vec2, WrapMode,
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn plain_options() -> Options {
    Options {
        show_whitespace: false,
        ..Options::default()
    }
}

fn text_box(options: Options) -> TextBox<HeadlessBackend> {
    init_tracing();
    let mut language = Language::new("braces");
    language.add_folding("{", "}").unwrap();
    let backend = HeadlessBackend::new(MonospaceFont::new(1.0, 10.0));
    TextBox::with_language(backend, options, Arc::new(language))
}

fn run_frames(text_box: &mut TextBox<HeadlessBackend>) {
    while text_box.backend().has_pending_input() {
        text_box.render(Vec2::new(0.0, 0.0), Vec2::new(200.0, 120.0));
    }
}

#[test]
fn test_scripted_copy_paste_session() {
    let mut tb = text_box(plain_options());
    tb.set_text("");
    let backend = tb.backend_mut();
    backend.type_text("let x=1;");
    backend.press(HotKeys::HOME);
    backend.press(HotKeys::SHIFT | HotKeys::END);
    backend.press(HotKeys::CTRL | HotKeys::C);
    backend.press(HotKeys::END);
    backend.type_text("\n");
    backend.press(HotKeys::CTRL | HotKeys::V);
    run_frames(&mut tb);

    assert_eq!(tb.backend().frames(), 7);
    assert_eq!(tb.backend().clipboard_text(), "let x=1;");
    assert_eq!(tb.text(), "let x=1;\nlet x=1;");
    assert_eq!(tb.backend().rendered_text(), "let x=1;1let x=1;2");
    assert_eq!(tb.internal_error_count(), 0);
}

#[test]
fn test_undo_from_keyboard_restores_frame() {
    let mut tb = text_box(plain_options());
    tb.set_text("a {\n}");
    tb.backend_mut().type_text("xyz");
    run_frames(&mut tb);
    assert_eq!(tb.text(), "xyza {\n}");

    tb.backend_mut().press(HotKeys::CTRL | HotKeys::Z);
    run_frames(&mut tb);
    assert_eq!(tb.text(), "a {\n}");
    assert_eq!(tb.backend().rendered_text(), "a {1}2");
}

#[test]
fn test_options_load_from_json() {
    let json = r#"{
        "wrap_mode": "BreakWord",
        "tab_mode": "Space",
        "tab_size": 2,
        "show_whitespace": false
    }"#;
    let options: Options = serde_json::from_str(json).unwrap();
    assert_eq!(options.wrap_mode, WrapMode::BreakWord);
    assert_eq!(options.tab_mode, TabMode::Space);
    assert!(options.auto_indent);

    let mut tb = text_box(options.clone());
    tb.set_text("\tx");
    assert_eq!(tb.text(), "  x");

    let saved = serde_json::to_string(&options).unwrap();
    assert_eq!(serde_json::from_str::<Options>(&saved).unwrap(), options);
}

#[test]
fn test_theme_loads_from_json() {
    let theme = Theme::dark();
    let json = serde_json::to_string_pretty(&theme).unwrap();
    let loaded: Theme = serde_json::from_str(&json).unwrap();
    assert_eq!(loaded, theme);

    let mut tb = text_box(plain_options());
    tb.set_theme(loaded);
    tb.set_text("a");
    tb.render(Vec2::new(0.0, 0.0), Vec2::new(200.0, 120.0));
    let page = tb.backend().calls().first().cloned();
    assert!(matches!(page, Some(DrawCall::Page { color, .. }) if color == theme.background));
}

#[test]
fn test_read_only_session_still_copies() {
    let options = Options {
        read_only: true,
        ..plain_options()
    };
    let mut tb = text_box(options);
    tb.set_text("keep");
    let backend = tb.backend_mut();
    backend.type_text("zz");
    backend.press(HotKeys::BACKSPACE);
    backend.press(HotKeys::CTRL | HotKeys::A);
    backend.press(HotKeys::CTRL | HotKeys::C);
    run_frames(&mut tb);

    assert_eq!(tb.text(), "keep");
    assert_eq!(tb.backend().clipboard_text(), "keep");
    assert!(!tb.history().can_undo());
    let dimmed = tb.theme().background_dimmed;
    let page = tb.backend().calls().first().cloned();
    assert!(matches!(page, Some(DrawCall::Page { color, .. }) if color == dimmed));
}

#[test]
fn test_keyboard_navigation_scrolls_to_caret() {
    let mut tb = text_box(plain_options());
    let text = (0..100).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");
    tb.set_text(&text);
    tb.backend_mut().press(HotKeys::CTRL | HotKeys::END);
    run_frames(&mut tb);

    assert_eq!(tb.carets().first().map(|c| c.position.line), Some(99));
    assert!(tb.backend().scroll_y() > 0.0);
    assert!(tb.backend().rendered_text().contains("99"));
    assert!(!tb.backend().rendered_text().starts_with("01"));
}

#[test]
fn test_text_box_moves_across_threads() {
    let mut tb = text_box(plain_options());
    tb.set_text("a {\nb\n}");
    let handle = std::thread::spawn(move || {
        tb.toggle_fold(0);
        tb.render(Vec2::new(0.0, 0.0), Vec2::new(200.0, 120.0));
        (tb.row_count(), tb.text())
    });
    let (rows, text) = handle.join().unwrap();
    assert_eq!(rows, 1);
    assert_eq!(text, "a {\nb\n}");
}

#[test]
fn test_debug_report_lists_caches() {
    let mut tb = text_box(plain_options());
    tb.set_text("x");
    tb.backend_mut().type_text("y");
    run_frames(&mut tb);
    let report = tb.debug_report();
    assert!(report.starts_with("Carets:\n"));
    assert!(report.contains("Caches:\n"));
    assert!(report.contains("#"));
}
