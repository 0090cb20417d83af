use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use textbox_core::{
    ActionKind, CaretMove, Coordinates, EditDirection, HeadlessBackend, MonospaceFont, TextBox,
};

fn text_box(text: &str) -> TextBox<HeadlessBackend> {
    let mut text_box = TextBox::new(HeadlessBackend::new(MonospaceFont::new(1.0, 10.0)));
    text_box.set_text(text);
    text_box
}

fn random_coordinates(text_box: &TextBox<HeadlessBackend>, rng: &mut StdRng) -> Coordinates {
    let doc = text_box.document();
    let line = rng.gen_range(0..doc.line_count());
    let len = doc.line_len(line).unwrap_or(0);
    Coordinates::new(line, rng.gen_range(0..=len))
}

fn random_step(text_box: &mut TextBox<HeadlessBackend>, rng: &mut StdRng) {
    const CHARS: &[char] = &['a', 'z', ' ', '{', '}', '1'];
    const MOVES: &[CaretMove] = &[
        CaretMove::Up,
        CaretMove::Down,
        CaretMove::Left,
        CaretMove::Right,
        CaretMove::StartOfLine,
        CaretMove::EndOfLine,
        CaretMove::StartOfWord,
        CaretMove::EndOfWord,
    ];

    match rng.gen_range(0..13) {
        0 => {
            let position = random_coordinates(text_box, rng);
            text_box.set_caret(position);
        }
        1 => {
            let position = random_coordinates(text_box, rng);
            text_box.add_caret(position);
        }
        2 | 3 => {
            let ch = CHARS[rng.gen_range(0..CHARS.len())];
            text_box.input_chars(&[ch]);
        }
        4 => {
            text_box.insert_text("ab\n  cd");
        }
        5 => {
            text_box.delete_char(EditDirection::Backward);
        }
        6 => {
            text_box.delete_char(EditDirection::Forward);
        }
        7 => {
            text_box.delete_selection();
            text_box.execute(ActionKind::Enter);
        }
        8 => {
            let kind = if rng.gen_bool(0.5) {
                ActionKind::Tab
            } else {
                ActionKind::UnTab
            };
            text_box.execute(kind);
        }
        9 => {
            let anchor = random_coordinates(text_box, rng);
            let position = random_coordinates(text_box, rng);
            text_box.set_selection(anchor, position);
        }
        10 => {
            let caret_move = MOVES[rng.gen_range(0..MOVES.len())];
            text_box.move_carets(caret_move, rng.gen_bool(0.3));
        }
        11 => {
            text_box.undo();
        }
        _ => {
            text_box.redo();
        }
    }
}

fn assert_carets_disjoint(text_box: &TextBox<HeadlessBackend>) {
    let carets: Vec<_> = text_box.carets().iter().collect();
    assert!(!carets.is_empty());
    for (i, later) in carets.iter().enumerate() {
        let (start, end) = later.sorted_without_sub();
        for earlier in &carets[..i] {
            let (earlier_start, earlier_end) = earlier.sorted_without_sub();
            assert!(
                earlier_start.is_bigger_than_without_sub(&end)
                    || start.is_bigger_than_without_sub(&earlier_end),
                "overlapping carets {earlier:?} and {later:?}"
            );
        }
    }
}

#[test]
fn test_undo_redo_single_insert() {
    let mut tb = text_box("");
    tb.input_chars(&['a']);
    assert_eq!(tb.text(), "a");
    assert!(tb.history().can_undo());
    assert!(!tb.history().can_redo());

    assert!(tb.undo());
    assert_eq!(tb.text(), "");
    assert!(!tb.history().can_undo());
    assert!(tb.history().can_redo());

    assert!(tb.redo());
    assert_eq!(tb.text(), "a");
    assert!(!tb.history().can_redo());
}

#[test]
fn test_consecutive_typing_undoes_as_one_step() {
    let mut tb = text_box("");
    for ch in ['a', 'b', 'c'] {
        tb.input_chars(&[ch]);
    }
    assert_eq!(tb.history().undo_len(), 3);

    assert!(tb.undo());
    assert_eq!(tb.text(), "");
    assert_eq!(tb.history().undo_len(), 0);
    assert_eq!(tb.history().redo_len(), 3);

    assert!(tb.redo());
    assert_eq!(tb.text(), "abc");
}

#[test]
fn test_new_edit_clears_redo() {
    let mut tb = text_box("x");
    tb.set_caret(Coordinates::new(0, 1));
    tb.input_chars(&['y']);
    tb.undo();
    assert!(tb.history().can_redo());
    tb.delete_char(EditDirection::Backward);
    assert!(!tb.history().can_redo());
    assert_eq!(tb.text(), "");
}

#[test]
fn test_undo_restores_every_caret() {
    let mut tb = text_box("ab\ncd\nef");
    tb.set_caret(Coordinates::new(0, 1));
    tb.add_caret(Coordinates::new(1, 1));
    tb.add_caret(Coordinates::new(2, 1));
    tb.execute(ActionKind::Enter);
    assert_eq!(tb.text(), "a\nb\nc\nd\ne\nf");

    tb.undo();
    assert_eq!(tb.text(), "ab\ncd\nef");
    let positions: Vec<_> = tb
        .carets()
        .iter()
        .map(|c| (c.position.line, c.position.char))
        .collect();
    assert_eq!(positions, vec![(0, 1), (1, 1), (2, 1)]);
}

#[test]
fn test_random_session_keeps_carets_disjoint() {
    let mut rng = StdRng::seed_from_u64(0x7e57_b0c5);
    let mut tb = text_box("fn main() {\n\tlet x = 1;\n}\n\n// done");
    for _ in 0..400 {
        random_step(&mut tb, &mut rng);
        assert_carets_disjoint(&tb);
    }
    while tb.undo() {
        assert_carets_disjoint(&tb);
    }
}

type CaretSet = Vec<(usize, usize, usize, usize)>;

fn caret_set(text_box: &TextBox<HeadlessBackend>) -> CaretSet {
    text_box
        .carets()
        .iter()
        .map(|c| (c.position.line, c.position.char, c.anchor.line, c.anchor.char))
        .collect()
}

fn random_action(text_box: &mut TextBox<HeadlessBackend>, rng: &mut StdRng) {
    match rng.gen_range(0..8) {
        0 | 1 => {
            text_box.input_chars(&['x']);
        }
        2 => {
            text_box.insert_text("q\n\tr");
        }
        3 => {
            text_box.delete_char(EditDirection::Backward);
        }
        4 => {
            text_box.delete_char(EditDirection::Forward);
        }
        5 => {
            text_box.delete_selection();
            text_box.execute(ActionKind::Enter);
        }
        6 => {
            text_box.execute(ActionKind::Tab);
        }
        _ => {
            text_box.delete_selection();
        }
    }
}

#[test]
fn test_random_actions_undo_and_redo_exactly() {
    const TEXTS: &[&str] = &[
        "fn main() {\n\tlet x = 1;\n}\n\nabc def",
        "a\nb\nc",
        "\n\n",
        "one two\n\tthree\n\t\tfour",
    ];

    for seed in 0..300 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut tb = text_box(TEXTS[rng.gen_range(0..TEXTS.len())]);
        for i in 0..rng.gen_range(1..=3) {
            let anchor = random_coordinates(&tb, &mut rng);
            let position = if rng.gen_bool(0.3) {
                random_coordinates(&tb, &mut rng)
            } else {
                anchor
            };
            if i == 0 {
                tb.set_selection(anchor, position);
            } else {
                tb.add_selection(anchor, position);
            }
        }
        let start = (tb.text(), caret_set(&tb));

        for _ in 0..rng.gen_range(1..=7) {
            random_action(&mut tb, &mut rng);
        }
        let end = (tb.text(), caret_set(&tb));

        while tb.undo() {}
        assert_eq!((tb.text(), caret_set(&tb)), start, "undo, seed {seed}");
        while tb.redo() {}
        assert_eq!((tb.text(), caret_set(&tb)), end, "redo, seed {seed}");
    }
}

#[test]
fn test_backspace_with_meeting_carets_undoes_exactly() {
    let original = "fn main() {\n\tlet x = 1;\n}\n\nabc def";
    let mut tb = text_box(original);
    tb.set_caret(Coordinates::new(0, 2));
    tb.add_caret(Coordinates::new(3, 0));
    tb.add_caret(Coordinates::new(2, 1));
    tb.add_caret(Coordinates::new(2, 0));
    let carets = caret_set(&tb);

    assert!(tb.delete_char(EditDirection::Backward));
    let edited = tb.text();
    assert!(tb.undo());
    assert_eq!(tb.text(), original);
    assert_eq!(caret_set(&tb), carets);

    assert!(tb.redo());
    assert_eq!(tb.text(), edited);
}
