use crate::editor::Editor;
use crate::error::{Error, Result};
use crate::input::{InputSeq, KeySeq};
use std::fs;
use std::io::{self, Write};
use tempfile::tempdir;

use KeySeq::*;

struct DummyInputs(Vec<InputSeq>);

impl Iterator for DummyInputs {
    type Item = Result<InputSeq>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.0.is_empty() {
            None
        } else {
            Some(Ok(self.0.remove(0)))
        }
    }
}

struct Discard;

impl Write for Discard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn key(c: char) -> InputSeq {
    InputSeq::new(Key(c as u8))
}

fn ctrl(c: char) -> InputSeq {
    InputSeq::ctrl(Key(c as u8))
}

fn sp(k: KeySeq) -> InputSeq {
    if let Key(_) = k {
        panic!("{:?}", k);
    }
    InputSeq::new(k)
}

fn backspace() -> InputSeq {
    InputSeq::new(Key(0x7f))
}

fn typed(s: &str) -> Vec<InputSeq> {
    s.chars().map(key).collect()
}

fn edit_lines(before: &[&str], input: Vec<InputSeq>) -> Editor<DummyInputs, Discard> {
    let mut editor = Editor::with_lines(
        before.iter().copied(),
        DummyInputs(input),
        Discard,
        Some((80, 24)),
    )
    .unwrap();
    editor.edit().unwrap();
    editor
}

fn lines_of<I: Iterator<Item = Result<InputSeq>>, W: Write>(editor: &Editor<I, W>) -> Vec<String> {
    editor
        .lines()
        .map(|l| String::from_utf8_lossy(l).into_owned())
        .collect()
}

#[test]
fn test_empty_buffer() {
    let input = DummyInputs(vec![ctrl('q')]);
    let mut editor = Editor::new(input, Discard, Some((80, 24))).unwrap();
    editor.edit().unwrap();

    assert_eq!(editor.screen().rows(), 22);
    assert_eq!(editor.screen().cols(), 80);
    assert_eq!(editor.lines().count(), 0);

    let msg = editor.screen().message_text();
    assert_eq!(msg, "HELP: Ctrl-S = save | Ctrl-Q = quit");
}

#[test]
fn test_write_to_empty_buffer() {
    let input = DummyInputs(vec![key('a'), key('b'), key('c'), ctrl('q')]);
    let mut editor = Editor::new(input, Discard, Some((80, 24))).unwrap();
    editor.edit().unwrap();

    assert_eq!(lines_of(&editor), vec!["abc"]);
    assert_eq!(editor.cursor(), (3, 0));
    assert!(editor.buf().modified());
}

#[test]
fn test_quit_does_not_ask_even_if_modified() {
    let input = DummyInputs(vec![key('a'), ctrl('q'), key('b')]);
    let mut editor = Editor::new(input, Discard, Some((80, 24))).unwrap();
    editor.edit().unwrap();

    assert_eq!(lines_of(&editor), vec!["a"]);
    assert!(editor.buf().modified());
}

#[test]
fn test_open_file() {
    let input = DummyInputs(vec![ctrl('q')]);

    let this_file = file!();
    let mut editor = Editor::open(input, Discard, Some((80, 24)), Some(this_file)).unwrap();
    editor.edit().unwrap();

    let content = fs::read(this_file).unwrap();
    let expected: Vec<_> = content.split(|b| *b == b'\n').collect();
    let actual: Vec<_> = editor.lines().collect();
    // split() yields an empty slice after the last newline
    assert_eq!(&expected[..expected.len() - 1], &actual[..]);
    assert!(!editor.buf().modified());
    assert_eq!(editor.buf().filename(), this_file);
}

#[test]
fn test_open_missing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing.txt");
    let input = DummyInputs(vec![]);
    match Editor::open(input, Discard, Some((80, 24)), Some(&path)) {
        Err(Error::OpenFile(p, _)) => assert_eq!(p, path),
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("missing file was opened"),
    }
}

#[test]
fn test_first_frame_shows_banner() {
    let mut out = vec![];
    {
        let input = DummyInputs(vec![ctrl('q')]);
        let mut editor = Editor::new(input, &mut out, Some((80, 26))).unwrap();
        editor.edit().unwrap();
    }

    let out = String::from_utf8(out).unwrap();
    let first_frame = out
        .split("\x1b[?25l")
        .nth(1)
        .unwrap()
        .trim_start_matches("\x1b[H");
    let rows: Vec<_> = first_frame.split("\r\n").collect();
    assert!(rows[8].contains("Kilo editor -- version 0.0.1"), "{:?}", rows[8]);
    assert!(rows[8].starts_with('~'), "{:?}", rows[8]);
    for (i, row) in rows[..24].iter().enumerate() {
        if i != 8 {
            assert_eq!(row, &"~\x1b[K", "row {}", i);
        }
    }
    assert!(out.ends_with("\x1b[2J\x1b[H"), "{:?}", out);
}

macro_rules! test_text_edit {
    ($title:ident {
        before: [$($before:expr),*],
        input: [$($input:expr,)+],
        after: [$($after:expr),*],
        cursor: $cursor:expr,
    }) => {
        #[test]
        fn $title() {
            let before: &[&str] = &[$($before),*];
            let editor = edit_lines(before, vec![$($input,)+]);

            let expected: Vec<&str> = vec![$($after),*];
            assert_eq!(lines_of(&editor), expected);
            assert_eq!(editor.cursor(), $cursor);
        }
    };
}

test_text_edit!(insert_char {
    before: [],
    input: [
        key('a'),
        key('b'),
        sp(DownKey),
        key('c'), // Insert first char to new line
        key('\r'),
        key('d'),
        key('e'),
    ],
    after: ["ab", "c", "de"],
    cursor: (2, 2),
});

test_text_edit!(delete_char {
    before: ["abc", "def", "", "gh"],
    input: [
        backspace(), // Do nothing at head of buffer
        sp(RightKey),
        sp(RightKey),
        sp(RightKey),
        backspace(), // Delete c
        ctrl('h'),   // Delete b
        sp(DownKey),
        sp(DownKey),
        backspace(), // Remove empty line
        backspace(), // Remove f
        sp(PageDownKey), // Move to end of buffer
        backspace(), // Do nothing
        sp(UpKey),
        sp(RightKey),
        backspace(), // Delete g
        backspace(), // Join line
        backspace(), // Delete e
    ],
    after: ["a", "dh"],
    cursor: (1, 1),
});

test_text_edit!(delete_right_char {
    before: ["abc", "de"],
    input: [
        sp(DeleteKey), // Delete a
        sp(RightKey),
        sp(RightKey),
        sp(DeleteKey), // Join next line
        sp(DeleteKey), // Delete d
        sp(DownKey),
        sp(DeleteKey), // Do nothing at end of buffer
        sp(UpKey),
        sp(RightKey),
        sp(RightKey),
        sp(RightKey),
        sp(DeleteKey), // Do nothing at end of last line
    ],
    after: ["bce"],
    cursor: (3, 0),
});

test_text_edit!(insert_line {
    before: ["ab", "cd"],
    input: [
        key('\r'), // Insert empty line above
        sp(RightKey),
        ctrl('m'), // Split 'ab'
        sp(DownKey),
        sp(RightKey),
        sp(RightKey),
        key('\r'), // At end of line
        sp(PageDownKey),
        key('\r'), // At end of buffer
    ],
    after: ["", "a", "b", "cd", "", ""],
    cursor: (0, 6),
});

test_text_edit!(insert_tab {
    before: ["ab"],
    input: [
        sp(RightKey),
        ctrl('i'),
    ],
    after: ["a\tb"],
    cursor: (2, 0),
});

test_text_edit!(join_lines_by_backspace {
    before: ["ab", "cd"],
    input: [
        sp(DownKey),
        backspace(),
    ],
    after: ["abcd"],
    cursor: (2, 0),
});

test_text_edit!(split_and_join_restores_line {
    before: ["hello world"],
    input: [
        sp(RightKey),
        sp(RightKey),
        sp(RightKey),
        sp(RightKey),
        sp(RightKey),
        key('\r'),
        backspace(),
    ],
    after: ["hello world"],
    cursor: (5, 0),
});

test_text_edit!(insert_then_delete_restores_line {
    before: ["abc"],
    input: [
        sp(RightKey),
        key('x'),
        sp(LeftKey),
        sp(DeleteKey),
    ],
    after: ["abc"],
    cursor: (1, 0),
});

test_text_edit!(ignore_unmapped_keys {
    before: ["abc"],
    input: [
        ctrl('a'),
        ctrl('l'),
        key('\x1b'),
        sp(Unidentified),
    ],
    after: ["abc"],
    cursor: (0, 0),
});

#[test]
fn test_left_at_top_of_buffer() {
    let editor = edit_lines(&["ab", "cd"], vec![sp(LeftKey)]);
    assert_eq!(editor.cursor(), (0, 0));
    assert!(!editor.buf().modified());
}

#[test]
fn test_move_cursor_wraps_lines() {
    let editor = edit_lines(&["ab", "cd"], vec![sp(DownKey), sp(LeftKey)]);
    assert_eq!(editor.cursor(), (2, 0));

    let editor = edit_lines(
        &["ab", "cd"],
        vec![sp(RightKey), sp(RightKey), sp(RightKey)],
    );
    assert_eq!(editor.cursor(), (0, 1));

    // Right key at the last line moves cursor to the virtual line after it
    let editor = edit_lines(&["a"], vec![sp(RightKey), sp(RightKey), sp(RightKey)]);
    assert_eq!(editor.cursor(), (0, 1));
}

#[test]
fn test_move_cursor_vertically_snaps_column() {
    let mut input = vec![sp(RightKey); 4];
    input.push(sp(DownKey));
    let editor = edit_lines(&["abcd", "x", "abcd"], input.clone());
    assert_eq!(editor.cursor(), (1, 1));

    input.push(sp(DownKey));
    let editor = edit_lines(&["abcd", "x", "abcd"], input.clone());
    assert_eq!(editor.cursor(), (1, 2));

    input.push(sp(DownKey));
    input.push(sp(DownKey));
    input.push(sp(UpKey));
    let editor = edit_lines(&["abcd", "x", "abcd"], input);
    assert_eq!(editor.cursor(), (0, 2));
}

#[test]
fn test_page_keys() {
    let lines: Vec<String> = (0..50).map(|i| format!("line {}", i)).collect();
    let lines: Vec<&str> = lines.iter().map(String::as_str).collect();

    // 22 rows are available for text in 80x24 window
    let editor = edit_lines(&lines, vec![sp(PageDownKey)]);
    assert_eq!(editor.cursor(), (0, 43));

    let editor = edit_lines(&lines, vec![sp(PageDownKey), sp(PageDownKey)]);
    assert_eq!(editor.cursor(), (0, 50));

    let editor = edit_lines(
        &lines,
        vec![sp(PageDownKey), sp(PageDownKey), sp(PageUpKey)],
    );
    assert_eq!(editor.cursor(), (0, 7));
    assert_eq!(editor.screen().rowoff, 7);

    let editor = edit_lines(&lines, vec![sp(PageUpKey)]);
    assert_eq!(editor.cursor(), (0, 0));
}

#[test]
fn test_page_down_in_short_buffer() {
    let editor = edit_lines(&["a", "b"], vec![sp(PageDownKey)]);
    assert_eq!(editor.cursor(), (0, 2));
}

#[test]
fn test_cursor_after_tab_is_on_tab_stop() {
    let editor = edit_lines(&["a\tb"], vec![sp(RightKey), sp(RightKey)]);
    assert_eq!(editor.cursor(), (2, 0));
    assert_eq!(editor.screen().rx(), 8);
}

#[test]
fn test_save_to_opened_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("opened.txt");
    fs::write(&path, "first\n").unwrap();

    let input = DummyInputs(vec![key('x'), ctrl('s'), ctrl('q')]);
    let mut editor = Editor::open(input, Discard, Some((80, 24)), Some(&path)).unwrap();
    editor.edit().unwrap();

    assert_eq!(fs::read(&path).unwrap(), b"xfirst\n");
    assert!(!editor.buf().modified());
    assert_eq!(editor.screen().message_text(), "7 bytes written to disk");
}

#[test]
fn test_save_unchanged_file_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("same.txt");
    let content = &b"\tindented\n\nline with trailing spaces   \nno newline at end"[..];
    fs::write(&path, content).unwrap();

    let input = DummyInputs(vec![ctrl('s'), ctrl('q')]);
    let mut editor = Editor::open(input, Discard, Some((80, 24)), Some(&path)).unwrap();
    editor.edit().unwrap();

    let mut expected = content.to_vec();
    expected.push(b'\n');
    assert_eq!(fs::read(&path).unwrap(), expected);
}

#[test]
fn test_save_as_new_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("new.txt");
    let path_str = path.to_str().unwrap();

    let mut input = vec![key('h'), key('i'), ctrl('s')];
    input.extend(typed(path_str));
    input.push(ctrl('m'));
    input.push(ctrl('q'));

    let mut editor = Editor::new(DummyInputs(input), Discard, Some((80, 24))).unwrap();
    editor.edit().unwrap();

    assert_eq!(fs::read(&path).unwrap(), b"hi\n");
    assert_eq!(editor.buf().filename(), path_str);
    assert!(!editor.buf().modified());
    assert_eq!(editor.screen().message_text(), "3 bytes written to disk");
}

#[test]
fn test_save_canceled() {
    let input = DummyInputs(vec![key('a'), ctrl('s'), key('b'), key('\x1b'), ctrl('q')]);
    let mut editor = Editor::new(input, Discard, Some((80, 24))).unwrap();
    editor.edit().unwrap();

    assert_eq!(lines_of(&editor), vec!["a"]);
    assert!(!editor.buf().has_file());
    assert!(editor.buf().modified());
    assert_eq!(editor.screen().message_text(), "Save aborted");
}

#[test]
fn test_save_failure() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("no-such-dir").join("file.txt");

    let mut input = vec![key('a'), ctrl('s')];
    input.extend(typed(path.to_str().unwrap()));
    input.push(key('\r'));
    input.push(key('b')); // Editing continues after failure

    let mut editor = Editor::new(DummyInputs(input), Discard, Some((80, 24))).unwrap();
    editor.edit().unwrap();

    let msg = editor.screen().message_text();
    assert!(msg.starts_with("Can't save! I/O error: "), "{}", msg);
    assert!(!editor.buf().has_file());
    assert!(editor.buf().modified());
    assert_eq!(lines_of(&editor), vec!["ab"]);
    assert!(!path.exists());
}

#[test]
fn test_prompt_is_drawn_on_message_bar() {
    let mut out = vec![];
    {
        let input = DummyInputs(vec![ctrl('s'), key('f'), key('\x1b'), ctrl('q')]);
        let mut editor = Editor::new(input, &mut out, Some((80, 24))).unwrap();
        editor.edit().unwrap();
    }
    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("\x1b[KSave as:  (ESC to cancel)"), "{:?}", out);
    assert!(out.contains("\x1b[KSave as: f (ESC to cancel)"), "{:?}", out);
    assert!(out.contains("\x1b[KSave aborted"), "{:?}", out);
}

#[test]
fn test_save_asks_name_again_after_failure() {
    let dir = tempdir().unwrap();
    let bad = dir.path().join("no-such-dir").join("file.txt");
    let good = dir.path().join("file.txt");

    let mut input = vec![key('a'), ctrl('s')];
    input.extend(typed(bad.to_str().unwrap()));
    input.push(key('\r'));
    input.push(ctrl('s')); // Asks a file name again
    input.extend(typed(good.to_str().unwrap()));
    input.push(key('\r'));

    let mut editor = Editor::new(DummyInputs(input), Discard, Some((80, 24))).unwrap();
    editor.edit().unwrap();

    assert_eq!(fs::read(&good).unwrap(), b"a\n");
    assert_eq!(editor.buf().filename(), good.to_str().unwrap());
    assert!(!editor.buf().modified());
}
