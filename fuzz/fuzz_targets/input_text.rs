#![no_main]
use libfuzzer_sys::fuzz_target;
extern crate kilo_editor;

use kilo_editor::{Editor, InputSeq, InputSequences, KeySeq};
use std::io::{self, Write};
use std::iter;

struct Discard;

impl Write for Discard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn is_save(seq: &InputSeq) -> bool {
    seq.ctrl && seq.key == KeySeq::Key(b's')
}

fuzz_target!(|data: &[u8]| {
    // The same bytes are used as both initial text and keystrokes. Decoder yields timeouts
    // forever at end of input, so the stream is bounded and then terminated with Ctrl-Q
    let lines = data.split(|b| *b == b'\n');
    let keys = InputSequences::new(data)
        .take(data.len() + 1)
        .filter(|seq| !matches!(seq, Ok(s) if is_save(s))) // Never write files while fuzzing
        .chain(iter::once(Ok(InputSeq::ctrl(KeySeq::Key(b'q')))));

    let mut editor = Editor::with_lines(lines, keys, Discard, Some((80, 24))).unwrap();
    editor.edit().unwrap(); // Editor must quit successfully
});
