use crate::error::Result;
use crate::input::{InputSeq, KeySeq};
use crate::prompt::{Prompt, PromptResult};
use crate::screen::Screen;
use crate::text_buffer::{Lines, TextBuffer};
use std::io::Write;
use std::path::Path;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum CursorDir {
    Left,
    Right,
    Up,
    Down,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum PageDir {
    Up,
    Down,
}

pub struct Editor<I: Iterator<Item = Result<InputSeq>>, W: Write> {
    input: I, // Escape sequences stream represented as Iterator
    screen: Screen<W>,
    buf: TextBuffer,
    // (x, y) coordinate in internal text buffer of rows. cy == number of rows is the
    // position just after the last line
    cx: usize,
    cy: usize,
}

impl<I, W> Editor<I, W>
where
    I: Iterator<Item = Result<InputSeq>>,
    W: Write,
{
    fn with_buf(
        buf: TextBuffer,
        input: I,
        output: W,
        window_size: Option<(usize, usize)>,
    ) -> Result<Editor<I, W>> {
        let screen = Screen::new(window_size, output)?;
        Ok(Editor {
            input,
            screen,
            buf,
            cx: 0,
            cy: 0,
        })
    }

    pub fn new(input: I, output: W, window_size: Option<(usize, usize)>) -> Result<Editor<I, W>> {
        Self::with_buf(TextBuffer::empty(), input, output, window_size)
    }

    pub fn with_lines<B, L>(
        lines: L,
        input: I,
        output: W,
        window_size: Option<(usize, usize)>,
    ) -> Result<Editor<I, W>>
    where
        B: Into<Vec<u8>>,
        L: IntoIterator<Item = B>,
    {
        Self::with_buf(TextBuffer::with_lines(lines), input, output, window_size)
    }

    pub fn open<P: AsRef<Path>>(
        input: I,
        output: W,
        window_size: Option<(usize, usize)>,
        path: Option<P>,
    ) -> Result<Editor<I, W>> {
        let buf = match path {
            Some(path) => TextBuffer::open(path)?,
            None => TextBuffer::empty(),
        };
        Self::with_buf(buf, input, output, window_size)
    }

    fn num_rows(&self) -> usize {
        self.buf.rows().len()
    }

    fn row_len(&self, y: usize) -> usize {
        self.buf.row(y).map(|r| r.len()).unwrap_or(0)
    }

    fn render_screen(&mut self) -> Result<()> {
        self.screen.render(&self.buf, (self.cx, self.cy))
    }

    pub fn move_cursor_one(&mut self, dir: CursorDir) {
        match dir {
            CursorDir::Up => self.cy = self.cy.saturating_sub(1),
            CursorDir::Left => {
                if self.cx > 0 {
                    self.cx -= 1;
                } else if self.cy > 0 {
                    // When moving to left at top of line, move cursor to end of previous line
                    self.cy -= 1;
                    self.cx = self.row_len(self.cy);
                }
            }
            CursorDir::Down => {
                // Allow to move cursor until next line to the last line of file to enable to add a
                // new line at the end.
                if self.cy < self.num_rows() {
                    self.cy += 1;
                }
            }
            CursorDir::Right => {
                if self.cy < self.num_rows() {
                    if self.cx < self.row_len(self.cy) {
                        // Allow to move cursor until next col to the last col of line to enable to
                        // add a new character at the end of line.
                        self.cx += 1;
                    } else {
                        // When moving to right at the end of line, move cursor to top of next line.
                        self.cy += 1;
                        self.cx = 0;
                    }
                }
            }
        };

        // Snap cursor to end of line when moving up/down from longer line
        let len = self.row_len(self.cy);
        if self.cx > len {
            self.cx = len;
        }
    }

    pub fn move_cursor_page(&mut self, dir: PageDir) {
        let (rowoff, num_rows) = (self.screen.rowoff, self.screen.rows());
        let (cy, step) = match dir {
            PageDir::Up => (rowoff, CursorDir::Up), // Top of screen
            // Bottom of screen. The last line of the buffer when it is on the screen
            PageDir::Down => ((rowoff + num_rows - 1).min(self.num_rows()), CursorDir::Down),
        };
        self.cy = cy;
        for _ in 0..num_rows {
            self.move_cursor_one(step);
        }
    }

    pub fn insert_char(&mut self, b: u8) {
        if self.cy == self.num_rows() {
            self.buf.insert_row(self.cy, "");
        }
        self.buf.insert_char(self.cy, self.cx, b);
        self.cx += 1;
    }

    pub fn insert_line(&mut self) {
        if self.cx == 0 {
            self.buf.insert_row(self.cy, "");
        } else {
            self.buf.split_row(self.cy, self.cx);
        }
        self.cy += 1;
        self.cx = 0;
    }

    // Deletes the character before the cursor. At the head of line, joins the line to the
    // previous line
    pub fn delete_char(&mut self) {
        if self.cy == self.num_rows() || self.cx == 0 && self.cy == 0 {
            return;
        }
        if self.cx > 0 {
            self.buf.delete_char(self.cy, self.cx - 1);
            self.cx -= 1;
        } else {
            self.cx = self.row_len(self.cy - 1);
            self.buf.join_row(self.cy);
            self.cy -= 1;
        }
    }

    // Deletes the character under the cursor. At the end of line, joins the next line. The
    // cursor never moves, so Delete at the end of the last line is a no-op and the cursor
    // does not step onto the line after the buffer
    pub fn delete_right_char(&mut self) {
        if self.cy >= self.num_rows() {
            return;
        }
        if self.cx < self.row_len(self.cy) {
            self.buf.delete_char(self.cy, self.cx);
        } else if self.cy + 1 < self.num_rows() {
            self.buf.join_row(self.cy + 1);
        }
    }

    fn prompt<S: AsRef<str>>(&mut self, prompt: S) -> Result<PromptResult> {
        Prompt::new(&mut self.screen, &self.buf, (self.cx, self.cy)).run(prompt, &mut self.input)
    }

    fn save(&mut self) -> Result<()> {
        let mut create = false;
        if !self.buf.has_file() {
            match self.prompt("Save as: {} (ESC to cancel)")? {
                PromptResult::Input(input) => {
                    self.buf.set_file(input);
                    create = true;
                }
                PromptResult::Canceled => {
                    self.screen.set_info_message("Save aborted");
                    return Ok(());
                }
            }
        }

        match self.buf.save() {
            Ok(bytes) => self
                .screen
                .set_info_message(format!("{} bytes written to disk", bytes)),
            Err(err) => {
                tracing::warn!(file = self.buf.filename(), %err, "could not save");
                self.screen
                    .set_error_message(format!("Can't save! I/O error: {}", err));
                // A name typed at the prompt is forgotten when it could not be written, so the
                // next save asks for a name again instead of retrying the same path
                if create {
                    self.buf.set_unnamed();
                }
            }
        }

        Ok(())
    }

    // Returns true when the editor should quit
    fn process_keypress(&mut self, s: InputSeq) -> Result<bool> {
        use KeySeq::*;

        if s.key != Unidentified {
            tracing::trace!(key = %s, cx = self.cx, cy = self.cy, "key");
        }

        match (s.key, s.ctrl) {
            (Unidentified, ..) => {} // Read timed out. Redraw to expire status message
            (Key(b'q'), true) => return Ok(true),
            (Key(b's'), true) => self.save()?,
            (Key(b'm'), true) | (Key(b'\r'), false) => self.insert_line(),
            (Key(b'h'), true) | (Key(0x7f), false) => self.delete_char(),
            (Key(b'i'), true) => self.insert_char(b'\t'),
            (Key(b'l'), true) | (Key(0x1b), false) => {} // Screen is refreshed after any key
            (Key(b), false) => self.insert_char(b),
            (UpKey, ..) => self.move_cursor_one(CursorDir::Up),
            (LeftKey, ..) => self.move_cursor_one(CursorDir::Left),
            (DownKey, ..) => self.move_cursor_one(CursorDir::Down),
            (RightKey, ..) => self.move_cursor_one(CursorDir::Right),
            (PageUpKey, ..) => self.move_cursor_page(PageDir::Up),
            (PageDownKey, ..) => self.move_cursor_page(PageDir::Down),
            (DeleteKey, ..) => self.delete_right_char(),
            (Key(_), true) => tracing::debug!(key = %s, "key not mapped"),
        }

        Ok(false)
    }

    pub fn edit(&mut self) -> Result<()> {
        self.render_screen()?; // First paint

        while let Some(seq) = self.input.next() {
            // Whole screen is redrawn on every key so nothing else is needed on resize
            self.screen.maybe_resize()?;

            if self.process_keypress(seq?)? {
                break;
            }

            self.render_screen()?;
        }

        self.screen.clear() // Finally clear screen on exit
    }

    pub fn lines(&self) -> Lines<'_> {
        self.buf.lines()
    }

    pub fn buf(&self) -> &TextBuffer {
        &self.buf
    }

    pub fn screen(&self) -> &Screen<W> {
        &self.screen
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.cx, self.cy)
    }
}
