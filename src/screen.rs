use crate::error::{Error, Result};
use crate::status_bar::StatusBar;
use crate::text_buffer::TextBuffer;
use signal_hook::consts::SIGWINCH;
use signal_hook::SigId;
use std::cmp;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const HELP: &str = "HELP: Ctrl-S = save | Ctrl-Q = quit";

const MESSAGE_LIFETIME: Duration = Duration::from_secs(5);

#[derive(PartialEq, Clone, Copy, Debug)]
enum StatusMessageKind {
    Info,
    Error,
}

struct StatusMessage {
    text: String,
    timestamp: SystemTime,
    kind: StatusMessageKind,
}

impl StatusMessage {
    fn new<S: Into<String>>(message: S, kind: StatusMessageKind) -> StatusMessage {
        StatusMessage {
            text: message.into(),
            timestamp: SystemTime::now(),
            kind,
        }
    }

    fn is_alive(&self) -> bool {
        // When the clock went backwards, consider the message expired
        match SystemTime::now().duration_since(self.timestamp) {
            Ok(d) => d < MESSAGE_LIFETIME,
            Err(_) => false,
        }
    }
}

fn check_window_size(w: usize, h: usize) -> Result<()> {
    if w == 0 || h < 3 {
        Err(Error::TooSmallWindow(w, h))
    } else {
        Ok(())
    }
}

type SizeQuery = Box<dyn Fn() -> Option<(usize, usize)>>;

// Window size source which can change while editing. `pending` is raised when the size
// may have changed and the size is queried again on the next key press
pub struct WindowResize {
    pending: Arc<AtomicBool>,
    query: SizeQuery,
    signal_id: Option<SigId>,
}

impl WindowResize {
    // Size of the terminal connected to stdout, raised by SIGWINCH. Nothing but the flag is
    // touched in the signal handler
    pub fn terminal() -> Result<Self> {
        let pending = Arc::new(AtomicBool::new(false));
        let signal_id = signal_hook::flag::register(SIGWINCH, Arc::clone(&pending))?;
        Ok(Self {
            pending,
            query: Box::new(term_size::dimensions_stdout),
            signal_id: Some(signal_id),
        })
    }

    pub fn with_query<F>(pending: Arc<AtomicBool>, query: F) -> Self
    where
        F: Fn() -> Option<(usize, usize)> + 'static,
    {
        Self {
            pending,
            query: Box::new(query),
            signal_id: None,
        }
    }

    fn size(&self) -> Result<(usize, usize)> {
        (self.query)().ok_or(Error::UnknownWindowSize)
    }

    fn take_pending(&self) -> bool {
        self.pending.swap(false, Ordering::Relaxed)
    }
}

impl Drop for WindowResize {
    fn drop(&mut self) {
        if let Some(id) = self.signal_id.take() {
            signal_hook::low_level::unregister(id);
        }
    }
}

pub struct Screen<W: Write> {
    output: W,
    // X coordinate in `render` text of rows
    rx: usize,
    // Screen size. Rows exclude status bar and message bar
    num_cols: usize,
    num_rows: usize,
    message: Option<StatusMessage>,
    // None when the window size is fixed
    resize: Option<WindowResize>,
    // Scroll position (row/col offset)
    pub rowoff: usize,
    pub coloff: usize,
}

impl<W: Write> Screen<W> {
    // `window_size` is (width, height) of the whole window. When it is None, the size is
    // taken from the terminal and follows its resizes
    pub fn new(window_size: Option<(usize, usize)>, output: W) -> Result<Self> {
        match window_size {
            Some(size) => Self::with_size(size, output, None),
            None => Self::with_resize(output, WindowResize::terminal()?),
        }
    }

    pub fn with_resize(output: W, resize: WindowResize) -> Result<Self> {
        let size = resize.size()?;
        Self::with_size(size, output, Some(resize))
    }

    fn with_size(
        (w, h): (usize, usize),
        output: W,
        resize: Option<WindowResize>,
    ) -> Result<Self> {
        check_window_size(w, h)?;
        tracing::debug!(width = w, height = h, "screen initialized");

        Ok(Self {
            output,
            rx: 0,
            num_cols: w,
            // Screen height is 2 lines less than window height due to status bar and message bar
            num_rows: h - 2,
            message: Some(StatusMessage::new(HELP, StatusMessageKind::Info)),
            resize,
            rowoff: 0,
            coloff: 0,
        })
    }

    fn draw_welcome_message<B: Write>(&self, mut buf: B) -> io::Result<()> {
        let msg_buf = format!("Kilo editor -- version {}", VERSION);
        let welcome = &msg_buf[..cmp::min(msg_buf.len(), self.num_cols)];
        let padding = (self.num_cols - welcome.len()) / 2;
        if padding > 0 {
            buf.write_all(b"~")?;
            for _ in 0..padding - 1 {
                buf.write_all(b" ")?;
            }
        }
        buf.write_all(welcome.as_bytes())
    }

    fn draw_rows<B: Write>(&self, mut buf: B, text: &TextBuffer) -> io::Result<()> {
        let rows = text.rows();

        for y in 0..self.num_rows {
            let file_row = y + self.rowoff;

            if file_row >= rows.len() {
                if rows.is_empty() && y == self.num_rows / 3 {
                    self.draw_welcome_message(&mut buf)?;
                } else {
                    buf.write_all(b"~")?;
                }
            } else {
                let render = rows[file_row].render_text();
                if self.coloff < render.len() {
                    let end = cmp::min(render.len(), self.coloff + self.num_cols);
                    buf.write_all(&render[self.coloff..end])?;
                }
            }

            // Erases the part of the line to the right of the cursor. http://vt100.net/docs/vt100-ug/chapter3.html#EL
            buf.write_all(b"\x1b[K")?;
            buf.write_all(b"\r\n")?;
        }

        Ok(())
    }

    fn draw_status_bar<B: Write>(&self, mut buf: B, status_bar: &StatusBar) -> io::Result<()> {
        // 'm' sets attributes to text printed after. 7 is inverse video https://vt100.net/docs/vt100-ug/chapter3.html#SGR
        buf.write_all(b"\x1b[7m")?;
        buf.write_all(&status_bar.line(self.num_cols))?;
        // Default argument of 'm' command is 0 so it resets attributes
        buf.write_all(b"\x1b[m")?;
        buf.write_all(b"\r\n")
    }

    fn draw_message_bar<B: Write>(&self, mut buf: B) -> io::Result<()> {
        buf.write_all(b"\x1b[K")?;
        if let Some(message) = self.message.as_ref().filter(|m| m.is_alive()) {
            let msg = &message.text.as_bytes()[..cmp::min(message.text.len(), self.num_cols)];
            if message.kind == StatusMessageKind::Error {
                // Red background
                buf.write_all(b"\x1b[41m")?;
                buf.write_all(msg)?;
                buf.write_all(b"\x1b[m")?;
            } else {
                buf.write_all(msg)?;
            }
        }
        Ok(())
    }

    // Builds a whole frame for current state. Nothing is written to the output here
    pub fn frame(&self, text: &TextBuffer, cursor: (usize, usize)) -> io::Result<Vec<u8>> {
        let (_, cy) = cursor;
        let mut buf = Vec::with_capacity((self.num_rows + 2) * self.num_cols);

        // \x1b[: Escape sequence header
        // Hide cursor while updating screen. 'l' is command to set mode http://vt100.net/docs/vt100-ug/chapter3.html#SM
        buf.write_all(b"\x1b[?25l")?;
        // H: Command to move cursor. Here \x1b[H is the same as \x1b[1;1H
        buf.write_all(b"\x1b[H")?;

        self.draw_rows(&mut buf, text)?;
        self.draw_status_bar(&mut buf, &StatusBar::from_buffer(text, cursor))?;
        self.draw_message_bar(&mut buf)?;

        // Move cursor
        let cursor_row = cy.saturating_sub(self.rowoff) + 1;
        let cursor_col = self.rx.saturating_sub(self.coloff) + 1;
        write!(buf, "\x1b[{};{}H", cursor_row, cursor_col)?;

        // Reveal cursor again. 'h' is command to reset mode https://vt100.net/docs/vt100-ug/chapter3.html#RM
        buf.write_all(b"\x1b[?25h")?;

        Ok(buf)
    }

    // Moves the viewport only as far as needed to contain the cursor
    pub fn do_scroll(&mut self, text: &TextBuffer, cursor: (usize, usize)) {
        let (cx, cy) = cursor;
        let prev = (self.rowoff, self.coloff);

        // Calculate X coordinate to render considering tab stop
        self.rx = text.row(cy).map(|r| r.rx_from_cx(cx)).unwrap_or(0);

        // Adjust scroll position when cursor is outside screen
        if cy < self.rowoff {
            // Scroll up when cursor is above the top of window
            self.rowoff = cy;
        }
        if cy >= self.rowoff + self.num_rows {
            // Scroll down when cursor is below the bottom of screen
            self.rowoff = cy - self.num_rows + 1;
        }
        if self.rx < self.coloff {
            self.coloff = self.rx;
        }
        if self.rx >= self.coloff + self.num_cols {
            self.coloff = self.rx - self.num_cols + 1;
        }

        if prev != (self.rowoff, self.coloff) {
            tracing::trace!(rowoff = self.rowoff, coloff = self.coloff, "scrolled");
        }
    }

    // Writes one frame to the output at once to avoid flickering
    pub fn render(&mut self, text: &TextBuffer, cursor: (usize, usize)) -> Result<()> {
        self.do_scroll(text, cursor);
        let frame = self.frame(text, cursor)?;
        self.output.write_all(&frame)?;
        self.output.flush()?;
        Ok(())
    }

    pub fn clear(&mut self) -> Result<()> {
        // 2: Argument of 'J' command to reset entire screen
        // J: Command to erase screen http://vt100.net/docs/vt100-ug/chapter3.html#ED
        self.output.write_all(b"\x1b[2J")?;
        // Set cursor position to left-top corner
        self.output.write_all(b"\x1b[H")?;
        self.output.flush()?;
        Ok(())
    }

    // Returns true when window size was changed since last call. Scroll offsets are clamped
    // to the new size by the next `do_scroll`
    pub fn maybe_resize(&mut self) -> Result<bool> {
        let (w, h) = match self.resize.as_ref() {
            Some(resize) if resize.take_pending() => resize.size()?,
            _ => return Ok(false),
        };

        check_window_size(w, h)?;
        self.num_cols = w;
        self.num_rows = h - 2;
        tracing::debug!(width = w, height = h, "window resized");
        Ok(true)
    }

    pub fn set_info_message<S: Into<String>>(&mut self, message: S) {
        self.message = Some(StatusMessage::new(message, StatusMessageKind::Info));
    }

    pub fn set_error_message<S: Into<String>>(&mut self, message: S) {
        self.message = Some(StatusMessage::new(message, StatusMessageKind::Error));
    }

    pub fn unset_message(&mut self) {
        self.message = None;
    }

    pub fn message_text(&self) -> &str {
        self.message.as_ref().map(|m| m.text.as_str()).unwrap_or("")
    }

    pub fn rows(&self) -> usize {
        self.num_rows
    }

    pub fn cols(&self) -> usize {
        self.num_cols
    }

    pub fn rx(&self) -> usize {
        self.rx
    }
}
