use crate::error::Result;
use std::fmt;
use std::io::{self, Read};
use std::os::unix::io::AsRawFd;

// Puts stdin into raw mode while alive. The original terminal mode is restored on drop, so
// keeping this value on the stack of main() restores the terminal on every exit path
// including unwinding panics.
pub struct StdinRawMode {
    stdin: io::Stdin,
    orig: termios::Termios,
}

impl StdinRawMode {
    pub fn new() -> Result<StdinRawMode> {
        use termios::*;

        let stdin = io::stdin();
        let fd = stdin.as_raw_fd();
        let mut termios = Termios::from_fd(fd)?;
        let orig = termios;

        // Set terminal raw mode. Disable echo back, canonical mode, signals (SIGINT, SIGTSTP) and Ctrl+V.
        termios.c_lflag &= !(ECHO | ICANON | ISIG | IEXTEN);
        // Disable control flow mode (Ctrl+Q/Ctrl+S) and CR-to-NL translation
        termios.c_iflag &= !(IXON | ICRNL | BRKINT | INPCK | ISTRIP);
        // Disable output processing such as \n to \r\n translation
        termios.c_oflag &= !OPOST;
        // Ensure character size is 8bits
        termios.c_cflag |= CS8;
        // Do not wait for next byte with blocking since reading 0 byte is permitted
        termios.c_cc[VMIN] = 0;
        // Set read timeout to 1/10 second it enables 100ms timeout on read()
        termios.c_cc[VTIME] = 1;
        // Apply terminal configurations
        tcsetattr(fd, TCSAFLUSH, &termios)?;

        tracing::debug!("entered raw mode");
        Ok(StdinRawMode { stdin, orig })
    }

    pub fn input_keys(self) -> InputSequences<StdinRawMode> {
        InputSequences::new(self)
    }
}

impl Drop for StdinRawMode {
    fn drop(&mut self) {
        // Restore original terminal mode
        if let Err(err) = termios::tcsetattr(self.stdin.as_raw_fd(), termios::TCSAFLUSH, &self.orig)
        {
            tracing::error!(%err, "could not restore terminal mode");
        }
    }
}

impl Read for StdinRawMode {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stdin.read(buf)
    }
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum KeySeq {
    Unidentified, // Read timed out before any byte arrived
    Key(u8),
    LeftKey,
    RightKey,
    UpKey,
    DownKey,
    PageUpKey,
    PageDownKey,
    DeleteKey,
}

impl fmt::Display for KeySeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use KeySeq::*;
        match self {
            Unidentified => write!(f, "UNKNOWN"),
            Key(b' ') => write!(f, "SPACE"),
            Key(0x1b) => write!(f, "ESC"),
            Key(0x7f) => write!(f, "BACKSPACE"),
            Key(b) if b.is_ascii_control() || !b.is_ascii() => write!(f, "\\x{:x}", b),
            Key(b) => write!(f, "{}", *b as char),
            LeftKey => write!(f, "LEFT"),
            RightKey => write!(f, "RIGHT"),
            UpKey => write!(f, "UP"),
            DownKey => write!(f, "DOWN"),
            PageUpKey => write!(f, "PAGEUP"),
            PageDownKey => write!(f, "PAGEDOWN"),
            DeleteKey => write!(f, "DELETE"),
        }
    }
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub struct InputSeq {
    pub key: KeySeq,
    pub ctrl: bool,
}

impl InputSeq {
    pub fn new(key: KeySeq) -> Self {
        Self { key, ctrl: false }
    }

    pub fn ctrl(key: KeySeq) -> Self {
        Self { key, ctrl: true }
    }
}

impl fmt::Display for InputSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            write!(f, "C-")?;
        }
        write!(f, "{}", self.key)
    }
}

// Decodes terminal input into key sequences. Reading zero bytes from `input` means that the
// read timed out, which is how an incomplete escape sequence is told apart from ESC key.
pub struct InputSequences<R: Read> {
    input: R,
}

impl<R: Read> InputSequences<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut one_byte: [u8; 1] = [0];
        match self.input.read(&mut one_byte) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(one_byte[0])),
            // SIGWINCH interrupts read(2). It is the same as timeout
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn decode_escape_sequence(&mut self) -> Result<InputSeq> {
        use KeySeq::*;

        let esc = InputSeq::new(Key(0x1b));

        // If the next two bytes do not arrive within the timeout, it was ESC key itself
        let first = match self.read_byte()? {
            Some(b) => b,
            None => return Ok(esc),
        };
        let second = match self.read_byte()? {
            Some(b) => b,
            None => return Ok(esc),
        };

        if first != b'[' {
            return Ok(esc);
        }

        if second.is_ascii_digit() {
            // e.g. \x1b[5~
            match self.read_byte()? {
                Some(b'~') => {}
                _ => return Ok(esc),
            }
            let key = match second {
                b'3' => DeleteKey,
                b'5' => PageUpKey,
                b'6' => PageDownKey,
                _ => return Ok(esc),
            };
            return Ok(InputSeq::new(key));
        }

        // e.g. <LEFT> => \x1b[D
        let key = match second {
            b'A' => UpKey,
            b'B' => DownKey,
            b'C' => RightKey,
            b'D' => LeftKey,
            _ => return Ok(esc),
        };
        Ok(InputSeq::new(key))
    }

    fn decode(&mut self, b: u8) -> Result<InputSeq> {
        use KeySeq::*;
        match b {
            // (Maybe) Escape sequence. Ctrl-[ is not available due to this
            0x1b => self.decode_escape_sequence(),
            // Ctrl-SPACE and Ctrl-?. 0x40, 0x3f, 0x60, 0x5f are not available
            0x00 | 0x1f => Ok(InputSeq::ctrl(Key(b | 0b0010_0000))),
            // Ctrl-\ and Ctrl-]. 0x3c, 0x3d, 0x7c, 0x7d are not available
            0x1c | 0x1d => Ok(InputSeq::ctrl(Key(b | 0b0100_0000))),
            // 0x00~0x1f keys are ascii keys with ctrl. Ctrl mod masks key with 0b11111.
            // Here unmask it with 0b1100000. It only works with 0x61~0x7f.
            0x00..=0x1f => Ok(InputSeq::ctrl(Key(b | 0b0110_0000))),
            // Printable ascii, backspace (0x7f) and raw non-ascii bytes
            0x20..=0xff => Ok(InputSeq::new(Key(b))),
        }
    }

    pub fn next_key(&mut self) -> Result<InputSeq> {
        if let Some(b) = self.read_byte()? {
            self.decode(b)
        } else {
            Ok(InputSeq::new(KeySeq::Unidentified))
        }
    }
}

impl<R: Read> Iterator for InputSequences<R> {
    type Item = Result<InputSeq>;

    // Read next byte from input with timeout 100ms. If nothing was read, it returns
    // Unidentified. This method never returns None so for loop never ends
    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_key())
    }
}
