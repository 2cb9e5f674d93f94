use crate::error::Result;
use crate::input::{InputSeq, KeySeq};
use crate::screen::Screen;
use crate::text_buffer::TextBuffer;
use std::io::Write;

#[derive(PartialEq, Debug)]
pub enum PromptResult {
    Canceled,
    Input(String),
}

struct PromptTemplate<'a> {
    prefix: &'a str,
    suffix: &'a str,
}

impl<'a> PromptTemplate<'a> {
    // `{}` in the prompt is replaced with user input
    fn parse(prompt: &'a str) -> Self {
        let mut it = prompt.splitn(2, "{}");
        let prefix = it.next().unwrap_or("");
        let suffix = it.next().unwrap_or("");
        PromptTemplate { prefix, suffix }
    }

    fn build(&self, input: &str) -> String {
        let cap = self.prefix.len() + self.suffix.len() + input.len();
        let mut buf = String::with_capacity(cap);
        buf.push_str(self.prefix);
        buf.push_str(input);
        buf.push_str(self.suffix);
        buf
    }
}

// Modal line input on the message bar. Text buffer is rendered as usual while typing
pub struct Prompt<'a, W: Write> {
    screen: &'a mut Screen<W>,
    buf: &'a TextBuffer,
    cursor: (usize, usize),
}

impl<'a, W: Write> Prompt<'a, W> {
    pub fn new(screen: &'a mut Screen<W>, buf: &'a TextBuffer, cursor: (usize, usize)) -> Self {
        Self {
            screen,
            buf,
            cursor,
        }
    }

    fn render_screen(&mut self, input: &str, template: &PromptTemplate<'_>) -> Result<()> {
        self.screen.set_info_message(template.build(input));
        self.screen.render(self.buf, self.cursor)
    }

    pub fn run<S, I>(&mut self, prompt: S, mut input: I) -> Result<PromptResult>
    where
        S: AsRef<str>,
        I: Iterator<Item = Result<InputSeq>>,
    {
        let template = PromptTemplate::parse(prompt.as_ref());
        let mut buf = String::new();
        let mut canceled = true; // Input stream ended before Enter

        self.render_screen("", &template)?;

        while let Some(seq) = input.next() {
            use KeySeq::*;

            let resized = self.screen.maybe_resize()?;
            let seq = seq?;
            let prev_len = buf.len();

            match (seq.key, seq.ctrl) {
                (Unidentified, ..) => {}
                (Key(b'h'), true) | (Key(0x7f), false) | (DeleteKey, ..) => {
                    buf.pop();
                }
                (Key(0x1b), false) => break,
                (Key(b'm'), true) | (Key(b'\r'), false) => {
                    // Empty input is not accepted
                    if !buf.is_empty() {
                        canceled = false;
                        break;
                    }
                }
                (Key(b), false) if b.is_ascii() && !b.is_ascii_control() => buf.push(b as char),
                _ => {}
            }

            if resized || prev_len != buf.len() {
                self.render_screen(&buf, &template)?;
            }
        }

        self.screen.unset_message();
        if canceled {
            tracing::debug!("prompt canceled");
            Ok(PromptResult::Canceled)
        } else {
            Ok(PromptResult::Input(buf))
        }
    }
}
