// Refs:
//   Build Your Own Text Editor: https://viewsourcecode.org/snaptoken/kilo/index.html
//   VT100 User Guide: https://vt100.net/docs/vt100-ug/chapter3.html

mod editor;
mod error;
mod input;
mod logging;
mod prompt;
mod row;
mod screen;
mod status_bar;
mod text_buffer;

pub use editor::{CursorDir, Editor, PageDir};
pub use error::{Error, Result};
pub use input::{InputSeq, InputSequences, KeySeq, StdinRawMode};
pub use logging::init_file_logging;
pub use prompt::PromptResult;
pub use row::{Row, TAB_STOP};
pub use screen::{Screen, WindowResize, HELP, VERSION};
pub use status_bar::StatusBar;
pub use text_buffer::{Lines, TextBuffer};

#[cfg(test)]
mod ui_test;
