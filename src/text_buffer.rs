use crate::error::{Error, Result};
use crate::row::Row;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::slice;

// Contain both actual path sequence and display string
pub struct FilePath {
    pub path: PathBuf,
    pub display: String,
}

impl FilePath {
    fn from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        FilePath {
            path: PathBuf::from(path),
            display: path.to_string_lossy().to_string(),
        }
    }

    fn from_string<S: Into<String>>(s: S) -> Self {
        let display = s.into();
        FilePath {
            path: PathBuf::from(&display),
            display,
        }
    }
}

pub struct Lines<'a>(slice::Iter<'a, Row>);

impl<'a> Iterator for Lines<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|r| r.buffer())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.0.as_slice().len();
        (len, Some(len))
    }
}

// The document. Row level edits go through this struct so that every change bumps the
// dirty counter.
#[derive(Default)]
pub struct TextBuffer {
    // File editor is opening
    file: Option<FilePath>,
    // Lines of text buffer
    row: Vec<Row>,
    // Number of changes since the buffer was loaded or saved. 0 means unmodified
    dirty: usize,
}

impl TextBuffer {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_lines<B, I>(lines: I) -> Self
    where
        B: Into<Vec<u8>>,
        I: IntoIterator<Item = B>,
    {
        Self {
            file: None,
            row: lines.into_iter().map(Row::new).collect(),
            dirty: 0,
        }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let open_error = |err: io::Error| Error::OpenFile(path.to_path_buf(), err);
        let file = File::open(path).map_err(open_error)?;

        let mut row = vec![];
        for line in io::BufReader::new(file).split(b'\n') {
            let mut line = line.map_err(open_error)?;
            while let Some(&b'\n') | Some(&b'\r') = line.last() {
                line.pop();
            }
            row.push(Row::new(line));
        }

        tracing::info!(path = %path.display(), lines = row.len(), "opened file");
        Ok(Self {
            file: Some(FilePath::from(path)),
            row,
            dirty: 0,
        })
    }

    pub fn insert_row<B: Into<Vec<u8>>>(&mut self, at: usize, line: B) {
        if at > self.row.len() {
            return;
        }
        self.row.insert(at, Row::new(line));
        self.dirty += 1;
    }

    pub fn delete_row(&mut self, at: usize) {
        if at >= self.row.len() {
            return;
        }
        self.row.remove(at);
        self.dirty += 1;
    }

    pub fn insert_char(&mut self, y: usize, at: usize, b: u8) {
        if let Some(row) = self.row.get_mut(y) {
            row.insert_char(at, b);
            self.dirty += 1;
        }
    }

    pub fn delete_char(&mut self, y: usize, at: usize) {
        if let Some(row) = self.row.get_mut(y) {
            if row.delete_char(at) {
                self.dirty += 1;
            }
        }
    }

    pub fn append_string(&mut self, y: usize, s: &[u8]) {
        if let Some(row) = self.row.get_mut(y) {
            row.append(s);
            self.dirty += 1;
        }
    }

    // Splits the row `y` at `at`. The bytes after `at` become a new row just below it
    pub fn split_row(&mut self, y: usize, at: usize) {
        if let Some(row) = self.row.get_mut(y) {
            let rest = row.split_off(at);
            self.insert_row(y + 1, rest);
        }
    }

    // Joins the row `y` onto the end of the row `y - 1`
    pub fn join_row(&mut self, y: usize) {
        if y == 0 || y >= self.row.len() {
            return;
        }
        let removed = self.row.remove(y);
        self.append_string(y - 1, removed.buffer());
    }

    pub fn rows_to_text(&self) -> Vec<u8> {
        let cap = self.row.iter().fold(0, |acc, row| acc + row.len() + 1);
        let mut text = Vec::with_capacity(cap);
        for row in self.row.iter() {
            text.extend_from_slice(row.buffer());
            text.push(b'\n');
        }
        text
    }

    // Writes the buffer to the bound file and returns the number of bytes written. The
    // dirty counter is cleared only on success
    pub fn save(&mut self) -> io::Result<usize> {
        let file = match &self.file {
            Some(file) => file,
            None => return Err(io::Error::new(io::ErrorKind::NotFound, "No file name")),
        };

        let text = self.rows_to_text();
        let mut f = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .mode(0o644)
            .open(&file.path)?;
        f.set_len(text.len() as u64)?;
        f.write_all(&text)?;
        f.flush()?;

        tracing::info!(path = %file.display, bytes = text.len(), "saved file");
        self.dirty = 0;
        Ok(text.len())
    }

    pub fn rows(&self) -> &[Row] {
        &self.row
    }

    pub fn row(&self, y: usize) -> Option<&Row> {
        self.row.get(y)
    }

    pub fn has_file(&self) -> bool {
        self.file.is_some()
    }

    pub fn filename(&self) -> &str {
        self.file
            .as_ref()
            .map(|f| f.display.as_str())
            .unwrap_or("[NO NAME]")
    }

    pub fn dirty(&self) -> usize {
        self.dirty
    }

    pub fn modified(&self) -> bool {
        self.dirty > 0
    }

    pub fn lines(&self) -> Lines<'_> {
        Lines(self.row.iter())
    }

    pub fn set_file<S: Into<String>>(&mut self, file_path: S) {
        self.file = Some(FilePath::from_string(file_path));
    }

    pub fn set_unnamed(&mut self) {
        self.file = None;
    }
}
