use crate::text_buffer::TextBuffer;

#[derive(Default, Debug, PartialEq)]
pub struct StatusBar {
    pub modified: bool,
    pub filename: String,
    pub num_lines: usize,
    // 1-based (row, col) of the cursor
    pub cursor_pos: (usize, usize),
}

impl StatusBar {
    pub fn from_buffer(buf: &TextBuffer, (cx, cy): (usize, usize)) -> Self {
        Self {
            modified: buf.modified(),
            filename: buf.filename().to_string(),
            num_lines: buf.rows().len(),
            cursor_pos: (cy + 1, cx + 1),
        }
    }

    pub fn left(&self) -> String {
        format!(
            "{:.20} - {} lines {}",
            self.filename,
            self.num_lines,
            if self.modified { "(modified)" } else { "" }
        )
    }

    pub fn right(&self) -> String {
        let (row, col) = self.cursor_pos;
        format!("row:{} - col:{}", row, col)
    }

    // Builds the whole bar exactly `width` bytes long when the left part fits. The right part
    // is shown only when it fits in the space left after the left part.
    pub fn line(&self, width: usize) -> Vec<u8> {
        let left = self.left();
        let right = self.right();
        let left = &left.as_bytes()[..left.len().min(width)];

        let mut line = Vec::with_capacity(width);
        line.extend_from_slice(left);
        let rest = width - left.len();
        if right.len() <= rest {
            line.resize(width - right.len(), b' ');
            line.extend_from_slice(right.as_bytes());
        } else {
            line.resize(width, b' ');
        }
        line
    }
}
