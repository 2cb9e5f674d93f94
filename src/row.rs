use std::ops;

pub const TAB_STOP: usize = 8;

// One line of text. Columns are byte indices; `render` is `buf` with every tab expanded
// to spaces up to the next tab stop.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Row {
    buf: Vec<u8>,
    render: Vec<u8>,
}

impl Row {
    pub fn new<B: Into<Vec<u8>>>(line: B) -> Row {
        let mut row = Row {
            buf: line.into(),
            render: vec![],
        };
        row.update_render();
        row
    }

    pub fn empty() -> Row {
        Row::default()
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buf
    }

    pub fn render_text(&self) -> &[u8] {
        &self.render
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn update_render(&mut self) {
        let tabs = self.buf.iter().filter(|b| **b == b'\t').count();
        self.render = Vec::with_capacity(self.buf.len() + tabs * (TAB_STOP - 1));
        for &b in self.buf.iter() {
            if b == b'\t' {
                self.render.push(b' ');
                while self.render.len() % TAB_STOP != 0 {
                    self.render.push(b' ');
                }
            } else {
                self.render.push(b);
            }
        }
    }

    pub fn rx_from_cx(&self, cx: usize) -> usize {
        self.buf.iter().take(cx).fold(0, |rx, &b| {
            if b == b'\t' {
                // Proceed TAB_STOP spaces then subtract spaces by mod TAB_STOP
                rx + TAB_STOP - (rx % TAB_STOP)
            } else {
                rx + 1
            }
        })
    }

    // Note: 'at' is an index of buffer, not render text. It is clamped to the end of line
    pub fn insert_char(&mut self, at: usize, b: u8) {
        if self.buf.len() <= at {
            self.buf.push(b);
        } else {
            self.buf.insert(at, b);
        }
        self.update_render();
    }

    // Returns false when `at` does not point to a byte in this row
    pub fn delete_char(&mut self, at: usize) -> bool {
        if at >= self.buf.len() {
            return false;
        }
        self.buf.remove(at);
        self.update_render();
        true
    }

    pub fn append(&mut self, s: &[u8]) {
        if s.is_empty() {
            return;
        }
        self.buf.extend_from_slice(s);
        self.update_render();
    }

    // Cuts the row at `at` and returns the bytes after it
    pub fn split_off(&mut self, at: usize) -> Vec<u8> {
        if at >= self.buf.len() {
            return vec![];
        }
        let rest = self.buf.split_off(at);
        self.update_render();
        rest
    }
}

impl ops::Index<ops::RangeFrom<usize>> for Row {
    type Output = [u8];

    fn index(&self, r: ops::RangeFrom<usize>) -> &Self::Output {
        &self.buf[r]
    }
}
