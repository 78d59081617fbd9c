//! Shadow of the last enumerated screen, used to age cells.

use tessel_render::{Age, CellAttr};

#[derive(Debug, Clone)]
struct Slot {
    codepoints: Vec<u32>,
    cell_width: u32,
    attr: CellAttr,
    age: Age,
}

impl Slot {
    fn matches(&self, codepoints: &[u32], cell_width: u32, attr: CellAttr) -> bool {
        self.codepoints == codepoints && self.cell_width == cell_width && self.attr == attr
    }
}

/// What each visible cell looked like when it last changed.
#[derive(Debug, Clone, Default)]
pub(crate) struct ShadowGrid {
    /// Row-major; `None` means never seen or invalidated.
    slots: Vec<Option<Slot>>,
    cols: usize,
    rows: usize,
}

impl ShadowGrid {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            slots: vec![None; cols * rows],
            cols,
            rows,
        }
    }

    /// Resize, forgetting everything.
    pub fn resize(&mut self, cols: usize, rows: usize) {
        *self = Self::new(cols, rows);
    }

    pub fn clear(&mut self) {
        self.slots.fill(None);
    }

    /// Record the cell at `(col, row)` as seen in frame `age` and return the
    /// age of the frame that last changed it.
    ///
    /// A wide cell also invalidates the columns it covers, since whatever is
    /// later drawn there has to repaint over it.
    pub fn observe(
        &mut self,
        col: usize,
        row: usize,
        codepoints: &[u32],
        cell_width: u32,
        attr: CellAttr,
        age: Age,
    ) -> Age {
        if col >= self.cols || row >= self.rows {
            return 0;
        }
        let idx = row * self.cols + col;

        for covered in 1..cell_width as usize {
            if col + covered < self.cols {
                self.slots[idx + covered] = None;
            }
        }

        match &mut self.slots[idx] {
            Some(slot) if slot.matches(codepoints, cell_width, attr) => slot.age,
            Some(slot) => {
                slot.codepoints.clear();
                slot.codepoints.extend_from_slice(codepoints);
                slot.cell_width = cell_width;
                slot.attr = attr;
                slot.age = age;
                age
            }
            empty => {
                *empty = Some(Slot {
                    codepoints: codepoints.to_vec(),
                    cell_width,
                    attr,
                    age,
                });
                age
            }
        }
    }
}
