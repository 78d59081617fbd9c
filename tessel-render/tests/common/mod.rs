//! Deterministic collaborators for render tests.

#![allow(dead_code)]

use tessel_render::{
    Age, AlphaMask, CellAttr, CellVisit, FaceStyle, Layout, PixelRect, Renderer, Result, Screen,
    ShapedLine, Shaper, Vte,
};

/// Shaper that draws every character as a solid box of `advance` pixels
/// from the ascent line down to the baseline.
pub struct BoxShaper {
    pub advance: u32,
    pub ascent: u32,
    pub descent: u32,
    /// Extra pixels added to the measured line width.
    pub slack: u32,
    /// Left side bearing reported for every line.
    pub bearing: i32,
    /// Text containing this character shapes to zero lines.
    pub no_lines_for: Option<char>,
    pub coverage: u8,
}

impl BoxShaper {
    /// 10x10 cells with the baseline at 8.
    pub fn cells_10x10() -> Self {
        Self {
            advance: 10,
            ascent: 8,
            descent: 2,
            slack: 0,
            bearing: 0,
            no_lines_for: Some('\u{fffd}'),
            coverage: 255,
        }
    }
}

impl Shaper for BoxShaper {
    type Glyph = i32;

    fn layout(&mut self, _style: &FaceStyle, text: &str) -> Result<Layout<i32>> {
        if self.no_lines_for.is_some_and(|c| text.contains(c)) {
            return Ok(Layout {
                lines: Vec::new(),
                extents: PixelRect::default(),
                baseline: 0.0,
            });
        }

        let count = text.chars().count() as u32;
        let width = count * self.advance + self.slack;
        let height = self.ascent + self.descent;
        let glyphs = (0..count as i32)
            .map(|i| self.bearing + i * self.advance as i32)
            .collect();

        Ok(Layout {
            lines: vec![ShapedLine {
                extents: PixelRect {
                    x: self.bearing,
                    y: -(self.ascent as i32),
                    width,
                    height,
                },
                glyphs,
            }],
            extents: PixelRect {
                x: 0,
                y: 0,
                width,
                height,
            },
            baseline: self.ascent as f32,
        })
    }

    fn draw_line(
        &mut self,
        line: &ShapedLine<i32>,
        target: &mut AlphaMask<'_>,
        x: i32,
        y: i32,
    ) -> Result<()> {
        for &gx in &line.glyphs {
            for py in y - self.ascent as i32..y {
                for px in x + gx..x + gx + self.advance as i32 {
                    target.cover(px, py, self.coverage);
                }
            }
        }
        Ok(())
    }
}

/// One scripted cell.
#[derive(Debug, Clone)]
pub struct ScriptCell {
    pub codepoints: Vec<u32>,
    pub cell_width: u32,
    pub col: u32,
    pub row: u32,
    pub attr: CellAttr,
    pub age: Age,
}

impl ScriptCell {
    pub fn blank(col: u32, row: u32, bg: (u8, u8, u8), age: Age) -> Self {
        Self {
            codepoints: Vec::new(),
            cell_width: 1,
            col,
            row,
            attr: CellAttr::new((0, 0, 0), bg),
            age,
        }
    }

    pub fn text(col: u32, row: u32, c: char, fg: (u8, u8, u8), bg: (u8, u8, u8), age: Age) -> Self {
        Self {
            codepoints: vec![c as u32],
            cell_width: 1,
            col,
            row,
            attr: CellAttr::new(fg, bg),
            age,
        }
    }
}

/// Screen that replays a fixed list of cells.
pub struct ScriptedScreen {
    pub columns: u32,
    pub rows: u32,
    pub cells: Vec<ScriptCell>,
    pub next_age: Age,
    pub draws: u32,
}

impl ScriptedScreen {
    pub fn new(columns: u32, rows: u32, cells: Vec<ScriptCell>, next_age: Age) -> Self {
        Self {
            columns,
            rows,
            cells,
            next_age,
            draws: 0,
        }
    }

    /// Every cell of the grid with one color and age.
    pub fn filled(columns: u32, rows: u32, bg: (u8, u8, u8), age: Age, next_age: Age) -> Self {
        let cells = (0..rows)
            .flat_map(|row| (0..columns).map(move |col| ScriptCell::blank(col, row, bg, age)))
            .collect();
        Self::new(columns, rows, cells, next_age)
    }

    pub fn set_ages(&mut self, age: Age) {
        for cell in &mut self.cells {
            cell.age = age;
        }
    }
}

impl Screen for ScriptedScreen {
    fn draw(&mut self, visit: &mut dyn FnMut(&CellVisit<'_>)) -> Age {
        self.draws += 1;
        for cell in &self.cells {
            visit(&CellVisit {
                id: tessel_render::cluster_id(&cell.codepoints),
                codepoints: &cell.codepoints,
                cell_width: cell.cell_width,
                col: cell.col,
                row: cell.row,
                attr: cell.attr,
                age: cell.age,
            });
        }
        self.next_age
    }

    fn columns(&self) -> u32 {
        self.columns
    }

    fn rows(&self) -> u32 {
        self.rows
    }
}

/// Fixed default attribute.
pub struct DefaultAttr(pub CellAttr);

impl Vte for DefaultAttr {
    fn default_attr(&self) -> CellAttr {
        self.0
    }
}

/// Snapshot of every visible framebuffer pixel.
pub fn snapshot(renderer: &Renderer) -> Vec<u32> {
    (0..renderer.height())
        .flat_map(|y| (0..renderer.width()).map(move |x| (x, y)))
        .filter_map(|(x, y)| renderer.pixel(x, y))
        .collect()
}
