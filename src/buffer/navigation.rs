// src/buffer/navigation.rs

//! Row-wise caret movement.
//!
//! The buffer itself is one-dimensional; rows only exist in whatever layout
//! the host rendered. The host reports per-token rectangles through
//! [`TokenLayout`], and Up/Down map the caret onto the adjacent visual row.
//! Without a usable layout the caret moves by a fixed stride instead.

use super::CommandBuffer;
use crate::config::LayoutConfig;
use log::trace;
use std::cmp::min;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalMove {
    Up,
    Down,
}

/// Screen rectangle of one rendered token, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
}

impl TokenRect {
    pub fn new(left: f32, top: f32, right: f32) -> Self {
        Self { left, top, right }
    }
}

/// Per-token rectangles, index-aligned with the buffer's tokens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenLayout {
    pub rects: Vec<TokenRect>,
}

impl TokenLayout {
    pub fn new(rects: Vec<TokenRect>) -> Self {
        Self { rects }
    }

    /// Groups token indices into visual rows as `[start, end)` ranges.
    /// A new row starts when a token's top differs from the current row's
    /// first top by more than `tolerance`.
    fn rows(&self, tolerance: f32) -> Vec<(usize, usize)> {
        let mut rows = Vec::new();
        let mut start = 0;
        for i in 1..self.rects.len() {
            if (self.rects[i].top - self.rects[start].top).abs() > tolerance {
                rows.push((start, i));
                start = i;
            }
        }
        if !self.rects.is_empty() {
            rows.push((start, self.rects.len()));
        }
        rows
    }

    /// Horizontal position of caret `pos`: the left edge of the token after
    /// it, or the right edge of the last token when at the very end.
    fn caret_x(&self, pos: usize) -> f32 {
        match self.rects.get(pos) {
            Some(rect) => rect.left,
            None => self.rects.last().map(|r| r.right).unwrap_or(0.0),
        }
    }
}

impl CommandBuffer {
    /// Moves the caret one visual row up or down.
    ///
    /// A layout whose length does not match the buffer is stale and is
    /// ignored in favour of the fixed stride.
    pub fn move_vertical(
        &mut self,
        movement: VerticalMove,
        layout: Option<&TokenLayout>,
        config: &LayoutConfig,
        extend: bool,
    ) {
        let target = match layout {
            Some(layout) if !self.is_empty() && layout.rects.len() == self.len() => {
                layout_target(self.cursor(), movement, layout, config.row_tolerance_px)
            }
            _ => stride_target(
                self.cursor(),
                self.len(),
                movement,
                config.fallback_row_stride.max(1),
            ),
        };
        trace!(
            "move_vertical({:?}) from {} to {}",
            movement,
            self.cursor(),
            target
        );
        self.move_to(target, extend);
    }
}

fn stride_target(cursor: usize, len: usize, movement: VerticalMove, stride: usize) -> usize {
    match movement {
        VerticalMove::Up => cursor.saturating_sub(stride),
        VerticalMove::Down => min(len, cursor.saturating_add(stride)),
    }
}

fn layout_target(cursor: usize, movement: VerticalMove, layout: &TokenLayout, tolerance: f32) -> usize {
    let len = layout.rects.len();
    let rows = layout.rows(tolerance);
    let anchor_token = min(cursor, len - 1);
    let current_row = rows
        .iter()
        .position(|&(start, end)| (start..end).contains(&anchor_token))
        .unwrap_or(0);

    let target_row = match movement {
        VerticalMove::Up if current_row == 0 => return 0,
        VerticalMove::Up => current_row - 1,
        VerticalMove::Down if current_row + 1 >= rows.len() => return len,
        VerticalMove::Down => current_row + 1,
    };

    let caret_x = layout.caret_x(cursor);
    let (start, end) = rows[target_row];
    // The gap after a row's last token is only addressable on the final row;
    // elsewhere it renders at the start of the following row.
    let last_candidate = if target_row + 1 == rows.len() { end } else { end - 1 };

    let mut best = start;
    let mut best_distance = f32::INFINITY;
    for pos in start..=last_candidate {
        let distance = (layout.caret_x(pos) - caret_x).abs();
        if distance < best_distance {
            best = pos;
            best_distance = distance;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notation::{Dir, Token};

    /// Three rows of four 10px-wide tokens, 20px apart vertically.
    fn grid_layout(count: usize) -> TokenLayout {
        TokenLayout::new(
            (0..count)
                .map(|i| {
                    let col = (i % 4) as f32;
                    let row = (i / 4) as f32;
                    TokenRect::new(col * 10.0, row * 20.0 + (i % 2) as f32, col * 10.0 + 10.0)
                })
                .collect(),
        )
    }

    fn buffer_of(count: usize, cursor: usize) -> CommandBuffer {
        CommandBuffer::from_parts(vec![Token::tap(Dir::F); count], cursor, None)
    }

    #[test]
    fn test_rows_cluster_within_tolerance() {
        let layout = grid_layout(10);
        assert_eq!(layout.rows(4.0), vec![(0, 4), (4, 8), (8, 10)]);
    }

    #[test]
    fn test_down_keeps_column() {
        let layout = grid_layout(12);
        let mut buffer = buffer_of(12, 2);
        buffer.move_vertical(VerticalMove::Down, Some(&layout), &LayoutConfig::default(), false);
        assert_eq!(buffer.cursor(), 6);
        buffer.move_vertical(VerticalMove::Up, Some(&layout), &LayoutConfig::default(), false);
        assert_eq!(buffer.cursor(), 2);
    }

    #[test]
    fn test_up_from_first_row_goes_home() {
        let layout = grid_layout(12);
        let mut buffer = buffer_of(12, 3);
        buffer.move_vertical(VerticalMove::Up, Some(&layout), &LayoutConfig::default(), false);
        assert_eq!(buffer.cursor(), 0);
    }

    #[test]
    fn test_down_from_last_row_goes_to_end() {
        let layout = grid_layout(10);
        let mut buffer = buffer_of(10, 8);
        buffer.move_vertical(VerticalMove::Down, Some(&layout), &LayoutConfig::default(), false);
        assert_eq!(buffer.cursor(), 10);
    }

    #[test]
    fn test_down_into_short_last_row_snaps_to_end() {
        // Row 2 only holds tokens 8 and 9 (x 0..20); column 3 maps past them.
        let layout = grid_layout(10);
        let mut buffer = buffer_of(10, 7);
        buffer.move_vertical(VerticalMove::Down, Some(&layout), &LayoutConfig::default(), false);
        assert_eq!(buffer.cursor(), 10);
    }

    #[test]
    fn test_stale_layout_falls_back_to_stride() {
        let layout = grid_layout(3);
        let mut buffer = buffer_of(40, 20);
        let config = LayoutConfig::default();
        buffer.move_vertical(VerticalMove::Up, Some(&layout), &config, false);
        assert_eq!(buffer.cursor(), 4);
        buffer.move_vertical(VerticalMove::Up, None, &config, false);
        assert_eq!(buffer.cursor(), 0);
        buffer.move_vertical(VerticalMove::Down, None, &config, false);
        buffer.move_vertical(VerticalMove::Down, None, &config, false);
        buffer.move_vertical(VerticalMove::Down, None, &config, false);
        assert_eq!(buffer.cursor(), 40);
    }

    #[test]
    fn test_extend_selects_rows() {
        let layout = grid_layout(12);
        let mut buffer = buffer_of(12, 1);
        buffer.move_vertical(VerticalMove::Down, Some(&layout), &LayoutConfig::default(), true);
        assert_eq!(buffer.cursor(), 5);
        assert_eq!(buffer.selection(), crate::buffer::Selection::between(1, 5));
    }
}
