use serde::{Deserialize, Serialize};

/// An axis-aligned pixel rectangle. `x2` and `y2` are excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Rect {
    pub const EMPTY: Rect = Rect {
        x1: 0,
        y1: 0,
        x2: 0,
        y2: 0,
    };

    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Rectangle anchored at the origin.
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    // Widened to i64: a host's infinite region spans i32::MIN..i32::MAX.
    pub fn width(&self) -> u32 {
        (i64::from(self.x2) - i64::from(self.x1)).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (i64::from(self.y2) - i64::from(self.y1)).max(0) as u32
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.x1 >= self.x2 || self.y1 >= self.y2
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x1 && x < self.x2 && y >= self.y1 && y < self.y2
    }

    /// Overlap of two rectangles, `None` when they share no pixel.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let r = Rect {
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
            x2: self.x2.min(other.x2),
            y2: self.y2.min(other.y2),
        };
        if r.is_empty() { None } else { Some(r) }
    }

    /// Split into row-major cells of at most `tile_width` x `tile_height`.
    /// Cells on the right and bottom edges are truncated.
    pub fn grid(&self, tile_width: u32, tile_height: u32) -> Vec<Rect> {
        if self.is_empty() {
            return Vec::new();
        }
        let tw = tile_width.clamp(1, self.width()).min(i32::MAX as u32) as i32;
        let th = tile_height.clamp(1, self.height()).min(i32::MAX as u32) as i32;
        let mut cells = Vec::new();
        for y1 in (self.y1..self.y2).step_by(th as usize) {
            for x1 in (self.x1..self.x2).step_by(tw as usize) {
                cells.push(Rect::new(
                    x1,
                    y1,
                    x1.saturating_add(tw).min(self.x2),
                    y1.saturating_add(th).min(self.y2),
                ));
            }
        }
        cells
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})..({}, {})", self.x1, self.y1, self.x2, self.y2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions() {
        let r = Rect::new(-2, 3, 6, 7);
        assert_eq!(r.width(), 8);
        assert_eq!(r.height(), 4);
        assert_eq!(r.area(), 32);
        assert!(!r.is_empty());
    }

    #[test]
    fn test_infinite_region_dimensions() {
        let r = Rect::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX);
        assert_eq!(r.width(), u32::MAX);
        assert_eq!(r.height(), u32::MAX);
        assert_eq!(r.area(), u64::from(u32::MAX) * u64::from(u32::MAX));
        assert_eq!(Rect::new(i32::MAX, 0, i32::MIN, 1).width(), 0);
    }

    #[test]
    fn test_grid_at_extreme_coordinates() {
        let r = Rect::new(i32::MAX - 3, i32::MIN, i32::MAX, i32::MIN + 2);
        assert_eq!(
            r.grid(2, 5),
            vec![
                Rect::new(i32::MAX - 3, i32::MIN, i32::MAX - 1, i32::MIN + 2),
                Rect::new(i32::MAX - 1, i32::MIN, i32::MAX, i32::MIN + 2),
            ]
        );
    }

    #[test]
    fn test_inverted_rect_is_empty() {
        let r = Rect::new(5, 5, 2, 8);
        assert!(r.is_empty());
        assert_eq!(r.width(), 0);
        assert_eq!(r.area(), 0);
    }

    #[test]
    fn test_contains_is_half_open() {
        let r = Rect::from_size(4, 2);
        assert!(r.contains(0, 0));
        assert!(r.contains(3, 1));
        assert!(!r.contains(4, 1));
        assert!(!r.contains(3, 2));
        assert!(!r.contains(-1, 0));
    }

    #[test]
    fn test_intersect_overlapping() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, -5, 15, 5);
        assert_eq!(a.intersect(&b), Some(Rect::new(5, 0, 10, 5)));
    }

    #[test]
    fn test_intersect_touching_edges_is_none() {
        let a = Rect::new(0, 0, 4, 4);
        let b = Rect::new(4, 0, 8, 4);
        assert_eq!(a.intersect(&b), None);
    }

    #[test]
    fn test_grid_truncates_edges() {
        let cells = Rect::new(0, 0, 5, 3).grid(2, 2);
        assert_eq!(
            cells,
            vec![
                Rect::new(0, 0, 2, 2),
                Rect::new(2, 0, 4, 2),
                Rect::new(4, 0, 5, 2),
                Rect::new(0, 2, 2, 3),
                Rect::new(2, 2, 4, 3),
                Rect::new(4, 2, 5, 3),
            ]
        );
    }

    #[test]
    fn test_grid_of_empty_rect() {
        assert!(Rect::EMPTY.grid(4, 4).is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(Rect::new(1, 2, 3, 4).to_string(), "(1, 2)..(3, 4)");
    }
}
