//! External contour extraction.
//!
//! Changed pixels are grouped into 8-connected regions. Each region's outer
//! boundary is traced with Moore-neighbour tracing and its enclosed area is
//! the shoelace area of the boundary polygon through pixel centres. Holes
//! inside a region do not reduce its area.

use std::collections::VecDeque;

use super::mask::BinaryMask;

/// Clockwise neighbourhood (y grows downward), starting west.
const NEIGHBOURS: [(i64, i64); 8] = [
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
];

/// Outer boundary of one connected changed region.
#[derive(Clone, Debug)]
pub struct Contour {
    points: Vec<(i64, i64)>,
    pixel_count: usize,
}

impl Contour {
    /// Boundary pixels in tracing order (start pixel not repeated).
    pub fn points(&self) -> &[(i64, i64)] {
        &self.points
    }

    /// Number of changed pixels in the region.
    pub fn pixel_count(&self) -> usize {
        self.pixel_count
    }

    /// Area enclosed by the boundary polygon.
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let twice: i64 = (0..n)
            .map(|i| {
                let (x0, y0) = self.points[i];
                let (x1, y1) = self.points[(i + 1) % n];
                x0 * y1 - x1 * y0
            })
            .sum();
        twice.abs() as f64 / 2.0
    }
}

/// Find the external contour of every 8-connected region in `mask`.
pub fn external_contours(mask: &BinaryMask) -> Vec<Contour> {
    let width = mask.width() as usize;
    let height = mask.height() as usize;
    let mut visited = vec![false; width * height];
    let mut contours = Vec::new();

    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            if visited[idx] || !mask.get(x as u32, y as u32) {
                continue;
            }
            // Raster order guarantees this is the top-left pixel of its region.
            let pixel_count = flood_region(mask, &mut visited, x, y);
            let points = trace_boundary(mask, (x as i64, y as i64), pixel_count);
            contours.push(Contour {
                points,
                pixel_count,
            });
        }
    }

    contours
}

/// Largest contour area in `mask`, 0 when nothing changed.
pub fn max_contour_area(mask: &BinaryMask) -> (f64, usize) {
    let contours = external_contours(mask);
    let max = contours
        .iter()
        .map(Contour::area)
        .fold(0.0_f64, f64::max);
    (max, contours.len())
}

fn flood_region(mask: &BinaryMask, visited: &mut [bool], x: usize, y: usize) -> usize {
    let width = mask.width() as usize;
    let mut queue = VecDeque::new();
    visited[y * width + x] = true;
    queue.push_back((x as i64, y as i64));
    let mut count = 0;

    while let Some((cx, cy)) = queue.pop_front() {
        count += 1;
        for (dx, dy) in NEIGHBOURS {
            let (nx, ny) = (cx + dx, cy + dy);
            if !mask.get_signed(nx, ny) {
                continue;
            }
            let nidx = ny as usize * width + nx as usize;
            if !visited[nidx] {
                visited[nidx] = true;
                queue.push_back((nx, ny));
            }
        }
    }

    count
}

fn direction_index(dx: i64, dy: i64) -> usize {
    NEIGHBOURS
        .iter()
        .position(|&d| d == (dx, dy))
        .unwrap_or(0)
}

fn trace_boundary(mask: &BinaryMask, start: (i64, i64), pixel_count: usize) -> Vec<(i64, i64)> {
    let mut points = vec![start];
    let mut current = start;
    // The west neighbour of the top-left pixel is always background.
    let mut backtrack = 0usize;
    let mut first_step: Option<(i64, i64)> = None;
    let limit = 4 * pixel_count + 8;

    for _ in 0..limit {
        let mut next = None;
        for i in 1..=8 {
            let d = (backtrack + i) % 8;
            let candidate = (current.0 + NEIGHBOURS[d].0, current.1 + NEIGHBOURS[d].1);
            if mask.get_signed(candidate.0, candidate.1) {
                let prev = (backtrack + i - 1) % 8;
                let background = (current.0 + NEIGHBOURS[prev].0, current.1 + NEIGHBOURS[prev].1);
                next = Some((candidate, background));
                break;
            }
        }

        // No neighbour at all: isolated pixel.
        let Some((candidate, background)) = next else {
            break;
        };

        if current == start {
            match first_step {
                Some(step) if step == candidate => break,
                Some(_) => {}
                None => first_step = Some(candidate),
            }
        }

        backtrack = direction_index(background.0 - candidate.0, background.1 - candidate.1);
        current = candidate;
        points.push(current);
    }

    if points.len() > 1 && points.last() == Some(&start) {
        points.pop();
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_mask_has_no_contours() {
        let mask = BinaryMask::new(8, 8);
        assert!(external_contours(&mask).is_empty());
        assert_eq!(max_contour_area(&mask), (0.0, 0));
    }

    #[test]
    fn filled_rectangle_area_follows_pixel_centres() {
        let mut mask = BinaryMask::new(20, 20);
        mask.fill_rect(3, 4, 14, 15); // 11x11 pixels

        let contours = external_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].pixel_count(), 121);
        assert_eq!(contours[0].area(), 100.0);
        assert_eq!(contours[0].points().len(), 40);
    }

    #[test]
    fn isolated_pixel_and_line_have_zero_area() {
        let mut mask = BinaryMask::new(10, 10);
        mask.set(1, 1, true);
        mask.fill_rect(4, 5, 9, 6);

        let contours = external_contours(&mask);
        assert_eq!(contours.len(), 2);
        assert!(contours.iter().all(|c| c.area() == 0.0));
    }

    #[test]
    fn holes_do_not_reduce_area() {
        let mut mask = BinaryMask::new(12, 12);
        mask.fill_rect(1, 1, 11, 11);
        for y in 4..8 {
            for x in 4..8 {
                mask.set(x, y, false);
            }
        }

        let (area, regions) = max_contour_area(&mask);
        assert_eq!(regions, 1);
        assert_eq!(area, 81.0);
    }

    #[test]
    fn diagonal_neighbours_form_one_region() {
        let mut mask = BinaryMask::new(6, 6);
        mask.set(1, 1, true);
        mask.set(2, 2, true);
        mask.set(3, 3, true);

        assert_eq!(external_contours(&mask).len(), 1);
    }

    #[test]
    fn max_area_picks_largest_region() {
        let mut mask = BinaryMask::new(40, 20);
        mask.fill_rect(1, 1, 6, 6); // 5x5 -> 16
        mask.fill_rect(10, 2, 31, 13); // 21x11 -> 200

        let (area, regions) = max_contour_area(&mask);
        assert_eq!(regions, 2);
        assert_eq!(area, 200.0);
    }

    #[test]
    fn concave_region_is_traced_around() {
        // U shape: two columns joined at the bottom.
        let mut mask = BinaryMask::new(10, 10);
        mask.fill_rect(1, 1, 3, 8);
        mask.fill_rect(6, 1, 8, 8);
        mask.fill_rect(1, 6, 8, 8);

        let contours = external_contours(&mask);
        assert_eq!(contours.len(), 1);
        let hull_area = 6.0 * 6.0;
        assert!(contours[0].area() > 0.0);
        assert!(contours[0].area() < hull_area);
    }
}
