//! Minimal raster line plots for diagnostic figures.
//!
//! Axes always span `[0, 1]` on both dimensions, which is all the curve
//! figures need (rates, precision and recall).

use image::{Rgb, RgbImage};
use imageproc::{
    drawing::{draw_hollow_rect_mut, draw_line_segment_mut},
    rect::Rect,
};

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub const GRID: Rgb<u8> = Rgb([225, 225, 225]);
pub const DARK_ORANGE: Rgb<u8> = Rgb([255, 140, 0]);
pub const NAVY: Rgb<u8> = Rgb([0, 0, 128]);
pub const BLUE: Rgb<u8> = Rgb([0, 0, 255]);

/// How a series is stroked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineStyle {
    Solid,
    /// Alternating drawn/skipped runs, lengths in pixels.
    Dashed { dash: f32, gap: f32 },
}

/// One polyline in data coordinates.
#[derive(Debug, Clone)]
pub struct Series {
    pub points: Vec<(f64, f64)>,
    pub color: Rgb<u8>,
    pub style: LineStyle,
    pub thickness: u32,
}

impl Series {
    pub fn solid(points: Vec<(f64, f64)>, color: Rgb<u8>) -> Self {
        Self {
            points,
            color,
            style: LineStyle::Solid,
            thickness: 2,
        }
    }

    pub fn dashed(points: Vec<(f64, f64)>, color: Rgb<u8>) -> Self {
        Self {
            points,
            color,
            style: LineStyle::Dashed {
                dash: 8.0,
                gap: 6.0,
            },
            thickness: 2,
        }
    }
}

/// A unit-square line plot.
#[derive(Debug, Clone)]
pub struct LinePlot {
    width: u32,
    height: u32,
    margin: u32,
    series: Vec<Series>,
}

impl LinePlot {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            margin: (width.min(height) / 10).max(4),
            series: Vec::new(),
        }
    }

    pub fn with_series(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }

    /// Map a data point to pixel coordinates. The y axis points up.
    pub fn to_pixel(&self, x: f64, y: f64) -> (f32, f32) {
        let plot_w = f64::from(self.width - 2 * self.margin);
        let plot_h = f64::from(self.height - 2 * self.margin);
        let px = f64::from(self.margin) + x.clamp(0.0, 1.0) * plot_w;
        let py = f64::from(self.margin) + (1.0 - y.clamp(0.0, 1.0)) * plot_h;
        (px as f32, py as f32)
    }

    pub fn render(&self) -> RgbImage {
        let mut canvas = RgbImage::from_pixel(self.width, self.height, WHITE);

        for step in 1..4 {
            let t = f64::from(step) / 4.0;
            draw_line_segment_mut(&mut canvas, self.to_pixel(t, 0.0), self.to_pixel(t, 1.0), GRID);
            draw_line_segment_mut(&mut canvas, self.to_pixel(0.0, t), self.to_pixel(1.0, t), GRID);
        }

        for series in &self.series {
            self.draw_series(&mut canvas, series);
        }

        let frame = Rect::at(self.margin as i32, self.margin as i32).of_size(
            self.width - 2 * self.margin + 1,
            self.height - 2 * self.margin + 1,
        );
        draw_hollow_rect_mut(&mut canvas, frame, BLACK);

        // ticks at quarters, pointing outwards
        let tick = (self.margin / 3).max(2) as f32;
        for step in 0..=4 {
            let t = f64::from(step) / 4.0;
            let (x, y) = self.to_pixel(t, 0.0);
            draw_line_segment_mut(&mut canvas, (x, y), (x, y + tick), BLACK);
            let (x, y) = self.to_pixel(0.0, t);
            draw_line_segment_mut(&mut canvas, (x - tick, y), (x, y), BLACK);
        }

        canvas
    }

    fn draw_series(&self, canvas: &mut RgbImage, series: &Series) {
        let offsets = stroke_offsets(series.thickness);
        for pair in series.points.windows(2) {
            let start = self.to_pixel(pair[0].0, pair[0].1);
            let end = self.to_pixel(pair[1].0, pair[1].1);
            for &(dx, dy) in &offsets {
                let start = (start.0 + dx, start.1 + dy);
                let end = (end.0 + dx, end.1 + dy);
                match series.style {
                    LineStyle::Solid => draw_line_segment_mut(canvas, start, end, series.color),
                    LineStyle::Dashed { dash, gap } => {
                        draw_dashed_segment(canvas, start, end, dash, gap, series.color);
                    }
                }
            }
        }
    }
}

fn stroke_offsets(thickness: u32) -> Vec<(f32, f32)> {
    let thickness = thickness.max(1) as i32;
    let lo = -(thickness - 1) / 2;
    let hi = lo + thickness;
    (lo..hi)
        .flat_map(|dx| (lo..hi).map(move |dy| (dx as f32, dy as f32)))
        .collect()
}

fn draw_dashed_segment(
    canvas: &mut RgbImage,
    start: (f32, f32),
    end: (f32, f32),
    dash: f32,
    gap: f32,
    color: Rgb<u8>,
) {
    let (dx, dy) = (end.0 - start.0, end.1 - start.1);
    let length = dx.hypot(dy);
    if length <= f32::EPSILON {
        return;
    }
    let period = (dash + gap).max(1.0);
    let mut t = 0.0f32;
    while t < length {
        let t_end = (t + dash).min(length);
        let a = (start.0 + dx * t / length, start.1 + dy * t / length);
        let b = (start.0 + dx * t_end / length, start.1 + dy * t_end / length);
        draw_line_segment_mut(canvas, a, b, color);
        t += period;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_map_to_plot_frame() {
        let plot = LinePlot::new(200, 100);
        assert_eq!(plot.to_pixel(0.0, 0.0), (10.0, 90.0));
        assert_eq!(plot.to_pixel(1.0, 1.0), (190.0, 10.0));
    }

    #[test]
    fn render_has_requested_size_and_frame() {
        let image = LinePlot::new(120, 80).render();
        assert_eq!(image.dimensions(), (120, 80));
        assert_eq!(image.get_pixel(8, 8), &BLACK);
        assert_eq!(image.get_pixel(0, 0), &WHITE);
    }

    #[test]
    fn solid_series_is_drawn_in_its_color() {
        let plot = LinePlot::new(100, 100)
            .with_series(Series::solid(vec![(0.0, 0.5), (1.0, 0.5)], DARK_ORANGE));
        let image = plot.render();
        let (x, y) = plot.to_pixel(0.5, 0.5);
        assert_eq!(image.get_pixel(x as u32, y as u32), &DARK_ORANGE);
    }

    #[test]
    fn dashed_series_leaves_gaps() {
        let plot = LinePlot::new(400, 400)
            .with_series(Series::dashed(vec![(0.0, 0.5), (1.0, 0.5)], NAVY));
        let image = plot.render();
        let (_, y) = plot.to_pixel(0.0, 0.5);
        let (x0, _) = plot.to_pixel(0.0, 0.5);
        let (x1, _) = plot.to_pixel(1.0, 0.5);
        let row: Vec<bool> = (x0 as u32 + 1..x1 as u32 - 1)
            .map(|x| image.get_pixel(x, y as u32) == &NAVY)
            .collect();
        assert!(row.iter().any(|&drawn| drawn));
        assert!(row.iter().any(|&drawn| !drawn));
    }

    #[test]
    fn stroke_offsets_cover_thickness() {
        assert_eq!(stroke_offsets(1), vec![(0.0, 0.0)]);
        assert_eq!(stroke_offsets(2).len(), 4);
        assert_eq!(stroke_offsets(3).len(), 9);
    }
}
