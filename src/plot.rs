use std::fs::File;
use std::path::Path;

use cairo::{Context, FontSlant, FontWeight, Format, ImageSurface};
use itertools::Itertools;
use itertools_num::linspace;

use crate::util::Engineering;
use crate::Result;

const WIDTH: i32 = 800;
const HEIGHT: i32 = 600;
const MARGIN: f64 = 80.0;
const TICKS: usize = 6;

const COLORS: [(u8, u8, u8); 8] = [
    (57, 106, 177),
    (218, 124, 48),
    (62, 150, 81),
    (204, 37, 41),
    (83, 81, 84),
    (107, 76, 154),
    (146, 36, 40),
    (148, 139, 61),
];

pub struct Curve {
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

pub struct Axes<'a> {
    pub title: &'a str,
    pub x_label: &'a str,
    pub y_label: &'a str,
}

fn range<I: Iterator<Item = f64>>(values: I) -> (f64, f64) {
    let (min, max) = values.fold((std::f64::INFINITY, std::f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        (0.0, 1.0)
    } else if min == max {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    }
}

fn centered(cr: &Context, text: &str, x: f64, y: f64) {
    let extents = cr.text_extents(text);
    cr.move_to(x - extents.width / 2.0, y);
    cr.show_text(text);
}

/// Draws every curve on shared linear axes, one colour per curve, and
/// writes the image to `path`.
pub fn plot_iv(path: &Path, axes: &Axes<'_>, curves: &[Curve]) -> Result<()> {
    let surface = ImageSurface::create(Format::ARgb32, WIDTH, HEIGHT)
        .map_err(|_| failure::err_msg("Can't create an off-screen surface"))?;
    let cr = Context::new(&surface);

    cr.set_source_rgb(1.0, 1.0, 1.0);
    cr.paint();

    let (min_v, max_v) = range(curves.iter().flat_map(|c| c.points.iter().map(|(v, _)| *v)));
    let (min_i, max_i) = range(curves.iter().flat_map(|c| c.points.iter().map(|(_, i)| *i)));

    let w = f64::from(WIDTH) - 2.0 * MARGIN;
    let h = f64::from(HEIGHT) - 2.0 * MARGIN;
    let x = |v: f64| MARGIN + (v - min_v) / (max_v - min_v) * w;
    let y = |i: f64| f64::from(HEIGHT) - MARGIN - (i - min_i) / (max_i - min_i) * h;

    cr.select_font_face("sans-serif", FontSlant::Normal, FontWeight::Normal);
    cr.set_font_size(12.0);

    cr.set_source_rgb(0.85, 0.85, 0.85);
    cr.set_line_width(1.0);
    for v in linspace(min_v, max_v, TICKS) {
        cr.move_to(x(v), MARGIN);
        cr.line_to(x(v), MARGIN + h);
    }
    for i in linspace(min_i, max_i, TICKS) {
        cr.move_to(MARGIN, y(i));
        cr.line_to(MARGIN + w, y(i));
    }
    cr.stroke();

    cr.set_source_rgb(0.0, 0.0, 0.0);
    cr.rectangle(MARGIN, MARGIN, w, h);
    cr.stroke();
    for v in linspace(min_v, max_v, TICKS) {
        centered(&cr, &format!("{:.2}", v), x(v), MARGIN + h + 18.0);
    }
    for i in linspace(min_i, max_i, TICKS) {
        let text = Engineering(i).to_string();
        let extents = cr.text_extents(&text);
        cr.move_to(MARGIN - extents.width - 6.0, y(i) + 4.0);
        cr.show_text(&text);
    }

    centered(&cr, axes.x_label, MARGIN + w / 2.0, f64::from(HEIGHT) - 24.0);
    cr.save();
    cr.translate(20.0, MARGIN + h / 2.0);
    cr.rotate(-std::f64::consts::FRAC_PI_2);
    centered(&cr, axes.y_label, 0.0, 0.0);
    cr.restore();

    cr.set_font_size(16.0);
    centered(&cr, axes.title, f64::from(WIDTH) / 2.0, MARGIN / 2.0);
    cr.set_font_size(12.0);

    cr.set_line_width(2.0);
    for (ix, (curve, (r, g, b))) in curves.iter().zip(COLORS.iter().cycle()).enumerate() {
        cr.set_source_rgb(f64::from(*r) / 255.0, f64::from(*g) / 255.0, f64::from(*b) / 255.0);
        for (n, (v, i)) in curve.points.iter().enumerate() {
            if n == 0 {
                cr.move_to(x(*v), y(*i));
            } else {
                cr.line_to(x(*v), y(*i));
            }
        }
        cr.stroke();

        let legend_y = MARGIN + 20.0 + 18.0 * ix as f64;
        cr.rectangle(MARGIN + 12.0, legend_y - 9.0, 10.0, 10.0);
        cr.fill();
        cr.set_source_rgb(0.0, 0.0, 0.0);
        cr.move_to(MARGIN + 28.0, legend_y);
        cr.show_text(&curve.label);
    }

    drop(cr);
    let mut out = File::create(path)?;
    surface
        .write_to_png(&mut out)
        .map_err(|_| failure::err_msg("Can't write the plot"))?;
    debug!(
        "Plotted {} to {}",
        curves.iter().map(|c| c.label.as_str()).join(", "),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_ranges_are_widened() {
        assert_eq!(range(vec![1.0, 1.0].into_iter()), (0.5, 1.5));
        assert_eq!(range(Vec::new().into_iter()), (0.0, 1.0));
        assert_eq!(range(vec![-3.0, 5.0, 0.2].into_iter()), (-3.0, 5.0));
    }

    #[test]
    fn writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("iv.png");
        let curve = Curve {
            label: "Vd = 0.2V".to_owned(),
            points: vec![(0.0, 0.0), (1.0, 1e-6), (2.0, 4e-6)],
        };
        let axes = Axes {
            title: "Drain current",
            x_label: "Gate Voltage (V)",
            y_label: "Drain Current (A)",
        };
        plot_iv(&path, &axes, &[curve]).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }
}
