use crate::db::core::Net;
use crate::db::indices::EdgeId;
use crate::geom::edge::EdgeCodec;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use std::path::Path;

const SCALE: u32 = 6;

// Hot colormap of overflow magnitude. `overflow` is indexed by dense edge
// id and may be shorter than `codec.num_edges()`.
pub fn draw_overflow_map(codec: &EdgeCodec, overflow: &[i32], filename: &str) {
    let width = (codec.gx() as u32).max(2) * SCALE;
    let height = (codec.gy() as u32).max(2) * SCALE;
    let mut img = RgbImage::from_pixel(width, height, Rgb([10, 10, 10]));

    let max_overflow = overflow.iter().copied().max().unwrap_or(0);
    if max_overflow > 0 {
        for (i, &ovf) in overflow.iter().enumerate() {
            if ovf <= 0 {
                continue;
            }
            let (p1, p2) = codec.edge(EdgeId::new(i));
            let t = ovf as f32 / max_overflow as f32;
            draw_line_segment_mut(
                &mut img,
                (p1.x as f32 * SCALE as f32, p1.y as f32 * SCALE as f32),
                (p2.x as f32 * SCALE as f32, p2.y as f32 * SCALE as f32),
                hot(t),
            );
        }
    }

    if let Err(e) = img.save(Path::new(filename)) {
        log::warn!("failed to write heatmap {}: {}", filename, e);
    }
}

pub fn draw_routes(codec: &EdgeCodec, nets: &[Net], filename: &str) {
    let width = (codec.gx() as u32).max(2) * SCALE;
    let height = (codec.gy() as u32).max(2) * SCALE;
    let mut img = RgbImage::from_pixel(width, height, Rgb([10, 10, 10]));

    for net in nets {
        for seg in &net.route {
            for &id in &seg.edges {
                let (p1, p2) = codec.edge(id);
                draw_line_segment_mut(
                    &mut img,
                    (p1.x as f32 * SCALE as f32, p1.y as f32 * SCALE as f32),
                    (p2.x as f32 * SCALE as f32, p2.y as f32 * SCALE as f32),
                    Rgb([220, 40, 40]),
                );
            }
        }
    }

    if let Err(e) = img.save(Path::new(filename)) {
        log::warn!("failed to write route plot {}: {}", filename, e);
    }
}

fn hot(t: f32) -> Rgb<u8> {
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0) as u8;
    Rgb([
        channel(3.0 * t),
        channel(3.0 * t - 1.0),
        channel(3.0 * t - 2.0),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hot_colormap_endpoints() {
        assert_eq!(hot(0.0), Rgb([0, 0, 0]));
        assert_eq!(hot(1.0 / 3.0), Rgb([255, 0, 0]));
        assert_eq!(hot(1.0), Rgb([255, 255, 255]));
    }
}
