use rand::Rng;
use std::fs::File;
use std::io::{BufWriter, Write};

// Writes a random benchmark in the input format.
pub fn generate_random_benchmark(
    filename: &str,
    gx: i32,
    gy: i32,
    capacity: i32,
    num_nets: usize,
    max_pins: usize,
    num_blockages: usize,
) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(filename)?);
    let mut rng = rand::thread_rng();

    let max_pins = max_pins.max(2);

    log::info!(
        "Generating benchmark: {}x{} grid, capacity {}, {} nets (<= {} pins), {} blockages",
        gx,
        gy,
        capacity,
        num_nets,
        max_pins,
        num_blockages
    );

    writeln!(out, "grid {} {}", gx, gy)?;
    writeln!(out, "capacity {}", capacity)?;
    writeln!(out, "num net {}", num_nets)?;

    for id in 0..num_nets {
        let pins = rng.gen_range(2..=max_pins);
        writeln!(out, "n{} {}", id, pins)?;
        for _ in 0..pins {
            writeln!(out, "{} {}", rng.gen_range(0..gx), rng.gen_range(0..gy))?;
        }
    }

    // A 1x1 grid has no edges to block; single-row/column grids only have
    // one orientation to pick from.
    let num_blockages = if gx < 2 && gy < 2 { 0 } else { num_blockages };
    writeln!(out, "{}", num_blockages)?;
    for _ in 0..num_blockages {
        let horizontal = match (gx >= 2, gy >= 2) {
            (true, true) => rng.gen_bool(0.5),
            (true, false) => true,
            _ => false,
        };
        let reduced = rng.gen_range(0..=capacity / 2);
        if horizontal {
            let x = rng.gen_range(0..gx - 1);
            let y = rng.gen_range(0..gy);
            writeln!(out, "{} {} {} {} {}", x, y, x + 1, y, reduced)?;
        } else {
            let x = rng.gen_range(0..gx);
            let y = rng.gen_range(0..gy - 1);
            writeln!(out, "{} {} {} {} {}", x, y, x, y + 1, reduced)?;
        }
    }

    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::parser::benchmark;

    #[test]
    fn degenerate_grids_generate_parseable_benchmarks() {
        for (name, gx, gy) in [
            ("gr_gen_row.gr", 8, 1),
            ("gr_gen_col.gr", 1, 8),
            ("gr_gen_dot.gr", 1, 1),
        ] {
            let path = std::env::temp_dir().join(name);
            let path = path.to_string_lossy().into_owned();
            generate_random_benchmark(&path, gx, gy, 4, 5, 3, 2).unwrap();

            // Round-tripping through the parser also checks every blockage
            // line names a real edge of the grid.
            let inst = benchmark::parse_file(&path).unwrap();
            assert_eq!((inst.gx, inst.gy), (gx, gy));
            assert_eq!(inst.num_nets(), 5);
            let _ = std::fs::remove_file(&path);
        }
    }
}
