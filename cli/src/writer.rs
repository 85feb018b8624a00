use anyhow::Context;
use gr_common::db::core::Net;
use gr_common::geom::edge::EdgeCodec;
use std::fs::File;
use std::io::{BufWriter, Write};

// n<id>, one (x1,y1)-(x2,y2) line per edge, "!" after each net. Nets are
// written in ascending id order regardless of how the solver left them.
pub fn write_routes<W: Write>(
    out: &mut W,
    codec: &EdgeCodec,
    nets: &[Net],
) -> std::io::Result<()> {
    let mut by_id: Vec<&Net> = nets.iter().collect();
    by_id.sort_by_key(|n| n.id);

    for net in by_id {
        writeln!(out, "n{}", net.id.index())?;
        for seg in &net.route {
            for &id in &seg.edges {
                let (a, b) = codec.edge(id);
                writeln!(out, "({},{})-({},{})", a.x, a.y, b.x, b.y)?;
            }
        }
        writeln!(out, "!")?;
    }
    Ok(())
}

pub fn write_routes_file(path: &str, codec: &EdgeCodec, nets: &[Net]) -> anyhow::Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create route file '{path}'"))?;
    let mut out = BufWriter::new(file);
    write_routes(&mut out, codec, nets)?;
    out.flush()?;
    Ok(())
}
