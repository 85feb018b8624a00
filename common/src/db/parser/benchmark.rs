use crate::db::core::{Net, RoutingInstance};
use crate::db::indices::NetId;
use crate::geom::point::Point;
use anyhow::{Context, Result, bail};
use std::fs::File;
use std::io::{BufReader, Read};

// Benchmark layout:
//   grid <gx> <gy>
//   capacity <cap>
//   num net <n>
//   n<id> <pinCount>, then pinCount "<x> <y>" lines
//   optional trailing "<blockages>" count + "<x1> <y1> <x2> <y2> <cap>" lines
pub fn parse_file(filename: &str) -> Result<RoutingInstance> {
    let file =
        File::open(filename).context(format!("failed to open benchmark: {}", filename))?;
    let mut text = String::new();
    BufReader::new(file)
        .read_to_string(&mut text)
        .context(format!("failed to read benchmark: {}", filename))?;
    parse_str(&text)
}

pub fn parse_str(text: &str) -> Result<RoutingInstance> {
    let mut toks = Tokens::new(text);

    let mut gx = 0;
    let mut gy = 0;
    let mut cap = 0;
    let mut nets: Vec<Net> = Vec::new();
    let mut blockages: Vec<(Point, Point, i32)> = Vec::new();
    let mut read_nets = false;

    while let Some((line, word)) = toks.peek() {
        match word {
            "grid" => {
                toks.next();
                gx = toks.expect_int("grid x dimension")?;
                gy = toks.expect_int("grid y dimension")?;
            }
            "capacity" => {
                toks.next();
                cap = toks.expect_int("capacity")?;
            }
            "num" => {
                toks.next();
                toks.expect_keyword("net")?;
                let count: i64 = toks.expect_int("net count")?;
                if count < 0 {
                    bail!("line {}: net count must be nonnegative", line);
                }
                for _ in 0..count {
                    nets.push(read_net(&mut toks)?);
                }
                read_nets = true;
            }
            _ if word.chars().next().is_some_and(|c| c.is_ascii_digit()) => {
                if !read_nets {
                    bail!("line {}: unexpected integer before net section", line);
                }
                let count: i64 = toks.expect_int("blockage count")?;
                for _ in 0..count {
                    let p1 = read_point(&mut toks)?;
                    let p2 = read_point(&mut toks)?;
                    let capacity: i32 = toks.expect_int("blockage capacity")?;
                    blockages.push((p1, p2, capacity));
                }
            }
            _ => bail!("line {}: unexpected token '{}'", line, word),
        }
    }

    let mut inst = RoutingInstance::new(gx, gy, cap);
    inst.nets = nets;
    inst.validate()?;

    let codec = inst.codec();
    for (p1, p2, capacity) in blockages {
        let id = codec.edge_id(p1, p2)?;
        inst.set_edge_cap(id, capacity);
    }

    Ok(inst)
}

fn read_net(toks: &mut Tokens<'_>) -> Result<Net> {
    let (line, name) = toks
        .next()
        .ok_or_else(|| anyhow::anyhow!("unexpected EOF: expected net name"))?;
    let id: u32 = name
        .strip_prefix('n')
        .and_then(|s| s.parse().ok())
        .with_context(|| format!("line {}: invalid net name '{}'", line, name))?;

    let pin_count: i64 = toks.expect_int("pin count")?;
    if pin_count < 0 {
        bail!("line {}: pin count must be nonnegative", line);
    }

    let mut pins = Vec::with_capacity(pin_count as usize);
    for _ in 0..pin_count {
        pins.push(read_point(toks)?);
    }
    Ok(Net::new(NetId(id), pins))
}

fn read_point(toks: &mut Tokens<'_>) -> Result<Point> {
    let x: i32 = toks.expect_int("x coordinate")?;
    let y: i32 = toks.expect_int("y coordinate")?;
    Ok(Point::new(x, y))
}

// Whitespace tokenizer that remembers the source line of every token.
struct Tokens<'a> {
    toks: Vec<(usize, &'a str)>,
    pos: usize,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        let mut toks = Vec::new();
        for (i, line) in text.lines().enumerate() {
            for word in line.split_whitespace() {
                toks.push((i + 1, word));
            }
        }
        Self { toks, pos: 0 }
    }

    fn peek(&self) -> Option<(usize, &'a str)> {
        self.toks.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<(usize, &'a str)> {
        let t = self.peek();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    // Parses directly into the caller's integer type so out-of-range
    // values fail here with a line number instead of wrapping.
    fn expect_int<T>(&mut self, what: &str) -> Result<T>
    where
        T: std::str::FromStr<Err = std::num::ParseIntError>,
    {
        match self.next() {
            Some((line, word)) => word
                .parse()
                .with_context(|| format!("line {}: invalid integer for {}: '{}'", line, what, word)),
            None => bail!("unexpected EOF: expected {}", what),
        }
    }

    fn expect_keyword(&mut self, kw: &str) -> Result<()> {
        match self.next() {
            Some((_, word)) if word == kw => Ok(()),
            Some((line, word)) => bail!("line {}: expected '{}', got '{}'", line, kw, word),
            None => bail!("unexpected EOF: expected '{}'", kw),
        }
    }
}
