// At least two workers are always assumed so a partition never degenerates
// to the whole input on single-core fallbacks.
pub fn workers() -> usize {
    rayon::current_num_threads().max(2)
}

pub fn chunk_len(n: usize) -> usize {
    n.div_ceil(workers()).max(1)
}
