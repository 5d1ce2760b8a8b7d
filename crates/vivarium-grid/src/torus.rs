//! Wraparound addressing for square grids.

/// All 8 offsets: N, S, W, E, NW, NE, SW, SE.
pub const OFFSETS_8: [(isize, isize); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
];

/// Resolve `val + delta` on an axis of length `len` with periodic wrap.
///
/// `val` must already be in `[0, len)` and `delta` in `[-1, 1]`.
#[inline]
pub fn wrap_axis(val: usize, delta: isize, len: usize) -> usize {
    match delta {
        -1 if val == 0 => len - 1,
        -1 => val - 1,
        1 if val + 1 == len => 0,
        1 => val + 1,
        _ => val,
    }
}

/// Row-major indices of the 8 neighbours of `(row, col)` on a torus of
/// side `size`.
///
/// On grids smaller than 3 a neighbour may appear more than once (or be
/// the cell itself); that is the torus semantics and is kept as is.
#[inline]
pub fn neighbour_indices(row: usize, col: usize, size: usize) -> [usize; 8] {
    let mut out = [0usize; 8];
    for (slot, (dr, dc)) in out.iter_mut().zip(OFFSETS_8) {
        let r = wrap_axis(row, dr, size);
        let c = wrap_axis(col, dc, size);
        *slot = r * size + c;
    }
    out
}
