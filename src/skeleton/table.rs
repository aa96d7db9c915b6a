//! Compile-time removability table for two-pass thinning.
//!
//! A pixel's 8-neighbourhood is packed into one byte, bit `k` set when the
//! neighbour at [`NEIGHBOR_OFFSETS`]`[k]` is a ridge pixel. The order runs
//! clockwise from north: N, NE, E, SE, S, SW, W, NW.

/// Neighbour offsets `(dx, dy)` in bit order, rows growing downwards.
pub(crate) const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

const N: u8 = 1 << 0;
const E: u8 = 1 << 2;
const S: u8 = 1 << 4;
const W: u8 = 1 << 6;

/// Removability per sub-iteration, indexed by neighbour pattern.
pub(crate) const REMOVABLE: [[bool; 256]; 2] = [build_table(0), build_table(1)];

/// Number of 8-connected ridge components around the centre (Yokoi).
///
/// Diagonal neighbours bridge their two adjacent edge neighbours, so an
/// L-shaped pair such as W + S counts as one component.
pub(crate) const fn connectivity_number(pattern: u8) -> u32 {
    let mut count = 0;
    let mut k = 0;
    while k < 8 {
        let a = 1 - bit(pattern, k);
        let b = 1 - bit(pattern, (k + 1) % 8);
        let c = 1 - bit(pattern, (k + 2) % 8);
        count += a - a * b * c;
        k += 2;
    }
    count
}

const fn bit(pattern: u8, k: u32) -> u32 {
    ((pattern >> k) & 1) as u32
}

const fn has(pattern: u8, mask: u8) -> bool {
    pattern & mask == mask
}

const fn removable(pattern: u8, pass: usize) -> bool {
    let neighbours = pattern.count_ones();
    if neighbours < 2 || neighbours > 6 {
        return false;
    }
    if connectivity_number(pattern) != 1 {
        return false;
    }
    if pass == 0 {
        !has(pattern, N | E | S) && !has(pattern, E | S | W)
    } else {
        !has(pattern, N | E | W) && !has(pattern, N | S | W)
    }
}

const fn build_table(pass: usize) -> [bool; 256] {
    let mut table = [false; 256];
    let mut pattern = 0usize;
    while pattern < 256 {
        table[pattern] = removable(pattern as u8, pass);
        pattern += 1;
    }
    table
}

#[cfg(test)]
mod tests {
    use super::{connectivity_number, E, N, REMOVABLE, S, W};

    const NE: u8 = 1 << 1;
    const SE: u8 = 1 << 3;
    const SW: u8 = 1 << 5;
    const NW: u8 = 1 << 7;

    #[test]
    fn connectivity_counts_components() {
        assert_eq!(connectivity_number(0), 0);
        assert_eq!(connectivity_number(0xFF), 0);
        assert_eq!(connectivity_number(W | S), 1);
        assert_eq!(connectivity_number(NW | SE), 2);
        assert_eq!(connectivity_number(N | SE | SW), 3);
        assert_eq!(connectivity_number(N | NE | E), 1);
    }

    #[test]
    fn endpoints_and_bridges_are_kept() {
        for pass in 0..2 {
            // Endpoint.
            assert!(!REMOVABLE[pass][N as usize]);
            // Line interior connecting north and south.
            assert!(!REMOVABLE[pass][(N | S) as usize]);
            // Isolated pixel.
            assert!(!REMOVABLE[pass][0]);
        }
    }

    #[test]
    fn passes_peel_opposite_corners() {
        // South-east corner of a blob: neighbours N, NW, W.
        let se_corner = (N | NW | W) as usize;
        assert!(REMOVABLE[0][se_corner]);
        assert!(REMOVABLE[1][se_corner]);
        // West edge pixel of a thick vertical bar: N, NE, E, SE, S.
        let west_edge = (N | NE | E | SE | S) as usize;
        assert!(!REMOVABLE[0][west_edge]);
        assert!(REMOVABLE[1][west_edge]);
        // East edge pixel: N, S, SW, W, NW.
        let east_edge = (N | S | SW | W | NW) as usize;
        assert!(!REMOVABLE[0][east_edge] || !REMOVABLE[1][east_edge]);
    }
}
