//! Zig-zag scan order, from low to high frequencies.

use std::sync::OnceLock;
use crate::error::{Error, Result};
use crate::layer::{STANDARD_PATCH_SIZE, EXTENDED_PATCH_SIZE};


/// The scan order for the specified patch size:
/// element `k` is the row-major index of the `k`-th transmitted coefficient.
/// Supports the standard and the extended patch size.
pub fn scan_order(size: usize) -> Result<&'static [usize]> {
    static STANDARD: OnceLock<Vec<usize>> = OnceLock::new();
    static EXTENDED: OnceLock<Vec<usize>> = OnceLock::new();

    match size {
        STANDARD_PATCH_SIZE => Ok(STANDARD.get_or_init(|| build_scan_order(STANDARD_PATCH_SIZE))),
        EXTENDED_PATCH_SIZE => Ok(EXTENDED.get_or_init(|| build_scan_order(EXTENDED_PATCH_SIZE))),
        _ => Err(Error::unsupported(format!("patch size {}", size))),
    }
}

/// Walk the square in zig-zag order, starting at the top left corner
/// and stepping right first. At an edge, the walk steps right or down
/// and then follows the next diagonal in the opposite direction.
pub fn build_scan_order(size: usize) -> Vec<usize> {
    let mut order = Vec::with_capacity(size * size);
    if size == 0 { return order; }

    let last = size - 1;
    let (mut column, mut row) = (0_usize, 0_usize);
    let mut on_diagonal = false;
    let mut up_right = true;

    while column < size && row < size {
        order.push(row * size + column);

        if !on_diagonal {
            if up_right {
                if column < last { column += 1 } else { row += 1 }
            }
            else {
                if row < last { row += 1 } else { column += 1 }
            }

            up_right = !up_right;
            on_diagonal = true;
        }
        else if up_right {
            column += 1;
            row -= 1; // a rising diagonal ends before reaching row zero
            if column == last || row == 0 { on_diagonal = false; }
        }
        else {
            column -= 1; // a falling diagonal ends before reaching column zero
            row += 1;
            if row == last || column == 0 { on_diagonal = false; }
        }
    }

    order
}


#[cfg(test)]
mod test {
    use super::*;

    /// The classic 8x8 table.
    const ZIGZAG_8: [usize; 64] = [
         0,  1,  8, 16,  9,  2,  3, 10,
        17, 24, 32, 25, 18, 11,  4,  5,
        12, 19, 26, 33, 40, 48, 41, 34,
        27, 20, 13,  6,  7, 14, 21, 28,
        35, 42, 49, 56, 57, 50, 43, 36,
        29, 22, 15, 23, 30, 37, 44, 51,
        58, 59, 52, 45, 38, 31, 39, 46,
        53, 60, 61, 54, 47, 55, 62, 63,
    ];

    #[test]
    fn matches_classic_table() {
        assert_eq!(build_scan_order(8), ZIGZAG_8.to_vec());
    }

    #[test]
    fn is_permutation() {
        for &size in [1_usize, 2, 3, 8, 16, 32].iter() {
            let mut order = build_scan_order(size);
            assert_eq!(order.len(), size * size);

            order.sort_unstable();
            assert!(order.iter().copied().eq(0 .. size * size), "size {}", size);
        }
    }

    #[test]
    fn frequencies_ascend() {
        let size = 16;
        let order = scan_order(size).unwrap();

        // every diagonal is completed before the next one starts
        let diagonals: Vec<usize> = order.iter().map(|index| index / size + index % size).collect();
        assert!(diagonals.windows(2).all(|pair| pair[1] >= pair[0]));

        assert_eq!(&order[.. 4], &[0, 1, 16, 32]);
        assert_eq!(order[255], 255);
    }

    #[test]
    fn cached_orders() {
        assert!(std::ptr::eq(scan_order(32).unwrap(), scan_order(32).unwrap()));
        assert!(scan_order(8).is_err());
    }
}
