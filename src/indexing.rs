//! Index arithmetic for element-wise and block-cyclic distributions
//!
//! Pure, deterministic mappings between global indices and (rank, local
//! index) pairs. Every checked entry point validates its preconditions and
//! returns `Err(Error::InvalidArgument)` on violation; the `_unchecked`
//! siblings carry the bare formulas and are used on hot paths after the
//! arguments have been validated once.

use crate::error::{Error, Result};

/// Signed index type. Shift computations pass through negative
/// intermediates, so all of this module works on signed integers.
pub type Int = i64;

/// Floor modulus: always returns a value in `[0, b)`, even for negative `a`.
pub fn floor_mod(a: Int, b: Int) -> Result<Int> {
    if b <= 0 {
        return Err(Error::InvalidArgument(format!(
            "modulus must be positive, got {b}"
        )));
    }
    Ok(floor_mod_unchecked(a, b))
}

#[inline]
pub fn floor_mod_unchecked(a: Int, b: Int) -> Int {
    let rem = a % b;
    if rem >= 0 {
        rem
    } else {
        rem + b
    }
}

fn check_stride(stride: Int) -> Result<()> {
    if stride <= 0 {
        return Err(Error::InvalidArgument(format!(
            "stride must be positive, got {stride}"
        )));
    }
    Ok(())
}

fn check_shift(shift: Int, stride: Int) -> Result<()> {
    check_stride(stride)?;
    if shift < 0 || shift >= stride {
        return Err(Error::InvalidArgument(format!(
            "invalid shift: shift={shift}, stride={stride}"
        )));
    }
    Ok(())
}

fn check_size(n: Int) -> Result<()> {
    if n < 0 {
        return Err(Error::InvalidArgument(format!(
            "size must be non-negative, got {n}"
        )));
    }
    Ok(())
}

fn check_block(bsize: Int, cut: Int) -> Result<()> {
    if bsize <= 0 {
        return Err(Error::InvalidArgument(format!(
            "block size must be positive, got {bsize}"
        )));
    }
    if cut < 0 || cut >= bsize {
        return Err(Error::InvalidArgument(format!(
            "invalid cut: cut={cut}, bsize={bsize}"
        )));
    }
    Ok(())
}

/// Number of indices of a length-`n` sequence owned by a process with the
/// given `shift` under uniform striding, i.e. the count of `i` in `[0, n)`
/// with `i ≡ shift (mod stride)`.
pub fn length(n: Int, shift: Int, stride: Int) -> Result<Int> {
    check_size(n)?;
    check_shift(shift, stride)?;
    Ok(length_unchecked(n, shift, stride))
}

#[inline]
pub fn length_unchecked(n: Int, shift: Int, stride: Int) -> Int {
    if n > shift {
        (n - shift - 1) / stride + 1
    } else {
        0
    }
}

/// [`length`] with the shift derived from a (rank, alignment) pair.
pub fn length_with_rank(n: Int, rank: Int, align: Int, stride: Int) -> Result<Int> {
    let shift = shift(rank, align, stride)?;
    length(n, shift, stride)
}

/// The maximum of [`length`] over all shifts; equals `ceil(n / stride)`.
pub fn max_length(n: Int, stride: Int) -> Result<Int> {
    check_size(n)?;
    check_stride(stride)?;
    Ok(if n > 0 { (n - 1) / stride + 1 } else { 0 })
}

/// Global index of local index `i_loc` under an element-wise distribution.
#[inline]
pub fn global_index(i_loc: Int, shift: Int, stride: Int) -> Int {
    shift + i_loc * stride
}

/// Number of indices of a length-`n` sequence owned by a process with the
/// given `shift` under a block-cyclic distribution with block size `bsize`,
/// where `cut` entries of the first block were already consumed.
///
/// The count decomposes into three phases: a truncated first block (owned
/// only if `shift == 0`), full interior blocks cycling every `stride`
/// blocks, and a possibly empty trailing partial block.
pub fn blocked_length(n: Int, shift: Int, bsize: Int, cut: Int, stride: Int) -> Result<Int> {
    check_size(n)?;
    check_shift(shift, stride)?;
    check_block(bsize, cut)?;
    Ok(blocked_length_unchecked(n, shift, bsize, cut, stride))
}

pub fn blocked_length_unchecked(
    mut n: Int,
    mut shift: Int,
    bsize: Int,
    cut: Int,
    stride: Int,
) -> Int {
    let mut length = 0;

    // The truncated first block
    let first_leftover = n.min(bsize - cut);
    if shift == 0 {
        length += first_leftover;
    }
    n -= first_leftover;
    // Cycle each process's first block left one
    shift = floor_mod_unchecked(shift - 1, stride);

    // Full middle blocks
    let num_blocks = n / bsize;
    length += length_unchecked(num_blocks, shift, stride) * bsize;
    n -= num_blocks * bsize;
    // Cycle each process's first block left by num_blocks
    shift = floor_mod_unchecked(shift - num_blocks, stride);

    // The (possibly empty) trailing block
    if shift == 0 {
        length += n;
    }

    length
}

/// [`blocked_length`] with the shift derived from a (rank, alignment) pair.
pub fn blocked_length_with_rank(
    n: Int,
    rank: Int,
    align: Int,
    bsize: Int,
    cut: Int,
    stride: Int,
) -> Result<Int> {
    let shift = shift(rank, align, stride)?;
    blocked_length(n, shift, bsize, cut, stride)
}

/// [`blocked_length`] at shift 0, which bounds every shift when `cut == 0`.
/// A truncated first block can move the true maximum to a nonzero shift
/// (n=5, bsize=2, cut=1, stride=3: shift 0 owns one entry, shift 1 owns two).
pub fn max_blocked_length(n: Int, bsize: Int, cut: Int, stride: Int) -> Result<Int> {
    blocked_length(n, 0, bsize, cut, stride)
}

/// Global index corresponding to local index `i_loc` under a block-cyclic
/// distribution. Inverse of the local counting performed by
/// [`blocked_length`].
pub fn global_blocked_index(i_loc: Int, shift: Int, bsize: Int, cut: Int, stride: Int) -> Int {
    // Global entries before the first block this process owns data in
    // (negative if we own the first block and the cut is nonzero)
    let i_before = shift * bsize - cut;

    let i_loc_adj = if shift == 0 { i_loc + cut } else { i_loc };
    let num_filled_blocks = i_loc_adj / bsize;
    let i_mid = num_filled_blocks * bsize * stride;
    let i_post = i_loc_adj - num_filled_blocks * bsize;

    i_before + i_mid + i_post
}

/// Local index of global index `i` under a block-cyclic distribution, or
/// `None` when `i` is owned by a different shift. Exact inverse of
/// [`global_blocked_index`] over the owned index range.
pub fn local_blocked_index(i: Int, shift: Int, bsize: Int, cut: Int, stride: Int) -> Option<Int> {
    let i_before = shift * bsize - cut;
    let d = i - i_before;
    if d < 0 {
        return None;
    }
    let full = bsize * stride;
    let k = d / full;
    let offset = d - k * full;
    if offset >= bsize {
        return None;
    }
    let i_loc_adj = k * bsize + offset;
    if shift == 0 {
        Some(i_loc_adj - cut)
    } else {
        Some(i_loc_adj)
    }
}

/// Rank owning global index `i` under a block-cyclic distribution.
pub fn owning_rank(i: Int, align: Int, bsize: Int, cut: Int, stride: Int) -> Int {
    let block = (i + cut) / bsize;
    floor_mod_unchecked(align + block, stride)
}

/// First global index assigned to `rank` given an alignment and stride.
pub fn shift(rank: Int, align: Int, stride: Int) -> Result<Int> {
    check_stride(stride)?;
    if align < 0 || align >= stride {
        return Err(Error::InvalidArgument(format!(
            "invalid alignment: align={align}, stride={stride}"
        )));
    }
    Ok(shift_unchecked(rank, align, stride))
}

#[inline]
pub fn shift_unchecked(rank: Int, align: Int, stride: Int) -> Int {
    floor_mod_unchecked(rank - align, stride)
}

/// Offset of the beginning of the last (possibly partial) block.
pub fn last_offset(n: Int, bsize: Int) -> Int {
    if floor_mod_unchecked(n, bsize) != 0 {
        bsize * (n / bsize)
    } else {
        bsize * (n / bsize - 1)
    }
}

/// Length of the diagonal of a `height x width` matrix at a signed offset
/// (positive offsets lie above the main diagonal). Saturates to zero once the
/// offset leaves the matrix.
pub fn diagonal_length(height: Int, width: Int, offset: Int) -> Int {
    if offset > 0 {
        let rem_width = (width - offset).max(0);
        height.min(rem_width)
    } else {
        let rem_height = (height + offset).max(0);
        rem_height.min(width)
    }
}

/// Greatest common divisor of two non-negative integers.
pub fn gcd(a: Int, b: Int) -> Result<Int> {
    if a < 0 || b < 0 {
        return Err(Error::InvalidArgument(
            "gcd called with negative argument".into(),
        ));
    }
    Ok(gcd_unchecked(a, b))
}

pub fn gcd_unchecked(a: Int, b: Int) -> Int {
    if b == 0 {
        a
    } else {
        gcd_unchecked(b, a - b * (a / b))
    }
}

/// True iff `n` is a positive power of two.
pub fn power_of_two(n: u64) -> bool {
    n != 0 && (n & (n - 1)) == 0
}

/// Floor of the base-2 logarithm of `n`.
pub fn floored_log2(mut n: u64) -> u64 {
    let mut result = 0;
    while n > 1 {
        n >>= 1;
        result += 1;
    }
    result
}
