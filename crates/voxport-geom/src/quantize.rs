/// Low mantissa bits discarded when comparing or hashing coordinates.
pub const QUANTIZE_DROP_BITS: u32 = 11;

const DROP_MASK: u32 = (1 << QUANTIZE_DROP_BITS) - 1;
const HALF_STEP: u32 = 1 << (QUANTIZE_DROP_BITS - 1);

/// Rounds `v` to the nearest float with the low [`QUANTIZE_DROP_BITS`] mantissa bits cleared.
///
/// Rounding is relative: the step grows with magnitude. NaN and infinities pass through.
/// Negative zero collapses to positive zero so equal values hash alike.
#[inline]
pub fn quantize(v: f32) -> f32 {
    if !v.is_finite() {
        return v;
    }
    if v == 0.0 {
        return 0.0;
    }
    let bits = v.to_bits();
    let sign = bits & 0x8000_0000;
    let mag = bits & 0x7FFF_FFFF;
    let rounded = mag.saturating_add(HALF_STEP) & !DROP_MASK;
    // Rounding can carry into the exponent; never past the largest finite value.
    let rounded = rounded.min(f32::MAX.to_bits() & !DROP_MASK);
    f32::from_bits(sign | rounded)
}

/// Bit pattern of [`quantize`], suitable as a hash key component.
#[inline]
pub fn quantized_bits(v: f32) -> u32 {
    quantize(v).to_bits()
}

/// Approximate equality under quantization.
#[inline]
pub fn float_eq(a: f32, b: f32) -> bool {
    quantize(a) == quantize(b)
}
