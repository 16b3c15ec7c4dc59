//! Scalar vector codec: f32 <-> u8 compression and cosine similarity.
//!
//! Embedding elements live in [-1, 1], so a fixed affine map onto the
//! full u8 range gives 4x memory reduction with a bounded per-element
//! error of one quantization step. The mapping is
//! `byte = round((clip(v) + 1) * 127.5)` and its inverse
//! `v = byte / 127.5 - 1`.

/// Size of one quantization step in float space (~0.0078).
///
/// The round-trip `dequantize(quantize(v))` is exact only up to this
/// bound per element, never bit-exact.
pub const QUANT_STEP: f32 = 1.0 / 127.5;

/// Quantize a float vector into one byte per element.
///
/// Non-finite elements (NaN, +/-inf) are treated as 0.0, then every
/// element is clipped to [-1, 1] before the affine map. Quantization is
/// total: it never fails, whatever the input.
pub fn quantize(vector: &[f32]) -> Vec<u8> {
    vector
        .iter()
        .map(|&v| {
            let v = if v.is_finite() { v } else { 0.0 };
            let clipped = v.clamp(-1.0, 1.0);
            ((clipped + 1.0) * 127.5).round() as u8
        })
        .collect()
}

/// Invert [`quantize`]: map each byte back into [-1, 1].
pub fn dequantize(bytes: &[u8]) -> Vec<f32> {
    bytes.iter().map(|&b| dequantize_one(b)).collect()
}

/// Dequantize a single byte.
#[inline]
pub fn dequantize_one(byte: u8) -> f32 {
    byte as f32 / 127.5 - 1.0
}

/// Cosine similarity between two equal-length vectors, in [-1, 1].
///
/// Returns 0.0 when either vector has zero norm. This is load-bearing:
/// the zero-vector fallback encoding relies on every similarity coming
/// out as exactly 0, so ranking degrades to original catalog order.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    let mut dot = 0.0_f32;
    let mut norm_a = 0.0_f32;
    let mut norm_b = 0.0_f32;
    for (&x, &y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}
