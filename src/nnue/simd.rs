//! SIMD kernels for accumulator maintenance.
//!
//! Adding or subtracting a feature column is the hot path of incremental
//! NNUE updates, so it is vectorized where the target supports it:
//!
//! - `x86_64`: `AVX2` (256-bit vectors, 16 i16 at a time)
//! - aarch64: NEON (128-bit vectors, 8 i16 at a time)
//! - Fallback: scalar saturating arithmetic

use super::HIDDEN_SIZE;

/// Add a weight column to an accumulator lane-wise.
#[inline]
pub(crate) fn add_weights(acc: &mut [i16; HIDDEN_SIZE], weights: &[i16; HIDDEN_SIZE]) {
    #[cfg(target_arch = "aarch64")]
    {
        // NEON is always available on aarch64
        unsafe { add_weights_neon(acc, weights) }
    }

    #[cfg(all(target_arch = "x86_64", target_feature = "avx2"))]
    {
        unsafe { add_weights_avx2(acc, weights) }
    }

    #[cfg(all(target_arch = "x86_64", not(target_feature = "avx2")))]
    {
        if is_x86_feature_detected!("avx2") {
            unsafe { add_weights_avx2(acc, weights) }
        } else {
            add_weights_scalar(acc, weights)
        }
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        add_weights_scalar(acc, weights)
    }
}

/// Subtract a weight column from an accumulator lane-wise.
#[inline]
pub(crate) fn sub_weights(acc: &mut [i16; HIDDEN_SIZE], weights: &[i16; HIDDEN_SIZE]) {
    #[cfg(target_arch = "aarch64")]
    {
        unsafe { sub_weights_neon(acc, weights) }
    }

    #[cfg(all(target_arch = "x86_64", target_feature = "avx2"))]
    {
        unsafe { sub_weights_avx2(acc, weights) }
    }

    #[cfg(all(target_arch = "x86_64", not(target_feature = "avx2")))]
    {
        if is_x86_feature_detected!("avx2") {
            unsafe { sub_weights_avx2(acc, weights) }
        } else {
            sub_weights_scalar(acc, weights)
        }
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        sub_weights_scalar(acc, weights)
    }
}

#[cfg(any(
    test,
    not(any(target_arch = "x86_64", target_arch = "aarch64")),
    all(target_arch = "x86_64", not(target_feature = "avx2"))
))]
#[inline]
fn add_weights_scalar(acc: &mut [i16; HIDDEN_SIZE], weights: &[i16; HIDDEN_SIZE]) {
    for (a, &w) in acc.iter_mut().zip(weights.iter()) {
        *a = a.saturating_add(w);
    }
}

#[cfg(any(
    test,
    not(any(target_arch = "x86_64", target_arch = "aarch64")),
    all(target_arch = "x86_64", not(target_feature = "avx2"))
))]
#[inline]
fn sub_weights_scalar(acc: &mut [i16; HIDDEN_SIZE], weights: &[i16; HIDDEN_SIZE]) {
    for (a, &w) in acc.iter_mut().zip(weights.iter()) {
        *a = a.saturating_sub(w);
    }
}

#[cfg(target_arch = "aarch64")]
unsafe fn add_weights_neon(acc: &mut [i16; HIDDEN_SIZE], weights: &[i16; HIDDEN_SIZE]) {
    use std::arch::aarch64::{vld1q_s16, vqaddq_s16, vst1q_s16};

    let acc_ptr = acc.as_mut_ptr();
    let weights_ptr = weights.as_ptr();

    for i in (0..HIDDEN_SIZE).step_by(8) {
        let a = vld1q_s16(acc_ptr.add(i));
        let w = vld1q_s16(weights_ptr.add(i));
        vst1q_s16(acc_ptr.add(i), vqaddq_s16(a, w));
    }
}

#[cfg(target_arch = "aarch64")]
unsafe fn sub_weights_neon(acc: &mut [i16; HIDDEN_SIZE], weights: &[i16; HIDDEN_SIZE]) {
    use std::arch::aarch64::{vld1q_s16, vqsubq_s16, vst1q_s16};

    let acc_ptr = acc.as_mut_ptr();
    let weights_ptr = weights.as_ptr();

    for i in (0..HIDDEN_SIZE).step_by(8) {
        let a = vld1q_s16(acc_ptr.add(i));
        let w = vld1q_s16(weights_ptr.add(i));
        vst1q_s16(acc_ptr.add(i), vqsubq_s16(a, w));
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn add_weights_avx2(acc: &mut [i16; HIDDEN_SIZE], weights: &[i16; HIDDEN_SIZE]) {
    use std::arch::x86_64::{
        __m256i, _mm256_adds_epi16, _mm256_loadu_si256, _mm256_storeu_si256,
    };

    let acc_ptr = acc.as_mut_ptr();
    let weights_ptr = weights.as_ptr();

    for i in (0..HIDDEN_SIZE).step_by(16) {
        let a = _mm256_loadu_si256(acc_ptr.add(i) as *const __m256i);
        let w = _mm256_loadu_si256(weights_ptr.add(i) as *const __m256i);
        _mm256_storeu_si256(acc_ptr.add(i) as *mut __m256i, _mm256_adds_epi16(a, w));
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn sub_weights_avx2(acc: &mut [i16; HIDDEN_SIZE], weights: &[i16; HIDDEN_SIZE]) {
    use std::arch::x86_64::{
        __m256i, _mm256_loadu_si256, _mm256_storeu_si256, _mm256_subs_epi16,
    };

    let acc_ptr = acc.as_mut_ptr();
    let weights_ptr = weights.as_ptr();

    for i in (0..HIDDEN_SIZE).step_by(16) {
        let a = _mm256_loadu_si256(acc_ptr.add(i) as *const __m256i);
        let w = _mm256_loadu_si256(weights_ptr.add(i) as *const __m256i);
        _mm256_storeu_si256(acc_ptr.add(i) as *mut __m256i, _mm256_subs_epi16(a, w));
    }
}
