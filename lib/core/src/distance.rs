// Euclidean distance kernels used by the brute-force index.
// Four independent accumulators keep the loop free of a serial dependency,
// which lets LLVM vectorize it on every target without intrinsics.

/// Squared Euclidean distance. Slices must have equal length.
#[inline]
pub fn squared_euclidean(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    let mut sum = [0.0f32; 4];
    let chunks = a.chunks_exact(4);
    let remainder = chunks.remainder();
    let b_chunks = b.chunks_exact(4);

    for (a_chunk, b_chunk) in chunks.zip(b_chunks) {
        for lane in 0..4 {
            let d = a_chunk[lane] - b_chunk[lane];
            sum[lane] += d * d;
        }
    }

    let tail_start = a.len() - remainder.len();
    let mut tail = 0.0f32;
    for (x, y) in remainder.iter().zip(&b[tail_start..]) {
        let d = x - y;
        tail += d * d;
    }

    (sum[0] + sum[1]) + (sum[2] + sum[3]) + tail
}

/// Euclidean (L2) distance
#[inline]
pub fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    squared_euclidean(a, b).sqrt()
}

/// Vector length
#[inline]
pub fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
    }

    #[test]
    fn test_squared_euclidean_matches_naive() {
        for dim in [1usize, 3, 4, 7, 16, 33, 384] {
            let a: Vec<f32> = (0..dim).map(|i| (i as f32 * 0.37).sin()).collect();
            let b: Vec<f32> = (0..dim).map(|i| (i as f32 * 0.11).cos()).collect();
            let expected = naive(&a, &b);
            assert!(
                (squared_euclidean(&a, &b) - expected).abs() < 1e-4,
                "dim {} mismatch",
                dim
            );
        }
    }

    #[test]
    fn test_euclidean() {
        assert!((euclidean(&[0.0, 0.0], &[3.0, 4.0]) - 5.0).abs() < 1e-6);
        assert_eq!(euclidean(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn test_norm() {
        assert!((norm(&[3.0, 4.0]) - 5.0).abs() < 1e-6);
        assert_eq!(norm(&[]), 0.0);
    }
}
