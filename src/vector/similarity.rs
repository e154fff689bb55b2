//! Vector math for ranking.

/// Scales `vector` to unit length in place. Zero vectors are left as is.
pub fn normalize(vector: &mut [f32]) {
    let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for value in vector.iter_mut() {
            *value /= magnitude;
        }
    }
}

/// Dot product of two equally sized vectors.
///
/// For unit vectors this is their cosine similarity.
#[must_use]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_of_unit_vectors() {
        let v1 = [1.0, 0.0, 0.0];
        assert!((dot(&v1, &[1.0, 0.0, 0.0]) - 1.0).abs() < 0.001);
        assert!(dot(&v1, &[0.0, 1.0, 0.0]).abs() < 0.001);
        assert!((dot(&v1, &[-1.0, 0.0, 0.0]) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_normalize_then_dot_is_cosine() {
        let mut a = vec![3.0, 4.0, 0.0];
        let mut b = vec![1.0, 2.0, 2.0];
        // (3 + 8) / (5 * 3)
        let expected = 11.0 / 15.0;

        normalize(&mut a);
        normalize(&mut b);

        let magnitude: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 1e-6);
        assert!((dot(&a, &b) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_zero_vector_is_noop() {
        let mut zero = vec![0.0; 4];
        normalize(&mut zero);
        assert_eq!(zero, vec![0.0; 4]);
    }
}
