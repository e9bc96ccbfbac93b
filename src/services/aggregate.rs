use crate::{
    error::{AppError, AppResult},
    models::Embedding,
};

/// Element-wise arithmetic mean of a set of equal-length vectors
///
/// Sums are accumulated in `f64` and narrowed back to `f32`, so a single
/// vector (or several identical ones) averages to itself exactly.
pub fn mean_vector(vectors: &[Embedding]) -> AppResult<Embedding> {
    let first = vectors.first().ok_or(AppError::EmptyInput)?;
    let dimension = first.len();

    let mut sums = vec![0.0_f64; dimension];
    for vector in vectors {
        if vector.len() != dimension {
            return Err(AppError::EmbeddingService(format!(
                "Embedding dimension mismatch: expected {}, got {}",
                dimension,
                vector.len()
            )));
        }
        for (sum, value) in sums.iter_mut().zip(vector) {
            *sum += f64::from(*value);
        }
    }

    let count = vectors.len() as f64;
    Ok(sums.into_iter().map(|sum| (sum / count) as f32).collect())
}
