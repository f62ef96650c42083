//! The capability every ensemble member exposes.

use std::sync::Arc;

use crate::error::GroveError;

/// A trained model that maps one input vector to one number.
///
/// Ensemble code is written against this trait only and never inspects the
/// concrete model. Implementations must be safe to call from many workers
/// at once; a trained model is never mutated.
pub trait Predict: Send + Sync {
    /// Predict the output for `input`.
    ///
    /// # Errors
    ///
    /// Implementations return [`GroveError`] when `input` is unusable.
    fn predict(&self, input: &[f64]) -> Result<f64, GroveError>;
}

impl<M: Predict + ?Sized> Predict for &M {
    fn predict(&self, input: &[f64]) -> Result<f64, GroveError> {
        (**self).predict(input)
    }
}

impl<M: Predict + ?Sized> Predict for Box<M> {
    fn predict(&self, input: &[f64]) -> Result<f64, GroveError> {
        (**self).predict(input)
    }
}

impl<M: Predict + ?Sized> Predict for Arc<M> {
    fn predict(&self, input: &[f64]) -> Result<f64, GroveError> {
        (**self).predict(input)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::Predict;
    use crate::error::GroveError;

    struct Doubler;

    impl Predict for Doubler {
        fn predict(&self, input: &[f64]) -> Result<f64, GroveError> {
            input.first().map(|v| v * 2.0).ok_or(GroveError::EmptyQuery)
        }
    }

    #[test]
    fn boxed_trait_objects_predict() {
        let models: Vec<Box<dyn Predict>> = vec![Box::new(Doubler), Box::new(Arc::new(Doubler))];
        for model in &models {
            assert_eq!(model.predict(&[1.5]).unwrap(), 3.0);
        }
        assert!(models[0].predict(&[]).is_err());
    }
}
