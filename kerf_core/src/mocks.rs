//! Test and helper mocks for kerf_core

use kerf_traits::{FEATURE_DIM, ParamModel};

/// A model that always returns the same normalized triple; useful for
/// exercising the model path of the engine without a trained artifact.
pub struct ConstModel(pub [f32; 3]);

impl ParamModel for ConstModel {
    fn infer(
        &self,
        _features: &[f32; FEATURE_DIM],
    ) -> Result<[f32; 3], Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.0)
    }
}

/// A model that always errors on inference; the engine must fall through to
/// the static algorithm.
pub struct FailingModel;

impl ParamModel for FailingModel {
    fn infer(
        &self,
        _features: &[f32; FEATURE_DIM],
    ) -> Result<[f32; 3], Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("model unavailable")))
    }
}
