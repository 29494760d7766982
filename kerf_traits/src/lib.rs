/// Number of numeric features the trained model consumes.
pub const FEATURE_DIM: usize = 9;

/// Inference contract of the externally trained parameter model.
///
/// The core never builds, loads, or trains the model; it only hands a
/// fixed-length feature vector across this seam and receives three
/// normalized scalars back: power, speed, and passes, each in [0, 1].
pub trait ParamModel {
    fn infer(
        &self,
        features: &[f32; FEATURE_DIM],
    ) -> Result<[f32; 3], Box<dyn std::error::Error + Send + Sync>>;
}
