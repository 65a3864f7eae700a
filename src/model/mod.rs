mod burn_q;
mod conv;
mod mlp;

pub use burn_q::{BurnQFunction, DQNModel};
pub use conv::{ConvNet, ConvNetConfig};
pub use mlp::{Mlp, MlpConfig};

use crate::{
    env::{EncodingMode, StateEncoding},
    error::Result,
};

/// A parametric mapping from a state encoding to one value per action
///
/// The learner only relies on this narrow contract, so the network topology stays pluggable.
pub trait QFunction {
    /// An in-memory snapshot of the parameters
    type Weights;

    /// Number of scalars expected in each encoding
    fn input_size(&self) -> usize;

    fn num_actions(&self) -> usize;

    /// The kind of encoding this function reads
    fn mode(&self) -> EncodingMode;

    /// A description of the topology; weights only load into a function with the same topology
    fn topology(&self) -> String;

    /// Action values for every encoding in the batch, one row per encoding
    fn predict(&self, states: &[StateEncoding]) -> Vec<Vec<f32>>;

    /// Take one optimisation step towards `targets` and return the loss before the step
    fn fit(&mut self, states: &[StateEncoding], targets: &[Vec<f32>]) -> f32;

    fn get_weights(&self) -> Self::Weights;

    fn set_weights(&mut self, weights: Self::Weights);

    /// Encode a snapshot as an opaque blob for the state store
    fn serialize_weights(&self, weights: Self::Weights) -> Result<Vec<u8>>;

    /// Decode a blob produced by [`QFunction::serialize_weights`]
    fn deserialize_weights(&self, bytes: Vec<u8>) -> Result<Self::Weights>;
}

#[cfg(test)]
pub(crate) mod tests {
    use crate::error::Error;

    use super::*;

    /// A linear stand-in for a network: `q[a] = x[0] + bias + a / 10`
    ///
    /// Every `fit` call is recorded so tests can inspect the targets the learner produced. The mode follows the action
    /// space: 4 actions read images, anything else reads vectors.
    #[derive(Debug, Clone)]
    pub(crate) struct MockQ {
        pub input_size: usize,
        pub num_actions: usize,
        pub mode: EncodingMode,
        pub bias: f32,
        pub fits: Vec<(Vec<StateEncoding>, Vec<Vec<f32>>)>,
    }

    impl MockQ {
        pub fn new(input_size: usize, num_actions: usize, bias: f32) -> Self {
            let mode = if num_actions == EncodingMode::Image.num_actions() {
                EncodingMode::Image
            } else {
                EncodingMode::Vector
            };
            Self {
                input_size,
                num_actions,
                mode,
                bias,
                fits: Vec::new(),
            }
        }

        pub fn row(&self, state: &StateEncoding) -> Vec<f32> {
            (0..self.num_actions)
                .map(|a| state.as_slice()[0] + self.bias + a as f32 / 10.0)
                .collect()
        }
    }

    impl QFunction for MockQ {
        type Weights = f32;

        fn input_size(&self) -> usize {
            self.input_size
        }

        fn num_actions(&self) -> usize {
            self.num_actions
        }

        fn mode(&self) -> EncodingMode {
            self.mode
        }

        fn topology(&self) -> String {
            format!("mock {:?} {}x{}", self.mode, self.input_size, self.num_actions)
        }

        fn predict(&self, states: &[StateEncoding]) -> Vec<Vec<f32>> {
            states.iter().map(|s| self.row(s)).collect()
        }

        fn fit(&mut self, states: &[StateEncoding], targets: &[Vec<f32>]) -> f32 {
            self.fits.push((states.to_vec(), targets.to_vec()));
            self.bias += 1.0;
            0.5
        }

        fn get_weights(&self) -> f32 {
            self.bias
        }

        fn set_weights(&mut self, weights: f32) {
            self.bias = weights;
        }

        fn serialize_weights(&self, weights: f32) -> Result<Vec<u8>> {
            Ok(weights.to_le_bytes().to_vec())
        }

        fn deserialize_weights(&self, bytes: Vec<u8>) -> Result<f32> {
            let bytes: [u8; 4] = bytes
                .try_into()
                .map_err(|_| Error::CorruptStateStore(String::from("mock weights are 4 bytes")))?;
            Ok(f32::from_le_bytes(bytes))
        }
    }
}
