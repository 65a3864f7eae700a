use std::fmt::Display;

use burn::{
    module::AutodiffModule,
    optim::{GradientsParams, Optimizer},
    prelude::*,
    record::{BinBytesRecorder, FullPrecisionSettings, Recorder},
    tensor::{backend::AutodiffBackend, ElementConversion},
};
use nn::loss::{MseLoss, Reduction};

use crate::{
    env::{EncodingMode, StateEncoding},
    error::{Error, Result},
    traits::{tensor_to_rows, ToTensor},
};

use super::QFunction;

/// A burn module used as a Q network
///
/// Inputs are always flattened to `[batch, features]`; models that need spatial structure reshape internally.
pub trait DQNModel<B: AutodiffBackend>: AutodiffModule<B> {
    /// Forward pass through the model
    ///
    /// In shape: `[batch, features]`
    ///
    /// Out shape: `[batch, num_actions]`
    fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2>;
}

/// A [`QFunction`] backed by a burn [`DQNModel`], trained with Adam on a mean squared error loss
///
/// ### Generics
/// - `B`: A burn autodiff backend
/// - `M`: The [`DQNModel`] holding the parameters
/// - `O`: The optimizer updating the parameters
pub struct BurnQFunction<B, M, O>
where
    B: AutodiffBackend,
    M: DQNModel<B>,
    O: Optimizer<M, B>,
{
    model: M,
    optimizer: O,
    loss: MseLoss<B>,
    lr: f64,
    device: B::Device,
    mode: EncodingMode,
    input_size: usize,
    num_actions: usize,
    topology: String,
}

impl<B, M, O> BurnQFunction<B, M, O>
where
    B: AutodiffBackend,
    M: DQNModel<B>,
    O: Optimizer<M, B>,
{
    /// Wrap a freshly initialized `model`
    ///
    /// `topology` should render the config the model was built from, so that checkpoints can be matched against it.
    pub fn new(
        model: M,
        optimizer: O,
        topology: impl Display,
        mode: EncodingMode,
        input_size: usize,
        num_actions: usize,
        lr: f64,
        device: B::Device,
    ) -> Self {
        Self {
            model,
            optimizer,
            loss: MseLoss::new(),
            lr,
            device,
            mode,
            input_size,
            num_actions,
            topology: topology.to_string(),
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }
}

impl<B, M, O> QFunction for BurnQFunction<B, M, O>
where
    B: AutodiffBackend,
    M: DQNModel<B>,
    O: Optimizer<M, B>,
{
    type Weights = M::Record;

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
        self.topology.clone()
    }

    fn predict(&self, states: &[StateEncoding]) -> Vec<Vec<f32>> {
        if states.is_empty() {
            return Vec::new();
        }
        let input: Tensor<B, 2> = states.to_tensor(&self.device);
        tensor_to_rows(self.model.forward(input).detach())
    }

    fn fit(&mut self, states: &[StateEncoding], targets: &[Vec<f32>]) -> f32 {
        let input: Tensor<B, 2> = states.to_tensor(&self.device);
        let targets: Tensor<B, 2> = targets.to_tensor(&self.device);

        let output = self.model.forward(input);
        let loss = self.loss.forward(output, targets, Reduction::Mean);
        let value = loss.clone().into_scalar().elem::<f32>();

        let grads = GradientsParams::from_grads(loss.backward(), &self.model);
        self.model = self.optimizer.step(self.lr, self.model.clone(), grads);

        value
    }

    fn get_weights(&self) -> Self::Weights {
        self.model.clone().into_record()
    }

    fn set_weights(&mut self, weights: Self::Weights) {
        self.model = self.model.clone().load_record(weights);
    }

    fn serialize_weights(&self, weights: Self::Weights) -> Result<Vec<u8>> {
        let recorder = BinBytesRecorder::<FullPrecisionSettings>::default();
        Recorder::<B>::record(&recorder, weights, ())
            .map_err(|e| Error::WeightEncoding(e.to_string()))
    }

    fn deserialize_weights(&self, bytes: Vec<u8>) -> Result<Self::Weights> {
        let recorder = BinBytesRecorder::<FullPrecisionSettings>::default();
        Recorder::<B>::load(&recorder, bytes, &self.device)
            .map_err(|e| Error::CorruptStateStore(format!("unreadable network weights: {e}")))
    }
}
