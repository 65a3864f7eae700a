use burn::{
    nn::{Linear, LinearConfig, Relu},
    optim::{AdamConfig, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::env::EncodingMode;

use super::{BurnQFunction, DQNModel};

/// Fully connected Q network for vector encodings
#[derive(Module, Debug)]
pub struct Mlp<B: Backend> {
    hidden: Vec<Linear<B>>,
    output: Linear<B>,
    activation: Relu,
}

#[derive(Config, Debug)]
pub struct MlpConfig {
    pub input_size: usize,
    pub num_actions: usize,
    #[config(default = "vec![64, 128, 256, 256, 128, 64]")]
    pub hidden_sizes: Vec<usize>,
}

impl MlpConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Mlp<B> {
        let mut hidden = Vec::with_capacity(self.hidden_sizes.len());
        let mut width = self.input_size;
        for &size in &self.hidden_sizes {
            hidden.push(LinearConfig::new(width, size).init(device));
            width = size;
        }

        Mlp {
            hidden,
            output: LinearConfig::new(width, self.num_actions).init(device),
            activation: Relu::new(),
        }
    }

    /// Build the network and wrap it as a trainable Q function
    pub fn q_function<B: AutodiffBackend>(
        &self,
        lr: f64,
        device: B::Device,
    ) -> BurnQFunction<B, Mlp<B>, impl Optimizer<Mlp<B>, B>> {
        let model = self.init(&device);
        BurnQFunction::new(
            model,
            AdamConfig::new().init(),
            self,
            EncodingMode::Vector,
            self.input_size,
            self.num_actions,
            lr,
            device,
        )
    }
}

impl<B: AutodiffBackend> DQNModel<B> for Mlp<B> {
    fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self
            .hidden
            .iter()
            .fold(input, |x, layer| self.activation.forward(layer.forward(x)));
        self.output.forward(x)
    }
}
