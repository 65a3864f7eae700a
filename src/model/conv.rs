use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        Linear, LinearConfig, PaddingConfig2d, Relu,
    },
    optim::{AdamConfig, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::env::EncodingMode;

use super::{BurnQFunction, DQNModel};

const KERNEL_SIZE: usize = 3;

/// Convolutional Q network for square image patches
#[derive(Module, Debug)]
pub struct ConvNet<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    fc1: Linear<B>,
    fc2: Linear<B>,
    fc3: Linear<B>,
    activation: Relu,
}

#[derive(Config, Debug)]
pub struct ConvNetConfig {
    /// Side length of the input patch
    pub side: usize,
    pub num_actions: usize,
    #[config(default = 32)]
    pub conv1_out: usize,
    #[config(default = 64)]
    pub conv2_out: usize,
    #[config(default = 256)]
    pub fc1_out: usize,
    #[config(default = 64)]
    pub fc2_out: usize,
}

impl ConvNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ConvNet<B> {
        let kernel = [KERNEL_SIZE, KERNEL_SIZE];
        // same padding keeps the patch size through both convolutions
        let conv_output_size = self.conv2_out * self.side * self.side;

        ConvNet {
            conv1: Conv2dConfig::new([1, self.conv1_out], kernel)
                .with_padding(PaddingConfig2d::Same)
                .init(device),
            conv2: Conv2dConfig::new([self.conv1_out, self.conv2_out], kernel)
                .with_padding(PaddingConfig2d::Same)
                .init(device),
            fc1: LinearConfig::new(conv_output_size, self.fc1_out).init(device),
            fc2: LinearConfig::new(self.fc1_out, self.fc2_out).init(device),
            fc3: LinearConfig::new(self.fc2_out, self.num_actions).init(device),
            activation: Relu::new(),
        }
    }

    pub fn input_size(&self) -> usize {
        self.side * self.side
    }

    /// Build the network and wrap it as a trainable Q function
    pub fn q_function<B: AutodiffBackend>(
        &self,
        lr: f64,
        device: B::Device,
    ) -> BurnQFunction<B, ConvNet<B>, impl Optimizer<ConvNet<B>, B>> {
        let model = self.init(&device);
        BurnQFunction::new(
            model,
            AdamConfig::new().init(),
            self,
            EncodingMode::Image,
            self.input_size(),
            self.num_actions,
            lr,
            device,
        )
    }
}

impl<B: AutodiffBackend> DQNModel<B> for ConvNet<B> {
    /// In shape: `[num_batches, side * side]`
    ///
    /// Out shape: `[num_batches, num_actions]`
    fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let [n, cells] = input.dims();
        let side = (cells as f64).sqrt().round() as usize;
        let x = input.reshape([n, 1, side, side]);

        let x = self.conv1.forward(x);
        let x = self.activation.forward(x);
        let x = self.conv2.forward(x);
        let x = self.activation.forward(x);

        let [n, c, h, w] = x.dims();
        let x = x.reshape([n, c * h * w]);
        let x = self.fc1.forward(x);
        let x = self.activation.forward(x);
        let x = self.fc2.forward(x);
        let x = self.activation.forward(x);
        self.fc3.forward(x)
    }
}
