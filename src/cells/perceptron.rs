use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::tensor::activation;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Activation applied after the affine map of a [`Perceptron`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PerceptronActivation {
    Relu,
    Sigmoid,
}

/// Single affine layer followed by an activation
#[derive(Module, Debug)]
pub struct Perceptron<B: Backend> {
    linear: Linear<B>,
    #[module(skip)]
    activation: PerceptronActivation,
}

impl<B: Backend> Perceptron<B> {
    pub fn new(
        input_size: usize,
        output_size: usize,
        activation: PerceptronActivation,
        device: &B::Device,
    ) -> Self {
        let linear = LinearConfig::new(input_size, output_size)
            .with_bias(true)
            .init(device);

        Self { linear, activation }
    }

    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.linear.forward(input);
        match self.activation {
            PerceptronActivation::Relu => activation::relu(x),
            PerceptronActivation::Sigmoid => activation::sigmoid(x),
        }
    }
}
