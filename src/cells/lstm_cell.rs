use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::tensor::activation;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Hidden and cell tensors of one LSTM layer, each `[batch_size, hidden_size]`
#[derive(Clone, Debug)]
pub struct LstmState<B: Backend> {
    pub hidden: Tensor<B, 2>,
    pub cell: Tensor<B, 2>,
}

impl<B: Backend> LstmState<B> {
    /// Zero state for a batch
    pub fn zeros(batch_size: usize, hidden_size: usize, device: &B::Device) -> Self {
        Self {
            hidden: Tensor::zeros([batch_size, hidden_size], device),
            cell: Tensor::zeros([batch_size, hidden_size], device),
        }
    }
}

/// Basic LSTM cell used by the recurrent encoder and decoder
///
/// Gates are computed from a single affine map of `[x, h]`:
/// - j = tanh(W_j @ x + U_j @ h + b_j)
/// - i = sigmoid(W_i @ x + U_i @ h + b_i)
/// - f = sigmoid(W_f @ x + U_f @ h + b_f + 1)
/// - o = sigmoid(W_o @ x + U_o @ h + b_o)
/// - c' = f * c + i * j
/// - h' = o * tanh(c')
#[derive(Module, Debug)]
pub struct LstmCell<B: Backend> {
    input_size: usize,
    hidden_size: usize,
    input_map: Linear<B>,     // input -> 4 * hidden_size (with bias)
    recurrent_map: Linear<B>, // hidden -> 4 * hidden_size (no bias)
}

impl<B: Backend> LstmCell<B> {
    /// Create a new LSTM cell
    ///
    /// # Arguments
    /// * `input_size` - Size of the input features
    /// * `hidden_size` - Size of the hidden state
    /// * `device` - Device to create the module on
    pub fn new(input_size: usize, hidden_size: usize, device: &B::Device) -> Self {
        let input_map = LinearConfig::new(input_size, 4 * hidden_size)
            .with_bias(true)
            .init(device);

        let recurrent_map = LinearConfig::new(hidden_size, 4 * hidden_size)
            .with_bias(false)
            .init(device);

        Self {
            input_size,
            hidden_size,
            input_map,
            recurrent_map,
        }
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    /// One timestep
    ///
    /// # Arguments
    /// * `input` - `[batch_size, input_size]`
    /// * `state` - previous hidden and cell state
    ///
    /// # Returns
    /// The new state; its `hidden` tensor is the cell output.
    pub fn forward(&self, input: Tensor<B, 2>, state: LstmState<B>) -> LstmState<B> {
        let LstmState { hidden, cell } = state;

        let z = self.input_map.forward(input) + self.recurrent_map.forward(hidden);

        let gates = z.chunk(4, 1);
        let candidate = gates[0].clone().tanh();
        let input_gate = activation::sigmoid(gates[1].clone());
        let forget_gate = activation::sigmoid(gates[2].clone() + 1.0);
        let output_gate = activation::sigmoid(gates[3].clone());

        let cell = cell * forget_gate + candidate * input_gate;
        let hidden = cell.clone().tanh() * output_gate;

        LstmState { hidden, cell }
    }
}

/// Stack of LSTM cells; layer `k + 1` reads the hidden output of layer `k`
#[derive(Module, Debug)]
pub struct LstmStack<B: Backend> {
    layers: Vec<LstmCell<B>>,
}

impl<B: Backend> LstmStack<B> {
    pub fn new(input_size: usize, hidden_size: usize, num_layers: usize, device: &B::Device) -> Self {
        let layers = (0..num_layers)
            .map(|layer| {
                let layer_input = if layer == 0 { input_size } else { hidden_size };
                LstmCell::new(layer_input, hidden_size, device)
            })
            .collect();

        Self { layers }
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// Zero state for every layer
    pub fn zero_state(&self, batch_size: usize, device: &B::Device) -> Vec<LstmState<B>> {
        self.layers
            .iter()
            .map(|layer| LstmState::zeros(batch_size, layer.hidden_size(), device))
            .collect()
    }

    /// One timestep through all layers. `states` must hold one entry per layer.
    pub fn forward(&self, input: Tensor<B, 2>, states: Vec<LstmState<B>>) -> Vec<LstmState<B>> {
        let mut x = input;
        let mut next = Vec::with_capacity(self.layers.len());

        for (layer, state) in self.layers.iter().zip(states) {
            let state = layer.forward(x, state);
            x = state.hidden.clone();
            next.push(state);
        }

        next
    }
}
