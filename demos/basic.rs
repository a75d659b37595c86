//! Basic usage of the keyboard cell
//!
//! Builds a cell for every encoder/decoder pair, runs a teacher-forced pass
//! over a random piano roll and samples a few free-running frames.
//!
//! Run with `RUST_LOG=deepmusic=debug` to see the build and registry logs.

use burn::backend::NdArray;
use burn::module::Module;
use burn::tensor::{Distribution, Tensor};
use deepmusic::prelude::*;
use tracing_subscriber::EnvFilter;

type Backend = NdArray<f32>;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let device = Default::default();

    println!("=== Keyboard Cell Example ===\n");
    println!(
        "Encoders: {:?}",
        encoder_registry::<Backend>().names()
    );
    println!(
        "Decoders: {:?}\n",
        decoder_registry::<Backend>().names()
    );

    for encoder in ["identity", "rnn"] {
        for decoder in ["perceptron", "lstm"] {
            let config = KeyboardCellConfig::new()
                .with_encoder(encoder.to_string())
                .with_decoder(decoder.to_string())
                .with_hidden_size(64);
            let cell = KeyboardCell::<Backend>::new(&config)?;
            println!("{encoder}/{decoder}: state {:?}", cell.state_size());

            // Input shape: [batch=2, seq=16, notes=88]
            let roll = Tensor::<Backend, 3>::random(
                [2, 16, NB_NOTES],
                Distribution::Bernoulli(0.1),
                &device,
            );
            let mut rnn = KeyboardRnn::new(cell);
            let (predictions, _) = rnn.forward(roll, None)?;
            println!(
                "  teacher forcing: {:?}, {} parameters",
                predictions.dims(),
                rnn.cell().num_params()
            );

            let primer = keyboard::empty::<Backend>(2, &device);
            let sampled = rnn.generate(primer, 8)?;
            let active = keyboard::binarize(sampled.clone(), config.note_threshold)
                .sum()
                .into_scalar();
            println!("  generated: {:?}, {active} keys pressed", sampled.dims());
        }
    }

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
