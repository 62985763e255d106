use std::time::{Duration, Instant};

use backprop::{Gym, Network, ShuffleMode, Topology, TrainConfig};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

fn time<T>(f: impl FnOnce() -> T) -> (Duration, T) {
    let before = Instant::now();
    let result = f();
    (before.elapsed(), result)
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Shuffle {
    Legacy,
    Unbiased,
    None,
}

impl From<Shuffle> for ShuffleMode {
    fn from(shuffle: Shuffle) -> Self {
        match shuffle {
            Shuffle::Legacy => ShuffleMode::Legacy,
            Shuffle::Unbiased => ShuffleMode::Unbiased,
            Shuffle::None => ShuffleMode::None,
        }
    }
}

/// Trains a 2-3-1 network on XOR.
#[derive(Debug, Parser)]
struct Args {
    #[arg(long, default_value_t = 5000)]
    epochs: usize,
    #[arg(long, default_value_t = 0.5)]
    rate: f32,
    #[arg(long, default_value_t = 1)]
    batch_size: usize,
    /// Seeds both the initial parameters and the sample order.
    #[arg(long, default_value_t = 42)]
    seed: u32,
    #[arg(long, value_enum, default_value_t = Shuffle::Legacy)]
    shuffle: Shuffle,
    /// Hidden layer sizes.
    #[arg(long, value_delimiter = ',', default_value = "3")]
    hidden: Vec<usize>,
    /// Print the trained parameters.
    #[arg(long)]
    print_params: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    let samples: &[(&[f32], &[f32])] = &[
        (&[0., 0.], &[0.]),
        (&[1., 0.], &[1.]),
        (&[0., 1.], &[1.]),
        (&[1., 1.], &[0.]),
    ];

    let mut layer_sizes = vec![2];
    layer_sizes.extend_from_slice(&args.hidden);
    layer_sizes.push(1);
    let mut nn = Network::new(Topology::new(&layer_sizes)?)?;
    nn.randomize(args.seed);

    println!("Initial loss: {}", nn.loss(samples)?);

    let config = TrainConfig::default()
        .rate(args.rate)
        .batch_size(args.batch_size)
        .n_epochs(args.epochs)
        .seed(args.seed)
        .shuffle(args.shuffle.into());
    let mut gym = Gym::new(&mut nn, config)?;
    let (training_duration, loss) = time(|| gym.train(samples));
    let loss = loss?;
    gym.finish();
    println!("training took {training_duration:?}, final epoch loss {loss}");

    if args.print_params {
        for i_connection in 0..nn.depth() {
            if let Some(params) = nn.pretty_print_connection(i_connection) {
                println!("=== Connection #{i_connection} ===\n\n{params}\n");
            }
        }
    }

    for (i, &(x_i, y_i)) in samples.iter().enumerate() {
        let a_i = nn.forward(x_i)?;
        println!("[i = {i}] {x_i:?} => expected: {y_i:?}, result: {a_i:?}");
    }

    Ok(())
}
