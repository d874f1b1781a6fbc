// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `evaluate`, and all
// their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::{
    evaluate_use_case::EvaluateConfig,
    train_use_case::TrainConfig,
};
use crate::ml::model::Architecture;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a language model on a word-level corpus
    Train(TrainArgs),

    /// Score a saved checkpoint on the test split
    Evaluate(EvaluateArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Location of the data corpus (train.txt, valid.txt, test.txt)
    #[arg(long, default_value = "./data/wikitext-2")]
    pub data: String,

    /// Model architecture: transformer, lstm, gru, rnn_tanh or rnn_relu
    #[arg(long, default_value = "transformer")]
    pub model: Architecture,

    /// Size of word embeddings (d_model for the transformer)
    #[arg(long, default_value_t = 200)]
    pub emsize: usize,

    /// Number of hidden units per recurrent layer
    #[arg(long, default_value_t = 200)]
    pub nhid: usize,

    /// Number of layers (encoder and decoder each, for the transformer)
    #[arg(long, default_value_t = 2)]
    pub nlayers: usize,

    /// Number of attention heads; must divide emsize
    #[arg(long, default_value_t = 4)]
    pub nhead: usize,

    /// Transformer feed-forward width
    #[arg(long, default_value_t = 256)]
    pub d_ff: usize,

    /// Initial learning rate
    #[arg(long, default_value_t = 20.0)]
    pub lr: f64,

    /// Gradient clipping (global norm ceiling)
    #[arg(long, default_value_t = 0.25)]
    pub clip: f64,

    /// Upper epoch limit
    #[arg(long, default_value_t = 40)]
    pub epochs: usize,

    /// Parallel streams for training
    #[arg(long, default_value_t = 20)]
    pub batch_size: usize,

    /// Parallel streams for validation and test
    #[arg(long, default_value_t = 10)]
    pub eval_batch_size: usize,

    /// Sequence length per window
    #[arg(long, default_value_t = 35)]
    pub bptt: usize,

    /// Dropout applied to layers (0 = no dropout)
    #[arg(long, default_value_t = 0.2)]
    pub dropout: f64,

    /// Tie the word embedding and softmax weights (recurrent models)
    #[arg(long)]
    pub tied: bool,

    /// Random seed
    #[arg(long, default_value_t = 1111)]
    pub seed: u64,

    /// Train on the GPU (wgpu) instead of the CPU
    #[arg(long)]
    pub cuda: bool,

    /// Report interval in batches
    #[arg(long, default_value_t = 200)]
    pub log_interval: usize,

    /// Path to save the best model (extension is replaced)
    #[arg(long, default_value = "model")]
    pub save: String,

    /// Path to export the final model in portable JSON form
    #[arg(long)]
    pub export: Option<String>,

    /// Append per-epoch metrics to this CSV file
    #[arg(long)]
    pub metrics: Option<String>,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data:            a.data,
            architecture:    a.model,
            emsize:          a.emsize,
            nhid:            a.nhid,
            nlayers:         a.nlayers,
            nhead:           a.nhead,
            d_ff:            a.d_ff,
            lr:              a.lr,
            clip:            a.clip,
            epochs:          a.epochs,
            batch_size:      a.batch_size,
            eval_batch_size: a.eval_batch_size,
            bptt:            a.bptt,
            dropout:         a.dropout,
            tied:            a.tied,
            seed:            a.seed,
            cuda:            a.cuda,
            log_interval:    a.log_interval,
            save:            a.save,
            export:          a.export,
            metrics:         a.metrics,
        }
    }
}

/// All arguments for the `evaluate` command
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Location of the data corpus used for training
    #[arg(long, default_value = "./data/wikitext-2")]
    pub data: String,

    /// Checkpoint path given to `train --save`
    #[arg(long, default_value = "model")]
    pub save: String,

    #[arg(long, default_value_t = 10)]
    pub eval_batch_size: usize,

    #[arg(long, default_value_t = 35)]
    pub bptt: usize,

    #[arg(long)]
    pub cuda: bool,
}

impl From<EvaluateArgs> for EvaluateConfig {
    fn from(a: EvaluateArgs) -> Self {
        EvaluateConfig {
            data:            a.data,
            save:            a.save,
            eval_batch_size: a.eval_batch_size,
            bptt:            a.bptt,
            cuda:            a.cuda,
        }
    }
}
