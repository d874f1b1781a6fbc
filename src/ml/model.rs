// ============================================================
// Layer 5 — Language Model Contract and Configuration
// ============================================================
// Two architectures share one training loop:
//
//   transformer — attention encoder-decoder (default)
//   lstm / gru  — stacked recurrent network
//   rnn_tanh / rnn_relu — stacked Elman network
//
// Both take a time-major window `[len, streams]` of token ids
// and return logits `[len, streams, vocab]`. Recurrent models
// also hand back a hidden state that the loop feeds into the
// next window; the transformer's state type is `()`.

use anyhow::{bail, Result};
use burn::{
    nn::{EmbeddingConfig, Initializer},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::ml::recurrent::{RecurrentCell, RecurrentLm};
use crate::ml::transformer::TransformerLm;

// ─── LanguageModel ────────────────────────────────────────────────────────────
/// A next-token model driven window by window.
pub trait LanguageModel<B: Backend>: Module<B> {
    /// Carried between consecutive windows of one pass.
    type State: Clone;

    /// `input`: `[len, streams]` token ids.
    /// `mask`: `[len, len]` additive causal mask.
    /// Returns logits `[len, streams, vocab]` and the state to carry.
    fn forward_window(
        &self,
        input: Tensor<B, 2, Int>,
        mask:  Tensor<B, 2>,
        state: Option<Self::State>,
    ) -> (Tensor<B, 3>, Option<Self::State>);

    /// Cut the state loose from the autodiff graph so backprop stops
    /// at the window boundary.
    fn detach_state(state: Self::State) -> Self::State;

    fn vocab_size(&self) -> usize;
}

// ─── Architecture ─────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    Transformer,
    Lstm,
    Gru,
    RnnTanh,
    RnnRelu,
}

impl FromStr for Architecture {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "transformer" => Ok(Self::Transformer),
            "lstm"        => Ok(Self::Lstm),
            "gru"         => Ok(Self::Gru),
            "rnn_tanh"    => Ok(Self::RnnTanh),
            "rnn_relu"    => Ok(Self::RnnRelu),
            other => Err(format!(
                "unknown model '{other}' (expected transformer, lstm, gru, rnn_tanh or rnn_relu)"
            )),
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Transformer => "transformer",
            Self::Lstm        => "lstm",
            Self::Gru         => "gru",
            Self::RnnTanh     => "rnn_tanh",
            Self::RnnRelu     => "rnn_relu",
        };
        f.write_str(name)
    }
}

// ─── LanguageModelConfig ──────────────────────────────────────────────────────
// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct LanguageModelConfig {
    pub architecture: Architecture,
    pub vocab_size:   usize,
    /// Embedding width; d_model for the transformer
    #[config(default = 200)]
    pub emsize:       usize,
    /// Hidden units per recurrent layer
    #[config(default = 200)]
    pub nhid:         usize,
    /// Recurrent layers, or encoder and decoder layers each
    #[config(default = 2)]
    pub nlayers:      usize,
    #[config(default = 4)]
    pub nhead:        usize,
    /// Transformer feed-forward width
    #[config(default = 256)]
    pub d_ff:         usize,
    #[config(default = 0.2)]
    pub dropout:      f64,
    /// Share the embedding matrix with the output projection (recurrent only)
    #[config(default = false)]
    pub tied:         bool,
}

impl LanguageModelConfig {
    pub fn validate(&self) -> Result<()> {
        if self.vocab_size == 0 {
            bail!("vocabulary is empty");
        }
        if self.emsize == 0 || self.nlayers == 0 {
            bail!("emsize and nlayers must be positive");
        }
        if !(0.0..1.0).contains(&self.dropout) {
            bail!("dropout must be in [0, 1), got {}", self.dropout);
        }
        match self.architecture {
            Architecture::Transformer => {
                if self.nhead == 0 || self.emsize % self.nhead != 0 {
                    bail!("emsize ({}) must be divisible by nhead ({})", self.emsize, self.nhead);
                }
            }
            _ => {
                if self.nhid == 0 {
                    bail!("nhid must be positive");
                }
                if self.tied && self.nhid != self.emsize {
                    bail!("when using --tied, nhid ({}) must equal emsize ({})", self.nhid, self.emsize);
                }
            }
        }
        Ok(())
    }

    pub fn init_transformer<B: Backend>(&self, device: &B::Device) -> TransformerLm<B> {
        TransformerLm::new(self, device)
    }

    pub fn init_recurrent<B: Backend>(&self, device: &B::Device) -> RecurrentLm<B> {
        let cell = match self.architecture {
            Architecture::Gru     => RecurrentCell::Gru,
            Architecture::RnnTanh => RecurrentCell::RnnTanh,
            Architecture::RnnRelu => RecurrentCell::RnnRelu,
            _                     => RecurrentCell::Lstm,
        };
        RecurrentLm::new(self, cell, device)
    }

    pub(crate) fn embedding_config(&self) -> EmbeddingConfig {
        EmbeddingConfig::new(self.vocab_size, self.emsize)
            .with_initializer(Initializer::Uniform { min: -0.1, max: 0.1 })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_architecture_parse_and_display() {
        for arch in [
            Architecture::Transformer,
            Architecture::Lstm,
            Architecture::Gru,
            Architecture::RnnTanh,
            Architecture::RnnRelu,
        ] {
            assert_eq!(arch.to_string().parse::<Architecture>().unwrap(), arch);
        }
        assert_eq!("LSTM".parse::<Architecture>().unwrap(), Architecture::Lstm);
        assert_eq!("RNN_TANH".parse::<Architecture>().unwrap(), Architecture::RnnTanh);
        assert!("rnn".parse::<Architecture>().is_err());
    }

    #[test]
    fn test_defaults() {
        let cfg = LanguageModelConfig::new(Architecture::Transformer, 100);
        assert_eq!(cfg.emsize, 200);
        assert_eq!(cfg.nhead, 4);
        assert_eq!(cfg.d_ff, 256);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_heads_must_divide_width() {
        let cfg = LanguageModelConfig::new(Architecture::Transformer, 100)
            .with_emsize(30)
            .with_nhead(4);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_tied_requires_matching_sizes() {
        let cfg = LanguageModelConfig::new(Architecture::Lstm, 100)
            .with_emsize(200)
            .with_nhid(100)
            .with_tied(true);
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("--tied"));

        assert!(cfg.with_nhid(200).validate().is_ok());
    }

    #[test]
    fn test_config_json_round_trip_keeps_architecture() {
        let cfg  = LanguageModelConfig::new(Architecture::Gru, 42).with_nlayers(3);
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains("\"gru\""));
        let back: LanguageModelConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.architecture, Architecture::Gru);
        assert_eq!(back.nlayers, 3);
        assert_eq!(back.vocab_size, 42);

        let json = serde_json::to_string(&LanguageModelConfig::new(Architecture::RnnRelu, 42)).unwrap();
        assert!(json.contains("\"rnn_relu\""));
    }
}
