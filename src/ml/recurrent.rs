// ============================================================
// Layer 5 — Recurrent Language Model (LSTM / GRU / Elman)
// ============================================================
//   window ──► embedding ──► dropout ──► cell₁ ──► dropout ──► … ──► cellₙ
//                                                                    │
//                                     logits ◄── decoder ◄── dropout ┘
//
// Hidden state flows from one window into the next so the
// network keeps context across window boundaries; the loop
// detaches it between windows so backprop stays inside one
// window.
//
// With `tied`, the output projection reuses the embedding
// matrix (transposed) plus its own bias, which requires
// nhid == emsize.
//
// Reference: Press & Wolf (2016) Using the Output Embedding
//            Burn Book §3 (Building Blocks)

use burn::{
    module::Param,
    nn::{
        Dropout, DropoutConfig,
        Embedding,
        Initializer,
        Linear, LinearConfig,
        Lstm, LstmConfig, LstmState,
    },
    prelude::*,
};

use crate::ml::cells::{ElmanLayer, GruLayer};
use crate::ml::model::{LanguageModel, LanguageModelConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurrentCell {
    Lstm,
    Gru,
    RnnTanh,
    RnnRelu,
}

/// Per-layer hidden (and, for LSTM, cell) state, each `[streams, nhid]`.
#[derive(Debug, Clone)]
pub struct RecurrentState<B: Backend> {
    pub hidden: Vec<Tensor<B, 2>>,
    pub cell:   Vec<Tensor<B, 2>>,
}

#[derive(Module, Debug)]
pub struct RecurrentLm<B: Backend> {
    pub embedding:  Embedding<B>,
    /// Exactly one of `lstm` / `gru` / `rnn` is non-empty
    pub lstm:       Vec<Lstm<B>>,
    pub gru:        Vec<GruLayer<B>>,
    pub rnn:        Vec<ElmanLayer<B>>,
    pub dropout:    Dropout,
    /// Untied output projection
    pub decoder:    Option<Linear<B>>,
    /// Output bias when tied to the embedding
    pub tied_bias:  Option<Param<Tensor<B, 1>>>,
    pub vocab_size: usize,
}

impl<B: Backend> RecurrentLm<B> {
    pub fn new(cfg: &LanguageModelConfig, cell: RecurrentCell, device: &B::Device) -> Self {
        let input_size = |layer: usize| if layer == 0 { cfg.emsize } else { cfg.nhid };
        let layers     = 0..cfg.nlayers;

        let mut lstm = Vec::new();
        let mut gru  = Vec::new();
        let mut rnn  = Vec::new();
        match cell {
            RecurrentCell::Lstm => lstm = layers
                .map(|l| LstmConfig::new(input_size(l), cfg.nhid, true).init(device))
                .collect(),
            RecurrentCell::Gru => gru = layers
                .map(|l| GruLayer::new(input_size(l), cfg.nhid, device))
                .collect(),
            RecurrentCell::RnnTanh | RecurrentCell::RnnRelu => rnn = layers
                .map(|l| ElmanLayer::new(input_size(l), cfg.nhid, cell == RecurrentCell::RnnRelu, device))
                .collect(),
        }

        let (decoder, tied_bias) = if cfg.tied {
            let bias = Tensor::<B, 1>::zeros([cfg.vocab_size], device);
            (None, Some(Param::from_tensor(bias)))
        } else {
            let linear = LinearConfig::new(cfg.nhid, cfg.vocab_size)
                .with_initializer(Initializer::Uniform { min: -0.1, max: 0.1 })
                .init(device);
            (Some(linear), None)
        };

        Self {
            embedding: cfg.embedding_config().init(device),
            lstm,
            gru,
            rnn,
            dropout: DropoutConfig::new(cfg.dropout).init(),
            decoder,
            tied_bias,
            vocab_size: cfg.vocab_size,
        }
    }

    pub fn num_layers(&self) -> usize {
        self.lstm.len() + self.gru.len() + self.rnn.len()
    }

    /// Dropout between layers, not after the last one.
    fn between_layers(&self, i: usize, out: Tensor<B, 3>) -> Tensor<B, 3> {
        if i + 1 < self.num_layers() { self.dropout.forward(out) } else { out }
    }

    /// `[streams, len, nhid]` → `[streams, len, vocab]`
    fn decode(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        if let Some(linear) = &self.decoder {
            return linear.forward(x);
        }

        let [streams, len, width] = x.dims();
        let weight = self.embedding.weight.val(); // [vocab, emsize]
        let mut logits = x.reshape([streams * len, width]).matmul(weight.transpose());
        if let Some(bias) = &self.tied_bias {
            logits = logits + bias.val().unsqueeze::<2>();
        }
        logits.reshape([streams, len, self.vocab_size])
    }
}

impl<B: Backend> LanguageModel<B> for RecurrentLm<B> {
    type State = RecurrentState<B>;

    fn forward_window(
        &self,
        input: Tensor<B, 2, Int>,
        _mask: Tensor<B, 2>,
        state: Option<RecurrentState<B>>,
    ) -> (Tensor<B, 3>, Option<RecurrentState<B>>) {
        let tokens = input.swap_dims(0, 1); // [streams, len]
        let mut x  = self.dropout.forward(self.embedding.forward(tokens));
        let mut next = RecurrentState {
            hidden: Vec::with_capacity(self.num_layers()),
            cell:   Vec::new(),
        };

        for (i, lstm) in self.lstm.iter().enumerate() {
            let prev = state
                .as_ref()
                .map(|s| LstmState::new(s.cell[i].clone(), s.hidden[i].clone()));
            let (out, st) = lstm.forward(x, prev);
            next.hidden.push(st.hidden);
            next.cell.push(st.cell);
            x = self.between_layers(i, out);
        }

        for (i, gru) in self.gru.iter().enumerate() {
            let prev = state.as_ref().map(|s| s.hidden[i].clone());
            let (out, last) = gru.forward(x, prev);
            next.hidden.push(last);
            x = self.between_layers(i, out);
        }

        for (i, rnn) in self.rnn.iter().enumerate() {
            let prev = state.as_ref().map(|s| s.hidden[i].clone());
            let (out, last) = rnn.forward(x, prev);
            next.hidden.push(last);
            x = self.between_layers(i, out);
        }

        let logits = self.decode(self.dropout.forward(x));
        (logits.swap_dims(0, 1), Some(next))
    }

    fn detach_state(state: RecurrentState<B>) -> RecurrentState<B> {
        RecurrentState {
            hidden: state.hidden.into_iter().map(Tensor::detach).collect(),
            cell:   state.cell.into_iter().map(Tensor::detach).collect(),
        }
    }

    fn vocab_size(&self) -> usize {
        self.vocab_size
    }
}
