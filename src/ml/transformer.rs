// ============================================================
// Layer 5 — Transformer Encoder-Decoder Language Model
// ============================================================
// Architecture:
//
//   window ──► src_embed ──► encoder ──────────────┐ memory
//      │                                           ▼
//      └─────► tgt_embed ──► decoder (causal self-attn, cross-attn)
//                                  │
//                                  ▼
//                              generator ──► logits over vocab
//
// The same window feeds both the encoder source and the
// decoder target. Only the decoder self-attention is masked;
// the encoder and the cross-attention see the whole window.
// There is no positional encoding: order enters through the
// causal mask alone.
//
// Reference: Vaswani et al. (2017) Attention Is All You Need
//            Burn Book §3 (Building Blocks)

use burn::{
    nn::{
        transformer::{
            TransformerDecoder, TransformerDecoderConfig, TransformerDecoderInput,
            TransformerEncoder, TransformerEncoderConfig, TransformerEncoderInput,
        },
        Embedding, Linear, LinearConfig,
    },
    prelude::*,
};

use crate::ml::mask::to_attention_mask;
use crate::ml::model::{LanguageModel, LanguageModelConfig};

#[derive(Module, Debug)]
pub struct TransformerLm<B: Backend> {
    pub src_embed:  Embedding<B>,
    pub tgt_embed:  Embedding<B>,
    pub encoder:    TransformerEncoder<B>,
    pub decoder:    TransformerDecoder<B>,
    pub generator:  Linear<B>,
    pub vocab_size: usize,
}

impl<B: Backend> TransformerLm<B> {
    pub fn new(cfg: &LanguageModelConfig, device: &B::Device) -> Self {
        let encoder = TransformerEncoderConfig::new(cfg.emsize, cfg.d_ff, cfg.nhead, cfg.nlayers)
            .with_dropout(cfg.dropout)
            .init(device);
        let decoder = TransformerDecoderConfig::new(cfg.emsize, cfg.d_ff, cfg.nhead, cfg.nlayers)
            .with_dropout(cfg.dropout)
            .init(device);

        Self {
            src_embed:  cfg.embedding_config().init(device),
            tgt_embed:  cfg.embedding_config().init(device),
            encoder,
            decoder,
            generator:  LinearConfig::new(cfg.emsize, cfg.vocab_size).init(device),
            vocab_size: cfg.vocab_size,
        }
    }
}

impl<B: Backend> LanguageModel<B> for TransformerLm<B> {
    type State = ();

    fn forward_window(
        &self,
        input: Tensor<B, 2, Int>,
        mask:  Tensor<B, 2>,
        _state: Option<()>,
    ) -> (Tensor<B, 3>, Option<()>) {
        let [_len, streams] = input.dims();
        // burn attention is batch-first
        let tokens = input.swap_dims(0, 1);

        let memory = self.encoder.forward(TransformerEncoderInput::new(
            self.src_embed.forward(tokens.clone()),
        ));

        let target = self.tgt_embed.forward(tokens);
        let hidden = self.decoder.forward(
            TransformerDecoderInput::new(target, memory)
                .target_mask_attn(to_attention_mask(mask, streams)),
        );

        // [streams, len, vocab] → [len, streams, vocab]
        (self.generator.forward(hidden).swap_dims(0, 1), None)
    }

    fn detach_state(state: ()) {
        state
    }

    fn vocab_size(&self) -> usize {
        self.vocab_size
    }
}
