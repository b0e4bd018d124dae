// ============================================================
// Layer 5 — Multi-Task Aesthetic Model
// ============================================================
// One shared convolutional feature extractor feeding three
// task-specific heads:
//
//   binary    — 1 logit   ("is this aesthetically pleasing")
//   score     — 10 logits (distribution over rating bins 1..=10)
//   attribute — 11 logits (one per schema attribute)
//
// The backbone halves the spatial size four times and widens to
// the configured channel count; an optional multi-head attention
// block over the final feature map can be toggled per run. The
// attention toggle is the architecture change the strict/lenient
// checkpoint loader has to cope with, which is why the model is
// split into separately recordable parts (backbone / attention /
// heads) rather than one opaque record.
//
// The rest of the system treats `forward` as an opaque scoring
// function: batch in, raw output bundle out.

use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, Dropout, DropoutConfig, LayerNorm, LayerNormConfig, Linear,
        LinearConfig, PaddingConfig2d,
    },
    prelude::*,
};

use crate::domain::attribute::{ATTRIBUTE_COUNT, SCORE_BINS};

// ─── Raw Output Bundle ────────────────────────────────────────────────────────
/// The raw multi-head output for one batch. Produced once per
/// forward pass and consumed by exactly one of the loss
/// aggregator (training) or the decoder (inference).
#[derive(Debug, Clone)]
pub struct MtOutput<B: Backend> {
    /// Binary logits — shape: [batch]
    pub binary: Tensor<B, 1>,
    /// Score-distribution logits — shape: [batch, SCORE_BINS]
    pub score: Tensor<B, 2>,
    /// Attribute logits — shape: [batch, ATTRIBUTE_COUNT]
    pub attribute: Tensor<B, 2>,
}

// ─── Configuration ────────────────────────────────────────────────────────────
#[derive(Config, Debug)]
pub struct MtAestheticConfig {
    /// Channel count of the final backbone stage (stages widen
    /// channels/8 → channels/4 → channels/2 → channels).
    pub channels: usize,
    /// Side length of every convolution kernel.
    pub kernel_size: usize,
    /// Whether to apply spatial self-attention after the backbone.
    pub use_attention: bool,
    #[config(default = 8)]
    pub attention_heads: usize,
    #[config(default = 0.2)]
    pub dropout: f64,
}

impl MtAestheticConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> MtAesthetic<B> {
        let widths = [
            (self.channels / 8).max(1),
            (self.channels / 4).max(1),
            (self.channels / 2).max(1),
            self.channels,
        ];
        let backbone = Backbone {
            blocks: vec![
                self.conv_block(3, widths[0], device),
                self.conv_block(widths[0], widths[1], device),
                self.conv_block(widths[1], widths[2], device),
                self.conv_block(widths[2], widths[3], device),
            ],
        };

        let attention = self.use_attention.then(|| SpatialAttention {
            attention: MultiHeadAttentionConfig::new(self.channels, self.attention_heads)
                .init(device),
            norm: LayerNormConfig::new(self.channels).init(device),
        });

        let heads = TaskHeads {
            dropout:   DropoutConfig::new(self.dropout).init(),
            binary:    LinearConfig::new(self.channels, 1).init(device),
            score:     LinearConfig::new(self.channels, SCORE_BINS).init(device),
            attribute: LinearConfig::new(self.channels, ATTRIBUTE_COUNT).init(device),
        };

        MtAesthetic {
            backbone,
            attention,
            pool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            heads,
        }
    }

    fn conv_block<B: Backend>(&self, input: usize, output: usize, device: &B::Device) -> ConvBlock<B> {
        ConvBlock {
            conv: Conv2dConfig::new([input, output], [self.kernel_size, self.kernel_size])
                .with_padding(PaddingConfig2d::Same)
                .init(device),
            norm: BatchNormConfig::new(output).init(device),
            pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
        }
    }
}

// ─── Backbone ─────────────────────────────────────────────────────────────────
/// Conv → BatchNorm → ReLU → MaxPool, halving the spatial size.
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    pub conv: Conv2d<B>,
    pub norm: BatchNorm<B, 2>,
    pub pool: MaxPool2d,
}

impl<B: Backend> ConvBlock<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.pool
            .forward(burn::tensor::activation::relu(self.norm.forward(self.conv.forward(x))))
    }
}

/// The shared feature extractor.
#[derive(Module, Debug)]
pub struct Backbone<B: Backend> {
    pub blocks: Vec<ConvBlock<B>>,
}

impl<B: Backend> Backbone<B> {
    pub fn forward(&self, mut x: Tensor<B, 4>) -> Tensor<B, 4> {
        for block in &self.blocks {
            x = block.forward(x);
        }
        x
    }
}

// ─── Spatial Attention ────────────────────────────────────────────────────────
/// Self-attention over the final feature map's spatial positions,
/// with a residual connection and layer norm.
#[derive(Module, Debug)]
pub struct SpatialAttention<B: Backend> {
    pub attention: MultiHeadAttention<B>,
    pub norm: LayerNorm<B>,
}

impl<B: Backend> SpatialAttention<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let [batch, channels, height, width] = x.dims();
        // [batch, c, h, w] → [batch, h*w, c] token sequence
        let tokens = x.reshape([batch, channels, height * width]).swap_dims(1, 2);
        let attended = self.attention.forward(MhaInput::self_attn(tokens.clone())).context;
        let tokens = self.norm.forward(tokens + attended);
        tokens.swap_dims(1, 2).reshape([batch, channels, height, width])
    }
}

// ─── Task Heads ───────────────────────────────────────────────────────────────
/// The three task-specific projections over the pooled features.
#[derive(Module, Debug)]
pub struct TaskHeads<B: Backend> {
    pub dropout:   Dropout,
    pub binary:    Linear<B>,
    pub score:     Linear<B>,
    pub attribute: Linear<B>,
}

impl<B: Backend> TaskHeads<B> {
    pub fn forward(&self, features: Tensor<B, 2>) -> MtOutput<B> {
        let [batch, _] = features.dims();
        let features = self.dropout.forward(features);
        MtOutput {
            binary:    self.binary.forward(features.clone()).reshape([batch]),
            score:     self.score.forward(features.clone()),
            attribute: self.attribute.forward(features),
        }
    }
}

// ─── Full Model ───────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct MtAesthetic<B: Backend> {
    pub backbone: Backbone<B>,
    pub attention: Option<SpatialAttention<B>>,
    pub pool: AdaptiveAvgPool2d,
    pub heads: TaskHeads<B>,
}

impl<B: Backend> MtAesthetic<B> {
    /// images: [batch, 3, size, size] → raw output bundle.
    /// Input must be at least 16x16 so four pooling stages leave
    /// a non-empty feature map.
    pub fn forward(&self, images: Tensor<B, 4>) -> MtOutput<B> {
        let mut features = self.backbone.forward(images);
        if let Some(attention) = &self.attention {
            features = attention.forward(features);
        }
        let pooled = self.pool.forward(features);
        let [batch, channels, _, _] = pooled.dims();
        self.heads.forward(pooled.reshape([batch, channels]))
    }
}
