use burn::{
    nn::{
        loss::BinaryCrossEntropyLossConfig, Embedding, EmbeddingConfig, Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::{relu, sigmoid},
};

use crate::domain::shape::{EMBEDDING_DIM, HIDDEN_UNITS, MAX_LEN, VOCAB_SIZE};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct SequenceClassifierConfig {
    #[config(default = "VOCAB_SIZE")]
    pub vocab_size: usize,
    #[config(default = "EMBEDDING_DIM")]
    pub embedding_dim: usize,
    #[config(default = "HIDDEN_UNITS")]
    pub hidden_units: usize,
    #[config(default = "MAX_LEN")]
    pub max_len: usize,
}

impl SequenceClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SequenceClassifier<B> {
        SequenceClassifier {
            embedding: EmbeddingConfig::new(self.vocab_size, self.embedding_dim).init(device),
            hidden: LinearConfig::new(self.embedding_dim, self.hidden_units).init(device),
            output: LinearConfig::new(self.hidden_units, 1).init(device),
        }
    }
}

/// Fixed architecture: embedding(128→16) → mean over positions →
/// dense(8, relu) → dense(1, sigmoid).
pub fn build<B: Backend>(device: &B::Device) -> SequenceClassifier<B> {
    SequenceClassifierConfig::new().init(device)
}

#[derive(Module, Debug)]
pub struct SequenceClassifier<B: Backend> {
    pub embedding: Embedding<B>,
    pub hidden: Linear<B>,
    pub output: Linear<B>,
}

impl<B: Backend> SequenceClassifier<B> {
    /// tokens: [batch, MAX_LEN] → pre-sigmoid scores: [batch]
    pub fn forward_logits(&self, tokens: Tensor<B, 2, Int>) -> Tensor<B, 1> {
        let [batch_size, _] = tokens.dims();

        let x = self.embedding.forward(tokens); // [batch, seq_len, embedding_dim]
        let [_, _, embedding_dim] = x.dims();

        // Average every position, padding included
        let pooled = x.mean_dim(1).reshape([batch_size, embedding_dim]);

        let hidden = relu(self.hidden.forward(pooled));
        self.output.forward(hidden).reshape([batch_size])
    }

    /// tokens: [batch, MAX_LEN] → membership probability: [batch]
    pub fn forward(&self, tokens: Tensor<B, 2, Int>) -> Tensor<B, 1> {
        sigmoid(self.forward_logits(tokens))
    }

    /// Binary cross-entropy of the sigmoid output against 0/1 targets.
    /// Returns (loss [1], logits [batch]).
    pub fn forward_loss(
        &self,
        tokens: Tensor<B, 2, Int>,
        targets: Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 1>) {
        let logits = self.forward_logits(tokens);
        let bce = BinaryCrossEntropyLossConfig::new()
            .with_logits(true)
            .init(&logits.device());
        let loss = bce.forward(logits.clone(), targets);
        (loss, logits)
    }
}
