//! # BPE Trainer

use crate::{
    errors::MSResult,
    types::{MSHashMap, TokenId},
    vocab::{
        TokenChain,
        TokenizeOptions,
        Vocabulary,
        training::{PairHistogram, RuleBuilder, TrainConfig},
    },
};

/// Learns merge rules from byte spans, in batched frequency-ordered steps.
///
/// Each step counts the adjacent pairs of every span, selects a batch of
/// pairs via [`PairHistogram::merges_to_add`], mints one rule per pair and
/// applies the merges; until the target size is reached or nothing is left
/// to merge.
#[derive(Debug, Clone)]
pub struct BpeTrainer {
    config: TrainConfig,

    /// Map of ``{ span -> occurrence count }``.
    spans: MSHashMap<Vec<u8>, u64>,
}

impl BpeTrainer {
    /// Create a trainer with no samples.
    pub fn new(config: TrainConfig) -> Self {
        Self {
            config,
            spans: Default::default(),
        }
    }

    /// The training config.
    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// The number of distinct spans.
    pub fn span_count(&self) -> usize {
        self.spans.len()
    }

    /// Count sample spans; merges never cross span boundaries.
    ///
    /// ## Arguments
    /// * `samples` - an iterator over byte-like samples.
    pub fn update_from_samples<I>(
        &mut self,
        samples: I,
    ) where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        for sample in samples {
            let sample = sample.as_ref();
            if sample.is_empty() {
                continue;
            }
            match self.spans.get_mut(sample) {
                Some(count) => *count += 1,
                None => {
                    self.spans.insert(sample.to_vec(), 1);
                }
            }
        }
    }

    /// Train a fresh [`Vocabulary`].
    pub fn train(self) -> MSResult<Vocabulary> {
        self.train_from(RuleBuilder::new())?.to_vocabulary()
    }

    /// Continue training from existing rules.
    ///
    /// ## Arguments
    /// * `builder` - the rules to extend; existing rules are kept in place.
    ///
    /// ## Returns
    /// The extended rules; or [`crate::MergescopeError::InvalidConfig`].
    pub fn train_from(
        self,
        mut builder: RuleBuilder,
    ) -> MSResult<RuleBuilder> {
        self.config.validate()?;

        let target = self.config.target_vocab_size;
        let start = builder.len();
        let wanted = target.saturating_sub(start);
        log::info!(
            "Starting BPE training: {} spans, {} merges to compute",
            self.spans.len(),
            wanted
        );

        let mut chains: Vec<(TokenChain, u64)> = if builder.rules().is_empty() {
            self.spans
                .iter()
                .map(|(span, &count)| (TokenChain::from_bytes(span), count))
                .collect()
        } else {
            let vocab = builder.to_vocabulary()?;
            let options = TokenizeOptions::default();
            self.spans
                .iter()
                .map(|(span, &count)| {
                    let ids = vocab.tokenize_ids(span, &options);
                    (TokenChain::from_tokens(ids), count)
                })
                .collect()
        };

        let mut step = 0;
        while builder.len() < target {
            step += 1;
            let added = self.train_step(&mut chains, &mut builder)?;
            if added == 0 {
                log::info!("Step {step}: no mergeable pairs remain");
                break;
            }
            log::info!(
                "Step {step}: {added} merges ({}/{target} tokens)",
                builder.len()
            );
        }

        log::info!(
            "Finished training: {} merges; {} tokens",
            builder.len() - start,
            builder.len()
        );
        Ok(builder)
    }

    /// Count pairs, then mint and apply one batch of merges.
    ///
    /// ## Returns
    /// The number of rules added.
    fn train_step(
        &self,
        chains: &mut [(TokenChain, u64)],
        builder: &mut RuleBuilder,
    ) -> MSResult<usize> {
        let mut histogram = PairHistogram::default();
        for (chain, count) in chains.iter() {
            histogram.register_chain(chain, *count);
        }

        let budget = self.config.target_vocab_size - builder.len();
        let value_len = |id: TokenId| builder.value(id).map_or(0, <[u8]>::len);
        let merged_len = |(left, right): (TokenId, TokenId)| value_len(left) + value_len(right);
        let merges = histogram.merges_to_add(&self.config, budget, merged_len);

        for &(left, right) in &merges {
            let result = builder.add_rule(left, right)?;
            log::debug!(
                "{left} + {right} -> {result} ({})",
                histogram.get_pair((left, right))
            );
            for (chain, _) in chains.iter_mut() {
                chain.merge_all((left, right), result);
            }
        }

        Ok(merges.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        MergescopeError,
        vocab::io::{read_rule_file, write_rule_file},
    };

    fn trainer(
        config: TrainConfig,
        samples: &[&str],
    ) -> BpeTrainer {
        let mut trainer = BpeTrainer::new(config);
        trainer.update_from_samples(samples);
        trainer
    }

    #[test]
    fn test_span_counts() {
        let trainer = trainer(TrainConfig::new(300), &["ab", "ab", "", "cd"]);
        assert_eq!(trainer.span_count(), 2);
        assert_eq!(trainer.config().target_vocab_size(), 300);
    }

    #[test]
    fn test_frequency_order() {
        let config = TrainConfig::new(259).with_eta(1.0);
        let vocab = trainer(config, &["abab", "abab", "abab", "cd"])
            .train()
            .unwrap();

        // ab: 6, then (ab ab): 3, then cd: 1.
        let rules: Vec<_> = vocab.merge_rules().iter().map(|r| r.pair()).collect();
        assert_eq!(rules, vec![(97, 98), (256, 256), (99, 100)]);
        assert_eq!(vocab.get(257).unwrap().value(), b"abab");
    }

    #[test]
    fn test_tie_break() {
        let config = TrainConfig::new(258).with_eta(1.0);
        let vocab = trainer(config, &["xy", "ab", "mn"]).train().unwrap();

        let rules: Vec<_> = vocab.merge_rules().iter().map(|r| r.pair()).collect();
        assert_eq!(rules, vec![(97, 98), (109, 110)]);
    }

    #[test]
    fn test_batch_step() {
        let config = TrainConfig::new(1000).with_eta(0.6);
        let mut builder = RuleBuilder::new();
        let trainer = trainer(config, &["ab", "ab", "cd", "cd", "ef"]);

        let mut chains: Vec<(TokenChain, u64)> = trainer
            .spans
            .iter()
            .map(|(span, &count)| (TokenChain::from_bytes(span), count))
            .collect();

        assert_eq!(trainer.train_step(&mut chains, &mut builder).unwrap(), 2);
        assert_eq!(builder.rules(), &[(97, 98), (99, 100)]);
    }

    #[test]
    fn test_max_token_length() {
        let config = TrainConfig::new(1000)
            .with_eta(1.0)
            .with_max_token_length(Some(3));
        let vocab = trainer(config, &["aaaaaaa"; 4]).train().unwrap();

        // ``aa``, then ``aa a``; every longer merge is skipped.
        let rules: Vec<_> = vocab.merge_rules().iter().map(|r| r.pair()).collect();
        assert_eq!(rules, vec![(97, 97), (256, 97)]);
        for token in vocab.tokens() {
            assert!(token.value().len() <= 3, "{token:?}");
        }
        assert_eq!(vocab.tokenize_ids(b"aaa", &Default::default()), vec![257]);
    }

    #[test]
    fn test_stops_when_exhausted() {
        let vocab = trainer(TrainConfig::new(1000), &["abc"]).train().unwrap();
        assert_eq!(vocab.merge_rules().len(), 2);
        assert_eq!(vocab.tokenize_ids(b"abc", &Default::default()), vec![257]);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            trainer(TrainConfig::new(300).with_eta(0.0), &["ab"]).train(),
            Err(MergescopeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_train_from_existing_rules() {
        let base = Vocabulary::from_merge_rules(&[(97, 98)]).unwrap();
        let config = TrainConfig::new(258).with_eta(1.0);

        let builder = trainer(config, &["abc", "abc"])
            .train_from(RuleBuilder::from_vocabulary(&base))
            .unwrap();
        assert_eq!(builder.rules(), &[(97, 98), (256, 99)]);
    }

    #[test]
    fn test_rule_file_round_trip() {
        let config = TrainConfig::new(280).with_eta(0.5);
        let vocab = trainer(
            config,
            &["the cat", "the hat", "that cat", "a hat", "the that"],
        )
        .train()
        .unwrap();
        assert!(vocab.len() > 256);

        let mut buf: Vec<u8> = Vec::new();
        write_rule_file(&vocab, &mut buf).unwrap();
        let loaded = read_rule_file(buf.as_slice()).unwrap();

        assert_eq!(loaded.merge_rules(), vocab.merge_rules());
        for sample in ["the cat", "that hat"] {
            assert_eq!(
                loaded.tokenize_ids(sample.as_bytes(), &Default::default()),
                vocab.tokenize_ids(sample.as_bytes(), &Default::default())
            );
        }
    }
}
