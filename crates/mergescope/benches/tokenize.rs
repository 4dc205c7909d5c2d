#![allow(missing_docs)]

use std::sync::LazyLock;

use divan::{Bencher, black_box, counter::BytesCount};
use mergescope::{
    TokenId,
    Vocabulary,
    types::Pair,
    vocab::{
        TokenizeOptions,
        training::{BpeTrainer, TrainConfig},
    },
};

#[global_allocator]
static ALLOC: divan::AllocProfiler = divan::AllocProfiler::system();

fn main() {
    divan::main();
}

static CORPUS: &str = "It was the best of times, it was the worst of times, \
it was the age of wisdom, it was the age of foolishness, \
it was the epoch of belief, it was the epoch of incredulity, \
it was the season of Light, it was the season of Darkness, \
it was the spring of hope, it was the winter of despair.\n";

fn corpus_text() -> String {
    CORPUS.repeat(20)
}

fn trainer(target_vocab_size: usize) -> BpeTrainer {
    let mut trainer = BpeTrainer::new(TrainConfig::new(target_vocab_size).with_eta(0.8));
    trainer.update_from_samples(CORPUS.split_inclusive(' '));
    trainer
}

static RULES: LazyLock<Vec<Pair<TokenId>>> = LazyLock::new(|| {
    let vocab = trainer(456).train().unwrap();
    vocab.merge_rules().iter().map(|rule| rule.pair()).collect()
});

static VOCAB: LazyLock<Vocabulary> =
    LazyLock::new(|| Vocabulary::from_merge_rules(&RULES).unwrap());

#[divan::bench]
fn train(bencher: Bencher) {
    bencher
        .with_inputs(|| trainer(456))
        .bench_values(|trainer| trainer.train().unwrap());
}

#[divan::bench]
fn build_vocab(bencher: Bencher) {
    bencher.bench(|| Vocabulary::from_merge_rules(black_box(&RULES)).unwrap());
}

#[divan::bench]
fn from_base64(bencher: Bencher) {
    let encoded = VOCAB.to_base64().unwrap();
    bencher.bench(|| Vocabulary::from_base64(black_box(&encoded)).unwrap());
}

#[divan::bench]
fn tokenize(bencher: Bencher) {
    let text = corpus_text();
    let options = TokenizeOptions::default();
    bencher
        .counter(BytesCount::of_str(&text))
        .bench(|| VOCAB.tokenize_ids(black_box(text.as_bytes()), &options));
}

#[divan::bench(args = [0, 50, 150])]
fn tokenize_limited(
    bencher: Bencher,
    max_rule_priority: usize,
) {
    let text = corpus_text();
    let options = TokenizeOptions::default().with_max_rule_priority(Some(max_rule_priority));
    bencher
        .counter(BytesCount::of_str(&text))
        .bench(|| VOCAB.tokenize_ids(black_box(text.as_bytes()), &options));
}

#[divan::bench]
fn history_trees(bencher: Bencher) {
    let ids: Vec<TokenId> = (256..VOCAB.len() as TokenId).collect();
    bencher.bench(|| {
        for &id in &ids {
            black_box(VOCAB.history_tree(id).unwrap());
        }
    });
}
