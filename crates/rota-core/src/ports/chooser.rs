//! Chooser port - 乱択の抽象化
//!
//! エンジンは暗黙のグローバル乱数を使わず、注入された Chooser に
//! 「長さ n の列から 1 つの index」を選ばせます。
//!
//! - UniformChooser: 一様分布（本番用、seed 指定で再現可能）
//! - SequenceChooser: あらかじめ決めた index を順に返す（テスト用）

use std::collections::VecDeque;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Chooser picks one index out of a non-empty ordered sequence.
pub trait Chooser: Send + Sync {
    /// Return an index in `0..len`. Callers never pass `len == 0`.
    fn choose_index(&self, len: usize) -> usize;
}

/// Pick one element of `items` through `chooser`. `None` for an empty slice.
pub fn pick<'a, T>(chooser: &dyn Chooser, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    let index = chooser.choose_index(items.len()).min(items.len() - 1);
    items.get(index)
}

/// Uniform choice backed by `rand`.
pub struct UniformChooser {
    seeded: Option<Mutex<StdRng>>,
}

impl UniformChooser {
    /// Thread-local entropy.
    pub fn new() -> Self {
        Self { seeded: None }
    }

    /// Reproducible sequence of choices.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seeded: Some(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }
}

impl Default for UniformChooser {
    fn default() -> Self {
        Self::new()
    }
}

impl Chooser for UniformChooser {
    fn choose_index(&self, len: usize) -> usize {
        match &self.seeded {
            Some(rng) => {
                let mut rng = rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                rng.gen_range(0..len)
            }
            None => rand::thread_rng().gen_range(0..len),
        }
    }
}

/// Returns the scripted indices in order, then `0` forever.
/// Indices are reduced modulo `len`.
#[derive(Debug, Default)]
pub struct SequenceChooser {
    picks: Mutex<VecDeque<usize>>,
}

impl SequenceChooser {
    pub fn new(picks: impl IntoIterator<Item = usize>) -> Self {
        Self {
            picks: Mutex::new(picks.into_iter().collect()),
        }
    }

    /// Always pick the first element.
    pub fn first() -> Self {
        Self::default()
    }
}

impl Chooser for SequenceChooser {
    fn choose_index(&self, len: usize) -> usize {
        let mut picks = self
            .picks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        picks.pop_front().unwrap_or(0) % len
    }
}
