//! Infoset node storage for training.
//!
//! Keys are interned into a contiguous arena of [`NodeStats`], so the hot
//! traversal path works with dense ids and the string map is touched once
//! per new infoset. Export joins the two back into a [`PolicyTable`].

use rustc_hash::FxHashMap;

use crate::blueprint::PolicyTable;
use crate::game::{Action, Actions, NUM_ACTIONS};

/// Regret-matched strategy over the legal actions.
///
/// Positive regrets normalize to probabilities; all-nonpositive regrets
/// fall back to uniform over the legal set.
#[must_use]
pub fn regret_match(regrets: &[f64; NUM_ACTIONS], legal: &Actions) -> [f64; NUM_ACTIONS] {
    let mut strategy = [0.0; NUM_ACTIONS];
    let mut total = 0.0;
    for &action in legal {
        let r = regrets[action.index()].max(0.0);
        strategy[action.index()] = r;
        total += r;
    }
    if total > 0.0 {
        for &action in legal {
            strategy[action.index()] /= total;
        }
    } else {
        #[allow(clippy::cast_precision_loss)]
        let uniform = 1.0 / legal.len().max(1) as f64;
        for &action in legal {
            strategy[action.index()] = uniform;
        }
    }
    strategy
}

/// Per-infoset training accumulators.
#[derive(Debug, Clone)]
pub struct NodeStats {
    pub regrets: [f64; NUM_ACTIONS],
    pub strategy_sum: [f64; NUM_ACTIONS],
    /// Actions ever seen legal at this infoset, as a bitmask over indices.
    pub legal_mask: u8,
    pub visits: u64,
}

impl NodeStats {
    fn new() -> Self {
        Self {
            regrets: [0.0; NUM_ACTIONS],
            strategy_sum: [0.0; NUM_ACTIONS],
            legal_mask: 0,
            visits: 0,
        }
    }

    /// Average strategy: normalized strategy sums, uniform over the seen
    /// legal mask when nothing accumulated.
    #[must_use]
    pub fn average(&self) -> [f64; NUM_ACTIONS] {
        let total: f64 = self.strategy_sum.iter().sum();
        let mut avg = [0.0; NUM_ACTIONS];
        if total > 0.0 {
            for (slot, &s) in avg.iter_mut().zip(&self.strategy_sum) {
                *slot = s / total;
            }
            return avg;
        }
        let legal: Vec<usize> = (0..NUM_ACTIONS)
            .filter(|i| self.legal_mask & (1 << i) != 0)
            .collect();
        if legal.is_empty() {
            return avg;
        }
        #[allow(clippy::cast_precision_loss)]
        let uniform = 1.0 / legal.len() as f64;
        for i in legal {
            avg[i] = uniform;
        }
        avg
    }
}

/// Interning table plus dense node arena.
#[derive(Debug, Default)]
pub struct NodeTable {
    index: FxHashMap<String, u32>,
    arena: Vec<NodeStats>,
}

impl NodeTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Id for a key, interning a fresh node on first sight. Marks the legal
    /// mask and counts the visit.
    #[allow(clippy::cast_possible_truncation)]
    pub fn visit(&mut self, key: &str, legal: &Actions) -> u32 {
        let id = if let Some(&id) = self.index.get(key) {
            id
        } else {
            let id = self.arena.len() as u32;
            self.index.insert(key.to_string(), id);
            self.arena.push(NodeStats::new());
            id
        };
        let node = &mut self.arena[id as usize];
        for &action in legal {
            node.legal_mask |= 1 << action.index();
        }
        node.visits += 1;
        id
    }

    #[must_use]
    pub fn get(&self, id: u32) -> &NodeStats {
        &self.arena[id as usize]
    }

    pub fn get_mut(&mut self, id: u32) -> &mut NodeStats {
        &mut self.arena[id as usize]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Export the averaged policy for every infoset.
    #[must_use]
    pub fn export_policy(&self) -> PolicyTable {
        let mut table = PolicyTable::new();
        for (key, &id) in &self.index {
            table.insert(key.clone(), self.arena[id as usize].average());
        }
        table
    }

    /// Rough memory footprint of the table, for checkpoint telemetry.
    #[must_use]
    pub fn approx_bytes(&self) -> usize {
        let arena = self.arena.len() * std::mem::size_of::<NodeStats>();
        let index: usize = self
            .index
            .keys()
            .map(|k| k.len() + std::mem::size_of::<u32>())
            .sum();
        arena + index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_macros::timed_test;

    fn legal_cbx() -> Actions {
        let mut legal = Actions::new();
        legal.push(Action::Check);
        legal.push(Action::BetHalf);
        legal.push(Action::AllIn);
        legal
    }

    #[timed_test]
    fn regret_match_normalizes_positive_regrets() {
        let legal = legal_cbx();
        let mut regrets = [0.0; NUM_ACTIONS];
        regrets[Action::Check.index()] = 3.0;
        regrets[Action::BetHalf.index()] = 1.0;
        regrets[Action::AllIn.index()] = -5.0;
        let s = regret_match(&regrets, &legal);
        assert!((s[Action::Check.index()] - 0.75).abs() < 1e-9);
        assert!((s[Action::BetHalf.index()] - 0.25).abs() < 1e-9);
        assert!(s[Action::AllIn.index()].abs() < 1e-12);
    }

    #[timed_test]
    fn regret_match_uniform_when_all_nonpositive() {
        let legal = legal_cbx();
        let regrets = [-1.0; NUM_ACTIONS];
        let s = regret_match(&regrets, &legal);
        for &action in &legal {
            assert!((s[action.index()] - 1.0 / 3.0).abs() < 1e-9);
        }
    }

    #[timed_test]
    fn visit_interns_once_per_key() {
        let mut table = NodeTable::new();
        let legal = legal_cbx();
        let a = table.visit("k1", &legal);
        let b = table.visit("k1", &legal);
        let c = table.visit("k2", &legal);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(a).visits, 2);
    }

    #[timed_test]
    fn legal_mask_accumulates() {
        let mut table = NodeTable::new();
        let legal = legal_cbx();
        let id = table.visit("k", &legal);
        let mask = table.get(id).legal_mask;
        assert_ne!(mask & (1 << Action::Check.index()), 0);
        assert_ne!(mask & (1 << Action::BetHalf.index()), 0);
        assert_eq!(mask & (1 << Action::Fold.index()), 0);
    }

    #[timed_test]
    fn average_normalizes_strategy_sums() {
        let mut table = NodeTable::new();
        let legal = legal_cbx();
        let id = table.visit("k", &legal);
        let node = table.get_mut(id);
        node.strategy_sum[Action::Check.index()] = 6.0;
        node.strategy_sum[Action::BetHalf.index()] = 2.0;
        let avg = table.get(id).average();
        assert!((avg[Action::Check.index()] - 0.75).abs() < 1e-9);
        assert!((avg[Action::BetHalf.index()] - 0.25).abs() < 1e-9);
        assert!((avg.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[timed_test]
    fn average_uniform_fallback_uses_legal_mask() {
        let mut table = NodeTable::new();
        let legal = legal_cbx();
        let id = table.visit("k", &legal);
        let avg = table.get(id).average();
        for &action in &legal {
            assert!((avg[action.index()] - 1.0 / 3.0).abs() < 1e-9);
        }
        assert!(avg[Action::Fold.index()].abs() < 1e-12);
    }

    #[timed_test]
    fn export_policy_joins_keys_and_averages() {
        let mut table = NodeTable::new();
        let legal = legal_cbx();
        let id = table.visit("flop|OOP|tex=0000|spr=2_4|unopened|r=0|hs=5", &legal);
        table.get_mut(id).strategy_sum[Action::Check.index()] = 1.0;
        let policy = table.export_policy();
        let probs = policy
            .lookup("flop|OOP|tex=0000|spr=2_4|unopened|r=0|hs=5")
            .expect("exported key");
        assert!((probs[Action::Check.index()] - 1.0).abs() < 1e-9);
    }

    #[timed_test]
    fn approx_bytes_grows_with_nodes() {
        let mut table = NodeTable::new();
        let legal = legal_cbx();
        let before = table.approx_bytes();
        table.visit("some-key", &legal);
        assert!(table.approx_bytes() > before);
    }
}
