//! Policy - ローテーションの規則
//!
//! 担当可能な worker の決め方（EligibilityRule）と、
//! 一巡完了の判定（CompletionRule）を切り替え可能にします。
//!
//! # デフォルト
//! - ExcludeCurrentAndPrevious + CoversPool
//! - プールが縮んで再び増えた場合でも前進が保証される組み合わせ

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ids::WorkerId;
use super::task::Task;
use super::worker::Worker;

/// 担当可能な worker の決め方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EligibilityRule {
    /// 現担当と前担当だけを除外する
    #[default]
    ExcludeCurrentAndPrevious,
    /// 履歴に載っている worker もすべて除外する
    ExcludeServed,
}

/// 一巡完了の判定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompletionRule {
    /// 履歴の worker 集合が現在のプールを包含している
    #[default]
    CoversPool,
    /// 履歴の件数が現在のプールのサイズ以上
    HistoryAtLeastPoolSize,
}

/// RotationPolicy は EligibilityRule と CompletionRule の組
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RotationPolicy {
    pub eligibility: EligibilityRule,
    pub completion: CompletionRule,
}

impl RotationPolicy {
    pub fn new(eligibility: EligibilityRule, completion: CompletionRule) -> Self {
        Self {
            eligibility,
            completion,
        }
    }

    /// Has the task been served by everyone in `pool`?
    ///
    /// An empty pool never counts as covered: with nobody to rotate to the
    /// task is parked, not completed.
    pub fn is_complete(&self, task: &Task, pool: &[Worker]) -> bool {
        if pool.is_empty() {
            return false;
        }
        match self.completion {
            CompletionRule::CoversPool => {
                let served = task.served_workers();
                pool.iter().all(|w| served.contains(&w.id))
            }
            CompletionRule::HistoryAtLeastPoolSize => task.history.len() >= pool.len(),
        }
    }

    /// Workers in `pool` that may take the task next, in pool order.
    pub fn eligible<'a>(&self, task: &Task, pool: &'a [Worker]) -> Vec<&'a Worker> {
        let mut excluded: HashSet<WorkerId> = HashSet::new();
        excluded.extend(task.current_worker);
        excluded.extend(task.previous_worker);
        if self.eligibility == EligibilityRule::ExcludeServed {
            excluded.extend(task.served_workers());
        }
        pool.iter().filter(|w| !excluded.contains(&w.id)).collect()
    }
}

/// 設定値のパースエラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {what} '{value}' (expected one of: {expected})")]
pub struct ParsePolicyError {
    what: &'static str,
    value: String,
    expected: &'static str,
}

impl FromStr for EligibilityRule {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "current-and-previous" => Ok(Self::ExcludeCurrentAndPrevious),
            "served" => Ok(Self::ExcludeServed),
            other => Err(ParsePolicyError {
                what: "eligibility rule",
                value: other.to_string(),
                expected: "current-and-previous, served",
            }),
        }
    }
}

impl FromStr for CompletionRule {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "covers-pool" => Ok(Self::CoversPool),
            "history-size" => Ok(Self::HistoryAtLeastPoolSize),
            other => Err(ParsePolicyError {
                what: "completion rule",
                value: other.to_string(),
                expected: "covers-pool, history-size",
            }),
        }
    }
}

impl fmt::Display for EligibilityRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExcludeCurrentAndPrevious => f.write_str("current-and-previous"),
            Self::ExcludeServed => f.write_str("served"),
        }
    }
}

impl fmt::Display for CompletionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CoversPool => f.write_str("covers-pool"),
            Self::HistoryAtLeastPoolSize => f.write_str("history-size"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;
    use ulid::Ulid;

    use crate::domain::{AssignmentId, AssignmentRecord, TaskId};

    fn worker(n: u128) -> Worker {
        Worker::new(WorkerId::from_ulid(Ulid::from_parts(0, n)), format!("w{n}"))
    }

    fn task_served_by(workers: &[&Worker]) -> Task {
        let mut task = Task::new(TaskId::from_ulid(Ulid::new()), "t");
        for w in workers {
            let record = AssignmentRecord::new(
                AssignmentId::from_ulid(Ulid::new()),
                task.id,
                w.id,
                Utc::now(),
            );
            task = task.assigned(record);
        }
        task
    }

    #[test]
    fn empty_pool_is_never_complete() {
        let w1 = worker(1);
        let task = task_served_by(&[&w1]);
        assert!(!RotationPolicy::default().is_complete(&task, &[]));
    }

    #[test]
    fn covers_pool_ignores_workers_that_left() {
        let (w1, w2, w3) = (worker(1), worker(2), worker(3));
        let task = task_served_by(&[&w1, &w2, &w3]);

        // w3 left the pool; history still covers everyone present
        assert!(RotationPolicy::default().is_complete(&task, &[w1, w2]));
    }

    #[test]
    fn covers_pool_requires_newcomers() {
        let (w1, w2, w3) = (worker(1), worker(2), worker(3));
        let task = task_served_by(&[&w1, &w2]);

        assert!(!RotationPolicy::default().is_complete(&task, &[w1, w2, w3]));
    }

    #[test]
    fn history_size_counts_records_not_members() {
        let (w1, w2, w3) = (worker(1), worker(2), worker(3));
        // w1 served twice, w3 never
        let task = task_served_by(&[&w1, &w2, &w1]);
        let policy = RotationPolicy::new(
            EligibilityRule::ExcludeCurrentAndPrevious,
            CompletionRule::HistoryAtLeastPoolSize,
        );

        assert!(policy.is_complete(&task, &[w1.clone(), w2.clone(), w3.clone()]));
        assert!(!RotationPolicy::default().is_complete(&task, &[w1, w2, w3]));
    }

    #[test]
    fn eligibility_excludes_current_and_previous() {
        let (w1, w2, w3, w4) = (worker(1), worker(2), worker(3), worker(4));
        let task = task_served_by(&[&w1, &w2, &w3]);
        let pool = [w1.clone(), w2, w3, w4.clone()];

        let ids: Vec<WorkerId> = RotationPolicy::default()
            .eligible(&task, &pool)
            .iter()
            .map(|w| w.id)
            .collect();
        assert_eq!(ids, vec![w1.id, w4.id]);
    }

    #[test]
    fn eligibility_can_exclude_every_served_worker() {
        let (w1, w2, w3, w4) = (worker(1), worker(2), worker(3), worker(4));
        let task = task_served_by(&[&w1, &w2, &w3]);
        let pool = [w1, w2, w3, w4.clone()];
        let policy = RotationPolicy::new(EligibilityRule::ExcludeServed, CompletionRule::CoversPool);

        let ids: Vec<WorkerId> = policy.eligible(&task, &pool).iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![w4.id]);
    }

    #[rstest]
    #[case("current-and-previous", EligibilityRule::ExcludeCurrentAndPrevious)]
    #[case("served", EligibilityRule::ExcludeServed)]
    #[case(" served ", EligibilityRule::ExcludeServed)]
    fn eligibility_rule_parses(#[case] input: &str, #[case] expected: EligibilityRule) {
        assert_eq!(input.parse::<EligibilityRule>().unwrap(), expected);
    }

    #[rstest]
    #[case("covers-pool", CompletionRule::CoversPool)]
    #[case("history-size", CompletionRule::HistoryAtLeastPoolSize)]
    fn completion_rule_parses(#[case] input: &str, #[case] expected: CompletionRule) {
        assert_eq!(input.parse::<CompletionRule>().unwrap(), expected);
    }

    #[test]
    fn unknown_rule_is_rejected() {
        let err = "everyone".parse::<EligibilityRule>().unwrap_err();
        assert!(err.to_string().contains("everyone"));
    }
}
