//! Aggregate view over a batch of evaluation records

use serde::{Deserialize, Serialize};

use super::runner::{EvalRecord, Outcome};

/// Counts and mean score for one evaluation run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvalReport {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Routing mismatches on cases marked flaky
    pub flaky_failures: usize,
    pub scored: usize,
    pub errored: usize,
    /// Mean verdict score across scored cases
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_score: Option<f64>,
}

impl EvalReport {
    pub fn from_records(records: &[EvalRecord]) -> Self {
        let mut report = EvalReport {
            total: records.len(),
            ..Default::default()
        };
        let mut score_sum = 0.0;

        for record in records {
            match &record.outcome {
                Outcome::Passed => report.passed += 1,
                Outcome::Failed { .. } if record.flaky => report.flaky_failures += 1,
                Outcome::Failed { .. } => report.failed += 1,
                Outcome::Scored { verdict } => {
                    report.scored += 1;
                    score_sum += verdict.score;
                }
                Outcome::Errored { .. } => report.errored += 1,
            }
        }

        if report.scored > 0 {
            report.mean_score = Some(score_sum / report.scored as f64);
        }
        report
    }

    /// No non-flaky failures and no errored cases
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::eval::{EvalMode, QualityVerdict};
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn record(outcome: Outcome, flaky: bool) -> EvalRecord {
        EvalRecord {
            id: Uuid::new_v4(),
            name: None,
            mode: EvalMode::Routing,
            node: "generatePath".into(),
            flaky,
            inputs: json!({}),
            output: None,
            outcome,
            started_at: Utc::now(),
            duration_ms: 0,
        }
    }

    fn scored(score: f64) -> Outcome {
        Outcome::Scored {
            verdict: QualityVerdict {
                key: "quality".into(),
                score,
                comment: String::new(),
            },
        }
    }

    #[test]
    fn counts_every_outcome() {
        let records = vec![
            record(Outcome::Passed, false),
            record(Outcome::Failed { mismatches: vec![] }, false),
            record(Outcome::Failed { mismatches: vec![] }, true),
            record(scored(8.0), false),
            record(scored(5.0), false),
            record(
                Outcome::Errored {
                    kind: ErrorKind::Timeout,
                    message: "late".into(),
                },
                false,
            ),
        ];
        let report = EvalReport::from_records(&records);

        assert_eq!(report.total, 6);
        assert_eq!(report.passed, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.flaky_failures, 1);
        assert_eq!(report.scored, 2);
        assert_eq!(report.errored, 1);
        assert_eq!(report.mean_score, Some(6.5));
        assert!(!report.is_success());
    }

    #[test]
    fn flaky_failures_do_not_fail_the_run() {
        let records = vec![
            record(Outcome::Passed, false),
            record(Outcome::Failed { mismatches: vec![] }, true),
        ];
        let report = EvalReport::from_records(&records);
        assert!(report.is_success());
        assert_eq!(report.mean_score, None);
    }

    #[test]
    fn empty_run_is_successful() {
        assert!(EvalReport::from_records(&[]).is_success());
    }
}
