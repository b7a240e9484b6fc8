use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::domain::{round_to, CriterionKey, EvaluationStatus, StudentEvaluation};

/// Average rating for one criterion across all evaluations.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionAverage {
    pub criterion: CriterionKey,
    pub label: &'static str,
    pub average: f64,
}

/// Average score received by one peer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerAverage {
    pub peer_name: String,
    pub evaluations: usize,
    pub average: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatusDistribution {
    pub submitted: usize,
    pub reviewed: usize,
    pub graded: usize,
}

/// Simple averages over a set of evaluations. Averages are rounded to two
/// decimals; empty inputs produce zeros rather than NaN.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationAnalytics {
    pub total_evaluations: usize,
    pub unique_peers: usize,
    pub average_score: f64,
    pub criteria: Vec<CriterionAverage>,
    pub peers: Vec<PeerAverage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_performer: Option<PeerAverage>,
    pub status: StatusDistribution,
    pub pending_review: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_teacher_grade: Option<f64>,
}

impl EvaluationAnalytics {
    pub fn from_evaluations(evaluations: &[StudentEvaluation]) -> Self {
        let total_evaluations = evaluations.len();

        let average_score = mean(evaluations.iter().map(StudentEvaluation::mean_rating));

        let criteria = CriterionKey::ALL
            .iter()
            .map(|key| CriterionAverage {
                criterion: *key,
                label: key.label(),
                average: mean(
                    evaluations
                        .iter()
                        .map(|evaluation| f64::from(evaluation.record.criteria.get(*key))),
                ),
            })
            .collect();

        let mut by_peer: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for evaluation in evaluations {
            by_peer
                .entry(evaluation.peer_name.as_str())
                .or_default()
                .push(evaluation.mean_rating());
        }
        let peers: Vec<PeerAverage> = by_peer
            .into_iter()
            .map(|(peer_name, scores)| PeerAverage {
                peer_name: peer_name.to_string(),
                evaluations: scores.len(),
                average: mean(scores.into_iter()),
            })
            .collect();

        // Peers are in name order, so the first maximum wins ties.
        let top_performer = peers
            .iter()
            .fold(None::<&PeerAverage>, |best, candidate| match best {
                Some(current) if current.average >= candidate.average => Some(current),
                _ => Some(candidate),
            })
            .cloned();

        let mut status = StatusDistribution::default();
        for evaluation in evaluations {
            match evaluation.status {
                EvaluationStatus::Submitted => status.submitted += 1,
                EvaluationStatus::Reviewed => status.reviewed += 1,
                EvaluationStatus::Graded => status.graded += 1,
            }
        }

        let grades: Vec<f64> = evaluations
            .iter()
            .filter(|evaluation| evaluation.status == EvaluationStatus::Graded)
            .filter_map(|evaluation| evaluation.teacher_grade.map(f64::from))
            .collect();
        let average_teacher_grade = if grades.is_empty() {
            None
        } else {
            Some(mean(grades.into_iter()))
        };

        let unique_peers = evaluations
            .iter()
            .map(|evaluation| evaluation.peer_name.as_str())
            .collect::<BTreeSet<_>>()
            .len();

        Self {
            total_evaluations,
            unique_peers,
            average_score,
            criteria,
            peers,
            top_performer,
            pending_review: status.submitted,
            status,
            average_teacher_grade,
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        0.0
    } else {
        round_to(sum / count as f64, 2)
    }
}
