use serde::{Deserialize, Serialize};

use super::aggregate::CriteriaAggregate;
use super::signals::TextSignals;

/// Diagnostic surfaced to the author or reviewer of a peer evaluation.
///
/// Declaration order matches the order in which the rule table emits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Suggestion {
    ComprehensiveFeedback,
    NeedsMoreDetail,
    EvidenceBased,
    EncourageExamples,
    InsufficientDifferentiation,
    VerifyHighRatings,
    LowRatingsNeedSupport,
    ActionableImprovements,
}

impl Suggestion {
    pub fn message(&self) -> &'static str {
        match self {
            Suggestion::ComprehensiveFeedback => "High quality: comprehensive feedback",
            Suggestion::NeedsMoreDetail => "Quality concern: needs more detail",
            Suggestion::EvidenceBased => "Evidence-based: concrete examples present",
            Suggestion::EncourageExamples => "Suggest improvement: encourage examples",
            Suggestion::InsufficientDifferentiation => {
                "Rating pattern: insufficient differentiation"
            }
            Suggestion::VerifyHighRatings => {
                "Positive evaluation: verify strengths justify high score"
            }
            Suggestion::LowRatingsNeedSupport => "Low ratings: ensure constructive feedback",
            Suggestion::ActionableImprovements => {
                "Constructive feedback: actionable suggestions present"
            }
        }
    }

    /// Longer explanation shown alongside the message in reviewer views.
    pub fn detail(&self) -> &'static str {
        match self {
            Suggestion::ComprehensiveFeedback => {
                "This evaluation provides comprehensive and detailed feedback."
            }
            Suggestion::NeedsMoreDetail => "Feedback could be more detailed and specific.",
            Suggestion::EvidenceBased => {
                "The author provided concrete examples to support the evaluation."
            }
            Suggestion::EncourageExamples => {
                "Encourage the author to include specific examples in future evaluations."
            }
            Suggestion::InsufficientDifferentiation => {
                "All ratings are very similar. This might indicate insufficient differentiation."
            }
            Suggestion::VerifyHighRatings => {
                "High ratings detected. Ensure the strengths section justifies these scores."
            }
            Suggestion::LowRatingsNeedSupport => {
                "Ensure feedback is constructive and provides actionable improvement suggestions."
            }
            Suggestion::ActionableImprovements => {
                "The evaluation provides actionable suggestions for improvement."
            }
        }
    }

    /// Whether the suggestion flags something to fix rather than praise.
    pub fn is_concern(&self) -> bool {
        matches!(
            self,
            Suggestion::NeedsMoreDetail
                | Suggestion::EncourageExamples
                | Suggestion::InsufficientDifferentiation
                | Suggestion::LowRatingsNeedSupport
        )
    }
}

const COMPREHENSIVE_STRENGTHS_MIN: usize = 100;
const COMPREHENSIVE_IMPROVEMENTS_MIN: usize = 80;
const DETAIL_FLOOR: usize = 50;
const DIFFERENTIATION_VARIANCE: f64 = 0.5;
const HIGH_MEAN: f64 = 4.5;
const LOW_MEAN: f64 = 2.5;

/// Inputs every rule predicate reads.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RuleContext {
    pub aggregate: CriteriaAggregate,
    pub signals: TextSignals,
}

impl RuleContext {
    pub(crate) fn is_comprehensive(&self) -> bool {
        self.signals.strengths_length > COMPREHENSIVE_STRENGTHS_MIN
            && self.signals.improvements_length > COMPREHENSIVE_IMPROVEMENTS_MIN
    }

    pub(crate) fn is_thin(&self) -> bool {
        self.signals.strengths_length < DETAIL_FLOOR
            || self.signals.improvements_length < DETAIL_FLOOR
    }
}

type Rule = fn(&RuleContext) -> Option<Suggestion>;

/// Evaluated top to bottom; each rule contributes at most one suggestion.
const SUGGESTION_RULES: [Rule; 6] = [
    comprehensive_feedback,
    needs_more_detail,
    concrete_examples,
    rating_differentiation,
    rating_tone,
    actionable_improvements,
];

fn comprehensive_feedback(ctx: &RuleContext) -> Option<Suggestion> {
    ctx.is_comprehensive().then_some(Suggestion::ComprehensiveFeedback)
}

fn needs_more_detail(ctx: &RuleContext) -> Option<Suggestion> {
    ctx.is_thin().then_some(Suggestion::NeedsMoreDetail)
}

fn concrete_examples(ctx: &RuleContext) -> Option<Suggestion> {
    Some(if ctx.signals.has_specifics_in_strengths {
        Suggestion::EvidenceBased
    } else {
        Suggestion::EncourageExamples
    })
}

fn rating_differentiation(ctx: &RuleContext) -> Option<Suggestion> {
    (ctx.aggregate.variance < DIFFERENTIATION_VARIANCE)
        .then_some(Suggestion::InsufficientDifferentiation)
}

fn rating_tone(ctx: &RuleContext) -> Option<Suggestion> {
    if ctx.aggregate.mean >= HIGH_MEAN {
        Some(Suggestion::VerifyHighRatings)
    } else if ctx.aggregate.mean <= LOW_MEAN {
        Some(Suggestion::LowRatingsNeedSupport)
    } else {
        None
    }
}

fn actionable_improvements(ctx: &RuleContext) -> Option<Suggestion> {
    ctx.signals
        .has_actionable_improvement
        .then_some(Suggestion::ActionableImprovements)
}

pub(crate) fn synthesize(ctx: &RuleContext) -> Vec<Suggestion> {
    SUGGESTION_RULES.iter().filter_map(|rule| rule(ctx)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(
        strengths_length: usize,
        improvements_length: usize,
        specifics: bool,
        actionable: bool,
        mean: f64,
        variance: f64,
    ) -> RuleContext {
        RuleContext {
            aggregate: CriteriaAggregate { mean, variance },
            signals: TextSignals {
                strengths_length,
                improvements_length,
                has_specifics_in_strengths: specifics,
                has_actionable_improvement: actionable,
            },
        }
    }

    #[test]
    fn every_rule_fires_in_table_order() {
        let suggestions = synthesize(&context(120, 90, true, true, 4.8, 0.16));
        assert_eq!(
            suggestions,
            vec![
                Suggestion::ComprehensiveFeedback,
                Suggestion::EvidenceBased,
                Suggestion::InsufficientDifferentiation,
                Suggestion::VerifyHighRatings,
                Suggestion::ActionableImprovements,
            ]
        );
    }

    #[test]
    fn examples_rule_always_contributes_one_of_its_branches() {
        let with = synthesize(&context(70, 70, true, false, 3.0, 1.0));
        let without = synthesize(&context(70, 70, false, false, 3.0, 1.0));
        assert_eq!(with, vec![Suggestion::EvidenceBased]);
        assert_eq!(without, vec![Suggestion::EncourageExamples]);
    }

    #[test]
    fn length_thresholds_are_strict() {
        let at_comprehensive_edge = synthesize(&context(100, 81, false, false, 3.0, 1.0));
        assert!(!at_comprehensive_edge.contains(&Suggestion::ComprehensiveFeedback));

        let improvements_edge = synthesize(&context(101, 80, false, false, 3.0, 1.0));
        assert!(!improvements_edge.contains(&Suggestion::ComprehensiveFeedback));

        let at_detail_floor = synthesize(&context(50, 50, false, false, 3.0, 1.0));
        assert!(!at_detail_floor.contains(&Suggestion::NeedsMoreDetail));

        let below_floor = synthesize(&context(50, 49, false, false, 3.0, 1.0));
        assert!(below_floor.contains(&Suggestion::NeedsMoreDetail));
    }

    #[test]
    fn mean_bounds_are_inclusive() {
        assert!(synthesize(&context(70, 70, false, false, 4.5, 1.0))
            .contains(&Suggestion::VerifyHighRatings));
        assert!(synthesize(&context(70, 70, false, false, 2.5, 1.0))
            .contains(&Suggestion::LowRatingsNeedSupport));

        let middle = synthesize(&context(70, 70, false, false, 3.4, 1.0));
        assert!(!middle.contains(&Suggestion::VerifyHighRatings));
        assert!(!middle.contains(&Suggestion::LowRatingsNeedSupport));
    }

    #[test]
    fn differentiation_threshold_is_strict() {
        assert!(!synthesize(&context(70, 70, false, false, 3.0, 0.5))
            .contains(&Suggestion::InsufficientDifferentiation));
        assert!(synthesize(&context(70, 70, false, false, 3.0, 0.49))
            .contains(&Suggestion::InsufficientDifferentiation));
    }

    #[test]
    fn uniform_high_ratings_keep_both_differentiation_and_praise() {
        let suggestions = synthesize(&context(70, 70, false, false, 5.0, 0.0));
        assert!(suggestions.contains(&Suggestion::InsufficientDifferentiation));
        assert!(suggestions.contains(&Suggestion::VerifyHighRatings));
    }

    #[test]
    fn concern_flags_cover_only_corrective_suggestions() {
        assert!(Suggestion::NeedsMoreDetail.is_concern());
        assert!(!Suggestion::EvidenceBased.is_concern());
        assert!(!Suggestion::VerifyHighRatings.is_concern());
    }
}
