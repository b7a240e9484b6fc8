use serde::{Deserialize, Serialize};

use super::rules::RuleContext;

const ADEQUATE_DETAIL_MIN: usize = 60;

/// Advisory grade tier; seeds the reviewer's grade input and nothing more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeTier {
    Excellent,
    Good,
    Basic,
    Satisfactory,
}

impl GradeTier {
    pub fn grade(&self) -> u8 {
        match self {
            GradeTier::Excellent => 95,
            GradeTier::Good => 88,
            GradeTier::Basic => 75,
            GradeTier::Satisfactory => 85,
        }
    }

    pub fn rationale(&self) -> &'static str {
        match self {
            GradeTier::Excellent => {
                "Excellent evaluation with specific examples and comprehensive feedback."
            }
            GradeTier::Good => "Good evaluation with adequate detail.",
            GradeTier::Basic => "Basic evaluation that could benefit from more detail.",
            GradeTier::Satisfactory => "Satisfactory evaluation meeting minimum requirements.",
        }
    }
}

/// Suggested grade with the tier that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeEstimate {
    pub tier: GradeTier,
    pub grade: u8,
}

impl GradeEstimate {
    pub fn rationale(&self) -> &'static str {
        self.tier.rationale()
    }

    pub fn summary(&self) -> String {
        format!("Suggested grade: {}/100 - {}", self.grade, self.rationale())
    }
}

impl From<GradeTier> for GradeEstimate {
    fn from(tier: GradeTier) -> Self {
        Self {
            tier,
            grade: tier.grade(),
        }
    }
}

/// First matching tier wins.
pub(crate) fn estimate(ctx: &RuleContext) -> GradeEstimate {
    let signals = &ctx.signals;
    let tier = if ctx.is_comprehensive() && signals.has_specifics_in_strengths {
        GradeTier::Excellent
    } else if signals.strengths_length > ADEQUATE_DETAIL_MIN
        && signals.improvements_length > ADEQUATE_DETAIL_MIN
    {
        GradeTier::Good
    } else if ctx.is_thin() {
        GradeTier::Basic
    } else {
        GradeTier::Satisfactory
    };

    GradeEstimate::from(tier)
}
