use super::stats::{self, Alternative, StatsError};
use crate::config::objective::{Hypothesis, ObjectiveConfig, SignatureType, StatTest};
use crate::error::{Result, SearchmiError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TwoGroupTest {
    MannWhitneyU,
    WelchT,
}

impl TwoGroupTest {
    pub fn p_value(&self, a: &[f64], b: &[f64], alternative: Alternative) -> std::result::Result<f64, StatsError> {
        match self {
            Self::MannWhitneyU => stats::mann_whitney_u(a, b, alternative),
            Self::WelchT => stats::welch_t(a, b, alternative),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreeGroupTest {
    OneWayAnova,
    KruskalWallis,
}

impl ThreeGroupTest {
    pub fn p_value(&self, groups: [&[f64]; 3]) -> std::result::Result<f64, StatsError> {
        match self {
            Self::OneWayAnova => stats::one_way_anova(&groups),
            Self::KruskalWallis => stats::kruskal_wallis(&groups),
        }
    }
}

/// Resolved statistical objective: the test is fixed together with the
/// group layout it applies to, so a two-group test can never be asked to
/// compare three groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Objective {
    /// Group A is `reference`, group B is every other sample.
    TwoGroups {
        test: TwoGroupTest,
        reference: String,
        alternative: Alternative,
    },
    ThreeGroups {
        test: ThreeGroupTest,
        groups: [String; 3],
    },
}

impl Objective {
    /// Resolve the configured test against the run's category values.
    ///
    /// `categories` is the configured category list, falling back to the
    /// data's categories when the config leaves it empty.
    pub fn resolve(config: &ObjectiveConfig, categories: &[String]) -> Result<Self> {
        match config.test {
            StatTest::MannWhitneyU | StatTest::WelchT => {
                if categories.len() != 2 {
                    return Err(SearchmiError::Configuration(format!(
                        "{:?} compares two groups, but {} categories were given",
                        config.test,
                        categories.len()
                    )));
                }
                let test = match config.test {
                    StatTest::MannWhitneyU => TwoGroupTest::MannWhitneyU,
                    _ => TwoGroupTest::WelchT,
                };
                let (reference, alternative) = match config.hypothesis {
                    Hypothesis::TwoSided => (categories[0].clone(), Alternative::TwoSided),
                    Hypothesis::OneSided => {
                        let reference = config.positive_label.clone().ok_or_else(|| {
                            SearchmiError::Configuration(
                                "one-sided hypothesis requires positive_label".to_string(),
                            )
                        })?;
                        let alternative = match config.signature {
                            SignatureType::Positive => Alternative::Greater,
                            SignatureType::Negative => Alternative::Less,
                        };
                        (reference, alternative)
                    }
                };
                Ok(Self::TwoGroups {
                    test,
                    reference,
                    alternative,
                })
            }
            StatTest::OneWayAnova | StatTest::KruskalWallis => {
                if categories.len() != 3 {
                    return Err(SearchmiError::Configuration(format!(
                        "{:?} compares three groups, but {} categories were given",
                        config.test,
                        categories.len()
                    )));
                }
                let test = match config.test {
                    StatTest::OneWayAnova => ThreeGroupTest::OneWayAnova,
                    _ => ThreeGroupTest::KruskalWallis,
                };
                Ok(Self::ThreeGroups {
                    test,
                    groups: [
                        categories[0].clone(),
                        categories[1].clone(),
                        categories[2].clone(),
                    ],
                })
            }
        }
    }

    pub fn group_count(&self) -> usize {
        match self {
            Self::TwoGroups { .. } => 2,
            Self::ThreeGroups { .. } => 3,
        }
    }

    /// Group slot for a sample label, or None when the label belongs to no
    /// compared group.
    pub fn group_of(&self, label: &str) -> Option<usize> {
        match self {
            Self::TwoGroups { reference, .. } => Some(if label == reference { 0 } else { 1 }),
            Self::ThreeGroups { groups, .. } => groups.iter().position(|g| g == label),
        }
    }

    /// Display name of a group slot.
    pub fn group_name(&self, slot: usize) -> String {
        match self {
            Self::TwoGroups { reference, .. } => {
                if slot == 0 {
                    reference.clone()
                } else {
                    format!("not {}", reference)
                }
            }
            Self::ThreeGroups { groups, .. } => groups.get(slot).cloned().unwrap_or_default(),
        }
    }

    /// Run the test on richness values already split by group slot.
    pub fn p_value(&self, groups: &[Vec<f64>]) -> std::result::Result<f64, StatsError> {
        for (slot, values) in groups.iter().enumerate() {
            if values.is_empty() {
                return Err(StatsError::EmptyGroup(self.group_name(slot)));
            }
        }
        match self {
            Self::TwoGroups {
                test, alternative, ..
            } => test.p_value(&groups[0], &groups[1], *alternative),
            Self::ThreeGroups { test, .. } => {
                test.p_value([&groups[0], &groups[1], &groups[2]])
            }
        }
    }
}
