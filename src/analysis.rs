//! Static table of the per-frame analyses and their dependencies.
//!
//! The tracker resolves the requested analyses against [`REGISTRY`] once, at
//! construction. The ellipse fit (and with it the moments) always runs since
//! every frame result carries it.
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Analysis {
    Moments,
    Ellipse,
    HuInvariants,
    Trajectory,
    Orientation,
    Edges,
    Hough,
}

#[derive(Clone, Copy, Debug)]
pub struct AnalysisInfo {
    pub analysis: Analysis,
    pub name: &'static str,
    pub requires: &'static [Analysis],
}

/// One entry per variant in declaration order; dependencies precede
/// dependents.
pub static REGISTRY: &[AnalysisInfo] = &[
    AnalysisInfo {
        analysis: Analysis::Moments,
        name: "moments",
        requires: &[],
    },
    AnalysisInfo {
        analysis: Analysis::Ellipse,
        name: "ellipse",
        requires: &[Analysis::Moments],
    },
    AnalysisInfo {
        analysis: Analysis::HuInvariants,
        name: "hu_invariants",
        requires: &[Analysis::Moments],
    },
    AnalysisInfo {
        analysis: Analysis::Trajectory,
        name: "trajectory",
        requires: &[Analysis::Moments],
    },
    AnalysisInfo {
        analysis: Analysis::Orientation,
        name: "orientation",
        requires: &[Analysis::Ellipse],
    },
    AnalysisInfo {
        analysis: Analysis::Edges,
        name: "edges",
        requires: &[],
    },
    AnalysisInfo {
        analysis: Analysis::Hough,
        name: "hough",
        requires: &[Analysis::Edges],
    },
];

impl Analysis {
    /// Registry entry; the table is indexed by discriminant.
    pub fn info(self) -> &'static AnalysisInfo {
        &REGISTRY[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn all() -> Vec<Analysis> {
        REGISTRY.iter().map(|info| info.analysis).collect()
    }
}

/// Resolved set of analyses, in registry order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AnalysisPlan {
    enabled: Vec<Analysis>,
}

impl Default for AnalysisPlan {
    fn default() -> Self {
        Self::resolve(&Analysis::all())
    }
}

impl AnalysisPlan {
    /// Close `requested` over the dependency table.
    pub fn resolve(requested: &[Analysis]) -> Self {
        let mut wanted: Vec<Analysis> = requested.to_vec();
        wanted.push(Analysis::Ellipse);
        let mut i = 0;
        while i < wanted.len() {
            for &dep in wanted[i].info().requires {
                if !wanted.contains(&dep) {
                    wanted.push(dep);
                }
            }
            i += 1;
        }
        let enabled = REGISTRY
            .iter()
            .map(|info| info.analysis)
            .filter(|a| wanted.contains(a))
            .collect();
        Self { enabled }
    }

    pub fn contains(&self, analysis: Analysis) -> bool {
        self.enabled.contains(&analysis)
    }

    pub fn iter(&self) -> impl Iterator<Item = Analysis> + '_ {
        self.enabled.iter().copied()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.iter().map(Analysis::name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lists_dependencies_first() {
        for (i, info) in REGISTRY.iter().enumerate() {
            for dep in info.requires {
                let pos = REGISTRY
                    .iter()
                    .position(|d| d.analysis == *dep)
                    .expect("dependency registered");
                assert!(pos < i, "{} must follow {}", info.name, dep.name());
            }
        }
        for (i, info) in REGISTRY.iter().enumerate() {
            assert_eq!(info.analysis as usize, i);
        }
    }

    #[test]
    fn resolve_pulls_in_dependencies() {
        let plan = AnalysisPlan::resolve(&[Analysis::Hough]);
        assert_eq!(
            plan.names(),
            vec!["moments", "ellipse", "edges", "hough"]
        );
        assert!(!plan.contains(Analysis::Orientation));
    }

    #[test]
    fn ellipse_is_always_resolved() {
        let plan = AnalysisPlan::resolve(&[]);
        assert!(plan.contains(Analysis::Ellipse));
        assert!(plan.contains(Analysis::Moments));
        assert!(!plan.contains(Analysis::Trajectory));
    }

    #[test]
    fn default_plan_enables_everything() {
        let plan = AnalysisPlan::default();
        assert_eq!(plan.iter().count(), REGISTRY.len());
    }

    #[test]
    fn analyses_deserialize_from_config_names() {
        let list: Vec<Analysis> =
            serde_json::from_str(r#"["orientation", "hu_invariants"]"#).expect("parse");
        let plan = AnalysisPlan::resolve(&list);
        assert_eq!(
            plan.names(),
            vec!["moments", "ellipse", "hu_invariants", "orientation"]
        );
    }
}
