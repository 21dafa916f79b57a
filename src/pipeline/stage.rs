// ABOUTME: Fixed stage topology and per-stage status types.
// ABOUTME: pre-deploy -> deploy -> post-deploy, with post-deploy always run.

use serde::Serialize;
use std::fmt;

/// Identity of a pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageId {
    PreDeploy,
    Deploy,
    PostDeploy,
}

impl StageId {
    pub fn as_str(self) -> &'static str {
        match self {
            StageId::PreDeploy => "pre-deploy",
            StageId::Deploy => "deploy",
            StageId::PostDeploy => "post-deploy",
        }
    }

    /// Position in `STAGES`.
    pub const fn index(self) -> usize {
        match self {
            StageId::PreDeploy => 0,
            StageId::Deploy => 1,
            StageId::PostDeploy => 2,
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node of the stage graph. Immutable once the graph is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub id: StageId,
    pub dependencies: &'static [StageId],
    /// Optional stages never fail the pipeline and never block dependents.
    pub required: bool,
    /// Runs once its dependencies are terminal, whatever their outcome.
    pub always_run: bool,
}

/// The pipeline, in execution order.
pub const STAGES: [Stage; 3] = [
    Stage {
        id: StageId::PreDeploy,
        dependencies: &[],
        required: true,
        always_run: false,
    },
    Stage {
        id: StageId::Deploy,
        dependencies: &[StageId::PreDeploy],
        required: true,
        always_run: false,
    },
    Stage {
        id: StageId::PostDeploy,
        dependencies: &[StageId::PreDeploy, StageId::Deploy],
        required: true,
        always_run: true,
    },
];

/// Look up a stage definition.
pub fn stage(id: StageId) -> &'static Stage {
    &STAGES[id.index()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    Running,
    Success,
    Failure,
    Skipped,
}

impl StageStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            StageStatus::Success | StageStatus::Failure | StageStatus::Skipped
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StageStatus::Pending => "pending",
            StageStatus::Running => "running",
            StageStatus::Success => "success",
            StageStatus::Failure => "failure",
            StageStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of a stage-local failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Missing configuration or unmet precondition detected before calling out.
    Validation,
    /// An external command or call failed.
    Collaborator,
}

/// Why a stage failed. Captured as data, never propagated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl StageFailure {
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Validation,
            message: message.into(),
        }
    }

    pub fn collaborator(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Collaborator,
            message: message.into(),
        }
    }
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            FailureKind::Validation => "validation error",
            FailureKind::Collaborator => "collaborator failure",
        };
        write!(f, "{kind}: {}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_declared_in_dependency_order() {
        for (i, stage) in STAGES.iter().enumerate() {
            for dep in stage.dependencies {
                let dep_index = STAGES.iter().position(|s| s.id == *dep).unwrap();
                assert!(dep_index < i, "{} depends on later stage {}", stage.id, dep);
            }
        }
    }

    #[test]
    fn only_post_deploy_is_always_run() {
        let always: Vec<_> = STAGES.iter().filter(|s| s.always_run).map(|s| s.id).collect();
        assert_eq!(always, [StageId::PostDeploy]);
    }

    #[test]
    fn lookup_matches_table() {
        for s in &STAGES {
            assert_eq!(stage(s.id), s);
        }
    }
}
