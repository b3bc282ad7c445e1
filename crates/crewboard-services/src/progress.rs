use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Named steps of a dashboard load, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Client,
    Applications,
    PeopleCount,
    PeopleData,
    Enrollments,
    DocumentsAndTasks,
    Invitations,
    Complete,
}

impl Stage {
    pub const ALL: [Stage; 8] = [
        Stage::Client,
        Stage::Applications,
        Stage::PeopleCount,
        Stage::PeopleData,
        Stage::Enrollments,
        Stage::DocumentsAndTasks,
        Stage::Invitations,
        Stage::Complete,
    ];

    /// 1-based position in [`Stage::ALL`]
    pub fn ordinal(&self) -> u32 {
        *self as u32 + 1
    }

    pub fn label(&self) -> &'static str {
        match self {
            Stage::Client => "Client",
            Stage::Applications => "Applications",
            Stage::PeopleCount => "People Count",
            Stage::PeopleData => "People Data",
            Stage::Enrollments => "Enrollments",
            Stage::DocumentsAndTasks => "Documents & Tasks",
            Stage::Invitations => "Invitations",
            Stage::Complete => "Complete",
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.label())
    }
}

/// One progress update: which stage is running and how far along the load is.
///
/// `current` and `total` count stages, not rows: `current` is the 1-based position of
/// `stage` in [`Stage::ALL`] and `total` is the number of stages. Row counts, such as the
/// number of people on the page, only appear in `message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub stage: Stage,
    /// Position of `stage`, starting at 1
    pub current: u32,
    /// Number of stages in a load
    pub total: u32,
    pub message: String,
}

impl Progress {
    pub fn at(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            current: stage.ordinal(),
            total: Stage::ALL.len() as u32,
            message: message.into(),
        }
    }

    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.current.min(self.total) * 100) / self.total) as u8
    }

    pub fn is_complete(&self) -> bool {
        self.stage == Stage::Complete
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            stage: Stage::Client,
            current: 0,
            total: Stage::ALL.len() as u32,
            message: String::new(),
        }
    }
}

/// Receiver of progress updates
pub trait ProgressSink: Send + Sync {
    fn report(&self, progress: Progress);
}

impl<F> ProgressSink for F
where
    F: Fn(Progress) + Send + Sync,
{
    fn report(&self, progress: Progress) {
        self(progress)
    }
}
