mod epic;
mod error;
mod sprint;
mod team;

pub use epic::EpicSummary;
pub use error::{Error, Result};
pub use sprint::{AssigneeStats, ClosedSprint, SprintIssue, SprintReport, SprintStats};
pub use team::Team;
