mod sprint;

pub use sprint::{build_sprint_report, latest_sprints};
