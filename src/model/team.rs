#[derive(Debug, Clone, Eq, Hash, PartialEq)]
pub struct Team {
    pub name: String,
    pub board_id: u64,
    pub project: String,
}

impl Team {
    pub fn new(name: impl ToString, board_id: u64, project: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            board_id,
            project: project.to_string(),
        }
    }
}
