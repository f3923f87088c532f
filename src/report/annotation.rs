use crate::model::{Result, SprintReport};
use std::collections::HashMap;
use std::io::{BufRead, Write};

/// Facts only a human knows about a sprint. Consulted once, before any table
/// is merged.
pub trait AnnotationSupplier {
    fn goal_met(&mut self, sprint: &str) -> Result<Option<bool>>;
    fn working_days(&mut self, sprint: &str, assignee: &str) -> Result<Option<u32>>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotations {
    goals: HashMap<String, bool>,
    working_days: HashMap<(String, String), u32>,
}

impl Annotations {
    pub fn collect<S: AnnotationSupplier + ?Sized>(
        supplier: &mut S,
        reports: &[&SprintReport],
        assignees: &[String],
    ) -> Result<Self> {
        let mut annotations = Self::default();
        for report in reports {
            if let Some(met) = supplier.goal_met(&report.sprint)? {
                annotations.goals.insert(report.sprint.clone(), met);
            }
            for assignee in assignees {
                if let Some(days) = supplier.working_days(&report.sprint, assignee)? {
                    annotations.set_working_days(&report.sprint, assignee, days);
                }
            }
        }
        Ok(annotations)
    }

    pub fn goal_met(&self, sprint: &str) -> Option<bool> {
        self.goals.get(sprint).copied()
    }

    pub fn working_days(&self, sprint: &str, assignee: &str) -> Option<u32> {
        self.working_days
            .get(&(sprint.to_string(), assignee.to_string()))
            .copied()
    }

    pub fn set_goal_met(&mut self, sprint: &str, met: bool) {
        self.goals.insert(sprint.to_string(), met);
    }

    pub fn set_working_days(&mut self, sprint: &str, assignee: &str, days: u32) {
        self.working_days
            .insert((sprint.to_string(), assignee.to_string()), days);
    }
}

/// Unattended runs: a fixed working-days figure, goal completion unknown.
#[derive(Debug, Clone, Default)]
pub struct DefaultAnnotations {
    pub working_days: Option<u32>,
}

impl AnnotationSupplier for DefaultAnnotations {
    fn goal_met(&mut self, _sprint: &str) -> Result<Option<bool>> {
        Ok(None)
    }

    fn working_days(&mut self, _sprint: &str, _assignee: &str) -> Result<Option<u32>> {
        Ok(self.working_days)
    }
}

/// Asks the operator on a terminal; empty or unreadable answers fall back to
/// `defaults`.
pub struct InteractivePrompt<R, W> {
    input: R,
    output: W,
    defaults: DefaultAnnotations,
}

impl<R: BufRead, W: Write> InteractivePrompt<R, W> {
    pub fn new(input: R, output: W, defaults: DefaultAnnotations) -> Self {
        Self {
            input,
            output,
            defaults,
        }
    }

    fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{question}")?;
        self.output.flush()?;
        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        Ok(answer.trim().to_string())
    }
}

impl<R: BufRead, W: Write> AnnotationSupplier for InteractivePrompt<R, W> {
    fn goal_met(&mut self, sprint: &str) -> Result<Option<bool>> {
        let answer = self.ask(&format!(
            "Was the sprint goal for {sprint} completed? (y/n): "
        ))?;
        match answer.to_lowercase().as_str() {
            "y" | "yes" => Ok(Some(true)),
            "n" | "no" => Ok(Some(false)),
            _ => self.defaults.goal_met(sprint),
        }
    }

    fn working_days(&mut self, sprint: &str, assignee: &str) -> Result<Option<u32>> {
        let default = self.defaults.working_days(sprint, assignee)?;
        let hint = default.map_or("none".to_string(), |days| days.to_string());
        let answer = self.ask(&format!(
            "How many working days did {assignee} work on the sprint {sprint}? (default is {hint}): "
        ))?;
        match answer.parse::<u32>() {
            Ok(days) => Ok(Some(days)),
            Err(_) => Ok(default),
        }
    }
}
