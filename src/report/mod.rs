pub mod annotation;
pub mod assignee_matrix;
pub mod epics;
pub mod page;
pub mod table;

use crate::model::{EpicSummary, Result, SprintReport};
use annotation::{AnnotationSupplier, Annotations};
use assignee_matrix::MatrixPlan;

/// Produces the next page body from the current one. Annotations are gathered
/// for the rows that will be rendered before either table is merged.
pub fn synchronize<S: AnnotationSupplier + ?Sized>(
    body: &str,
    team_name: &str,
    reports: &[SprintReport],
    epics: &[EpicSummary],
    supplier: &mut S,
) -> Result<String> {
    let plan = MatrixPlan::new(assignee_matrix::LOCATOR.grid(body), reports);
    let annotations = Annotations::collect(supplier, plan.reports(), &plan.assignees())?;
    let sprints_table = plan.apply(&annotations).render(&assignee_matrix::STYLE);
    let epics_table = epics::sync(body, epics);
    Ok(page::compose(body, team_name, &sprints_table, &epics_table))
}
