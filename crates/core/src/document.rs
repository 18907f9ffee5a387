//! Document trait: a named record with a lifecycle state.

use crate::docstatus::DocStatus;

/// Named, submittable host document (identity + continuity across state changes).
pub trait Document {
    /// Host doctype label (e.g. "Sales Invoice").
    const DOCTYPE: &'static str;

    /// Strongly-typed document name.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    fn name(&self) -> &Self::Id;

    fn docstatus(&self) -> DocStatus;
}
