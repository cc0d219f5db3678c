/// Selection and grouping of (x, y) pairs for one plot.
///
/// Rows missing either value are dropped before numeric coercion, so
/// the plotted point count per group always equals the number of group
/// rows with both fields present.

use crate::model::{COL_WATERSHED, Table, WqError};

/// One categorical group and its paired observations, in row order.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub name: String,
    pub points: Vec<(f64, f64)>,
}

/// Paired (x, y) values that survived filtering, with their group label
/// when a grouping column was requested.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub x_column: String,
    pub y_column: String,
    pub points: Vec<Observation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub x: f64,
    pub y: f64,
    pub watershed: Option<String>,
    pub group: Option<String>,
}

impl Selection {
    pub fn xy(&self) -> Vec<(f64, f64)> {
        self.points.iter().map(|o| (o.x, o.y)).collect()
    }

    /// Keep only rows of one watershed.
    pub fn focus(mut self, watershed: &str) -> Self {
        self.points.retain(|o| o.watershed.as_deref() == Some(watershed));
        self
    }

    /// Partition by group label in order of first appearance. Rows with
    /// no label are left out.
    pub fn groups(&self) -> Vec<Group> {
        let mut groups: Vec<Group> = Vec::new();
        for obs in &self.points {
            let Some(name) = obs.group.as_deref() else {
                continue;
            };
            match groups.iter_mut().find(|g| g.name == name) {
                Some(group) => group.points.push((obs.x, obs.y)),
                None => groups.push(Group {
                    name: name.to_string(),
                    points: vec![(obs.x, obs.y)],
                }),
            }
        }
        groups
    }
}

/// Pull the (x, y) pairs out of `table`.
///
/// `group_by` names the categorical column to carry along; `None` skips
/// it (pooled plots). The watershed column is carried when present so a
/// focus filter can be applied afterwards.
///
/// # Errors
/// - `ColumnNotFound` for an unknown x, y, or group column
/// - `TypeConversion` if a present x or y value is not numeric
pub fn select(
    table: &Table,
    x: &str,
    y: &str,
    group_by: Option<&str>,
) -> Result<Selection, WqError> {
    let x_idx = table.column_index(x)?;
    let y_idx = table.column_index(y)?;
    let group_idx = group_by.map(|g| table.column_index(g)).transpose()?;
    let watershed_idx = table.find_column(COL_WATERSHED);

    let mut points = Vec::new();
    for record in &table.records {
        let (x_cell, y_cell) = (record.get(x_idx), record.get(y_idx));
        if x_cell.is_missing() || y_cell.is_missing() {
            continue;
        }
        points.push(Observation {
            x: coerce(x, x_cell)?,
            y: coerce(y, y_cell)?,
            watershed: watershed_idx.and_then(|i| record.get(i).as_label()),
            group: group_idx.and_then(|i| record.get(i).as_label()),
        });
    }

    Ok(Selection {
        x_column: x.to_string(),
        y_column: y.to_string(),
        points,
    })
}

fn coerce(column: &str, cell: &crate::model::CellValue) -> Result<f64, WqError> {
    cell.to_number().ok_or_else(|| WqError::TypeConversion {
        column: column.to_string(),
        value: cell.to_string(),
    })
}
