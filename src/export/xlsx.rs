use crate::engines::search::SearchEngine;
use crate::error::Result;
use crate::types::{EngineKind, TrackingRecord};
use rust_xlsxwriter::Workbook;
use std::path::Path;

pub const BEST_SOLUTION_SHEET: &str = "Best solution";

/// Annealing exports only the lowest-cost iterations.
pub const TOP_ITERATIONS: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }
}

/// One worksheet as rows of cells, row 0 being the first spreadsheet row.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetLayout {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl SheetLayout {
    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }
}

/// Writes a run's best solution and step history to a workbook.
pub struct ResultExporter;

impl ResultExporter {
    /// The two sheets of the export, built without touching the filesystem.
    pub fn layout(engine: &dyn SearchEngine) -> Vec<SheetLayout> {
        vec![Self::best_solution_sheet(engine), Self::history_sheet(engine)]
    }

    fn best_solution_sheet(engine: &dyn SearchEngine) -> SheetLayout {
        let mut rows = vec![
            vec![Cell::text("Best solution:")],
            vec![Cell::Text(format!("P-value: {}", engine.best_cost()))],
        ];
        rows.extend(sorted(engine.best_features()).into_iter().map(|name| vec![Cell::Text(name)]));

        SheetLayout {
            name: BEST_SOLUTION_SHEET.to_string(),
            rows,
        }
    }

    fn history_sheet(engine: &dyn SearchEngine) -> SheetLayout {
        let kind = engine.kind();
        let records: Vec<&TrackingRecord> = match kind {
            EngineKind::Genetic => engine.history().iter().rev().collect(),
            EngineKind::Annealing => {
                let mut records: Vec<&TrackingRecord> = engine.history().iter().collect();
                records.sort_by(|a, b| {
                    a.best_cost
                        .partial_cmp(&b.best_cost)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                records.truncate(TOP_ITERATIONS);
                records
            }
        };

        let mut rows = vec![vec![Cell::text(kind.step_label()), Cell::text("p-value")]];
        for record in records {
            let mut row = vec![Cell::Number(record.index as f64), Cell::Number(record.best_cost)];
            row.extend(sorted(record.features.clone()).into_iter().map(Cell::Text));
            rows.push(row);
        }

        let name = match kind {
            EngineKind::Genetic => "Generations",
            EngineKind::Annealing => "Iterations",
        };
        SheetLayout {
            name: name.to_string(),
            rows,
        }
    }

    pub fn write(sheets: &[SheetLayout], path: &Path) -> Result<()> {
        let mut workbook = Workbook::new();

        for sheet in sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(&sheet.name)?;
            for (r, row) in sheet.rows.iter().enumerate() {
                for (c, cell) in row.iter().enumerate() {
                    match cell {
                        Cell::Text(text) => worksheet.write_string(r as u32, c as u16, text)?,
                        Cell::Number(value) => worksheet.write_number(r as u32, c as u16, *value)?,
                    };
                }
            }
        }

        workbook.save(path)?;
        Ok(())
    }

    pub fn export(engine: &dyn SearchEngine, path: &Path) -> Result<()> {
        Self::write(&Self::layout(engine), path)?;
        log::info!("Results exported to {}", path.display());
        Ok(())
    }
}

fn sorted(mut names: Vec<String>) -> Vec<String> {
    names.sort();
    names
}
