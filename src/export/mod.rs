pub mod xlsx;

pub use xlsx::{Cell, ResultExporter, SheetLayout, BEST_SOLUTION_SHEET, TOP_ITERATIONS};
