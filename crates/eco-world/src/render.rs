//! Text rendering of the grid and population counts.

use crate::grid::Grid;
use std::fmt::Write;

/// Framed picture of the grid, one character per cell
pub fn render_grid(grid: &Grid, generation: u64) -> String {
    let width = grid.cols.max(0) as usize;
    let rule = "-".repeat(width * 2 + 1);
    let mut out = String::with_capacity((width * 2 + 2) * (grid.rows.max(0) as usize + 4));

    let _ = writeln!(out, "Generation {}", generation);
    let _ = writeln!(out, "{}", rule);
    for x in 0..grid.rows {
        let Some(row) = grid.row(x) else { break };
        let cells: Vec<String> = row.iter().map(|cell| cell.symbol().to_string()).collect();
        let _ = writeln!(out, "|{}|", cells.join(" "));
    }
    let _ = writeln!(out, "{}", rule);
    out.push('\n');
    out
}

pub fn render_stats(generation: u64, rabbits: usize, foxes: usize) -> String {
    format!(
        "Generation {}:\n - Rabbits: {}\n - Foxes  : {}\n-------------------------\n",
        generation, rabbits, foxes
    )
}
