//! # Evaluation statistics
//!
//! Plots the per tile metrics of a directory evaluation. Only built with the `statistics`
//! feature.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::Path;

use plotters::prelude::*;

use crate::error::*;
use crate::io::TileReport;

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Draw EPE and D1 (as a percentage) for every tile into a PNG chart.
pub fn plot_reports<P: AsRef<Path>>(reports: &[TileReport], path: P) -> Result<()> {
    let plot_err = |e: &dyn std::fmt::Debug| Error::Plot(format!("{:?}", e));

    let root = BitMapBackend::new(path.as_ref(), (800, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| plot_err(&e))?;

    let y_max = reports
        .iter()
        .map(|r| r.epe.max(r.d1 * 100.0))
        .fold(1.0f32, f32::max);

    let mut chart = ChartBuilder::on(&root)
        .caption("Evaluation per tile", ("sans-serif", 20).into_font())
        .margin(5)
        .x_label_area_size(30)
        .y_label_area_size(30)
        .build_ranged(0..reports.len().max(1), 0f32..y_max)
        .map_err(|e| plot_err(&e))?;

    chart.configure_mesh().draw().map_err(|e| plot_err(&e))?;

    chart
        .draw_series(LineSeries::new(
            reports.iter().enumerate().map(|(i, r)| (i, r.epe)),
            &RED
        ))
        .map_err(|e| plot_err(&e))?
        .label("EPE")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));

    chart
        .draw_series(LineSeries::new(
            reports.iter().enumerate().map(|(i, r)| (i, r.d1 * 100.0)),
            &BLUE
        ))
        .map_err(|e| plot_err(&e))?
        .label("D1 (%)")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(|e| plot_err(&e))?;

    Ok(())
}
