//! Visualization functions using Plotters for segment analysis

use crate::segment::{Segment, SegmentedCustomer};
use crate::summary::SegmentSummary;
use plotters::prelude::*;
use rust_decimal::prelude::ToPrimitive;

/// Color for each segment, indexed in `Segment::ALL` order
const SEGMENT_COLORS: [RGBColor; 10] = [
    RGBColor(120, 120, 120),
    RED,
    RGBColor(128, 0, 0),
    RGBColor(255, 165, 0),
    YELLOW,
    BLUE,
    CYAN,
    GREEN,
    MAGENTA,
    RGBColor(0, 100, 0),
];

fn segment_color(segment: Segment) -> &'static RGBColor {
    let idx = Segment::ALL.iter().position(|s| *s == segment).unwrap_or(0);
    &SEGMENT_COLORS[idx]
}

/// Frequency and log10 monetary coordinates for the scatter plot.
pub fn scatter_points(customers: &[SegmentedCustomer]) -> Vec<(f64, f64, Segment)> {
    customers
        .iter()
        .map(|c| {
            let metrics = &c.scored.metrics;
            let monetary = metrics.monetary.to_f64().unwrap_or(1.0).max(1e-2);
            (f64::from(metrics.frequency), monetary.log10(), c.segment)
        })
        .collect()
}

/// Create scatter plot of customers, frequency vs monetary, colored by segment
///
/// # Arguments
/// * `customers` - Segmented customers
/// * `output_path` - Path to save the PNG plot
/// * `plot_title` - Title for the plot
pub fn create_segment_visualization(
    customers: &[SegmentedCustomer],
    output_path: &str,
    plot_title: Option<&str>,
) -> crate::Result<()> {
    let title = plot_title.unwrap_or("Customer Segmentation: Frequency vs Monetary (Colored by Segment)");
    let points = scatter_points(customers);

    let freq_max = points.iter().map(|p| p.0).fold(1.0, f64::max) + 1.0;
    let mon_min = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min).min(0.0) - 0.5;
    let mon_max = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max).max(1.0) + 0.5;

    let root = BitMapBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..freq_max, mon_min..mon_max)?;

    chart
        .configure_mesh()
        .x_desc("Frequency (invoices)")
        .y_desc("Monetary (log10)")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for segment in Segment::ALL {
        let color = segment_color(segment);
        let series: Vec<(f64, f64)> = points
            .iter()
            .filter(|p| p.2 == segment)
            .map(|p| (p.0, p.1))
            .collect();
        if series.is_empty() {
            continue;
        }

        chart
            .draw_series(series.into_iter().map(|(x, y)| Circle::new((x, y), 4, color.filled())))?
            .label(segment.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y), (x + 10, y + 10)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    println!("Segment visualization saved to: {}", output_path);

    Ok(())
}

/// Create a bar chart of segment sizes
pub fn create_segment_size_chart(summaries: &[SegmentSummary], output_path: &str) -> crate::Result<()> {
    let max_size = summaries.iter().map(|s| s.count).max().unwrap_or(1) as f64;

    let root = BitMapBackend::new(output_path, (900, 450)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Segment Sizes", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0f64..(Segment::ALL.len() as f64), 0f64..(max_size * 1.1))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Segment")
        .y_desc("Number of Customers")
        .x_labels(Segment::ALL.len())
        .x_label_formatter(&|x| {
            Segment::ALL
                .get(x.floor() as usize)
                .map(|s| s.as_str().to_string())
                .unwrap_or_default()
        })
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for summary in summaries {
        let idx = Segment::ALL.iter().position(|s| *s == summary.segment).unwrap_or(0) as f64;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(idx + 0.1, 0.0), (idx + 0.9, summary.count as f64)],
            segment_color(summary.segment).filled(),
        )))?;
    }

    root.present()?;
    println!("Segment size chart saved to: {}", output_path);

    Ok(())
}

/// Generate the scatter plot and the segment size chart next to it
pub fn generate_visualization_report(
    customers: &[SegmentedCustomer],
    summaries: &[SegmentSummary],
    base_output_path: &str,
) -> crate::Result<()> {
    create_segment_visualization(customers, base_output_path, None)?;

    let size_chart_path = size_chart_path(base_output_path);
    create_segment_size_chart(summaries, &size_chart_path)?;

    Ok(())
}

/// `plot.png` -> `plot_sizes.png`
pub fn size_chart_path(base_output_path: &str) -> String {
    match base_output_path.strip_suffix(".png") {
        Some(stem) => format!("{}_sizes.png", stem),
        None => format!("{}_sizes.png", base_output_path),
    }
}
