//! SegmentForge: Customer segmentation CLI using RFM quantile scoring
//!
//! This is the main entrypoint that orchestrates data loading, the RFM
//! pipeline, export and visualization.

use anyhow::Result;
use clap::Parser;
use segmentforge::{data, logging, run_pipeline, summary, viz, Args};
use std::time::Instant;

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_logging(args.verbose);

    if args.verbose {
        println!("SegmentForge - Customer Segmentation using RFM scoring");
        println!("======================================================\n");
    }

    run_full_pipeline(&args)
}

fn run_full_pipeline(args: &Args) -> Result<()> {
    println!("=== RFM Segmentation Pipeline ===\n");

    let start_time = Instant::now();
    let config = args.resolve_config()?;

    if args.verbose {
        println!("Step 1: Loading data");
        println!("  Input file: {}", args.input);
        println!("  Reference date: {}", config.reference_date);
        if let Some(window) = &config.window {
            println!("  Analysis window: {} to {}", window.start, window.end);
        }
    }

    let data_start = Instant::now();
    let lines = data::load_transactions(&args.input)?;
    println!("✓ Data loaded: {} invoice lines", lines.len());
    if args.verbose {
        println!("  Loading time: {:.2}s", data_start.elapsed().as_secs_f64());
        println!("\nStep 2: Cleaning, aggregating, scoring and segmenting");
    }

    let pipeline_start = Instant::now();
    let analysis = run_pipeline(&lines, &config)?;
    let report = &analysis.cleaning;

    println!(
        "✓ Cleaned: {} lines kept, {} excluded ({} cancellations)",
        report.kept,
        report.excluded(),
        report.cancelled
    );
    println!("✓ Segmented: {} customers", analysis.customers.len());
    if args.verbose {
        println!(
            "  Missing invoice: {}, customer: {}, quantity: {}, price: {}, date: {}, outside window: {}",
            report.missing_invoice,
            report.missing_customer,
            report.missing_quantity,
            report.missing_unit_price,
            report.missing_invoice_date,
            report.outside_window
        );
        println!("  Pipeline time: {:.2}s", pipeline_start.elapsed().as_secs_f64());
    }

    let summaries = summary::summarize_segments(&analysis.customers);
    summary::print_segment_statistics(&summaries);

    data::write_rfm_csv(&args.output, &analysis.records())?;
    println!("\nRFM table saved to: {}", args.output);

    if let Some(segment) = args.export_segment {
        let count = data::write_segment_ids(&args.segment_output, &analysis.customers, segment)?;
        println!("{} {} ids saved to: {}", count, segment, args.segment_output);
    }

    if let Some(plot_path) = &args.plot {
        if args.verbose {
            println!("\nStep 3: Generating visualizations");
        }
        viz::generate_visualization_report(&analysis.customers, &summaries, plot_path)?;
    }

    println!("\n=== Pipeline Complete ===");
    println!("Total processing time: {:.2}s", start_time.elapsed().as_secs_f64());

    Ok(())
}
