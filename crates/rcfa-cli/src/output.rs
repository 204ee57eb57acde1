//! Output formatting module

use rcfa_types::{AnalysisResponse, AnalysisResult, BatchResults, OutputFormat, Result};

pub fn output_response(output_format: OutputFormat, response: &AnalysisResponse, from_cache: bool) -> Result<()> {
    if output_format == OutputFormat::Json {
        let content = serde_json::to_string_pretty(response)?;
        println!("{}", content);
        return Ok(());
    }

    print_result_table(&response.analysis);

    println!();
    println!("Model:           {}", response.model_used);
    println!(
        "Processing time: {:.1}s{}",
        response.processing_time_secs,
        if from_cache { " (cached)" } else { "" }
    );
    println!("Timestamp:       {}", response.timestamp.format("%Y-%m-%d %H:%M:%S UTC"));

    Ok(())
}

pub fn output_result(output_format: OutputFormat, result: &AnalysisResult) -> Result<()> {
    if output_format == OutputFormat::Json {
        let content = serde_json::to_string_pretty(result)?;
        println!("{}", content);
    } else {
        print_result_table(result);
    }

    Ok(())
}

fn print_result_table(result: &AnalysisResult) {
    println!("\nBearing Failure Analysis");
    println!("========================");
    println!(
        "Bearing detected: {}",
        if result.bearing_detected { "Yes" } else { "No" }
    );

    if result.is_degraded() {
        println!("Status:           DEGRADED (result could not be produced normally)");
    }

    println!("\nObserved damage:");
    println!("  {}", result.observed_damage);

    println!("\nFailure mode:");
    println!("  {}", result.failure_mode);

    println!("\nRoot cause analysis:");
    for (i, cause) in result.root_cause_analysis.iter().enumerate() {
        println!("  {}. {}", i + 1, cause);
    }

    println!("\nConfidence:       {:.0}%", result.confidence_score * 100.0);

    println!("\nRecommendations:");
    for rec in &result.recommendations {
        println!("  - {}", rec);
    }

    if let Some(ref notes) = result.technical_notes {
        println!("\nNotes: {}", notes);
    }
}

pub fn output_batch_summary(results: &BatchResults) {
    println!("\nBatch Analysis Complete");
    println!("=======================");
    println!("Total:      {}", results.entries.len());
    println!("Successful: {}", results.succeeded());
    println!("Degraded:   {}", results.degraded());
    println!("Failed:     {}", results.failed());
    println!("Duration:   {:.1}s", results.duration_secs());

    let failures: Vec<_> = results.entries.iter().filter(|e| e.error.is_some()).collect();
    if !failures.is_empty() {
        println!("\nFailures:");
        for entry in failures {
            println!(
                "  {}: {}",
                entry.image_path,
                entry.error.as_deref().unwrap_or_default()
            );
        }
    }
}
