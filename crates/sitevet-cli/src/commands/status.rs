//! Status command - show review progress and dataset summary.

use std::path::PathBuf;

use colored::Colorize;
use sitevet::RecordTable;

pub fn run(file: PathBuf, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    let table = RecordTable::load(&file)?;
    let counts = table.status_counts();
    let summary = table.numeric_summary(&table.ids());

    if json_output {
        let status = serde_json::json!({
            "file": file.display().to_string(),
            "rows": table.len(),
            "located": table.located_count(),
            "status": counts,
            "countries": table.unique_values("Country"),
            "numeric_summary": summary,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Review status for".cyan().bold(),
        file.display().to_string().white()
    );
    println!();

    let decided = counts.accepted + counts.rejected;
    let total = counts.total();
    let progress = if total == 0 {
        0.0
    } else {
        decided as f64 / total as f64
    };
    let bar_width = 30;
    let filled = (progress * bar_width as f64).round() as usize;
    let bar: String = "█".repeat(filled) + &"░".repeat(bar_width - filled);

    println!(
        "Progress: {} {}/{} ({:.0}%)",
        bar.cyan(),
        decided.to_string().white().bold(),
        total,
        progress * 100.0
    );
    println!();

    println!("{}", "Records:".yellow().bold());
    println!("  Unreviewed: {}", counts.unreviewed.to_string().white());
    println!("  Accepted:   {}", counts.accepted.to_string().green());
    println!("  Rejected:   {}", counts.rejected.to_string().red());
    println!(
        "  With location: {} of {}",
        table.located_count().to_string().white(),
        total
    );
    println!();

    if !summary.is_empty() {
        println!("{}", "Numeric columns:".yellow().bold());
        for column in &summary {
            println!(
                "  {:24} n={:<5} min={:<12.2} max={:<12.2} mean={:.2}",
                column.column, column.count, column.min, column.max, column.mean
            );
        }
        println!();
    }

    if counts.unreviewed > 0 {
        println!(
            "Run {} to continue reviewing.",
            format!("sitevet review {}", file.display()).cyan().bold()
        );
    } else {
        println!("{}", "All records reviewed!".green().bold());
    }

    Ok(())
}
