use crate::models::{AnnotationIndex, DatasetLayout};
use crate::services::AnnotationSetIndexer;
use crate::Result;
use anyhow::Context;
use colored::Colorize;
use std::path::Path;

/// Show the document x annotator matrix of a dataset
pub fn run(dataset: &Path, json: bool) -> Result<()> {
    let index = AnnotationSetIndexer::new(dataset)
        .index()
        .with_context(|| format!("Failed to index {}", dataset.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&index)?);
        return Ok(());
    }

    print_index(&index);
    Ok(())
}

fn print_index(index: &AnnotationIndex) {
    let layout = match index.layout {
        DatasetLayout::Flat => "flat",
        DatasetLayout::Directory => "directory",
    };

    println!("{}", format!("📂 {}", index.root.display()).cyan().bold());
    println!("   Layout:     {}", layout);
    println!("   Annotators: {}", index.annotators().join(", "));
    println!(
        "   Documents:  {} ({} files)",
        index.documents().len(),
        index.file_count()
    );
    println!();

    let width = index
        .documents()
        .iter()
        .map(|d| d.id.len())
        .max()
        .unwrap_or(0)
        .max("document".len());

    let header: Vec<String> = index
        .annotators()
        .iter()
        .map(|a| format!("{:^3}", a))
        .collect();
    println!("   {:width$}  {}", "document", header.join(" "), width = width);

    for document in index.documents() {
        let cells: Vec<String> = (0..index.annotator_count())
            .map(|slot| {
                let width = index.annotator(slot).map_or(1, str::len).max(3);
                match document.file(slot) {
                    Some(_) => format!("{:^width$}", "✓", width = width).green().to_string(),
                    None => format!("{:^width$}", "-", width = width).red().to_string(),
                }
            })
            .collect();

        let missing = document.missing_count();
        let note = if missing > 0 {
            format!("  ({} missing)", missing).yellow().to_string()
        } else {
            String::new()
        };
        println!("   {:width$}  {}{}", document.id, cells.join(" "), note, width = width);
    }

    if !index.skipped.is_empty() {
        println!();
        println!(
            "{}",
            format!("⚠ Skipped {} file(s):", index.skipped.len()).yellow()
        );
        for path in &index.skipped {
            println!("   {}", path.display().to_string().bright_black());
        }
    }
}
