// Entry point and high-level CLI flow.
//
// The console program mirrors the interactive dashboard it replaces:
// - Option [1] loads and cleans the visits CSV, printing diagnostics.
// - Option [2] prompts for a page and the sidebar filters, then prints the
//   page's aggregate tables and optionally exports them.
// - After exploring a page, the user can go back to the menu or exit.
mod aggregate;
mod filter;
mod loader;
mod output;
mod pages;
mod types;
mod util;

use filter::FilterSpec;
use once_cell::sync::OnceCell;
use pages::Page;
use std::collections::HashSet;
use std::io::{self, Write};
use types::VisitRecord;

// The dataset is loaded once per session and immutable afterwards; every
// recomputation borrows it read-only.
static DATASET: OnceCell<Vec<VisitRecord>> = OnceCell::new();

const DEFAULT_PATH: &str = "consultas_ambulatoriais_2023.csv";

/// Read a single trimmed line of input after printing a prompt.
fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Read a single line of input after printing the common "Enter choice:" prompt.
fn read_choice() -> String {
    read_line("Enter choice: ")
}

fn prompt_yes_no(prompt: &str) -> bool {
    loop {
        match read_line(prompt).to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Handle option [1]: load and clean the visits CSV.
///
/// On success the dataset lands in `DATASET`; a second load is refused since
/// the dataset is immutable for the rest of the session.
fn handle_load(path: &str) {
    if DATASET.get().is_some() {
        println!("Data already loaded for this session.\n");
        return;
    }
    match loader::load_and_clean(path) {
        Ok((data, report)) => {
            println!(
                "Processing dataset... ({} rows read, {} visits kept for {})",
                util::format_int(report.total_rows as i64),
                util::format_int(report.kept_rows as i64),
                types::TARGET_YEAR
            );
            println!(
                "Note: {} rows skipped due to parse/validation errors, {} outside {}.",
                util::format_int(report.parse_errors as i64),
                util::format_int(report.other_years as i64),
                types::TARGET_YEAR
            );
            if report.missing_municipality > 0 {
                println!(
                    "Info: {} visits without municipality recorded as \"{}\".",
                    util::format_int(report.missing_municipality as i64),
                    types::NOT_INFORMED
                );
            }
            let first = data.iter().map(|r| r.visit).min();
            let last = data.iter().map(|r| r.visit).max();
            if let (Some(first), Some(last)) = (first, last) {
                println!("Info: visits span {} to {}.", first.date(), last.date());
            }
            println!();
            let _ = DATASET.set(data);
        }
        Err(e) => {
            eprintln!("Failed to load file: {}\n", e);
        }
    }
}

/// Parse a comma-separated selection; empty input means "keep all observed".
fn prompt_selection(prompt: &str) -> Option<HashSet<String>> {
    let input = read_line(prompt);
    if input.is_empty() {
        return None;
    }
    Some(
        input
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

/// Build the filter spec for one interaction. Starts from the full selection
/// (every observed value, full age span) and narrows whatever the user typed.
fn prompt_filters(dataset: &[VisitRecord]) -> FilterSpec {
    let mut spec = FilterSpec::all_observed(dataset);
    println!("Filters (leave empty to keep all observed values):");
    if let Some(sel) = prompt_selection("  Sex: ") {
        spec.sexes = sel;
    }
    if let Some(sel) = prompt_selection("  Specialty: ") {
        spec.specialties = sel;
    }
    if let Some(sel) = prompt_selection("  Municipality: ") {
        spec.municipalities = sel;
    }
    if let Some(sel) = prompt_selection("  Months (1-12): ") {
        spec.months = sel.iter().filter_map(|s| s.parse::<u32>().ok()).collect();
    }
    let range = read_line("  Age range (min-max): ");
    if !range.is_empty() {
        if let Some((lo, hi)) = parse_age_range(&range) {
            spec.age_range = (lo, hi);
        } else {
            println!("  Unrecognized range, keeping the full age span.");
        }
    }
    spec
}

fn parse_age_range(input: &str) -> Option<(i32, i32)> {
    let (lo, hi) = input.split_once('-')?;
    Some((lo.trim().parse().ok()?, hi.trim().parse().ok()?))
}

/// Handle option [2]: pick a page, apply filters, print its tables.
fn handle_explore() {
    let Some(dataset) = DATASET.get() else {
        println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
        return;
    };

    println!("Navigate the pages:");
    for (idx, page) in Page::ALL.iter().enumerate() {
        println!("[{}] {}", idx + 1, page.title());
    }
    let page = match read_choice().parse::<usize>() {
        Ok(n) if (1..=Page::ALL.len()).contains(&n) => Page::ALL[n - 1],
        _ => {
            println!("Invalid choice. Please enter 1 to {}.\n", Page::ALL.len());
            return;
        }
    };

    let spec = prompt_filters(dataset);
    let view = filter::apply(dataset, &spec);
    println!(
        "\n{} ({} visits in view)\n",
        page.title(),
        util::format_int(view.len() as i64)
    );
    if page == Page::Home {
        println!("Dashboard de Consultas Ambulatoriais 2023");
        println!("Os filtros afetam todas as tabelas; navegue pelas páginas para diferentes perspectivas.\n");
    }

    let charts = pages::assemble(page, dataset, &view);
    for chart in &charts {
        output::print_chart(chart);
    }

    if prompt_yes_no("Export tables (Y/N): ") {
        for chart in &charts {
            match output::export_chart(chart, &output::slugify(&chart.title)) {
                Ok(path) => println!("Exported {}", path),
                Err(e) => eprintln!("Write error: {}", e),
            }
        }
        println!();
    }
}

fn main() {
    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_PATH.to_string());
    loop {
        println!("Dashboard Consultas Ambulatoriais 2023");
        println!("[1] Load the visits file");
        println!("[2] Explore a page\n");
        match read_choice().as_str() {
            "1" => {
                handle_load(&path);
            }
            "2" => {
                println!();
                handle_explore();
                if !prompt_yes_no("Back to page selection (Y/N): ") {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => {
                println!("Invalid choice. Please enter 1 or 2.\n");
            }
        }
    }
}
