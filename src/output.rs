use crate::pages::{AggregateResult, Chart};
use crate::types::{
    AgeStatsGroup, AgeStatsRow, CategoryCount, CategoryCountRow, GroupedMean, HistogramBin,
    HistogramBinRow, MeanAgeRow, PivotTable, RankedCountRow, SeriesPoint, SeriesPointRow,
    SummaryStats,
};
use crate::util::{format_int, format_number};
use serde::Serialize;
use std::error::Error;
use tabled::{builder::Builder, settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &str, rows: &[T]) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Print one chart as a markdown table under its title.
pub fn print_chart(chart: &Chart) {
    println!("{}", chart.title);
    match &chart.result {
        AggregateResult::Counts(counts) => print_table(&count_rows(counts)),
        AggregateResult::Ranked(counts) => print_table(&ranked_rows(counts)),
        AggregateResult::Means(means) => print_table(&mean_rows(means)),
        AggregateResult::Pivot(pivot) => print_pivot(pivot),
        AggregateResult::Series(series) => print_table(&series_rows(series)),
        AggregateResult::Histogram(bins) => print_table(&histogram_rows(bins)),
        AggregateResult::AgeStats(stats) => print_table(&age_stats_rows(stats)),
        AggregateResult::Summary(summary) => print_summary(summary),
    }
}

/// Write one chart to disk next to the binary; returns the file name written.
/// Tables go to CSV, the summary to JSON.
pub fn export_chart(chart: &Chart, stem: &str) -> Result<String, Box<dyn Error>> {
    match &chart.result {
        AggregateResult::Counts(counts) => {
            let path = format!("{stem}.csv");
            write_csv(&path, &count_rows(counts))?;
            Ok(path)
        }
        AggregateResult::Ranked(counts) => {
            let path = format!("{stem}.csv");
            write_csv(&path, &ranked_rows(counts))?;
            Ok(path)
        }
        AggregateResult::Means(means) => {
            let path = format!("{stem}.csv");
            write_csv(&path, &mean_rows(means))?;
            Ok(path)
        }
        AggregateResult::Pivot(pivot) => {
            let path = format!("{stem}.csv");
            write_pivot_csv(&path, pivot)?;
            Ok(path)
        }
        AggregateResult::Series(series) => {
            let path = format!("{stem}.csv");
            write_csv(&path, &series_rows(series))?;
            Ok(path)
        }
        AggregateResult::Histogram(bins) => {
            let path = format!("{stem}.csv");
            write_csv(&path, &histogram_rows(bins))?;
            Ok(path)
        }
        AggregateResult::AgeStats(stats) => {
            let path = format!("{stem}.csv");
            write_csv(&path, &age_stats_rows(stats))?;
            Ok(path)
        }
        AggregateResult::Summary(summary) => {
            let path = format!("{stem}.json");
            write_json(&path, summary)?;
            Ok(path)
        }
    }
}

/// File-name stem for an exported chart, derived from its title.
pub fn slugify(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut last_was_sep = true;
    for c in title.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_was_sep = false;
        } else if !last_was_sep {
            out.push('_');
            last_was_sep = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

fn print_table<T>(rows: &[T])
where
    T: Tabled + Clone,
{
    if rows.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(rows.to_vec()).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

fn print_pivot(pivot: &PivotTable) {
    if pivot.row_labels.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let mut builder = Builder::default();
    let mut header = vec!["Categoria".to_string()];
    header.extend(pivot.col_labels.iter().cloned());
    builder.push_record(header);
    for (label, row) in pivot.row_labels.iter().zip(&pivot.cells) {
        let mut record = vec![label.clone()];
        record.extend(row.iter().map(u64::to_string));
        builder.push_record(record);
    }
    let table_str = builder.build().with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

fn print_summary(summary: &SummaryStats) {
    println!("Total de atendimentos: {}", format_int(summary.total_visits as i64));
    println!("Especialidades distintas: {}", format_int(summary.distinct_specialties as i64));
    println!("Municípios distintos: {}", format_int(summary.distinct_municipalities as i64));
    println!("Idade média: {}\n", format_number(summary.mean_age, 1));
}

fn write_pivot_csv(path: &str, pivot: &PivotTable) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    let mut header = vec!["Categoria".to_string()];
    header.extend(pivot.col_labels.iter().cloned());
    wtr.write_record(&header)?;
    for (label, row) in pivot.row_labels.iter().zip(&pivot.cells) {
        let mut record = vec![label.clone()];
        record.extend(row.iter().map(u64::to_string));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

fn count_rows(counts: &[CategoryCount]) -> Vec<CategoryCountRow> {
    counts
        .iter()
        .map(|c| CategoryCountRow {
            category: c.category.clone(),
            count: c.count,
        })
        .collect()
}

fn ranked_rows(counts: &[CategoryCount]) -> Vec<RankedCountRow> {
    counts
        .iter()
        .enumerate()
        .map(|(idx, c)| RankedCountRow {
            rank: idx + 1,
            category: c.category.clone(),
            count: c.count,
        })
        .collect()
}

fn mean_rows(means: &[GroupedMean]) -> Vec<MeanAgeRow> {
    means
        .iter()
        .map(|m| MeanAgeRow {
            category: m.category.clone(),
            mean_age: format_number(m.mean, 1),
        })
        .collect()
}

fn series_rows(series: &[SeriesPoint]) -> Vec<SeriesPointRow> {
    series
        .iter()
        .map(|p| SeriesPointRow {
            label: p.label.clone(),
            count: p.count,
        })
        .collect()
}

fn histogram_rows(bins: &[HistogramBin]) -> Vec<HistogramBinRow> {
    bins.iter()
        .map(|b| HistogramBinRow {
            age_range: format!("{}-{}", b.start, b.end),
            count: b.count,
        })
        .collect()
}

fn age_stats_rows(stats: &[AgeStatsGroup]) -> Vec<AgeStatsRow> {
    stats
        .iter()
        .map(|s| AgeStatsRow {
            category: s.category.clone(),
            count: s.count,
            min: format_number(s.min, 1),
            q1: format_number(s.q1, 1),
            median: format_number(s.median, 1),
            q3: format_number(s.q3, 1),
            max: format_number(s.max, 1),
            mean: format_number(s.mean, 1),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_builds_safe_file_stems() {
        assert_eq!(
            slugify("Top 10 Municípios com Mais Atendimentos"),
            "top_10_munic_pios_com_mais_atendimentos"
        );
        assert_eq!(slugify("Idade Média por Município (Top 5)"), "idade_m_dia_por_munic_pio_top_5");
    }

    #[test]
    fn ranked_rows_are_one_based() {
        let counts = vec![
            CategoryCount {
                category: "A".into(),
                count: 3,
            },
            CategoryCount {
                category: "B".into(),
                count: 1,
            },
        ];
        let rows = ranked_rows(&counts);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[1].rank, 2);
    }
}
