// Aggregation library: pure transforms from a filtered view to chart-ready
// values. Every function is total — an empty view produces an empty (or
// zero-filled, for fixed-axis series) result, never an error.
use crate::types::{
    AgeStatsGroup, CategoryCount, GroupedMean, HistogramBin, PivotTable, SeriesPoint,
    SummaryStats, VisitRecord, weekday_name, WEEKDAYS,
};
use crate::util::{average, median, percentile_sorted};
use chrono::Weekday;
use std::collections::{HashMap, HashSet};

/// Bin count for age histograms, matching the dashboard's charts.
pub const HISTOGRAM_BINS: usize = 30;

/// First-encountered rank of each category in the *unfiltered* dataset.
///
/// Top-N ties are broken by this rank, so two categories with equal counts
/// always land in the same relative order no matter which filter is active.
pub struct CategoryOrder {
    rank: HashMap<String, usize>,
}

impl CategoryOrder {
    pub fn new<'a, F>(dataset: &'a [VisitRecord], key: F) -> Self
    where
        F: Fn(&'a VisitRecord) -> Option<&'a str>,
    {
        let mut rank = HashMap::new();
        for r in dataset {
            if let Some(k) = key(r) {
                let next = rank.len();
                rank.entry(k.to_string()).or_insert(next);
            }
        }
        CategoryOrder { rank }
    }

    fn rank_of(&self, category: &str) -> usize {
        self.rank.get(category).copied().unwrap_or(usize::MAX)
    }
}

/// Count rows per category. Records missing the dimension are skipped.
/// Output order is first-encountered order within the view.
pub fn category_counts<'a, F>(view: &[&'a VisitRecord], key: F) -> Vec<CategoryCount>
where
    F: Fn(&'a VisitRecord) -> Option<&'a str>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<CategoryCount> = Vec::new();
    for r in view {
        let Some(k) = key(r) else { continue };
        match index.get(k) {
            Some(&i) => out[i].count += 1,
            None => {
                index.insert(k.to_string(), out.len());
                out.push(CategoryCount {
                    category: k.to_string(),
                    count: 1,
                });
            }
        }
    }
    out
}

/// The `n` most frequent categories, descending by count, ties broken by the
/// supplied dataset order. Fewer than `n` distinct categories yields exactly
/// that many entries, no padding.
pub fn top_n<'a, F>(
    view: &[&'a VisitRecord],
    n: usize,
    key: F,
    order: &CategoryOrder,
) -> Vec<CategoryCount>
where
    F: Fn(&'a VisitRecord) -> Option<&'a str>,
{
    let mut counts = category_counts(view, key);
    counts.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| order.rank_of(&a.category).cmp(&order.rank_of(&b.category)))
    });
    counts.truncate(n);
    counts
}

/// Mean age per category, restricted to `candidates` (typically a prior
/// top-N), ascending by mean. Candidates with no matching rows are omitted
/// rather than reported as NaN.
pub fn grouped_mean_age<'a, F>(
    view: &[&'a VisitRecord],
    candidates: &[String],
    key: F,
) -> Vec<GroupedMean>
where
    F: Fn(&'a VisitRecord) -> Option<&'a str>,
{
    let allowed: HashSet<&str> = candidates.iter().map(String::as_str).collect();
    let mut ages: HashMap<String, Vec<f64>> = HashMap::new();
    for r in view {
        let Some(k) = key(r) else { continue };
        if allowed.contains(k) {
            ages.entry(k.to_string()).or_default().push(r.age as f64);
        }
    }
    let mut out: Vec<GroupedMean> = ages
        .into_iter()
        .map(|(category, vals)| GroupedMean {
            category,
            mean: average(&vals),
        })
        .collect();
    out.sort_by(|a, b| a.mean.partial_cmp(&b.mean).unwrap_or(std::cmp::Ordering::Equal));
    out
}

/// Cross-tabulated counts: rows restricted to `row_candidates` (in that
/// order), columns fixed to `col_labels`. Absent combinations are 0.
pub fn pivot_counts<'a, F, G>(
    view: &[&'a VisitRecord],
    row_candidates: &[String],
    row_key: F,
    col_labels: &[String],
    col_key: G,
) -> PivotTable
where
    F: Fn(&'a VisitRecord) -> Option<&'a str>,
    G: Fn(&'a VisitRecord) -> Option<&'a str>,
{
    let row_index: HashMap<&str, usize> = row_candidates
        .iter()
        .enumerate()
        .map(|(i, s)| (s.as_str(), i))
        .collect();
    let col_index: HashMap<&str, usize> = col_labels
        .iter()
        .enumerate()
        .map(|(i, s)| (s.as_str(), i))
        .collect();
    let mut cells = vec![vec![0u64; col_labels.len()]; row_candidates.len()];
    for r in view {
        let (Some(rk), Some(ck)) = (row_key(r), col_key(r)) else {
            continue;
        };
        if let (Some(&i), Some(&j)) = (row_index.get(rk), col_index.get(ck)) {
            cells[i][j] += 1;
        }
    }
    PivotTable {
        row_labels: row_candidates.to_vec(),
        col_labels: col_labels.to_vec(),
        cells,
    }
}

/// Visits per weekday, reindexed onto the fixed Monday→Sunday axis with
/// zero-fill. Always exactly seven points.
pub fn weekday_series(view: &[&VisitRecord]) -> Vec<SeriesPoint> {
    let mut counts: HashMap<Weekday, u64> = HashMap::new();
    for r in view {
        *counts.entry(r.weekday).or_default() += 1;
    }
    WEEKDAYS
        .iter()
        .map(|d| SeriesPoint {
            label: weekday_name(*d).to_string(),
            count: counts.get(d).copied().unwrap_or(0),
        })
        .collect()
}

/// Visits per month, ascending by calendar month index — never by count and
/// never alphabetically. Only observed months appear.
pub fn month_series(view: &[&VisitRecord]) -> Vec<SeriesPoint> {
    let mut counts: HashMap<u32, u64> = HashMap::new();
    for r in view {
        *counts.entry(r.month).or_default() += 1;
    }
    let mut months: Vec<u32> = counts.keys().copied().collect();
    months.sort_unstable();
    months
        .into_iter()
        .map(|m| SeriesPoint {
            label: m.to_string(),
            count: counts[&m],
        })
        .collect()
}

/// Age distribution over `bins` equal-width integer bins spanning the view's
/// observed min..max age. Empty view ⇒ empty histogram.
pub fn age_histogram(view: &[&VisitRecord], bins: usize) -> Vec<HistogramBin> {
    if view.is_empty() || bins == 0 {
        return Vec::new();
    }
    let min = view.iter().map(|r| r.age).min().unwrap_or(0);
    let max = view.iter().map(|r| r.age).max().unwrap_or(0);
    let span = (max - min + 1) as usize;
    let width = span.div_ceil(bins).max(1);
    let bin_count = span.div_ceil(width);
    let mut out: Vec<HistogramBin> = (0..bin_count)
        .map(|i| {
            let start = min + (i * width) as i32;
            HistogramBin {
                start,
                end: start + width as i32 - 1,
                count: 0,
            }
        })
        .collect();
    for r in view {
        let idx = (r.age - min) as usize / width;
        out[idx].count += 1;
    }
    out
}

/// Age distribution of the records matching an exact value on one dimension,
/// e.g. the per-sex histograms.
pub fn conditional_age_histogram<'a, F>(
    view: &[&'a VisitRecord],
    key: F,
    value: &str,
    bins: usize,
) -> Vec<HistogramBin>
where
    F: Fn(&'a VisitRecord) -> Option<&'a str>,
{
    let part: Vec<&VisitRecord> = view
        .iter()
        .copied()
        .filter(|r| key(r) == Some(value))
        .collect();
    age_histogram(&part, bins)
}

/// Age spread (box-plot numbers) per candidate category, in candidate order.
/// Candidates with no matching rows are omitted.
pub fn grouped_age_stats<'a, F>(
    view: &[&'a VisitRecord],
    candidates: &[String],
    key: F,
) -> Vec<AgeStatsGroup>
where
    F: Fn(&'a VisitRecord) -> Option<&'a str>,
{
    let mut ages: HashMap<&str, Vec<f64>> = HashMap::new();
    let allowed: HashSet<&str> = candidates.iter().map(String::as_str).collect();
    for r in view {
        let Some(k) = key(r) else { continue };
        if let Some(&name) = allowed.get(k) {
            ages.entry(name).or_default().push(r.age as f64);
        }
    }
    candidates
        .iter()
        .filter_map(|c| {
            let vals = ages.remove(c.as_str())?;
            let mut sorted = vals.clone();
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            Some(AgeStatsGroup {
                category: c.clone(),
                count: vals.len() as u64,
                min: sorted[0],
                q1: percentile_sorted(&sorted, 0.25),
                median: median(vals.clone()),
                q3: percentile_sorted(&sorted, 0.75),
                max: sorted[sorted.len() - 1],
                mean: average(&vals),
            })
        })
        .collect()
}

/// Headline numbers for the home page.
pub fn summary(view: &[&VisitRecord]) -> SummaryStats {
    let specialties: HashSet<&str> = view.iter().filter_map(|r| r.specialty.as_deref()).collect();
    let municipalities: HashSet<&str> = view.iter().map(|r| r.municipality.as_str()).collect();
    let ages: Vec<f64> = view.iter().map(|r| r.age as f64).collect();
    SummaryStats {
        total_visits: view.len(),
        distinct_specialties: specialties.len(),
        distinct_municipalities: municipalities.len(),
        mean_age: average(&ages),
    }
}
