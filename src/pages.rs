// Page assembler: each dashboard page maps to an ordered list of aggregation
// recipes. Adding a page means adding an enum variant and a recipe list, not
// editing a branch chain.
use crate::aggregate::{self, CategoryOrder, HISTOGRAM_BINS};
use crate::types::{
    weekday_name, AgeStatsGroup, CategoryCount, GroupedMean, HistogramBin, PivotTable,
    SeriesPoint, SummaryStats, VisitRecord, NOT_INFORMED, WEEKDAYS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    BySex,
    ByAge,
    Specialties,
    Municipalities,
    TimeTrends,
}

impl Page {
    pub const ALL: [Page; 6] = [
        Page::Home,
        Page::BySex,
        Page::ByAge,
        Page::Specialties,
        Page::Municipalities,
        Page::TimeTrends,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Page::Home => "Página Inicial",
            Page::BySex => "Análises por Sexo",
            Page::ByAge => "Análises por Idade",
            Page::Specialties => "Especialidades",
            Page::Municipalities => "Municípios",
            Page::TimeTrends => "Tendências Temporais",
        }
    }
}

/// One aggregation step of a page. Top-N sizes and partition values are baked
/// into the variant since the dashboard's pages are fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipe {
    Summary,
    SexCounts,
    FemaleAgeHistogram,
    MaleAgeHistogram,
    AgeHistogram,
    AgeStatsTopSpecialties,
    SpecialtyBySexTop5,
    SpecialtyWeekdayTop10,
    TopMunicipalities,
    MeanAgeTopMunicipalities,
    WeekdayTrend,
    MonthTrend,
}

/// The dispatch table: which recipes a page runs, in display order.
pub fn recipes(page: Page) -> &'static [Recipe] {
    match page {
        Page::Home => &[Recipe::Summary, Recipe::SexCounts],
        Page::BySex => &[Recipe::FemaleAgeHistogram, Recipe::MaleAgeHistogram],
        Page::ByAge => &[Recipe::AgeHistogram, Recipe::AgeStatsTopSpecialties],
        Page::Specialties => &[Recipe::SpecialtyBySexTop5, Recipe::SpecialtyWeekdayTop10],
        Page::Municipalities => &[Recipe::TopMunicipalities, Recipe::MeanAgeTopMunicipalities],
        Page::TimeTrends => &[Recipe::WeekdayTrend, Recipe::MonthTrend],
    }
}

#[derive(Debug)]
pub enum AggregateResult {
    Counts(Vec<CategoryCount>),
    Ranked(Vec<CategoryCount>),
    Means(Vec<GroupedMean>),
    Pivot(PivotTable),
    Series(Vec<SeriesPoint>),
    Histogram(Vec<HistogramBin>),
    AgeStats(Vec<AgeStatsGroup>),
    Summary(SummaryStats),
}

#[derive(Debug)]
pub struct Chart {
    pub title: String,
    pub result: AggregateResult,
}

fn sex_of(r: &VisitRecord) -> Option<&str> {
    r.sex.as_deref()
}

fn specialty_of(r: &VisitRecord) -> Option<&str> {
    r.specialty.as_deref()
}

fn municipality_of(r: &VisitRecord) -> Option<&str> {
    Some(r.municipality.as_str())
}

fn weekday_of(r: &VisitRecord) -> Option<&str> {
    Some(weekday_name(r.weekday))
}

/// Run every recipe of a page against the current view.
///
/// `dataset` is the full unfiltered dataset; it only feeds the
/// first-encountered category order used for tie-breaking and column order,
/// so the ranking is stable across filter changes.
pub fn assemble<'a>(
    page: Page,
    dataset: &'a [VisitRecord],
    view: &[&'a VisitRecord],
) -> Vec<Chart> {
    recipes(page)
        .iter()
        .map(|r| run_recipe(*r, dataset, view))
        .collect()
}

fn run_recipe<'a>(recipe: Recipe, dataset: &'a [VisitRecord], view: &[&'a VisitRecord]) -> Chart {
    match recipe {
        Recipe::Summary => Chart {
            title: "Resumo dos Atendimentos".to_string(),
            result: AggregateResult::Summary(aggregate::summary(view)),
        },
        Recipe::SexCounts => Chart {
            title: "Distribuição de Pacientes por Sexo".to_string(),
            result: AggregateResult::Counts(aggregate::category_counts(view, sex_of)),
        },
        Recipe::FemaleAgeHistogram => Chart {
            title: "Idade das Pacientes (Feminino)".to_string(),
            result: AggregateResult::Histogram(aggregate::conditional_age_histogram(
                view,
                sex_of,
                "FEMININO",
                HISTOGRAM_BINS,
            )),
        },
        Recipe::MaleAgeHistogram => Chart {
            title: "Idade dos Pacientes (Masculino)".to_string(),
            result: AggregateResult::Histogram(aggregate::conditional_age_histogram(
                view,
                sex_of,
                "MASCULINO",
                HISTOGRAM_BINS,
            )),
        },
        Recipe::AgeHistogram => Chart {
            title: "Distribuição Geral de Atendimentos por Idade".to_string(),
            result: AggregateResult::Histogram(aggregate::age_histogram(view, HISTOGRAM_BINS)),
        },
        Recipe::AgeStatsTopSpecialties => {
            let order = CategoryOrder::new(dataset, specialty_of);
            let top5: Vec<String> = aggregate::top_n(view, 5, specialty_of, &order)
                .into_iter()
                .map(|c| c.category)
                .collect();
            Chart {
                title: "Idade por Especialidade (Top 5)".to_string(),
                result: AggregateResult::AgeStats(aggregate::grouped_age_stats(
                    view,
                    &top5,
                    specialty_of,
                )),
            }
        }
        Recipe::SpecialtyBySexTop5 => {
            let order = CategoryOrder::new(dataset, specialty_of);
            let top5: Vec<String> = aggregate::top_n(view, 5, specialty_of, &order)
                .into_iter()
                .map(|c| c.category)
                .collect();
            let sexes = observed_in_order(dataset, sex_of);
            Chart {
                title: "Especialidades por Sexo (Top 5)".to_string(),
                result: AggregateResult::Pivot(aggregate::pivot_counts(
                    view,
                    &top5,
                    specialty_of,
                    &sexes,
                    sex_of,
                )),
            }
        }
        Recipe::SpecialtyWeekdayTop10 => {
            let order = CategoryOrder::new(dataset, specialty_of);
            let top10: Vec<String> = aggregate::top_n(view, 10, specialty_of, &order)
                .into_iter()
                .map(|c| c.category)
                .collect();
            let weekdays: Vec<String> = WEEKDAYS
                .iter()
                .map(|d| weekday_name(*d).to_string())
                .collect();
            Chart {
                title: "Volume de Atendimentos por Especialidade e Dia da Semana".to_string(),
                result: AggregateResult::Pivot(aggregate::pivot_counts(
                    view,
                    &top10,
                    specialty_of,
                    &weekdays,
                    weekday_of,
                )),
            }
        }
        Recipe::TopMunicipalities => {
            // The ranking leaves out visits whose municipality is unknown;
            // every other municipality view keeps them.
            let informed: Vec<&VisitRecord> = view
                .iter()
                .copied()
                .filter(|r| r.municipality != NOT_INFORMED)
                .collect();
            let order = CategoryOrder::new(dataset, municipality_of);
            Chart {
                title: "Top 10 Municípios com Mais Atendimentos".to_string(),
                result: AggregateResult::Ranked(aggregate::top_n(
                    &informed,
                    10,
                    municipality_of,
                    &order,
                )),
            }
        }
        Recipe::MeanAgeTopMunicipalities => {
            let order = CategoryOrder::new(dataset, municipality_of);
            let top5: Vec<String> = aggregate::top_n(view, 5, municipality_of, &order)
                .into_iter()
                .map(|c| c.category)
                .collect();
            Chart {
                title: "Idade Média por Município (Top 5)".to_string(),
                result: AggregateResult::Means(aggregate::grouped_mean_age(
                    view,
                    &top5,
                    municipality_of,
                )),
            }
        }
        Recipe::WeekdayTrend => Chart {
            title: "Tendência de Atendimentos na Semana".to_string(),
            result: AggregateResult::Series(aggregate::weekday_series(view)),
        },
        Recipe::MonthTrend => Chart {
            title: "Tendência de Atendimentos por Mês".to_string(),
            result: AggregateResult::Series(aggregate::month_series(view)),
        },
    }
}

/// Distinct values of a dimension in first-encountered dataset order, used
/// for stable pivot column order.
fn observed_in_order<'a, F>(dataset: &'a [VisitRecord], key: F) -> Vec<String>
where
    F: Fn(&'a VisitRecord) -> Option<&'a str>,
{
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for r in dataset {
        if let Some(k) = key(r) {
            if seen.insert(k) {
                out.push(k.to_string());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{apply, FilterSpec};
    use crate::types::sample_visit;

    #[test]
    fn every_page_has_at_least_one_recipe() {
        for page in Page::ALL {
            assert!(!recipes(page).is_empty(), "{} has no recipes", page.title());
        }
    }

    #[test]
    fn filtered_count_by_specialty_end_to_end() {
        // Two visits; filtering to FEMININO keeps exactly the first, and the
        // specialty count over the view is {A: 1}.
        let data = vec![
            sample_visit(Some("FEMININO"), 30, Some("A"), "X", "2023-01-02 10:00"),
            sample_visit(Some("MASCULINO"), 40, Some("B"), "Y", "2023-02-07 10:00"),
        ];
        let mut spec = FilterSpec::all_observed(&data);
        spec.sexes = ["FEMININO".to_string()].into_iter().collect();
        spec.age_range = (0, 100);
        let view = apply(&data, &spec);
        assert_eq!(view.len(), 1);
        let counts = aggregate::category_counts(&view, |r| r.specialty.as_deref());
        assert_eq!(
            counts,
            vec![CategoryCount {
                category: "A".into(),
                count: 1
            }]
        );
    }

    #[test]
    fn municipality_ranking_excludes_the_sentinel() {
        let data = vec![
            sample_visit(Some("FEMININO"), 30, Some("A"), NOT_INFORMED, "2023-01-02 10:00"),
            sample_visit(Some("FEMININO"), 31, Some("A"), NOT_INFORMED, "2023-01-03 10:00"),
            sample_visit(Some("FEMININO"), 32, Some("A"), "CANOAS", "2023-01-04 10:00"),
        ];
        let view: Vec<&VisitRecord> = data.iter().collect();
        let charts = assemble(Page::Municipalities, &data, &view);
        let AggregateResult::Ranked(ranked) = &charts[0].result else {
            panic!("expected ranked municipalities");
        };
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].category, "CANOAS");
        // The mean-age view keeps the sentinel.
        let AggregateResult::Means(means) = &charts[1].result else {
            panic!("expected grouped means");
        };
        assert!(means.iter().any(|m| m.category == NOT_INFORMED));
    }

    #[test]
    fn empty_view_assembles_well_formed_charts_on_every_page() {
        let data = vec![sample_visit(
            Some("FEMININO"),
            30,
            Some("A"),
            "X",
            "2023-01-02 10:00",
        )];
        let empty: Vec<&VisitRecord> = Vec::new();
        for page in Page::ALL {
            let charts = assemble(page, &data, &empty);
            assert_eq!(charts.len(), recipes(page).len());
            for chart in charts {
                match chart.result {
                    AggregateResult::Counts(v) | AggregateResult::Ranked(v) => {
                        assert!(v.is_empty())
                    }
                    AggregateResult::Means(v) => assert!(v.is_empty()),
                    AggregateResult::Pivot(p) => {
                        // Candidate rows come from the empty view, so the
                        // matrix has no rows but keeps its column axis.
                        assert!(p.row_labels.is_empty());
                        assert!(p.cells.is_empty());
                    }
                    AggregateResult::Series(v) => {
                        // Weekday series stays a full zero-filled week; the
                        // month series is simply empty.
                        assert!(v.len() == 7 || v.is_empty());
                        assert!(v.iter().all(|p| p.count == 0));
                    }
                    AggregateResult::Histogram(v) => assert!(v.is_empty()),
                    AggregateResult::AgeStats(v) => assert!(v.is_empty()),
                    AggregateResult::Summary(s) => assert_eq!(s.total_visits, 0),
                }
            }
        }
    }

    #[test]
    fn specialty_pivot_columns_follow_dataset_sex_order() {
        let data = vec![
            sample_visit(Some("MASCULINO"), 40, Some("A"), "X", "2023-01-02 10:00"),
            sample_visit(Some("FEMININO"), 30, Some("A"), "X", "2023-01-03 10:00"),
        ];
        let view: Vec<&VisitRecord> = data.iter().collect();
        let charts = assemble(Page::Specialties, &data, &view);
        let AggregateResult::Pivot(p) = &charts[0].result else {
            panic!("expected pivot");
        };
        assert_eq!(p.col_labels, vec!["MASCULINO", "FEMININO"]);
        assert_eq!(p.cells, vec![vec![1, 1]]);
    }
}
