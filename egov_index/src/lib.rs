mod config;
mod controller;
mod map;

pub mod builder;
pub mod manual;

use log::{debug, info};

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

pub use crate::config::*;
pub use crate::controller::{run_pipeline, Controller};
pub use crate::map::render_map;

/// The records of one index family.
///
/// A dataset is built once (see [`builder::DatasetBuilder`]) and never modified:
/// every transform below produces new values.
#[derive(PartialEq, Debug, Clone)]
pub struct Dataset {
    records: Vec<IndexRecord>,
    // Sorted, without duplicates.
    years: Vec<u32>,
}

impl Dataset {
    pub(crate) fn from_records(records: Vec<IndexRecord>) -> Dataset {
        let years: BTreeSet<u32> = records.iter().map(|r| r.year).collect();
        info!(
            "Dataset: {} records over {} years",
            records.len(),
            years.len()
        );
        Dataset {
            records,
            years: years.into_iter().collect(),
        }
    }

    pub fn records(&self) -> &[IndexRecord] {
        &self.records
    }

    /// The published years, in increasing order.
    pub fn years(&self) -> &[u32] {
        &self.years
    }

    pub fn min_year(&self) -> Option<u32> {
        self.years.first().cloned()
    }

    pub fn max_year(&self) -> Option<u32> {
        self.years.last().cloned()
    }

    pub fn contains_year(&self, year: u32) -> bool {
        self.years.binary_search(&year).is_ok()
    }

    /// The records of the given year, in dataset order.
    pub fn year_slice(&self, year: u32) -> Vec<&IndexRecord> {
        self.records.iter().filter(|r| r.year == year).collect()
    }

    /// All the countries of the dataset, sorted by code.
    ///
    /// When a country changed name over the years, the name of its latest
    /// record is used.
    pub fn regions(&self) -> Vec<(String, String)> {
        let mut latest: BTreeMap<&str, &IndexRecord> = BTreeMap::new();
        for r in self.records.iter() {
            let e = latest.entry(r.country_code.as_str()).or_insert(r);
            if r.year > e.year {
                *e = r;
            }
        }
        latest
            .into_iter()
            .map(|(code, r)| (code.to_string(), r.country_name.clone()))
            .collect()
    }
}

/// Ranks the countries of one year by decreasing score.
///
/// * `rank` is the competition rank with the maximum tie-break: a country gets the
/// number of countries scoring at least as much as itself. Two countries tied for
/// the second place both get rank 3.
/// * `percentile` is the share of countries scoring at most as much as itself,
/// between 0 and 100 and rounded to one decimal.
///
/// Records without a score stay in the slice but are not ranked, and do not count
/// in the percentiles of the others.
pub fn rank(dataset: &Dataset, year: u32) -> Result<RankedSlice, IndexErrors> {
    let slice = dataset.year_slice(year);
    if slice.is_empty() {
        return Err(IndexErrors::EmptyYear { year });
    }

    let mut scores: Vec<f64> = slice.iter().filter_map(|r| r.score).collect();
    scores.sort_by(|a, b| a.total_cmp(b));
    let num_scores = scores.len();
    debug!(
        "rank: year {}: {} records, {} with a score",
        year,
        slice.len(),
        num_scores
    );

    let records: Vec<RankedRecord> = slice
        .into_iter()
        .map(|r| {
            let (rank, percentile) = match r.score {
                Some(s) => {
                    let num_below = scores.partition_point(|x| *x < s);
                    let num_at_most = scores.partition_point(|x| *x <= s);
                    let rank = (num_scores - num_below) as u32;
                    let pct = round_one_decimal(num_at_most as f64 * 100.0 / num_scores as f64);
                    (Some(rank), Some(pct))
                }
                None => (None, None),
            };
            RankedRecord {
                record: r.clone(),
                rank,
                percentile,
            }
        })
        .collect();

    Ok(RankedSlice { year, records })
}

fn round_one_decimal(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Orders the records by rank and keeps the `limit` first ones.
///
/// The unranked records come last. Ties are ordered by country name and then by
/// country code, so that the output does not depend on the dataset order.
pub fn project(
    ranked: &RankedSlice,
    columns: &[ColumnSpec],
    limit: usize,
) -> Result<OrderedTable, IndexErrors> {
    let cols: Vec<Column> = columns
        .iter()
        .map(|c| Column::from_name(&c.column))
        .collect::<Result<Vec<Column>, IndexErrors>>()?;

    let mut sorted: Vec<&RankedRecord> = ranked.records.iter().collect();
    sorted.sort_by(|a, b| compare_for_display(a, b));

    let rows: Vec<Vec<Cell>> = sorted
        .iter()
        .take(limit)
        .map(|rr| cols.iter().map(|c| cell_of(rr, *c)).collect())
        .collect();
    debug!(
        "project: year {}: {} rows out of {}",
        ranked.year,
        rows.len(),
        ranked.len()
    );

    Ok(OrderedTable {
        headers: columns.iter().map(|c| c.label.clone()).collect(),
        rows,
    })
}

fn compare_for_display(a: &RankedRecord, b: &RankedRecord) -> Ordering {
    let by_rank = match (a.rank, b.rank) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_rank
        .then_with(|| a.record.country_name.cmp(&b.record.country_name))
        .then_with(|| a.record.country_code.cmp(&b.record.country_code))
}

fn cell_of(rr: &RankedRecord, column: Column) -> Cell {
    match column {
        Column::Rank => rr.rank.map(Cell::Rank).unwrap_or(Cell::Missing),
        Column::CountryCode => Cell::Text(rr.record.country_code.clone()),
        Column::CountryName => Cell::Text(rr.record.country_name.clone()),
        Column::Year => Cell::Year(rr.record.year),
        Column::Score => rr.record.score.map(Cell::Score).unwrap_or(Cell::Missing),
        Column::Percentile => rr.percentile.map(Cell::Percentile).unwrap_or(Cell::Missing),
    }
}

/// The rank, score and percentile of a country, looked up by name.
pub fn summary_for(ranked: &RankedSlice, country_name: &str) -> Result<CardValue, IndexErrors> {
    let rr = ranked
        .records
        .iter()
        .find(|rr| rr.record.country_name == country_name)
        .ok_or_else(|| IndexErrors::CountryNotFound {
            country: country_name.to_string(),
            year: ranked.year,
        })?;
    match (rr.rank, rr.record.score, rr.percentile) {
        (Some(rank), Some(score), Some(percentile)) => Ok(CardValue {
            rank,
            score,
            percentile,
        }),
        _ => Err(IndexErrors::MissingScore {
            country: country_name.to_string(),
            year: ranked.year,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::builder::DatasetBuilder;
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn abc_dataset() -> Dataset {
        let mut b = DatasetBuilder::new();
        b.add_record("AAA", "A", 2016, Some(0.4)).unwrap();
        b.add_record("BBB", "B", 2016, Some(0.6)).unwrap();
        b.add_record("AAA", "A", 2018, Some(0.9)).unwrap();
        b.add_record("BBB", "B", 2018, Some(0.9)).unwrap();
        b.add_record("CCC", "C", 2018, Some(0.5)).unwrap();
        b.build().unwrap()
    }

    fn get<'a>(rs: &'a RankedSlice, code: &str) -> &'a RankedRecord {
        rs.records
            .iter()
            .find(|rr| rr.record.country_code == code)
            .unwrap()
    }

    #[test]
    fn years_are_sorted_and_distinct() {
        let mut b = DatasetBuilder::new();
        b.add_record("AAA", "A", 2020, Some(0.1)).unwrap();
        b.add_record("AAA", "A", 2003, Some(0.1)).unwrap();
        b.add_record("BBB", "B", 2020, Some(0.1)).unwrap();
        let d = b.build().unwrap();
        assert_eq!(d.years(), &[2003, 2020]);
        assert_eq!(d.min_year(), Some(2003));
        assert_eq!(d.max_year(), Some(2020));
        assert!(d.contains_year(2003));
        assert!(!d.contains_year(2010));
    }

    #[test]
    fn regions_use_latest_name() {
        let mut b = DatasetBuilder::new();
        b.add_record("CZE", "Czech Republic", 2016, Some(0.6)).unwrap();
        b.add_record("CZE", "Czechia", 2020, Some(0.8)).unwrap();
        b.add_record("AUT", "Austria", 2016, Some(0.7)).unwrap();
        let d = b.build().unwrap();
        assert_eq!(
            d.regions(),
            vec![
                ("AUT".to_string(), "Austria".to_string()),
                ("CZE".to_string(), "Czechia".to_string())
            ]
        );
    }

    #[test]
    fn max_tie_break_scenario() {
        init();
        let rs = rank(&abc_dataset(), 2018).unwrap();
        assert_eq!(rs.len(), 3);
        assert_eq!(get(&rs, "AAA").rank, Some(2));
        assert_eq!(get(&rs, "BBB").rank, Some(2));
        assert_eq!(get(&rs, "CCC").rank, Some(3));
        assert_eq!(get(&rs, "AAA").percentile, Some(100.0));
        assert_eq!(get(&rs, "BBB").percentile, Some(100.0));
        assert_eq!(get(&rs, "CCC").percentile, Some(33.3));
    }

    #[test]
    fn ranks_stay_in_bounds() {
        init();
        let mut b = DatasetBuilder::new();
        let scores = [0.3, 0.1, 0.3, 0.9, 0.0, 0.3, 0.5];
        for (i, s) in scores.iter().enumerate() {
            b.add_record(&format!("C{}", i), &format!("Country {}", i), 2020, Some(*s))
                .unwrap();
        }
        let rs = rank(&b.build().unwrap(), 2020).unwrap();
        assert_eq!(rs.len(), scores.len());
        for rr in rs.records.iter() {
            let r = rr.rank.unwrap();
            assert!(r >= 1 && r as usize <= scores.len());
            let p = rr.percentile.unwrap();
            assert!((0.0..=100.0).contains(&p));
        }
        // The three tied countries share rank and percentile.
        let tied: Vec<&RankedRecord> = rs
            .records
            .iter()
            .filter(|rr| rr.record.score == Some(0.3))
            .collect();
        assert_eq!(tied.len(), 3);
        assert!(tied.iter().all(|rr| rr.rank == Some(5)));
        assert!(tied.iter().all(|rr| rr.percentile == Some(71.4)));
        assert_eq!(get(&rs, "C3").rank, Some(1));
        assert_eq!(get(&rs, "C4").rank, Some(7));
        assert_eq!(get(&rs, "C4").percentile, Some(14.3));
    }

    #[test]
    fn unscored_records_are_not_ranked() {
        let mut b = DatasetBuilder::new();
        b.add_record("AAA", "A", 2018, Some(0.9)).unwrap();
        b.add_record("BBB", "B", 2018, None).unwrap();
        b.add_record("CCC", "C", 2018, Some(0.0)).unwrap();
        let rs = rank(&b.build().unwrap(), 2018).unwrap();
        assert_eq!(rs.len(), 3);
        assert_eq!(get(&rs, "BBB").rank, None);
        assert_eq!(get(&rs, "BBB").percentile, None);
        assert_eq!(get(&rs, "CCC").rank, Some(2));
        assert_eq!(get(&rs, "CCC").percentile, Some(50.0));
    }

    #[test]
    fn empty_year_is_an_error() {
        assert_eq!(
            rank(&abc_dataset(), 2017),
            Err(IndexErrors::EmptyYear { year: 2017 })
        );
    }

    #[test]
    fn project_orders_by_rank_and_limits() {
        let rs = rank(&abc_dataset(), 2018).unwrap();
        let cols = vec![
            ColumnSpec::new("rank", "Pořadí"),
            ColumnSpec::new("country_name", "Země"),
            ColumnSpec::new("percentile", "Percentil"),
        ];
        let t = project(&rs, &cols, 2).unwrap();
        assert_eq!(t.headers, vec!["Pořadí", "Země", "Percentil"]);
        assert_eq!(
            t.rows,
            vec![
                vec![
                    Cell::Rank(2),
                    Cell::Text("A".to_string()),
                    Cell::Percentile(100.0)
                ],
                vec![
                    Cell::Rank(2),
                    Cell::Text("B".to_string()),
                    Cell::Percentile(100.0)
                ],
            ]
        );
        let all = project(&rs, &cols, 15).unwrap();
        assert_eq!(all.rows.len(), 3);
        assert_eq!(all.rows[2][0], Cell::Rank(3));
    }

    #[test]
    fn project_puts_unranked_last() {
        let mut b = DatasetBuilder::new();
        b.add_record("AAA", "A", 2018, None).unwrap();
        b.add_record("BBB", "B", 2018, Some(0.2)).unwrap();
        let rs = rank(&b.build().unwrap(), 2018).unwrap();
        let t = project(
            &rs,
            &[
                ColumnSpec::new("country_code", "code"),
                ColumnSpec::new("score", "score"),
                ColumnSpec::new("year", "year"),
            ],
            10,
        )
        .unwrap();
        assert_eq!(
            t.rows,
            vec![
                vec![
                    Cell::Text("BBB".to_string()),
                    Cell::Score(0.2),
                    Cell::Year(2018)
                ],
                vec![Cell::Text("AAA".to_string()), Cell::Missing, Cell::Year(2018)],
            ]
        );
    }

    #[test]
    fn project_rejects_unknown_column() {
        let rs = rank(&abc_dataset(), 2018).unwrap();
        assert_eq!(
            project(&rs, &[ColumnSpec::new("log_score", "log")], 5),
            Err(IndexErrors::UnknownColumn {
                name: "log_score".to_string()
            })
        );
    }

    #[test]
    fn summary_lookup() {
        let d = abc_dataset();
        let rs = rank(&d, 2018).unwrap();
        assert_eq!(
            summary_for(&rs, "C"),
            Ok(CardValue {
                rank: 3,
                score: 0.5,
                percentile: 33.3
            })
        );
        // C only appears from 2018 on.
        let rs2016 = rank(&d, 2016).unwrap();
        assert_eq!(
            summary_for(&rs2016, "C"),
            Err(IndexErrors::CountryNotFound {
                country: "C".to_string(),
                year: 2016
            })
        );
    }
}
