use log::{debug, info, warn};

use crate::config::*;
use crate::map::render_map;
use crate::{project, rank, summary_for, Dataset};

/// Runs the whole pipeline for one year.
///
/// This never fails: a year without records gives a bundle with no table, no-data
/// regions and unavailable cards, and the cause is listed in `errors`. A country
/// missing from the year gives an unavailable card.
///
/// The rules are expected to be valid (see [`PipelineRules::validate`]).
pub fn run_pipeline(dataset: &Dataset, rules: &PipelineRules, year: u32) -> Bundle {
    let map = render_map(dataset, year, &rules.map);
    let table_title = fill_year(&rules.table_title, year);
    let mut errors: Vec<IndexErrors> = Vec::new();

    let (table, summaries) = match rank(dataset, year) {
        Ok(ranked) => {
            let table = match project(&ranked, &rules.table_columns, rules.table_limit) {
                Ok(t) => Some(t),
                Err(e) => {
                    errors.push(e);
                    None
                }
            };
            let summaries: Vec<SummaryCard> = rules
                .reference_countries
                .iter()
                .map(|country| match summary_for(&ranked, country) {
                    Ok(value) => SummaryCard::Available {
                        country: country.clone(),
                        value,
                    },
                    Err(reason) => {
                        errors.push(reason.clone());
                        SummaryCard::Unavailable {
                            country: country.clone(),
                            reason,
                        }
                    }
                })
                .collect();
            (table, summaries)
        }
        Err(e) => {
            let summaries: Vec<SummaryCard> = rules
                .reference_countries
                .iter()
                .map(|country| SummaryCard::Unavailable {
                    country: country.clone(),
                    reason: e.clone(),
                })
                .collect();
            errors.push(e);
            (None, summaries)
        }
    };

    if !errors.is_empty() {
        warn!("run_pipeline: year {}: degraded bundle: {:?}", year, errors);
    }

    Bundle {
        year,
        map,
        table_title,
        table,
        summaries,
        errors,
    }
}

/// Holds the selected year of one index family and the bundle computed for it.
///
/// The controller borrows its dataset: several controllers can share read access to
/// datasets, and can be driven from different threads.
///
/// ```
/// # use egov_index::builder::DatasetBuilder;
/// # use egov_index::*;
/// let mut builder = DatasetBuilder::new();
/// builder.add_record("CZE", "Czech Republic", 2016, Some(0.6454))?;
/// builder.add_record("CZE", "Czech Republic", 2018, Some(0.7084))?;
/// let dataset = builder.build()?;
///
/// let mut rules = PipelineRules::new(MapSettings::new(GeoScope::World, 0.0, 1.0));
/// rules.reference_countries = vec!["Czech Republic".to_string()];
///
/// let mut controller = Controller::new(&dataset, rules)?;
/// assert_eq!(controller.selected_year(), 2018);
///
/// let bundle = controller.select_year(2016)?;
/// assert_eq!(bundle.table_title, "Top 15 in 2016");
/// # Ok::<(), IndexErrors>(())
/// ```
#[derive(Debug, Clone)]
pub struct Controller<'a> {
    dataset: &'a Dataset,
    rules: PipelineRules,
    selected_year: u32,
    bundle: Bundle,
}

impl<'a> Controller<'a> {
    /// Validates the rules and computes the bundle of the latest year.
    pub fn new(dataset: &'a Dataset, rules: PipelineRules) -> Result<Controller<'a>, IndexErrors> {
        rules.validate()?;
        let year = dataset.max_year().ok_or(IndexErrors::EmptyDataset)?;
        info!(
            "Controller: years {:?}, starting at {}",
            dataset.years(),
            year
        );
        let bundle = run_pipeline(dataset, &rules, year);
        Ok(Controller {
            dataset,
            rules,
            selected_year: year,
            bundle,
        })
    }

    pub fn selected_year(&self) -> u32 {
        self.selected_year
    }

    /// The bundle of the selected year.
    pub fn bundle(&self) -> &Bundle {
        &self.bundle
    }

    pub fn years(&self) -> &[u32] {
        self.dataset.years()
    }

    pub fn rules(&self) -> &PipelineRules {
        &self.rules
    }

    /// Handles a "year changed" event.
    ///
    /// The new bundle is fully computed before it replaces the current one. A year
    /// that the dataset does not publish is rejected and the state is left untouched.
    pub fn select_year(&mut self, year: u32) -> Result<&Bundle, IndexErrors> {
        if !self.dataset.contains_year(year) {
            warn!("select_year: rejecting unknown year {}", year);
            return Err(IndexErrors::UnknownYear { year });
        }
        debug!("select_year: {} -> {}", self.selected_year, year);
        let bundle = run_pipeline(self.dataset, &self.rules, year);
        self.selected_year = year;
        self.bundle = bundle;
        Ok(&self.bundle)
    }
}
