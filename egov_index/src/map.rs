use log::debug;

use std::collections::HashMap;

use crate::config::*;
use crate::Dataset;

/// Builds the choropleth of one year.
///
/// Every country of the dataset is drawn. Countries without a record or without a
/// score that year are marked as `NoData`, never as zero. The color domain comes
/// from the settings and does not depend on the values of the year.
pub fn render_map(dataset: &Dataset, year: u32, settings: &MapSettings) -> MapFigure {
    let scores: HashMap<&str, Option<f64>> = dataset
        .records()
        .iter()
        .filter(|r| r.year == year)
        .map(|r| (r.country_code.as_str(), r.score))
        .collect();

    let regions: Vec<Region> = dataset
        .regions()
        .into_iter()
        .map(|(country_code, country_name)| {
            let value = match scores.get(country_code.as_str()) {
                Some(Some(s)) => RegionValue::Score(*s),
                _ => RegionValue::NoData,
            };
            Region {
                country_code,
                country_name,
                value,
            }
        })
        .collect();

    debug!(
        "render_map: year {}: {} regions, {} with data",
        year,
        regions.len(),
        regions
            .iter()
            .filter(|r| matches!(r.value, RegionValue::Score(_)))
            .count()
    );

    MapFigure {
        year,
        regions,
        domain: settings.domain,
        scope: settings.scope,
        title: fill_year(&settings.title, year),
        colorbar_title: fill_year(&settings.colorbar_title, year),
        annotation: settings.annotation.clone(),
    }
}
