// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// One row of an index series.
///
/// A missing `score` means the index was not published for this country
/// that year. It is kept in the dataset and shown as "no data".
#[derive(PartialEq, Debug, Clone)]
pub struct IndexRecord {
    pub country_code: String,
    pub country_name: String,
    pub year: u32,
    pub score: Option<f64>,
}

// ******** Output data structures *********

/// A record of a year slice, with its rank and percentile.
///
/// Both are `None` when the record has no score.
#[derive(PartialEq, Debug, Clone)]
pub struct RankedRecord {
    pub record: IndexRecord,
    pub rank: Option<u32>,
    pub percentile: Option<f64>,
}

/// All the records of one year, in dataset order, augmented with ranks.
#[derive(PartialEq, Debug, Clone)]
pub struct RankedSlice {
    pub year: u32,
    pub records: Vec<RankedRecord>,
}

impl RankedSlice {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// The columns that can be projected out of a ranked slice.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Column {
    Rank,
    CountryCode,
    CountryName,
    Year,
    Score,
    Percentile,
}

impl Column {
    pub fn from_name(name: &str) -> Result<Column, IndexErrors> {
        match name {
            "rank" => Ok(Column::Rank),
            "country_code" => Ok(Column::CountryCode),
            "country_name" => Ok(Column::CountryName),
            "year" => Ok(Column::Year),
            "score" => Ok(Column::Score),
            "percentile" => Ok(Column::Percentile),
            x => Err(IndexErrors::UnknownColumn {
                name: x.to_string(),
            }),
        }
    }
}

/// A column to display, under a new label.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ColumnSpec {
    pub column: String,
    pub label: String,
}

impl ColumnSpec {
    pub fn new(column: &str, label: &str) -> ColumnSpec {
        ColumnSpec {
            column: column.to_string(),
            label: label.to_string(),
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub enum Cell {
    Rank(u32),
    Year(u32),
    Score(f64),
    Percentile(f64),
    Text(String),
    Missing,
}

/// The rows handed to the UI, already ordered and relabeled.
#[derive(PartialEq, Debug, Clone)]
pub struct OrderedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct CardValue {
    pub rank: u32,
    pub score: f64,
    pub percentile: f64,
}

/// The statistics of a reference country for the selected year.
#[derive(PartialEq, Debug, Clone)]
pub enum SummaryCard {
    Available { country: String, value: CardValue },
    Unavailable { country: String, reason: IndexErrors },
}

impl SummaryCard {
    pub fn country(&self) -> &str {
        match self {
            SummaryCard::Available { country, .. } => country,
            SummaryCard::Unavailable { country, .. } => country,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum GeoScope {
    World,
    Europe,
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub struct ColorDomain {
    pub zmin: f64,
    pub zmax: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub enum RegionValue {
    Score(f64),
    NoData,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Region {
    pub country_code: String,
    pub country_name: String,
    pub value: RegionValue,
}

/// A render-ready choropleth description.
///
/// `regions` holds every country of the dataset, sorted by country code, so
/// that the drawn set does not change between years.
#[derive(PartialEq, Debug, Clone)]
pub struct MapFigure {
    pub year: u32,
    pub regions: Vec<Region>,
    pub domain: ColorDomain,
    pub scope: GeoScope,
    pub title: String,
    pub colorbar_title: String,
    pub annotation: Option<String>,
}

/// Everything the UI needs after a year selection.
///
/// `errors` lists the problems met while computing it. The bundle is still
/// complete: missing parts are explicit (`table` is `None`, cards are
/// unavailable, regions have no data).
#[derive(PartialEq, Debug, Clone)]
pub struct Bundle {
    pub year: u32,
    pub map: MapFigure,
    pub table_title: String,
    pub table: Option<OrderedTable>,
    pub summaries: Vec<SummaryCard>,
    pub errors: Vec<IndexErrors>,
}

/// Errors raised by the pipeline.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum IndexErrors {
    /// The dataset does not contain any record.
    EmptyDataset,
    DuplicateRecord { country_code: String, year: u32 },
    /// A score is negative, infinite or NaN.
    InvalidScore { country_code: String, year: u32 },
    EmptyYear { year: u32 },
    /// The year is not one of the published years of the dataset.
    UnknownYear { year: u32 },
    UnknownColumn { name: String },
    CountryNotFound { country: String, year: u32 },
    /// The country is listed for this year but without a score.
    MissingScore { country: String, year: u32 },
    InvalidDomain,
    InvalidLimit,
}

impl Error for IndexErrors {}

impl Display for IndexErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexErrors::EmptyDataset => write!(f, "the dataset is empty"),
            IndexErrors::DuplicateRecord { country_code, year } => {
                write!(f, "duplicate record for {} in {}", country_code, year)
            }
            IndexErrors::InvalidScore { country_code, year } => {
                write!(f, "invalid score for {} in {}", country_code, year)
            }
            IndexErrors::EmptyYear { year } => write!(f, "no data for year {}", year),
            IndexErrors::UnknownYear { year } => write!(f, "year {} is not available", year),
            IndexErrors::UnknownColumn { name } => write!(f, "unknown column {:?}", name),
            IndexErrors::CountryNotFound { country, year } => {
                write!(f, "{} is not ranked in {}", country, year)
            }
            IndexErrors::MissingScore { country, year } => {
                write!(f, "{} has no score in {}", country, year)
            }
            IndexErrors::InvalidDomain => write!(f, "the color domain must satisfy zmin < zmax"),
            IndexErrors::InvalidLimit => write!(f, "the table limit must be positive"),
        }
    }
}

// ********* Configuration **********

/// The colors of the scale, from the lowest to the highest value.
///
/// The scale is reversed when drawn: the best scores get the first color.
pub const DEFAULT_COLORSCALE: [(f64, &str); 4] = [
    (0.0, "rgb(0,150,50)"),
    (0.3, "rgb(250,240,110)"),
    (0.6, "rgb(180,60,50)"),
    (1.0, "rgb(80,20,80)"),
];

#[derive(PartialEq, Debug, Clone)]
pub struct MapSettings {
    pub scope: GeoScope,
    pub domain: ColorDomain,
    /// Title template, `{year}` is replaced by the selected year.
    pub title: String,
    pub colorbar_title: String,
    pub annotation: Option<String>,
}

impl MapSettings {
    pub fn new(scope: GeoScope, zmin: f64, zmax: f64) -> MapSettings {
        MapSettings {
            scope,
            domain: ColorDomain { zmin, zmax },
            title: "{year} eGovernment index".to_string(),
            colorbar_title: "{year} index value".to_string(),
            annotation: None,
        }
    }
}

/// How one index family turns a year into a bundle.
#[derive(PartialEq, Debug, Clone)]
pub struct PipelineRules {
    pub table_columns: Vec<ColumnSpec>,
    pub table_limit: usize,
    /// Table title template, `{year}` is replaced by the selected year.
    pub table_title: String,
    pub reference_countries: Vec<String>,
    pub map: MapSettings,
}

impl PipelineRules {
    pub fn new(map: MapSettings) -> PipelineRules {
        PipelineRules {
            table_columns: vec![
                ColumnSpec::new("rank", "rank"),
                ColumnSpec::new("country_name", "country"),
                ColumnSpec::new("score", "score"),
                ColumnSpec::new("percentile", "percentile"),
            ],
            table_limit: 15,
            table_title: "Top 15 in {year}".to_string(),
            reference_countries: Vec::new(),
            map,
        }
    }

    /// Checks the parts of the rules that cannot change between years.
    pub fn validate(&self) -> Result<(), IndexErrors> {
        for c in self.table_columns.iter() {
            Column::from_name(&c.column)?;
        }
        if self.table_limit == 0 {
            return Err(IndexErrors::InvalidLimit);
        }
        let d = self.map.domain;
        if !(d.zmin.is_finite() && d.zmax.is_finite() && d.zmin < d.zmax) {
            return Err(IndexErrors::InvalidDomain);
        }
        Ok(())
    }
}

pub(crate) fn fill_year(template: &str, year: u32) -> String {
    template.replace("{year}", year.to_string().as_str())
}
