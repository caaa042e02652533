use crate::dash::*;

use serde::{Deserialize, Serialize};

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "dashboardTitle")]
    pub dashboard_title: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "countryCodeColumn")]
    pub country_code_column: String,
    #[serde(rename = "countryNameColumn")]
    pub country_name_column: String,
    #[serde(rename = "yearColumn")]
    pub year_column: String,
    #[serde(rename = "scoreColumn")]
    pub score_column: String,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    pub delimiter: Option<String>,
}

impl FileSource {
    pub fn delimiter_byte(&self) -> DashResult<u8> {
        match self.delimiter.as_deref() {
            None => Ok(b','),
            Some("\\t") => Ok(b'\t'),
            Some(d) if d.len() == 1 => Ok(d.as_bytes()[0]),
            Some(d) => whatever!("The delimiter must be a single character, got {:?}", d),
        }
    }
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    pub scope: String,
    pub zmin: f64,
    pub zmax: f64,
    pub title: Option<String>,
    #[serde(rename = "colorbarTitle")]
    pub colorbar_title: Option<String>,
    pub annotation: Option<String>,
    pub height: Option<u32>,
}

impl MapConfig {
    pub fn height(&self) -> u32 {
        self.height.unwrap_or(1000)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct TableColumn {
    pub column: String,
    pub label: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    pub limit: Option<usize>,
    pub title: String,
    pub columns: Vec<TableColumn>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct IndexFamilyConfig {
    pub name: String,
    pub title: String,
    pub description: Option<String>,
    pub source: FileSource,
    pub map: MapConfig,
    pub table: TableConfig,
    #[serde(rename = "referenceCountries", default)]
    pub reference_countries: Vec<String>,
    #[serde(rename = "scoreDecimals")]
    pub _score_decimals: Option<u32>,
    #[serde(rename = "firstYearLabel")]
    pub _first_year_label: Option<String>,
}

impl IndexFamilyConfig {
    pub fn score_decimals(&self) -> u32 {
        self._score_decimals.unwrap_or(3)
    }

    pub fn first_year_label(&self) -> &str {
        self._first_year_label.as_deref().unwrap_or("{year}")
    }
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DashConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "indexFamilies")]
    pub index_families: Vec<IndexFamilyConfig>,
}

pub fn read_config(path: &str) -> DashResult<DashConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: DashConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: String) -> DashResult<JSValue> {
    let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

/// Turns the settings of a family into the rules of its pipeline.
pub fn validate_rules(family: &IndexFamilyConfig) -> DashResult<PipelineRules> {
    let scope = match family.map.scope.as_str() {
        "world" => GeoScope::World,
        "europe" => GeoScope::Europe,
        x => {
            whatever!(
                "Cannot use map scope {:?} for {}: expected world or europe",
                x,
                family.name
            )
        }
    };
    let mut map = MapSettings::new(scope, family.map.zmin, family.map.zmax);
    if let Some(t) = family.map.title.clone() {
        map.title = t;
    }
    if let Some(t) = family.map.colorbar_title.clone() {
        map.colorbar_title = t;
    }
    map.annotation = family.map.annotation.clone();

    let mut rules = PipelineRules::new(map);
    rules.table_columns = family
        .table
        .columns
        .iter()
        .map(|c| ColumnSpec::new(&c.column, &c.label))
        .collect();
    rules.table_limit = family.table.limit.unwrap_or(15);
    rules.table_title = family.table.title.clone();
    rules.reference_countries = family.reference_countries.clone();

    rules.validate().context(InvalidRulesSnafu {
        family: family.name.clone(),
    })?;
    debug!("validate_rules: {}: {:?}", family.name, rules);
    Ok(rules)
}
