use log::{debug, info, warn};

use egov_index::builder::DatasetBuilder;
use egov_index::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::thread;

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_xlsx;

use crate::dash::config_reader::*;
use crate::dash::io_common::simplify_file_name;

#[derive(Debug, Snafu)]
pub enum DashError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing to {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error reading the events"))]
    ReadingEvents { source: std::io::Error },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error parsing a line of {path}"))]
    CsvLineParse { source: csv::Error, path: String },
    #[snafu(display("Error opening Excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The Excel file {path} has no data"))]
    EmptyExcel { path: String },
    #[snafu(display("The Excel file {path} has no worksheet named {name:?}"))]
    MissingWorksheet { path: String, name: String },
    #[snafu(display("Unexpected cell at line {lineno}: {content}"))]
    ExcelWrongCellType { lineno: u64, content: String },
    #[snafu(display("Column {column:?} is missing from the header of {path}"))]
    MissingColumn { path: String, column: String },
    #[snafu(display("Line {lineno} of {path} is too short"))]
    LineTooShort { path: String, lineno: usize },
    #[snafu(display("Invalid {column} at line {lineno} of {path}: {content:?}"))]
    InvalidCell {
        path: String,
        lineno: usize,
        column: String,
        content: String,
    },
    #[snafu(display("Invalid dataset {path}: {source}"))]
    InvalidDataset { source: IndexErrors, path: String },
    #[snafu(display("Invalid settings for index family {family}: {source}"))]
    InvalidRules { source: IndexErrors, family: String },
    #[snafu(display("Index family {family}: {source}"))]
    Pipeline { source: IndexErrors, family: String },
    #[snafu(display("Unknown index family {name:?}"))]
    UnknownFamily { name: String },
    #[snafu(display("Could not understand event {line:?}, expected '<family> <year>'"))]
    InvalidEvent { line: String },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type DashResult<T> = Result<T, DashError>;

/// A row, as parsed by the readers.
/// This is before checking the dataset invariants.
#[derive(PartialEq, Debug, Clone)]
pub struct ParsedRecord {
    pub lineno: usize,
    pub country_code: String,
    pub country_name: String,
    pub year: u32,
    pub score: Option<f64>,
}

/// An index family, with its validated rules and its data.
#[derive(Debug, Clone)]
pub struct LoadedFamily {
    pub config: IndexFamilyConfig,
    pub rules: PipelineRules,
    pub dataset: Dataset,
}

/// The immutable state of the dashboard, built once at startup.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub config: DashConfig,
    pub families: Vec<LoadedFamily>,
}

impl Dashboard {
    /// Builds one controller per family. The initial bundles are computed in parallel.
    pub fn controllers(&self) -> DashResult<Vec<Controller<'_>>> {
        let results: Vec<(String, thread::Result<Result<Controller<'_>, IndexErrors>>)> =
            thread::scope(|s| {
                let handles: Vec<_> = self
                    .families
                    .iter()
                    .map(|f| {
                        let h = s.spawn(move || Controller::new(&f.dataset, f.rules.clone()));
                        (f.config.name.clone(), h)
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|(name, h)| (name, h.join()))
                    .collect()
            });

        let mut res: Vec<Controller<'_>> = Vec::new();
        for (family, r) in results {
            match r {
                Ok(c) => res.push(c.context(InvalidRulesSnafu { family })?),
                Err(_) => whatever!("The initial computation of {} panicked", family),
            }
        }
        Ok(res)
    }

    fn family_index(&self, name: &str) -> DashResult<usize> {
        self.families
            .iter()
            .position(|f| f.config.name == name)
            .context(UnknownFamilySnafu { name })
    }
}

fn read_source(root_path: &Path, source: &FileSource) -> DashResult<Dataset> {
    let p: PathBuf = root_path.join(&source.file_path);
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read index file {:?}", p2);
    let parsed_records = match source.provider.as_str() {
        "csv" => io_csv::read_csv_records(p2.clone(), source),
        "xlsx" => io_xlsx::read_excel_records(p2.clone(), source),
        x => whatever!("Provider not implemented {:?}", x),
    }?;
    validate_records(&p2, parsed_records)
}

fn validate_records(path: &str, parsed_records: Vec<ParsedRecord>) -> DashResult<Dataset> {
    let mut builder = DatasetBuilder::new();
    for pr in parsed_records {
        debug!("validate_records: {} line {}: {:?}", path, pr.lineno, pr);
        builder
            .add_record_2(IndexRecord {
                country_code: pr.country_code,
                country_name: pr.country_name,
                year: pr.year,
                score: pr.score,
            })
            .context(InvalidDatasetSnafu { path })?;
    }
    builder.build().context(InvalidDatasetSnafu { path })
}

/// Reads the configuration and all the datasets it refers to.
///
/// Any problem with the sources is fatal: the dashboard does not start with
/// partial data.
pub fn load_dashboard(config_path: &str) -> DashResult<Dashboard> {
    let config = read_config(config_path)?;
    info!("config: {:?}", config);
    let root_p = Path::new(config_path)
        .parent()
        .context(MissingParentDirSnafu {})?;

    if config.index_families.is_empty() {
        whatever!("No index family in {}", config_path)
    }

    let mut families: Vec<LoadedFamily> = Vec::new();
    for fam in config.index_families.iter() {
        if families.iter().any(|f| f.config.name == fam.name) {
            whatever!("Index family {:?} is declared twice", fam.name)
        }
        let rules = validate_rules(fam)?;
        let dataset = read_source(root_p, &fam.source)?;
        info!(
            "Index family {}: {} records, years {:?}",
            fam.name,
            dataset.records().len(),
            dataset.years()
        );
        families.push(LoadedFamily {
            config: fam.clone(),
            rules,
            dataset,
        });
    }

    Ok(Dashboard { config, families })
}

fn format_percentile(p: f64) -> String {
    format!("{:.1}%", p)
}

fn round_score(score: f64, decimals: u32) -> f64 {
    let f = 10f64.powi(decimals as i32);
    (score * f).round() / f
}

fn cell_to_json(cell: &Cell) -> JSValue {
    match cell {
        Cell::Rank(r) => json!(r),
        Cell::Year(y) => json!(y),
        Cell::Score(s) => json!(s),
        Cell::Percentile(p) => json!(format_percentile(*p)),
        Cell::Text(t) => json!(t),
        Cell::Missing => JSValue::Null,
    }
}

fn table_to_json(title: &str, table: &Option<OrderedTable>) -> JSValue {
    match table {
        Some(t) => {
            let rows: Vec<JSValue> = t
                .rows
                .iter()
                .map(|row| JSValue::Array(row.iter().map(cell_to_json).collect()))
                .collect();
            json!({"title": title, "available": true, "columns": t.headers, "rows": rows})
        }
        None => json!({"title": title, "available": false, "columns": [], "rows": []}),
    }
}

fn summary_to_json(card: &SummaryCard, score_decimals: u32) -> JSValue {
    match card {
        SummaryCard::Available { country, value } => json!({
            "country": country,
            "available": true,
            "rank": value.rank,
            "score": round_score(value.score, score_decimals),
            "percentile": format_percentile(value.percentile),
        }),
        SummaryCard::Unavailable { country, reason } => json!({
            "country": country,
            "available": false,
            "reason": reason.to_string(),
        }),
    }
}

/// The map in the format of a plotly choropleth figure.
///
/// Regions without data get a `null` value, which plotly leaves uncolored.
fn map_to_json(m: &MapFigure, height: u32) -> JSValue {
    let locations: Vec<&str> = m.regions.iter().map(|r| r.country_code.as_str()).collect();
    let z: Vec<JSValue> = m
        .regions
        .iter()
        .map(|r| match r.value {
            RegionValue::Score(s) => json!(s),
            RegionValue::NoData => JSValue::Null,
        })
        .collect();
    let text: Vec<&str> = m.regions.iter().map(|r| r.country_name.as_str()).collect();
    let colorscale: Vec<JSValue> = DEFAULT_COLORSCALE
        .iter()
        .map(|(stop, color)| json!([stop, color]))
        .collect();

    let mut geo: JSMap<String, JSValue> = JSMap::new();
    geo.insert("showframe".to_string(), json!(false));
    geo.insert("showcoastlines".to_string(), json!(false));
    geo.insert(
        "projection".to_string(),
        json!({"type": "equirectangular"}),
    );
    geo.insert("resolution".to_string(), json!(50));

    let mut layout: JSMap<String, JSValue> = JSMap::new();
    match m.scope {
        GeoScope::World => {
            geo.insert("scope".to_string(), json!("world"));
        }
        GeoScope::Europe => {
            geo.insert("scope".to_string(), json!("europe"));
            geo.insert("fitbounds".to_string(), json!("locations"));
            geo.insert("visible".to_string(), json!(true));
            layout.insert("margin".to_string(), json!({"r": 0, "t": 0, "l": 0, "b": 0}));
        }
    }

    let annotations: Vec<JSValue> = m
        .annotation
        .iter()
        .map(|text| {
            json!({
                "x": 0.59,
                "y": 0.01,
                "xref": "paper",
                "yref": "paper",
                "text": text,
                "showarrow": false
            })
        })
        .collect();

    layout.insert("height".to_string(), json!(height));
    layout.insert("title".to_string(), json!({ "text": m.title }));
    layout.insert("geo".to_string(), JSValue::Object(geo));
    layout.insert("annotations".to_string(), JSValue::Array(annotations));

    json!({
        "data": [{
            "type": "choropleth",
            "locations": locations,
            "z": z,
            "text": text,
            "colorscale": colorscale,
            "zmin": m.domain.zmin,
            "zmax": m.domain.zmax,
            "autocolorscale": false,
            "reversescale": true,
            "marker": {"line": {"color": "darkgray", "width": 0.5}},
            "colorbar": {"title": {"text": m.colorbar_title}, "tickprefix": ""}
        }],
        "layout": layout
    })
}

fn slider_to_json(years: &[u32], selected_year: u32, first_year_label: &str) -> JSValue {
    let mut marks: JSMap<String, JSValue> = JSMap::new();
    for (idx, year) in years.iter().enumerate() {
        let label = if idx == 0 {
            first_year_label.replace("{year}", year.to_string().as_str())
        } else {
            year.to_string()
        };
        marks.insert(year.to_string(), json!(label));
    }
    json!({
        "min": years.first(),
        "max": years.last(),
        "value": selected_year,
        "marks": marks
    })
}

/// The JSON bundle of one family, for the currently selected year.
pub fn bundle_to_json(family: &LoadedFamily, controller: &Controller) -> JSValue {
    let c = &family.config;
    let bundle = controller.bundle();
    let summaries: Vec<JSValue> = bundle
        .summaries
        .iter()
        .map(|card| summary_to_json(card, c.score_decimals()))
        .collect();
    let errors: Vec<String> = bundle.errors.iter().map(|e| e.to_string()).collect();
    json!({
        "family": c.name,
        "title": c.title,
        "description": c.description,
        "year": bundle.year,
        "slider": slider_to_json(controller.years(), controller.selected_year(), c.first_year_label()),
        "map": map_to_json(&bundle.map, c.map.height()),
        "table": table_to_json(&bundle.table_title, &bundle.table),
        "summaries": summaries,
        "dataset": simplify_file_name(&c.source.file_path),
        "errors": errors
    })
}

pub fn dashboard_to_json(dashboard: &Dashboard, controllers: &[Controller]) -> JSValue {
    let families: Vec<JSValue> = dashboard
        .families
        .iter()
        .zip(controllers.iter())
        .map(|(f, c)| bundle_to_json(f, c))
        .collect();
    json!({
        "dashboard": {"title": dashboard.config.output_settings.dashboard_title},
        "families": families
    })
}

fn parse_event(line: &str) -> DashResult<(String, u32)> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        [family, year] => {
            let y = year
                .parse::<u32>()
                .ok()
                .context(InvalidEventSnafu { line })?;
            Ok((family.to_string(), y))
        }
        _ => InvalidEventSnafu { line }.fail(),
    }
}

fn handle_event(
    dashboard: &Dashboard,
    controllers: &mut [Controller],
    line: &str,
) -> DashResult<JSValue> {
    let (family, year) = parse_event(line)?;
    let idx = dashboard.family_index(&family)?;
    let controller = &mut controllers[idx];
    controller
        .select_year(year)
        .context(PipelineSnafu { family })?;
    Ok(bundle_to_json(&dashboard.families[idx], controller))
}

/// Reads `<family> <year>` events, one per line, and writes one JSON line per event.
///
/// A rejected event is answered with an error object and leaves the family unchanged.
pub fn run_events<R: BufRead, W: Write>(
    dashboard: &Dashboard,
    controllers: &mut [Controller],
    input: R,
    mut output: W,
) -> DashResult<()> {
    for line_r in input.lines() {
        let line = line_r.context(ReadingEventsSnafu {})?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        debug!("run_events: event {:?}", line);
        let js = match handle_event(dashboard, controllers, line) {
            Ok(js) => js,
            Err(e) => {
                warn!("run_events: rejected event {:?}: {}", line, e);
                json!({"event": line, "error": e.to_string()})
            }
        };
        let s = serde_json::to_string(&js).context(ParsingJsonSnafu {})?;
        writeln!(output, "{}", s).context(WritingOutputSnafu { path: "events" })?;
        output
            .flush()
            .context(WritingOutputSnafu { path: "events" })?;
    }
    Ok(())
}

fn check_reference(summary_path: String, pretty_js_stats: &str) -> DashResult<()> {
    let summary_ref = read_summary(summary_path)?;
    info!("summary: {:?}", summary_ref);
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference string");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        whatever!("Difference detected between calculated summary and reference summary")
    }
    Ok(())
}

pub fn run_dashboard(
    config_path: String,
    check_summary_path: Option<String>,
    out_path: Option<String>,
    interactive: bool,
) -> DashResult<()> {
    let dashboard = load_dashboard(&config_path)?;
    let mut controllers = dashboard.controllers()?;

    // The initial document, as seen before any event.
    let result_js = dashboard_to_json(&dashboard, &controllers);
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;

    match out_path.as_deref() {
        Some("stdout") => println!("{}", pretty_js_stats),
        Some(p) => {
            info!("Writing dashboard to {}", p);
            fs::write(p, pretty_js_stats.as_bytes()).context(WritingOutputSnafu { path: p })?;
        }
        // The standard output carries the answers to the events.
        None if interactive => {}
        None => println!("{}", pretty_js_stats),
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = check_summary_path {
        check_reference(summary_p, &pretty_js_stats)?;
    }

    if interactive {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        run_events(&dashboard, &mut controllers, stdin.lock(), stdout.lock())?;
    }

    Ok(())
}
