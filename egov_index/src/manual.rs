/*!

This is the long-form manual for `egov_index` and `egovdash`.

## Pipeline

Every index family (for example the UN e-Government Development Index and the
EU eGovernment Benchmark) goes through the same steps each time a year is selected:

1. the records of the year are extracted from the dataset (`Dataset::year_slice`);
2. they are ranked (`rank`);
3. the best ones are projected into a table (`project`) and the reference countries
   are looked up (`summary_for`);
4. in parallel, the map of the year is built from the full dataset (`render_map`).

`run_pipeline` chains these steps and `Controller` keeps the result for the selected
year.

## Ranking

Countries are ranked by decreasing score. When several countries share a score, they
all get the largest rank number that a strict ordering would have assigned to them:

| country | score | rank | percentile |
|---------|-------|------|------------|
| A       | 0.9   | 2    | 100.0      |
| B       | 0.9   | 2    | 100.0      |
| C       | 0.5   | 3    | 33.3       |

The percentile is the share of the ranked countries that score at most as much as the
country, rounded to one decimal. Countries listed without a score are neither ranked
nor counted.

## Maps

The color domain of a map is set once per index family (`MapSettings::domain`) so that
colors can be compared from one year to the next. Countries that have no score in the
selected year are drawn as "no data", which is different from a score of zero.

## Configuration file

`egovdash` reads a JSON file. File paths are relative to the directory of the
configuration file.

```json
{
  "outputSettings": { "dashboardTitle": "eGovernment benchmark" },
  "indexFamilies": [
    {
      "name": "un",
      "title": "UN eGovernment index",
      "source": {
        "provider": "csv",
        "filePath": "eGov-t4.csv",
        "countryCodeColumn": "Code",
        "countryNameColumn": "Czech name",
        "yearColumn": "Year",
        "scoreColumn": "UN eGov index"
      },
      "map": { "scope": "world", "zmin": 0.0, "zmax": 1.0 },
      "table": {
        "limit": 15,
        "title": "TOP 15 in {year}",
        "columns": [
          { "column": "rank", "label": "Rank" },
          { "column": "country_name", "label": "Country" },
          { "column": "score", "label": "Index" },
          { "column": "percentile", "label": "Percentile" }
        ]
      },
      "referenceCountries": ["Česká republika"],
      "scoreDecimals": 3
    }
  ]
}
```

### Providers

* `csv` Comma Separated Values with a header row. The `delimiter` option changes the separator.
* `xlsx` Excel workbook. The first worksheet is read unless `excelWorksheetName` is given.

Empty cells and the `..` marker in the score column are read as missing scores.

### Columns

The table columns can be picked among `rank`, `country_code`, `country_name`, `year`,
`score` and `percentile`. Any other name is rejected at startup.

## Events

With `--interactive`, `egovdash` reads one event per line on the standard input:

```text
un 2016
eu 2019
```

and answers with one JSON bundle per line.

*/
