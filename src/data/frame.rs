//! Conversion between polars tables and typed records
//!
//! Columns are always resolved by name, so a table whose columns arrive in
//! any order yields the same records.

use super::record::{
    PropertyFeatures, TrainingSet, AMENITIES, BATHROOMS, BEDROOMS, CATEGORICAL_COLUMNS,
    FEATURE_COLUMNS, LOCATION, SIZE_SQFT, TARGET_COLUMN,
};
use crate::error::{EstimatorError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Load a CSV file with a header row
///
/// Categorical columns are always read as text, so labels that look numeric
/// (zip codes, `007`) keep their spelling. Every other column type is inferred
/// from the whole file rather than a prefix of it.
pub fn load_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();

    let header = CsvReadOptions::default()
        .with_has_header(true)
        .with_n_rows(Some(0))
        .into_reader_with_file_handle(File::open(path)?)
        .finish()?;

    let mut overwrite = Schema::default();
    for name in header.get_column_names() {
        if CATEGORICAL_COLUMNS.contains(&name.as_str()) {
            overwrite.with_column(name.clone(), DataType::String);
        }
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .with_schema_overwrite(Some(Arc::new(overwrite)))
        .into_reader_with_file_handle(File::open(path)?)
        .finish()?;

    debug!(path = %path.display(), rows = df.height(), columns = df.width(), "Loaded CSV");
    Ok(df)
}

/// Extract a labelled training set; the table must hold exactly the five
/// feature columns plus the target
pub fn training_set_from_frame(df: &DataFrame) -> Result<TrainingSet> {
    let mut expected: Vec<&str> = FEATURE_COLUMNS.to_vec();
    expected.push(TARGET_COLUMN);
    check_columns(df, &expected)?;

    if df.height() == 0 {
        return Err(EstimatorError::Data("training data has zero rows".to_string()));
    }

    let targets = target_column(df)?;
    let features = rows_from_frame(df)?;
    TrainingSet::new(features, targets)
}

/// Extract prediction inputs; the table must hold exactly the five feature columns
pub fn features_from_frame(df: &DataFrame) -> Result<Vec<PropertyFeatures>> {
    check_columns(df, &FEATURE_COLUMNS)?;
    rows_from_frame(df)
}

fn rows_from_frame(df: &DataFrame) -> Result<Vec<PropertyFeatures>> {
    let locations = categorical_column(df, LOCATION)?;
    let amenities = categorical_column(df, AMENITIES)?;
    let sizes = numeric_column(df, SIZE_SQFT)?;
    let bedrooms = count_column(df, BEDROOMS)?;
    let bathrooms = count_column(df, BATHROOMS)?;

    let rows = locations
        .into_iter()
        .zip(amenities)
        .zip(sizes)
        .zip(bedrooms.into_iter().zip(bathrooms))
        .map(|(((location, amenities), size_sqft), (bedrooms, bathrooms))| PropertyFeatures {
            location,
            size_sqft,
            bedrooms,
            bathrooms,
            amenities,
        })
        .collect();

    Ok(rows)
}

fn check_columns(df: &DataFrame, expected: &[&str]) -> Result<()> {
    let present: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    for name in expected {
        if !present.iter().any(|p| p == name) {
            return Err(EstimatorError::schema(*name, "required column is missing"));
        }
    }
    for name in &present {
        if !expected.contains(&name.as_str()) {
            return Err(EstimatorError::schema(name.clone(), "unexpected column"));
        }
    }
    Ok(())
}

fn series<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map(|c| c.as_materialized_series())
        .map_err(|_| EstimatorError::schema(name, "required column is missing"))
}

/// Missing cells become the empty category
fn categorical_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let casted = series(df, name)?
        .cast(&DataType::String)
        .map_err(|e| EstimatorError::schema(name, format!("cannot be read as a category: {}", e)))?;
    let values = casted.str()?;

    Ok(values
        .into_iter()
        .map(|v| v.unwrap_or_default().to_string())
        .collect())
}

fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let s = series(df, name)?;
    if matches!(s.dtype(), DataType::String) {
        return Err(EstimatorError::schema(name, "expected a numeric column, found text"));
    }

    let casted = s.cast(&DataType::Float64)?;
    let values = casted.f64()?;

    values
        .into_iter()
        .enumerate()
        .map(|(row, v)| match v {
            Some(x) if x.is_finite() => Ok(x),
            _ => Err(EstimatorError::Data(format!(
                "column '{}' has a missing or non-finite value at row {}",
                name, row
            ))),
        })
        .collect()
}

fn count_column(df: &DataFrame, name: &str) -> Result<Vec<u32>> {
    numeric_column(df, name)?
        .into_iter()
        .enumerate()
        .map(|(row, x)| {
            if x < 0.0 || x.fract() != 0.0 || x > u32::MAX as f64 {
                Err(EstimatorError::Data(format!(
                    "column '{}' must hold non-negative whole numbers, got {} at row {}",
                    name, x, row
                )))
            } else {
                Ok(x as u32)
            }
        })
        .collect()
}

fn target_column(df: &DataFrame) -> Result<Vec<f64>> {
    let s = series(df, TARGET_COLUMN)?;
    if matches!(s.dtype(), DataType::String) {
        return Err(EstimatorError::Data(format!(
            "target column '{}' contains non-numeric values",
            TARGET_COLUMN
        )));
    }
    numeric_column(df, TARGET_COLUMN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn training_frame() -> DataFrame {
        df!(
            "location" => &["X", "Y"],
            "size_sqft" => &[1000.0, 1500.0],
            "bedrooms" => &[2i64, 3],
            "bathrooms" => &[1i64, 2],
            "amenities" => &["pool", "none"],
            "price" => &[200_000.0, 300_000.0]
        )
        .unwrap()
    }

    #[test]
    fn test_training_set_from_frame() {
        let set = training_set_from_frame(&training_frame()).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.features[0], PropertyFeatures::new("X", 1000.0, 2, 1, "pool"));
        assert_eq!(set.targets[1], 300_000.0);
    }

    #[test]
    fn test_missing_target_is_schema_error() {
        let df = training_frame().drop("price").unwrap();
        let err = training_set_from_frame(&df).unwrap_err();
        match err {
            EstimatorError::Schema { column, .. } => assert_eq!(column, "price"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_extra_column_is_schema_error() {
        let mut df = training_frame();
        df.with_column(Series::new("garage".into(), &[1i64, 0])).unwrap();
        let err = training_set_from_frame(&df).unwrap_err();
        assert!(matches!(err, EstimatorError::Schema { ref column, .. } if column == "garage"));
    }

    #[test]
    fn test_text_in_numeric_column_is_schema_error() {
        let df = df!(
            "location" => &["X"],
            "size_sqft" => &["big"],
            "bedrooms" => &[2i64],
            "bathrooms" => &[1i64],
            "amenities" => &["pool"],
            "price" => &[1.0]
        )
        .unwrap();
        let err = training_set_from_frame(&df).unwrap_err();
        assert!(matches!(err, EstimatorError::Schema { ref column, .. } if column == "size_sqft"));
    }

    #[test]
    fn test_text_target_is_data_error() {
        let df = df!(
            "location" => &["X"],
            "size_sqft" => &[1000.0],
            "bedrooms" => &[2i64],
            "bathrooms" => &[1i64],
            "amenities" => &["pool"],
            "price" => &["expensive"]
        )
        .unwrap();
        assert!(matches!(training_set_from_frame(&df), Err(EstimatorError::Data(_))));
    }

    #[test]
    fn test_missing_target_value_is_data_error() {
        let df = df!(
            "location" => &["X", "Y"],
            "size_sqft" => &[1000.0, 1500.0],
            "bedrooms" => &[2i64, 3],
            "bathrooms" => &[1i64, 2],
            "amenities" => &["pool", "none"],
            "price" => &[Some(1.0), None]
        )
        .unwrap();
        assert!(matches!(training_set_from_frame(&df), Err(EstimatorError::Data(_))));
    }

    #[test]
    fn test_fractional_count_is_data_error() {
        let df = df!(
            "location" => &["X"],
            "size_sqft" => &[1000.0],
            "bedrooms" => &[2.5],
            "bathrooms" => &[1i64],
            "amenities" => &["pool"]
        )
        .unwrap();
        assert!(matches!(features_from_frame(&df), Err(EstimatorError::Data(_))));
    }

    #[test]
    fn test_permuted_columns_yield_same_rows() {
        let canonical = df!(
            "location" => &["X"],
            "size_sqft" => &[1000.0],
            "bedrooms" => &[2i64],
            "bathrooms" => &[1i64],
            "amenities" => &["pool"]
        )
        .unwrap();
        let permuted = df!(
            "amenities" => &["pool"],
            "bathrooms" => &[1i64],
            "location" => &["X"],
            "bedrooms" => &[2i64],
            "size_sqft" => &[1000.0]
        )
        .unwrap();
        assert_eq!(
            features_from_frame(&canonical).unwrap(),
            features_from_frame(&permuted).unwrap()
        );
    }

    #[test]
    fn test_null_category_becomes_empty() {
        let df = df!(
            "location" => &["X"],
            "size_sqft" => &[1000.0],
            "bedrooms" => &[2i64],
            "bathrooms" => &[1i64],
            "amenities" => &[None::<&str>]
        )
        .unwrap();
        let rows = features_from_frame(&df).unwrap();
        assert_eq!(rows[0].amenities, "");
    }

    fn write_csv(dir: &Path, rows: impl Iterator<Item = String>) -> std::path::PathBuf {
        let path = dir.join("listings.csv");
        let mut contents = String::from("location,size_sqft,bedrooms,bathrooms,amenities,price\n");
        for row in rows {
            contents.push_str(&row);
            contents.push('\n');
        }
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_late_decimal_in_whole_number_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            (0..1100).map(|i| {
                if i == 1050 {
                    "X,1200.5,2,1,pool,250000.75".to_string()
                } else {
                    format!("X,{},2,1,pool,{}", 1000 + i, 200_000 + i)
                }
            }),
        );

        let set = training_set_from_frame(&load_csv(&path).unwrap()).unwrap();
        assert_eq!(set.len(), 1100);
        assert_eq!(set.features[1050].size_sqft, 1200.5);
        assert_eq!(set.targets[1050], 250_000.75);
    }

    #[test]
    fn test_late_text_in_numeric_looking_category() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            (0..1100).map(|i| {
                let location = if i == 1050 { "Downtown".to_string() } else { format!("0{}", 9400 + i % 7) };
                format!("{},1000,2,1,{},200000", location, i % 3)
            }),
        );

        let set = training_set_from_frame(&load_csv(&path).unwrap()).unwrap();
        assert_eq!(set.features[0].location, "09400");
        assert_eq!(set.features[0].amenities, "0");
        assert_eq!(set.features[1050].location, "Downtown");
    }
}
