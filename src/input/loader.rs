//! Loading the EPA radon survey files into a [`RadonData`] table.
//!
//! The measurement file (`srrs2.dat`) and the county file (`cty.dat`) are
//! comma separated with a header row and space-padded fields.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::{debug, info};
use serde::Deserialize;
use thiserror::Error;

use super::{InputError, RadonData};
use crate::preprocess::{RADON_LOG_OFFSET, log_transform};

/// Errors raised while reading and reshaping the survey files.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("no measurements found for state `{state}`")]
    EmptyState { state: String },
    #[error("no uranium record for county `{county}` (fips {fips})")]
    MissingUranium { county: String, fips: u32 },
    #[error("non-positive uranium concentration {value} for fips {fips}")]
    NonPositiveUranium { fips: u32, value: f64 },
    #[error(transparent)]
    InvalidTable(#[from] InputError),
}

#[derive(Debug, Deserialize)]
struct MeasurementRecord {
    idnum: u64,
    state: String,
    stfips: u32,
    floor: f64,
    activity: f64,
    cntyfips: u32,
    county: String,
}

#[derive(Debug, Deserialize)]
struct CountyRecord {
    stfips: u32,
    ctfips: u32,
    #[serde(rename = "Uppm")]
    uppm: f64,
}

const fn fips(state_fips: u32, county_fips: u32) -> u32 {
    state_fips * 1_000 + county_fips
}

/// Load the radon table for one state from file paths.
///
/// # Errors
///
/// Returns `LoadError` if a file cannot be read or parsed, the state has no
/// measurements, or a county lacks a uranium record.
pub fn load_radon(
    srrs_path: impl AsRef<Path>,
    cty_path: Option<&Path>,
    state: &str,
) -> Result<RadonData, LoadError> {
    let srrs_path = srrs_path.as_ref();
    info!("loading radon measurements from {}", srrs_path.display());
    let srrs = open(srrs_path)?;
    let cty = cty_path.map(open).transpose()?;
    load_radon_from_readers(srrs, cty, state)
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Load the radon table for one state from already-open readers.
///
/// Rows are de-duplicated by `idnum`; county codes are assigned in order of
/// first appearance. When a county reader is given, `ln(Uppm)` is attached
/// per county.
///
/// # Errors
///
/// Returns `LoadError` on parse failures or inconsistent inputs.
pub fn load_radon_from_readers<R: Read, C: Read>(
    srrs: R,
    cty: Option<C>,
    state: &str,
) -> Result<RadonData, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(srrs);

    let mut seen_ids = HashSet::new();
    let mut county_lookup: HashMap<String, usize> = HashMap::new();
    let mut county_names = Vec::new();
    let mut county_fips = Vec::new();
    let mut log_radon = Vec::new();
    let mut floor = Vec::new();
    let mut county = Vec::new();
    let mut skipped_duplicates = 0usize;

    for record in reader.deserialize::<MeasurementRecord>() {
        let record = record?;
        if record.state != state {
            continue;
        }
        if !seen_ids.insert(record.idnum) {
            skipped_duplicates += 1;
            continue;
        }
        let name = record.county.trim().to_string();
        let code = if let Some(code) = county_lookup.get(&name) {
            *code
        } else {
            let code = county_names.len();
            county_lookup.insert(name.clone(), code);
            county_names.push(name);
            county_fips.push(fips(record.stfips, record.cntyfips));
            code
        };
        log_radon.push(log_transform(record.activity, RADON_LOG_OFFSET));
        floor.push(record.floor);
        county.push(code);
    }

    if log_radon.is_empty() {
        return Err(LoadError::EmptyState {
            state: state.to_string(),
        });
    }
    if skipped_duplicates > 0 {
        debug!("skipped {skipped_duplicates} duplicated measurement ids");
    }

    let mut data = RadonData::new(log_radon, floor, county, county_names);
    if let Some(cty) = cty {
        let uranium = read_county_uranium(cty, &data.county_names, &county_fips)?;
        data = data.with_county_uranium(uranium);
    }
    data.validate()?;

    info!(
        "loaded {} measurements across {} counties for state {state}",
        data.n_obs(),
        data.n_counties()
    );
    Ok(data)
}

fn read_county_uranium<C: Read>(
    cty: C,
    county_names: &[String],
    county_fips: &[u32],
) -> Result<Vec<f64>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(cty);

    let mut by_fips: HashMap<u32, f64> = HashMap::new();
    for record in reader.deserialize::<CountyRecord>() {
        let record = record?;
        by_fips
            .entry(fips(record.stfips, record.ctfips))
            .or_insert(record.uppm);
    }

    county_names
        .iter()
        .zip(county_fips)
        .map(|(name, code)| {
            let value = by_fips
                .get(code)
                .copied()
                .ok_or_else(|| LoadError::MissingUranium {
                    county: name.clone(),
                    fips: *code,
                })?;
            if value <= 0.0 {
                return Err(LoadError::NonPositiveUranium { fips: *code, value });
            }
            Ok(value.ln())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SRRS: &str = "\
idnum,state,state2,stfips,zip,region,typebldg,floor,room,basement,windoor,rep,stratum,wave,starttm,stoptm,startdt,stopdt,activity,pcterr,adjwt,dupflag,zipflag,cntyfips,county
    1,MN,MN,27,55735,5,1,1,3,N,0,2,4,41,930,930,12088,12288,2.2,9.7,1146.49919,1,0,1,AITKIN
    2,MN,MN,27,55748,5,1,0,4,Y,0,5,2,40,1615,1615,11888,12088,2.2,14.5,471.366223,0,0,1,AITKIN
    2,MN,MN,27,55748,5,1,0,4,Y,0,5,2,40,1615,1615,11888,12088,2.2,14.5,471.366223,0,0,1,AITKIN
    3,MN,MN,27,55303,5,1,0,4,Y,0,3,2,42,1045,1045,11888,12088,14.0,4.3,433.316718,0,0,3,ANOKA
    4,AZ,AZ,4,85920,1,0,0,2,Y,0,1,1,9,1100,700,12689,12789,0.3,0,136.060971,0,0,1,APACHE
";

    const CTY: &str = "\
stfips,ctfips,st,cty,lon,lat,Uppm
27,1,MN,AITKIN,-93.4,46.6,0.502054
27,3,MN,ANOKA,-93.2,45.2,0.428565
4,1,AZ,APACHE,-109.5,35.4,2.49759
";

    #[test]
    fn loads_state_rows_and_deduplicates_ids() {
        let data = load_radon_from_readers(SRRS.as_bytes(), Some(CTY.as_bytes()), "MN")
            .expect("fixture should load");
        assert_eq!(data.n_obs(), 3);
        assert_eq!(data.county_names, vec!["AITKIN", "ANOKA"]);
        assert_eq!(data.county, vec![0, 0, 1]);
        assert_eq!(data.floor, vec![1.0, 0.0, 0.0]);
        assert_relative_eq!(data.log_radon[0], 2.3_f64.ln(), epsilon = 1e-12);
        assert_relative_eq!(data.log_radon[2], 14.1_f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn attaches_log_uranium_per_county() {
        let data = load_radon_from_readers(SRRS.as_bytes(), Some(CTY.as_bytes()), "MN")
            .expect("fixture should load");
        let uranium = data.county_uranium.expect("uranium should be attached");
        assert_relative_eq!(uranium[0], 0.502_054_f64.ln(), epsilon = 1e-12);
        assert_relative_eq!(uranium[1], 0.428_565_f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn loads_without_county_file() {
        let data = load_radon_from_readers(SRRS.as_bytes(), None::<&[u8]>, "MN")
            .expect("fixture should load");
        assert!(data.county_uranium.is_none());
    }

    #[test]
    fn unknown_state_is_an_error() {
        let err = load_radon_from_readers(SRRS.as_bytes(), None::<&[u8]>, "ZZ")
            .expect_err("no rows for ZZ");
        assert!(matches!(err, LoadError::EmptyState { .. }));
    }

    #[test]
    fn missing_uranium_record_is_reported() {
        let cty = "stfips,ctfips,st,cty,lon,lat,Uppm\n27,1,MN,AITKIN,-93.4,46.6,0.502054\n";
        let err = load_radon_from_readers(SRRS.as_bytes(), Some(cty.as_bytes()), "MN")
            .expect_err("ANOKA has no uranium row");
        assert!(matches!(
            err,
            LoadError::MissingUranium { fips: 27_003, .. }
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_radon("/definitely/not/here/srrs2.dat", None, "MN")
            .expect_err("file does not exist");
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
