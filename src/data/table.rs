//! Lap table operations and DataFrame materialisation

use polars::prelude::*;
use std::cmp::Ordering;
use std::fs::File;
use std::path::Path;

use crate::core::similarity::SimilarityMatrix;
use crate::models::{ClassificationEntry, LapRecord, LapTable, RiderLaps, SessionTag};

/// Name of the session tag column in materialised tables
pub const SESSION_COLUMN: &str = "Session";
pub const RIDER_COLUMN: &str = "Rider";

/// Median of the finite values, `None` when there are none
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

impl LapTable {
    /// Copy keeping only laps within `[min, max]`
    ///
    /// Riders whose laps are all masked stay in the table with no laps.
    pub fn mask(&self, min: f64, max: f64) -> LapTable {
        LapTable {
            session: self.session.clone(),
            riders: self
                .riders
                .iter()
                .map(|r| RiderLaps {
                    rider: r.rider.clone(),
                    laps: r
                        .laps
                        .iter()
                        .copied()
                        .filter(|&lap| lap >= min && lap <= max)
                        .collect(),
                })
                .collect(),
        }
    }

    /// Median of the per-rider medians
    pub fn median_of_medians(&self) -> Option<f64> {
        let medians: Vec<f64> = self.riders.iter().filter_map(|r| median(&r.laps)).collect();
        median(&medians)
    }

    /// Fastest lap and the rider who set it; ties go to the earlier column
    pub fn fastest_lap(&self) -> Option<(f64, &str)> {
        let mut fastest: Option<(f64, &str)> = None;
        for rider in &self.riders {
            for &lap in rider.laps.iter().filter(|l| l.is_finite()) {
                match fastest {
                    Some((best, _)) if lap >= best => {}
                    _ => fastest = Some((lap, rider.rider.as_str())),
                }
            }
        }
        fastest
    }

    /// Copy with riders ordered by ascending median lap, riders without laps last
    pub fn sorted_by_median(&self) -> LapTable {
        let mut riders: Vec<(Option<f64>, RiderLaps)> = self
            .riders
            .iter()
            .map(|r| (median(&r.laps), r.clone()))
            .collect();

        riders.sort_by(|(a, _), (b, _)| match (a, b) {
            (Some(a), Some(b)) => a.total_cmp(b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });

        LapTable {
            session: self.session.clone(),
            riders: riders.into_iter().map(|(_, r)| r).collect(),
        }
    }

    /// Keep only the named riders, in the given order
    pub fn select(&self, riders: &[&str]) -> LapTable {
        LapTable {
            session: self.session.clone(),
            riders: riders
                .iter()
                .filter_map(|name| self.riders.iter().find(|r| r.rider == *name).cloned())
                .collect(),
        }
    }

    /// Long-format rows, rider by rider
    pub fn to_records(&self) -> Vec<LapRecord> {
        self.riders
            .iter()
            .flat_map(|r| {
                r.laps.iter().map(move |&lap_time| LapRecord {
                    session: self.session.clone(),
                    rider: r.rider.clone(),
                    lap_time,
                })
            })
            .collect()
    }

    /// Pool several sessions into one rider-keyed table
    ///
    /// Laps are appended session by session; riders keep the order of their
    /// first appearance.
    pub fn pool(tables: &[LapTable], session: SessionTag) -> LapTable {
        let mut pooled = LapTable::new(session);
        for table in tables {
            for rider in &table.riders {
                match pooled.riders.iter_mut().find(|r| r.rider == rider.rider) {
                    Some(existing) => existing.laps.extend_from_slice(&rider.laps),
                    None => pooled.riders.push(rider.clone()),
                }
            }
        }
        pooled
    }

    /// Long-format rows of several sessions, each lap keeping its own tag
    ///
    /// The pooled counterpart of [`to_records`](Self::to_records): unlike
    /// [`pool`](Self::pool) no session is relabelled.
    pub fn pooled_records(tables: &[LapTable]) -> Vec<LapRecord> {
        tables.iter().flat_map(LapTable::to_records).collect()
    }

    /// Padded table: one column per rider plus the session column
    ///
    /// Shorter riders are padded with nulls up to the longest rider.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let height = self.height();
        let mut series: Vec<Series> = Vec::with_capacity(self.riders.len() + 1);

        for rider in &self.riders {
            let values: Vec<Option<f64>> = (0..height).map(|i| rider.laps.get(i).copied()).collect();
            series.push(Series::new(rider.rider.as_str().into(), values));
        }
        series.push(Series::new(
            SESSION_COLUMN.into(),
            vec![self.session.as_str(); height],
        ));

        DataFrame::new(series.into_iter().map(Into::into).collect())
    }
}

/// Long-format lap records as a DataFrame (Session, Riders, LapTimes)
pub fn records_to_dataframe(records: &[LapRecord]) -> PolarsResult<DataFrame> {
    let sessions: Vec<&str> = records.iter().map(|r| r.session.as_str()).collect();
    let riders: Vec<&str> = records.iter().map(|r| r.rider.as_str()).collect();
    let laps: Vec<f64> = records.iter().map(|r| r.lap_time).collect();

    DataFrame::new(
        vec![
            Series::new(SESSION_COLUMN.into(), sessions),
            Series::new("Riders".into(), riders),
            Series::new("LapTimes".into(), laps),
        ]
        .into_iter()
        .map(Into::into)
        .collect(),
    )
}

/// Classification as a DataFrame (Position, Points, Rider)
pub fn classification_to_dataframe(entries: &[ClassificationEntry]) -> PolarsResult<DataFrame> {
    let positions: Vec<u32> = entries.iter().map(|e| e.position).collect();
    let points: Vec<f64> = entries.iter().map(|e| e.points).collect();
    let riders: Vec<&str> = entries.iter().map(|e| e.rider.as_str()).collect();

    DataFrame::new(
        vec![
            Series::new("Position".into(), positions),
            Series::new("Points".into(), points),
            Series::new(RIDER_COLUMN.into(), riders),
        ]
        .into_iter()
        .map(Into::into)
        .collect(),
    )
}

/// Similarity matrix as a DataFrame: a rider column then one column per rider
pub fn similarity_to_dataframe(matrix: &SimilarityMatrix) -> PolarsResult<DataFrame> {
    let mut series: Vec<Series> = Vec::with_capacity(matrix.riders().len() + 1);
    series.push(Series::new(RIDER_COLUMN.into(), matrix.riders().to_vec()));

    for (j, rider) in matrix.riders().iter().enumerate() {
        let column: Vec<f64> = matrix.rows().iter().map(|row| row[j]).collect();
        series.push(Series::new(rider.as_str().into(), column));
    }

    DataFrame::new(series.into_iter().map(Into::into).collect())
}

pub fn write_csv<P: AsRef<Path>>(df: &mut DataFrame, path: P) -> PolarsResult<()> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> LapTable {
        let mut table = LapTable::new(SessionTag::new("FP1"));
        table.insert("Francesco BAGNAIA", vec![100.2, 100.4, 100.3, 100.5]);
        table.insert("Jorge MARTIN", vec![99.9, 100.1]);
        table.insert("Marc MARQUEZ", vec![100.8, 101.0, 109.0]);
        table
    }

    fn column_names(df: &DataFrame) -> Vec<String> {
        df.get_column_names().iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[f64::NAN, 5.0]), Some(5.0));
    }

    #[test]
    fn test_mask_inclusive_bounds() {
        let masked = sample_table().mask(100.0, 101.0);

        assert_eq!(masked.get("Francesco BAGNAIA").unwrap().len(), 4);
        assert_eq!(masked.get("Jorge MARTIN"), Some(&[100.1][..]));
        assert_eq!(masked.get("Marc MARQUEZ"), Some(&[100.8, 101.0][..]));
        assert_eq!(masked.session.as_str(), "FP1");
    }

    #[test]
    fn test_mask_keeps_empty_riders() {
        let masked = sample_table().mask(200.0, 201.0);
        assert_eq!(masked.len(), 3);
        assert!(masked.riders.iter().all(|r| r.laps.is_empty()));
        assert_eq!(masked.fastest_lap(), None);
    }

    #[test]
    fn test_median_of_medians() {
        // Rider medians: 100.35, 100.0, 101.0
        let value = sample_table().median_of_medians().unwrap();
        assert!((value - 100.35).abs() < 1e-9);

        assert_eq!(LapTable::new(SessionTag::new("FP1")).median_of_medians(), None);
    }

    #[test]
    fn test_fastest_lap() {
        let table = sample_table();
        let (lap, rider) = table.fastest_lap().unwrap();
        assert!((lap - 99.9).abs() < 1e-9);
        assert_eq!(rider, "Jorge MARTIN");
    }

    #[test]
    fn test_fastest_lap_tie_goes_to_first_column() {
        let mut table = LapTable::new(SessionTag::new("FP1"));
        table.insert("A", vec![101.0, 100.0]);
        table.insert("B", vec![100.0]);
        assert_eq!(table.fastest_lap(), Some((100.0, "A")));
    }

    #[test]
    fn test_sorted_by_median() {
        let mut table = sample_table();
        table.insert("Brad BINDER", vec![]);

        let sorted = table.sorted_by_median();
        assert_eq!(
            sorted.rider_names(),
            vec!["Jorge MARTIN", "Francesco BAGNAIA", "Marc MARQUEZ", "Brad BINDER"]
        );
    }

    #[test]
    fn test_select() {
        let selected = sample_table().select(&["Marc MARQUEZ", "Nobody", "Jorge MARTIN"]);
        assert_eq!(selected.rider_names(), vec!["Marc MARQUEZ", "Jorge MARTIN"]);
    }

    #[test]
    fn test_to_records() {
        let records = sample_table().to_records();
        assert_eq!(records.len(), 9);
        assert_eq!(records[0].rider, "Francesco BAGNAIA");
        assert_eq!(records[4].rider, "Jorge MARTIN");
        assert!((records[4].lap_time - 99.9).abs() < 1e-9);
        assert!(records.iter().all(|r| r.session.as_str() == "FP1"));
    }

    #[test]
    fn test_pool_sessions() {
        let mut fp2 = LapTable::new(SessionTag::new("FP2"));
        fp2.insert("Jorge MARTIN", vec![99.5]);
        fp2.insert("Brad BINDER", vec![100.9, 101.1]);

        let pooled = LapTable::pool(&[sample_table(), fp2], SessionTag::new("FP"));
        assert_eq!(
            pooled.rider_names(),
            vec!["Francesco BAGNAIA", "Jorge MARTIN", "Marc MARQUEZ", "Brad BINDER"]
        );
        assert_eq!(pooled.get("Jorge MARTIN"), Some(&[99.9, 100.1, 99.5][..]));
        assert_eq!(pooled.session.as_str(), "FP");
    }

    #[test]
    fn test_pooled_records_keep_session_tags() {
        let mut race = LapTable::new(SessionTag::new("RAC"));
        race.insert("Jorge MARTIN", vec![101.2, 101.0]);

        let records = LapTable::pooled_records(&[sample_table(), race]);
        assert_eq!(records.len(), 11);
        assert_eq!(records[0].session.as_str(), "FP1");
        assert_eq!(records[9].session.as_str(), "RAC");
        assert_eq!(records[10].rider, "Jorge MARTIN");
        assert!((records[10].lap_time - 101.0).abs() < 1e-9);

        let df = records_to_dataframe(&records).unwrap();
        let sessions = df.column(SESSION_COLUMN).unwrap();
        assert_eq!(sessions.str().unwrap().get(10), Some("RAC"));
    }

    #[test]
    fn test_to_dataframe_pads_short_riders() {
        let df = sample_table().to_dataframe().unwrap();

        assert_eq!(df.height(), 4);
        assert_eq!(
            column_names(&df),
            vec!["Francesco BAGNAIA", "Jorge MARTIN", "Marc MARQUEZ", "Session"]
        );

        let martin = df.column("Jorge MARTIN").unwrap();
        assert_eq!(martin.null_count(), 2);
        assert_eq!(martin.f64().unwrap().get(1), Some(100.1));
        assert_eq!(martin.f64().unwrap().get(2), None);

        let session = df.column(SESSION_COLUMN).unwrap();
        assert_eq!(session.str().unwrap().get(3), Some("FP1"));
    }

    #[test]
    fn test_to_dataframe_empty_table() {
        let df = LapTable::new(SessionTag::new("FP1")).to_dataframe().unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(column_names(&df), vec!["Session"]);
    }

    #[test]
    fn test_records_to_dataframe() {
        let df = records_to_dataframe(&sample_table().to_records()).unwrap();
        assert_eq!(df.height(), 9);
        assert_eq!(column_names(&df), vec!["Session", "Riders", "LapTimes"]);
    }

    #[test]
    fn test_classification_to_dataframe() {
        let entries = vec![
            ClassificationEntry {
                position: 1,
                points: 25.0,
                rider: "Francesco BAGNAIA".to_string(),
            },
            ClassificationEntry {
                position: 2,
                points: 20.0,
                rider: "Jorge MARTIN".to_string(),
            },
        ];
        let df = classification_to_dataframe(&entries).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(column_names(&df), vec!["Position", "Points", "Rider"]);
    }

    #[test]
    fn test_write_csv() {
        let path = std::env::temp_dir().join(format!("motogp_pace_laps_{}.csv", std::process::id()));
        let mut df = sample_table().to_dataframe().unwrap();
        write_csv(&mut df, &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let header = contents.lines().next().unwrap();
        assert_eq!(header, "Francesco BAGNAIA,Jorge MARTIN,Marc MARQUEZ,Session");
        assert_eq!(contents.lines().count(), 5);

        std::fs::remove_file(&path).ok();
    }
}
