// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one CSV row per epoch metrics event so learning curves
// can be plotted after (or during) a run.
//
// Output file: <dir>/metrics.csv
//
// Example:
//   epoch,phase,loss,binary_acc,score_mse,attr_precision,attr_recall,attr_f1,w_binary,w_score,w_attribute
//   1,training,2.914501,0.581000,4.213000,0.310000,0.270000,0.288000,1.000000,1.000000,1.000000
//   1,validation,2.875200,0.590000,4.102000,0.315000,0.280000,0.296000,1.000000,1.000000,1.000000

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};

use anyhow::Result;

use crate::domain::events::EpochMetricsEvent;

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet, so a
    /// resumed run appends to the same curve.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let csv_path = dir.join("metrics.csv");

        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(
                f,
                "epoch,phase,loss,binary_acc,score_mse,\
                 attr_precision,attr_recall,attr_f1,w_binary,w_score,w_attribute"
            )?;
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a CSV row.
    pub fn log(&self, event: &EpochMetricsEvent) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;
        writeln!(
            f,
            "{},{},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6}",
            event.epoch,
            event.phase.as_str(),
            event.loss,
            event.binary_accuracy,
            event.score_mse,
            event.attribute.precision,
            event.attribute.recall,
            event.attribute.f1,
            event.weights.binary,
            event.weights.score,
            event.weights.attribute,
        )?;
        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}
