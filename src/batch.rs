//! Converting many sources into many documents
//!
//! Documents share nothing, so they are the unit of parallelism. With the `parallel`
//! feature jobs run on a rayon pool sized to the worker count; otherwise one after
//! another. A failed job is logged and reported, and never stops its siblings.

use std::path::PathBuf;

use log::{error, info};

use crate::error::Result;
use crate::options::ExportOptions;
use crate::source::{export_source, RowSource};

/// One source to convert into one document
pub struct ExportJob {
    pub name: String,
    pub source: Box<dyn RowSource + Send>,
    pub destination: PathBuf,
    /// Overrides the batch options for this job
    pub options: Option<ExportOptions>,
}

impl ExportJob {
    pub fn new<S, P>(name: &str, source: S, destination: P) -> Self
    where
        S: RowSource + Send + 'static,
        P: Into<PathBuf>,
    {
        ExportJob {
            name: name.to_string(),
            source: Box::new(source),
            destination: destination.into(),
            options: None,
        }
    }

    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = Some(options);
        self
    }
}

/// Outcome of one job
#[derive(Debug)]
pub struct JobOutcome {
    pub name: String,
    pub destination: PathBuf,
    /// Data rows written, or the failure
    pub result: Result<u64>,
}

/// Outcomes of a batch, in job order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<JobOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &JobOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &JobOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn total_rows(&self) -> u64 {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok()).sum()
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }
}

/// Runs export jobs with a bounded number of workers
#[derive(Debug, Clone)]
pub struct BatchExporter {
    workers: usize,
    options: ExportOptions,
}

impl BatchExporter {
    pub fn new(options: ExportOptions) -> Self {
        BatchExporter {
            workers: 1,
            options,
        }
    }

    /// Documents built at the same time; at least one
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn run(&self, jobs: Vec<ExportJob>) -> BatchReport {
        info!("Starting batch of {} jobs with {} workers", jobs.len(), self.workers);
        let outcomes = self.run_jobs(jobs);
        let report = BatchReport { outcomes };
        info!(
            "Batch finished: {} succeeded, {} failed, {} rows",
            report.succeeded().count(),
            report.failed().count(),
            report.total_rows()
        );
        report
    }

    #[cfg(feature = "parallel")]
    fn run_jobs(&self, jobs: Vec<ExportJob>) -> Vec<JobOutcome> {
        use rayon::prelude::*;

        match rayon::ThreadPoolBuilder::new().num_threads(self.workers).build() {
            Ok(pool) => pool.install(|| jobs.into_par_iter().map(|job| self.run_job(job)).collect()),
            Err(e) => {
                error!("Failed to build worker pool, running sequentially: {}", e);
                jobs.into_iter().map(|job| self.run_job(job)).collect()
            }
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn run_jobs(&self, jobs: Vec<ExportJob>) -> Vec<JobOutcome> {
        jobs.into_iter().map(|job| self.run_job(job)).collect()
    }

    fn run_job(&self, job: ExportJob) -> JobOutcome {
        let ExportJob {
            name,
            mut source,
            destination,
            options,
        } = job;
        let options = options.as_ref().unwrap_or(&self.options);

        let result = export_source(source.as_mut(), &destination, options);
        match &result {
            Ok(rows) => info!("{}: {} rows written to {}", name, rows, destination.display()),
            Err(e) => error!("{}: export to {} failed: {}", name, destination.display(), e),
        }

        JobOutcome {
            name,
            destination,
            result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use crate::types::{FieldType, FieldValue};
    use tempfile::tempdir;

    fn source(rows: usize) -> MemorySource {
        MemorySource::new(vec![("n".to_string(), FieldType::I64)])
            .with_rows((0..rows as i64).map(|i| vec![FieldValue::Int(i)]).collect())
    }

    #[test]
    fn test_batch_isolates_failures() -> Result<()> {
        let dir = tempdir()?;
        let broken = MemorySource::new(Vec::new());

        let jobs = vec![
            ExportJob::new("first", source(3), dir.path().join("first.xlsx")),
            ExportJob::new("broken", broken, dir.path().join("broken.xlsx")),
            ExportJob::new("last", source(2), dir.path().join("last.xlsx")),
        ];

        let report = BatchExporter::new(ExportOptions::default()).with_workers(2).run(jobs);
        assert!(!report.is_success());
        assert_eq!(report.succeeded().count(), 2);
        assert_eq!(report.total_rows(), 5);

        let failed: Vec<_> = report.failed().map(|o| o.name.as_str()).collect();
        assert_eq!(failed, ["broken"]);
        assert!(dir.path().join("last.xlsx").exists());
        assert!(!dir.path().join("broken.xlsx").exists());
        Ok(())
    }

    #[test]
    fn test_job_options_override() -> Result<()> {
        let dir = tempdir()?;
        let job = ExportJob::new("limited", source(5), dir.path().join("limited.xlsx"))
            .with_options(ExportOptions::default().with_max_rows(3));

        let report = BatchExporter::new(ExportOptions::default()).run(vec![job]);
        assert_eq!(report.failed().count(), 1);
        Ok(())
    }

    #[test]
    fn test_workers_at_least_one() {
        assert_eq!(BatchExporter::new(ExportOptions::default()).with_workers(0).workers(), 1);
    }
}
