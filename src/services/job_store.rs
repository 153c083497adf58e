use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tress_core::{RasterScanner, RgbaImage, ScanState};

use super::scan_driver::FilterParams;
use crate::error::{ApiError, FilterError};
use crate::models::{JobId, JobInfo, JobStatus};
use crate::rendering::{decode_image, encode_png};

type SharedScanner = Arc<Mutex<RasterScanner<RgbaImage>>>;

/// One submitted image and the scan running over it
pub struct Job {
    id: JobId,
    width: usize,
    height: usize,
    params: FilterParams,
    created_at: DateTime<Utc>,
    scanner: SharedScanner,
    /// `f64` bits of the last observed progress
    progress: AtomicU64,
    finished_at: OnceLock<Instant>,
    discarded: AtomicBool,
}

impl Job {
    pub fn new(id: JobId, image: RgbaImage, params: FilterParams) -> Result<Self, FilterError> {
        let (width, height) = image.dimensions();
        let scanner = params.start(image)?;
        let progress = AtomicU64::new(scanner.progress().to_bits());
        Ok(Self {
            id,
            width,
            height,
            params,
            created_at: Utc::now(),
            scanner: Arc::new(Mutex::new(scanner)),
            progress,
            finished_at: OnceLock::new(),
            discarded: AtomicBool::new(false),
        })
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn params(&self) -> &FilterParams {
        &self.params
    }

    /// Run one time-bounded scan step on the blocking pool.
    pub async fn step(&self) -> Result<ScanState, ApiError> {
        let scanner = self.scanner.clone();
        let budget = self.params.step_budget;
        let (state, progress) = tokio::task::spawn_blocking(move || {
            let mut scanner = lock_scanner(&scanner)?;
            let state = scanner.advance(budget);
            Ok::<_, ApiError>((state, scanner.progress()))
        })
        .await
        .map_err(|e| ApiError::Internal(format!("Scan task failed: {e}")))??;

        self.progress.store(progress.to_bits(), Ordering::Relaxed);
        if state == ScanState::Complete {
            self.finished_at.get_or_init(Instant::now);
        }
        Ok(state)
    }

    pub fn is_complete(&self) -> bool {
        self.finished_at.get().is_some()
    }

    /// When the scan wrote its last pixel
    pub fn finished_at(&self) -> Option<Instant> {
        self.finished_at.get().copied()
    }

    /// Snapshot of the job; never waits on a running step.
    pub fn info(&self) -> JobInfo {
        let status = if self.is_complete() {
            JobStatus::Complete
        } else {
            JobStatus::Running
        };
        JobInfo {
            id: self.id.clone(),
            width: self.width,
            height: self.height,
            radius: self.params.radius,
            darken_amount: self.params.darken_amount,
            status,
            progress: f64::from_bits(self.progress.load(Ordering::Relaxed)),
            created_at: self.created_at,
        }
    }

    /// Encode the output buffer. A running job only encodes when
    /// `allow_partial` is set; unwritten pixels are transparent.
    pub async fn encode_result(&self, allow_partial: bool) -> Result<Vec<u8>, ApiError> {
        if !self.is_complete() && !allow_partial {
            return Err(ApiError::NotReady);
        }
        let scanner = self.scanner.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<u8>, ApiError> {
            // Copy out so a waiting step is not held up by the encoder
            let snapshot = lock_scanner(&scanner)?.result().clone();
            Ok(encode_png(&snapshot)?)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("Encode task failed: {e}")))?
    }

    /// Ask the driver task to stop.
    pub fn discard(&self) {
        self.discarded.store(true, Ordering::Relaxed);
    }

    pub fn is_discarded(&self) -> bool {
        self.discarded.load(Ordering::Relaxed)
    }
}

fn lock_scanner(
    scanner: &Mutex<RasterScanner<RgbaImage>>,
) -> Result<MutexGuard<'_, RasterScanner<RgbaImage>>, ApiError> {
    scanner
        .lock()
        .map_err(|_| ApiError::Internal("scanner lock poisoned".to_string()))
}

/// Trait for job storage
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Store a job unless one with the same id exists. Returns the stored
    /// job and whether it was newly inserted.
    async fn insert(&self, job: Arc<Job>) -> Result<(Arc<Job>, bool), ApiError>;

    /// Find job by id
    async fn find(&self, id: &JobId) -> Result<Option<Arc<Job>>, ApiError>;

    /// Remove a job, returning it if it existed
    async fn remove(&self, id: &JobId) -> Result<Option<Arc<Job>>, ApiError>;

    /// Drop finished jobs older than the retention period. Returns how many
    /// were removed.
    async fn evict_expired(&self) -> usize;

    /// Number of stored jobs
    async fn len(&self) -> usize;
}

/// Default number of jobs held at once
pub const DEFAULT_MAX_JOBS: usize = 64;

/// Default retention of a finished job
pub const DEFAULT_JOB_TTL: Duration = Duration::from_secs(600);

/// In-memory job storage.
///
/// Finished jobs expire `ttl` after completion. When the store is full, the
/// job that finished first makes room; running jobs are never evicted.
pub struct InMemoryJobStore {
    jobs: Arc<RwLock<HashMap<JobId, Arc<Job>>>>,
    max_jobs: usize,
    ttl: Duration,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_JOBS, DEFAULT_JOB_TTL)
    }

    pub fn with_limits(max_jobs: usize, ttl: Duration) -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            max_jobs: max_jobs.max(1),
            ttl,
        }
    }

    fn remove_expired(&self, jobs: &mut HashMap<JobId, Arc<Job>>) -> usize {
        let before = jobs.len();
        jobs.retain(|_, job| match job.finished_at() {
            Some(finished) => finished.elapsed() < self.ttl,
            None => true,
        });
        before - jobs.len()
    }
}

impl Default for InMemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn insert(&self, job: Arc<Job>) -> Result<(Arc<Job>, bool), ApiError> {
        let mut jobs = self.jobs.write().await;
        if let Some(existing) = jobs.get(job.id()) {
            return Ok((existing.clone(), false));
        }

        self.remove_expired(&mut jobs);
        if jobs.len() >= self.max_jobs {
            let oldest = jobs
                .values()
                .filter_map(|j| j.finished_at().map(|t| (t, j.id().clone())))
                .min_by_key(|(finished, _)| *finished)
                .map(|(_, id)| id);
            match oldest {
                Some(id) => {
                    tracing::debug!(job = %id, "Evicting oldest finished job");
                    jobs.remove(&id);
                }
                None => {
                    return Err(ApiError::Busy {
                        max: self.max_jobs,
                    })
                }
            }
        }

        jobs.insert(job.id().clone(), job.clone());
        Ok((job, true))
    }

    async fn find(&self, id: &JobId) -> Result<Option<Arc<Job>>, ApiError> {
        let jobs = self.jobs.read().await;
        Ok(jobs.get(id).cloned())
    }

    async fn remove(&self, id: &JobId) -> Result<Option<Arc<Job>>, ApiError> {
        let mut jobs = self.jobs.write().await;
        Ok(jobs.remove(id))
    }

    async fn evict_expired(&self) -> usize {
        let mut jobs = self.jobs.write().await;
        self.remove_expired(&mut jobs)
    }

    async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }
}

/// Drive a job to completion. Steps run on the blocking pool; the driver
/// yields between them so other requests are served.
pub fn spawn_driver(job: Arc<Job>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut steps = 0u64;
        loop {
            if job.is_discarded() {
                tracing::info!(job = %job.id(), steps, "Job discarded");
                return;
            }
            steps += 1;
            match job.step().await {
                Ok(ScanState::Complete) => break,
                Ok(_) => tokio::task::yield_now().await,
                Err(e) => {
                    tracing::error!(job = %job.id(), steps, error = %e, "Scan step failed");
                    return;
                }
            }
        }
        tracing::info!(job = %job.id(), steps, "Job complete");
    })
}

/// Periodically drop expired jobs from the store.
pub fn spawn_sweeper<S: JobStore + 'static>(
    store: Arc<S>,
    period: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let evicted = store.evict_expired().await;
            if evicted > 0 {
                tracing::debug!(evicted, "Evicted expired jobs");
            }
        }
    })
}

/// Decode an upload and register a job for it, starting a driver if the
/// job is new. Identical submissions return the existing job.
pub async fn submit<S: JobStore + ?Sized>(
    store: &S,
    bytes: &[u8],
    params: FilterParams,
) -> Result<(Arc<Job>, bool), ApiError> {
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("empty request body".to_string()));
    }
    params.validate()?;

    let id = JobId::derive(bytes, params.radius, params.darken_amount, params.cache);
    if let Some(existing) = store.find(&id).await? {
        tracing::debug!(job = %id, "Reusing existing job");
        return Ok((existing, false));
    }

    let image = decode_image(bytes)?;
    let job = Arc::new(Job::new(id, image, params)?);
    let (job, created) = store.insert(job).await?;
    if created {
        tracing::info!(
            job = %job.id(),
            radius = params.radius,
            darken_amount = params.darken_amount,
            "Job submitted"
        );
        spawn_driver(job.clone());
    }
    Ok((job, created))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tress_core::{CacheStrategy, Rgba};

    fn params() -> FilterParams {
        FilterParams {
            radius: 2,
            darken_amount: 0.1,
            step_budget: Duration::from_millis(1),
            cache: CacheStrategy::default(),
        }
    }

    fn image_bytes(width: usize, height: usize) -> Vec<u8> {
        let image = RgbaImage::from_fn(width, height, |x, y| {
            Rgba::new((x * 7) as u8, (y * 5) as u8, 99, 255)
        });
        encode_png(&image).unwrap()
    }

    fn finished_job(id: &str) -> Arc<Job> {
        let job = Job::new(JobId::new(id), RgbaImage::new(2, 2), params()).unwrap();
        job.finished_at.get_or_init(Instant::now);
        Arc::new(job)
    }

    fn running_job(id: &str) -> Arc<Job> {
        Arc::new(Job::new(JobId::new(id), RgbaImage::new(2, 2), params()).unwrap())
    }

    async fn wait_complete(job: &Job) {
        for _ in 0..10_000 {
            if job.info().status == JobStatus::Complete {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!("job did not complete");
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = InMemoryJobStore::new();
        let job = Job::new(JobId::new("a"), RgbaImage::new(2, 2), params()).unwrap();

        let (stored, created) = store.insert(Arc::new(job)).await.unwrap();
        assert!(created);
        assert_eq!(stored.id(), &JobId::new("a"));

        let found = store.find(&JobId::new("a")).await.unwrap();
        assert!(found.is_some());
        assert!(store.find(&JobId::new("b")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_keeps_existing() {
        let store = InMemoryJobStore::new();
        let first = Arc::new(Job::new(JobId::new("a"), RgbaImage::new(2, 2), params()).unwrap());
        let second = Arc::new(Job::new(JobId::new("a"), RgbaImage::new(3, 3), params()).unwrap());

        store.insert(first.clone()).await.unwrap();
        let (stored, created) = store.insert(second).await.unwrap();
        assert!(!created);
        assert!(Arc::ptr_eq(&stored, &first));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = InMemoryJobStore::new();
        let job = Arc::new(Job::new(JobId::new("a"), RgbaImage::new(1, 1), params()).unwrap());
        store.insert(job).await.unwrap();

        assert!(store.remove(&JobId::new("a")).await.unwrap().is_some());
        assert!(store.remove(&JobId::new("a")).await.unwrap().is_none());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_job_rejects_invalid_params() {
        let bad = FilterParams {
            radius: 0,
            ..params()
        };
        assert!(Job::new(JobId::new("x"), RgbaImage::new(1, 1), bad).is_err());
    }

    #[tokio::test]
    async fn test_encode_result_requires_completion() {
        let job = Job::new(JobId::new("a"), RgbaImage::new(4, 4), params()).unwrap();
        assert!(matches!(job.encode_result(false).await, Err(ApiError::NotReady)));
        // Preview is allowed before any step ran
        assert!(job.encode_result(true).await.is_ok());

        while job.step().await.unwrap() != ScanState::Complete {}
        assert!(job.encode_result(false).await.is_ok());
    }

    #[tokio::test]
    async fn test_submit_runs_to_completion() {
        let store = InMemoryJobStore::new();
        let bytes = image_bytes(24, 16);

        let (job, created) = submit(&store, &bytes, params()).await.unwrap();
        assert!(created);
        wait_complete(&job).await;

        let info = job.info();
        assert_eq!((info.width, info.height), (24, 16));
        assert_eq!(info.progress, 100.0);
    }

    #[tokio::test]
    async fn test_submit_deduplicates() {
        let store = InMemoryJobStore::new();
        let bytes = image_bytes(8, 8);

        let (a, created_a) = submit(&store, &bytes, params()).await.unwrap();
        let (b, created_b) = submit(&store, &bytes, params()).await.unwrap();
        assert!(created_a);
        assert!(!created_b);
        assert!(Arc::ptr_eq(&a, &b));

        let other = FilterParams {
            radius: 3,
            ..params()
        };
        let (c, created_c) = submit(&store, &bytes, other).await.unwrap();
        assert!(created_c);
        assert_ne!(a.id(), c.id());
    }

    #[tokio::test]
    async fn test_submit_rejects_empty_and_garbage() {
        let store = InMemoryJobStore::new();
        assert!(matches!(
            submit(&store, &[], params()).await,
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            submit(&store, b"nope", params()).await,
            Err(ApiError::Filter(FilterError::UnsupportedFormat))
        ));
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_discarded_job_stops_advancing() {
        let job = Arc::new(Job::new(JobId::new("d"), RgbaImage::new(64, 64), params()).unwrap());
        job.discard();
        spawn_driver(job.clone()).await.unwrap();

        let info = job.info();
        assert_eq!(info.status, JobStatus::Running);
        assert_eq!(info.progress, 0.0);
    }

    #[tokio::test]
    async fn test_step_records_progress_and_completion() {
        let job = Job::new(JobId::new("p"), RgbaImage::new(3, 3), params()).unwrap();
        assert!(job.finished_at().is_none());

        while job.step().await.unwrap() != ScanState::Complete {}
        let info = job.info();
        assert_eq!(info.status, JobStatus::Complete);
        assert_eq!(info.progress, 100.0);
        assert!(job.finished_at().is_some());
    }

    #[tokio::test]
    async fn test_info_does_not_wait_for_scanner() {
        let job = Job::new(JobId::new("i"), RgbaImage::new(8, 8), params()).unwrap();
        // Stand-in for a step in progress on the blocking pool
        let _guard = job.scanner.lock().unwrap();

        let info = job.info();
        assert_eq!(info.status, JobStatus::Running);
        assert_eq!(info.progress, 0.0);
    }

    #[tokio::test]
    async fn test_poisoned_scanner_is_internal_error() {
        let job = Arc::new(Job::new(JobId::new("x"), RgbaImage::new(4, 4), params()).unwrap());
        let scanner = job.scanner.clone();
        std::thread::spawn(move || {
            let _guard = scanner.lock().unwrap();
            panic!("step blew up");
        })
        .join()
        .unwrap_err();

        assert!(matches!(job.step().await, Err(ApiError::Internal(_))));
        assert!(matches!(
            job.encode_result(true).await,
            Err(ApiError::Internal(_))
        ));
        // The driver gives up instead of spinning on the broken job
        spawn_driver(job.clone()).await.unwrap();
        assert_eq!(job.info().status, JobStatus::Running);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_step_leaves_runtime_free() {
        let slow = FilterParams {
            radius: 100,
            step_budget: Duration::from_millis(300),
            ..params()
        };
        let image = RgbaImage::from_fn(2000, 2000, |x, y| {
            Rgba::new((x % 251) as u8, (y % 241) as u8, 7, 255)
        });
        let job = Arc::new(Job::new(JobId::new("s"), image, slow).unwrap());

        let stepping = tokio::spawn({
            let job = job.clone();
            async move { job.step().await }
        });
        tokio::task::yield_now().await;

        // A single-threaded runtime only wakes this timer if the step is
        // running somewhere else
        let started = Instant::now();
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(
            started.elapsed() < Duration::from_millis(200),
            "timer delayed by {:?}",
            started.elapsed()
        );
        assert_eq!(job.info().status, JobStatus::Running);

        assert_eq!(stepping.await.unwrap().unwrap(), ScanState::Paused);
    }

    #[tokio::test]
    async fn test_finished_jobs_expire() {
        let store = InMemoryJobStore::with_limits(16, Duration::ZERO);
        let job = Arc::new(Job::new(JobId::new("e"), RgbaImage::new(4, 4), params()).unwrap());
        store.insert(job.clone()).await.unwrap();
        store.insert(running_job("r")).await.unwrap();

        // Not finished yet, so the zero ttl does not apply
        assert_eq!(store.evict_expired().await, 0);

        while job.step().await.unwrap() != ScanState::Complete {}
        assert_eq!(store.evict_expired().await, 1);
        assert!(store.find(&JobId::new("e")).await.unwrap().is_none());
        assert!(store.find(&JobId::new("r")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_ttl_counts_from_completion() {
        let store = InMemoryJobStore::with_limits(16, Duration::from_secs(3600));
        store.insert(finished_job("a")).await.unwrap();
        assert_eq!(store.evict_expired().await, 0);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_full_store_evicts_oldest_finished() {
        let store = InMemoryJobStore::with_limits(3, Duration::from_secs(3600));
        store.insert(finished_job("a")).await.unwrap();
        store.insert(running_job("b")).await.unwrap();
        store.insert(finished_job("c")).await.unwrap();

        let (_, created) = store.insert(running_job("d")).await.unwrap();
        assert!(created);
        assert_eq!(store.len().await, 3);
        assert!(store.find(&JobId::new("a")).await.unwrap().is_none());
        for id in ["b", "c", "d"] {
            assert!(store.find(&JobId::new(id)).await.unwrap().is_some(), "{id}");
        }
    }

    #[tokio::test]
    async fn test_full_store_of_running_jobs_is_busy() {
        let store = InMemoryJobStore::with_limits(2, Duration::from_secs(3600));
        store.insert(running_job("a")).await.unwrap();
        store.insert(running_job("b")).await.unwrap();

        assert!(matches!(
            store.insert(running_job("c")).await,
            Err(ApiError::Busy { max: 2 })
        ));
        // Known ids still resolve to the stored job
        let (_, created) = store.insert(running_job("a")).await.unwrap();
        assert!(!created);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_completed_submissions_do_not_accumulate() {
        let store = InMemoryJobStore::with_limits(2, Duration::from_secs(3600));
        for size in 4..8 {
            let (job, _) = submit(&store, &image_bytes(size, size), params())
                .await
                .unwrap();
            wait_complete(&job).await;
        }
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_sweeper_removes_expired_jobs() {
        let store = Arc::new(InMemoryJobStore::with_limits(16, Duration::ZERO));
        store.insert(finished_job("a")).await.unwrap();
        store.insert(finished_job("b")).await.unwrap();

        let sweeper = spawn_sweeper(store.clone(), Duration::from_millis(1));
        for _ in 0..1000 {
            if store.len().await == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        sweeper.abort();
        assert_eq!(store.len().await, 0);
    }
}
