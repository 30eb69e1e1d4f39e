//! Parallel preview regeneration.
//!
//! Backs [`PreviewGenerator::refresh_stale`](crate::PreviewGenerator) when
//! the `rayon` feature is enabled. Each job opens its own decode session, so
//! workers share nothing but the generator's configuration.

use ::rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::preview::{PreviewGenerator, PreviewOutcome, RefreshJob};

/// Run refresh jobs across rayon threads. Results come back in job order.
pub(crate) fn parallel_refresh(
    generator: &PreviewGenerator,
    jobs: &[RefreshJob<'_>],
) -> Vec<(String, PreviewOutcome)> {
    jobs.par_iter().map(|job| job.run(generator)).collect()
}
