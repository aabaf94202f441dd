use crate::prelude::{Candidate, Epoch};

/// Any measurement provider should implement [ObservationSource]
/// to feed the epoch processor.
pub trait ObservationSource {
    /// Sampling [Epoch]s available for this site, within `[begin, end]`,
    /// in chronological order.
    fn epochs(&self, site: &str, begin: Epoch, end: Epoch) -> Vec<Epoch>;

    /// Ordered list of [Candidate]s observed by this site at this [Epoch].
    /// May be empty.
    fn observations(&self, site: &str, epoch: Epoch) -> Vec<Candidate>;
}
