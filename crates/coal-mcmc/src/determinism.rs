use coal_core::derive_substream_seed;

/// Derives the seed of chain `chain_index`.
///
/// Chain zero uses the master seed itself, so a single-chain run is
/// reproducible from the configured seed alone.
pub fn chain_seed(master_seed: u64, chain_index: usize) -> u64 {
    if chain_index == 0 {
        master_seed
    } else {
        derive_substream_seed(master_seed, chain_index as u64)
    }
}
