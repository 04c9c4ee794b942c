use codechat_code_chunker::Chunk;
use codechat_vector_store::Neighbor;
use std::collections::HashSet;

/// Rank store hits: keep those strictly closer than `similarity_threshold`, order them
/// by ascending distance and drop repeats of the same chunk.
pub fn rank_neighbors(neighbors: Vec<Neighbor>, similarity_threshold: f32) -> Vec<Chunk> {
    rank_chunks(
        neighbors.into_iter().map(Neighbor::into_chunk).collect(),
        similarity_threshold,
    )
}

/// Same as [`rank_neighbors`] for chunks that already carry a distance.
///
/// A chunk without a distance never passes the threshold. The sort is stable, so
/// equal distances keep the store's order; of two equal chunks the first survives.
pub fn rank_chunks(chunks: Vec<Chunk>, similarity_threshold: f32) -> Vec<Chunk> {
    let mut kept: Vec<Chunk> = chunks
        .into_iter()
        .filter(|chunk| {
            chunk
                .distance
                .is_some_and(|distance| distance < similarity_threshold)
        })
        .collect();

    kept.sort_by(|a, b| distance_of(a).total_cmp(&distance_of(b)));

    let first_seen: Vec<bool> = {
        let mut seen = HashSet::with_capacity(kept.len());
        kept.iter().map(|chunk| seen.insert(chunk.dedup_key())).collect()
    };

    kept.into_iter()
        .zip(first_seen)
        .filter_map(|(chunk, first)| first.then_some(chunk))
        .collect()
}

fn distance_of(chunk: &Chunk) -> f32 {
    chunk.distance.unwrap_or(f32::INFINITY)
}
