//! Candidate scoring (§4.7): dendrogram persistence combined with a
//! caller-supplied compactness score into "variance stability".

use crate::dendrogram::{Dendrogram, LinkId, Member};

/// Persistence of candidate link `id`: the sum, over its two children, of
/// `(child.lambda_min - link.lambda_min) * child.size` for children that are
/// themselves candidates, or `0.0` for pruned/leaf children (§4.7).
///
/// Pruned and leaf children contribute nothing: their points never existed
/// as a smaller candidate, so they are treated as departing at `id`'s own
/// birth rather than at some earlier lambda.
#[must_use]
pub fn persistence(dendrogram: &Dendrogram, id: LinkId, min_cluster_size: usize) -> f64 {
    let link = dendrogram.link(id);
    let mut total = 0.0_f64;
    for child in link.children().iter().flatten() {
        if let Member::Link(child_id) = child {
            let child_link = dendrogram.link(*child_id);
            if child_link.size() >= min_cluster_size {
                let delta_lambda = f64::from(child_link.lambda_min()) - f64::from(link.lambda_min());
                total += delta_lambda * child_link.size() as f64;
            }
        }
    }
    total
}

/// Scores candidate `id` as compactness × persistence, where `compactness`
/// is the caller-supplied score capability applied to the candidate's member
/// points (§4.1, §4.7).
///
/// # Errors
/// None directly; `score` is expected to be total (infallible). Callers
/// needing a fallible score should pre-validate before [`Run`](crate::Clustering::run).
#[must_use]
pub fn score_candidate<S>(
    dendrogram: &Dendrogram,
    id: LinkId,
    min_cluster_size: usize,
    score: &S,
    points: &[Vec<f32>],
) -> f32
where
    S: Fn(&[usize], &[Vec<f32>]) -> f32,
{
    let link = dendrogram.link(id);
    let compactness = score(link.points(), points);
    let persistence = persistence(dendrogram, id, min_cluster_size) as f32;
    compactness * persistence
}
