//! Optimal antichain selection (§4.7): a bottom-up pass over dendrogram
//! candidates that chooses, at each branch, between a candidate and the
//! union of its already-selected descendants.

use crate::dendrogram::{Dendrogram, LinkId, Member};
use crate::scoring::score_candidate;

/// Runs the bottom-up selection pass and returns the selected candidates'
/// link ids, ascending.
///
/// The dendrogram's arena is built in ascending merge order (§4.5), and
/// weight/size are monotone non-decreasing root-ward, so a single forward
/// scan over arena indices already visits every link after both of its
/// children — no separate topological sort is needed.
///
/// Every non-candidate link (leaf or pruned subtree) has its `delta` flag
/// forced to `false`: only candidates ever become output clusters.
pub fn select_clusters<S>(
    dendrogram: &mut Dendrogram,
    min_cluster_size: usize,
    score: &S,
    points: &[Vec<f32>],
) -> Vec<LinkId>
where
    S: Fn(&[usize], &[Vec<f32>]) -> f32,
{
    let len = dendrogram.links().len();
    let mut selected_score = vec![0.0_f64; len];
    let mut selected_frontier: Vec<Vec<LinkId>> = vec![Vec::new(); len];

    for index in 0..len {
        let id = LinkId(index);
        let link = dendrogram.link(id);
        let is_candidate = link.size() >= min_cluster_size;

        let mut child_sum = 0.0_f64;
        let mut child_frontier: Vec<LinkId> = Vec::new();
        for child in link.children().iter().flatten() {
            if let Member::Link(child_id) = child {
                child_sum += selected_score[child_id.index()];
                child_frontier.append(&mut selected_frontier[child_id.index()].clone());
            }
        }

        if is_candidate {
            let s_self = f64::from(score_candidate(dendrogram, id, min_cluster_size, score, points));
            if s_self >= child_sum {
                for descendant in &child_frontier {
                    dendrogram.links_mut()[descendant.index()].set_delta(false);
                }
                dendrogram.links_mut()[index].set_delta(true);
                selected_score[index] = s_self;
                selected_frontier[index] = vec![id];
            } else {
                dendrogram.links_mut()[index].set_delta(false);
                selected_score[index] = child_sum;
                selected_frontier[index] = child_frontier;
            }
        } else {
            dendrogram.links_mut()[index].set_delta(false);
            selected_score[index] = child_sum;
            selected_frontier[index] = child_frontier;
        }
    }

    let mut selected: Vec<LinkId> = dendrogram
        .roots()
        .iter()
        .filter_map(|root| match root {
            Member::Link(id) => Some(selected_frontier[id.index()].clone()),
            Member::Point(_) => None,
        })
        .flatten()
        .collect();
    selected.sort_unstable();
    selected
}
