//! The dendrogram (link tree) builder (§4.5): single-linkage agglomeration
//! over ascending-weight mutual-reachability edges, backed by a disjoint-set
//! structure over point indices.
//!
//! Parent/child references are cyclic by nature (a link's parent points back
//! at it, its children point back at their parent), so the tree is an arena
//! (`Vec<Link>`) indexed by [`LinkId`] rather than an owning tree of `Rc`s —
//! see Design Notes §9. Leaves (individual points) are never materialized as
//! arena entries; a link's children may reference a bare point index
//! directly.

use tracing::instrument;

use crate::mutual_reachability::Edge;

/// Arena index of a [`Link`]. Distinct from [`Link::id`], which is the
/// externally-visible identifier starting at `n` (§3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinkId(pub(crate) usize);

impl LinkId {
    /// Returns the raw arena index backing this id.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// One side of a merge: either a bare point index (a leaf) or a previously
/// minted link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Member {
    /// A leaf — an individual point, not materialized as an arena entry.
    Point(usize),
    /// A non-leaf child: a previously-minted link.
    Link(LinkId),
}

/// A single dendrogram node (§3): the record of one agglomerative merge.
#[derive(Clone, Debug, PartialEq)]
pub struct Link {
    id: usize,
    weight: f32,
    lambda_min: f32,
    size: usize,
    points: Vec<usize>,
    parent: Option<LinkId>,
    children: [Option<Member>; 2],
    delta: bool,
}

impl Link {
    /// Externally-visible identifier, assigned past `n` in agglomeration
    /// order (§3).
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    /// The MST edge weight that caused this merge.
    #[must_use]
    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// `1 / weight`, or `+inf` when `weight == 0.0`.
    #[must_use]
    pub fn lambda_min(&self) -> f32 {
        self.lambda_min
    }

    /// Count of points under this link.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// The set of point indices under this link, in ascending order.
    #[must_use]
    pub fn points(&self) -> &[usize] {
        &self.points
    }

    /// The link that consumed this one, if any.
    #[must_use]
    pub fn parent(&self) -> Option<LinkId> {
        self.parent
    }

    /// The up-to-two links/points merged to form this one.
    #[must_use]
    pub fn children(&self) -> &[Option<Member>; 2] {
        &self.children
    }

    /// Whether this link currently survives selection (§4.7). Candidates
    /// start `true`; [`crate::selection::select_clusters`] flips this to
    /// `false` on any candidate that is replaced by the union of its
    /// selected descendants.
    #[must_use]
    pub fn delta(&self) -> bool {
        self.delta
    }

    pub(crate) fn set_delta(&mut self, delta: bool) {
        self.delta = delta;
    }

    fn is_candidate(&self, min_cluster_size: usize) -> bool {
        self.size >= min_cluster_size
    }
}

/// The forest of links produced by single-linkage agglomeration (§4.5),
/// plus the top-level components ([`Dendrogram::roots`]) it resolved into.
#[derive(Clone, Debug)]
pub struct Dendrogram {
    links: Vec<Link>,
    roots: Vec<Member>,
}

impl Dendrogram {
    /// The link arena, indexed by [`LinkId`].
    #[must_use]
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Mutable access to the link arena, used by [`crate::selection`] to
    /// flip `delta` flags during the selection pass.
    pub(crate) fn links_mut(&mut self) -> &mut [Link] {
        &mut self.links
    }

    /// The roots of the forest: one per connected component of the input
    /// edge set.
    #[must_use]
    pub fn roots(&self) -> &[Member] {
        &self.roots
    }

    /// Returns the link at `id`.
    #[must_use]
    pub fn link(&self, id: LinkId) -> &Link {
        &self.links[id.0]
    }

    /// Candidate links (§4.6): those whose `size >= min_cluster_size`.
    /// Leaves and sub-threshold links remain in the tree to preserve point
    /// membership and ancestry, but are skipped here.
    pub fn candidates(&self, min_cluster_size: usize) -> impl Iterator<Item = LinkId> + '_ {
        self.links
            .iter()
            .enumerate()
            .filter(move |(_, link)| link.is_candidate(min_cluster_size))
            .map(|(index, _)| LinkId(index))
    }
}

struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
    component_member: Vec<Member>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
            component_member: (0..n).map(Member::Point).collect(),
        }
    }

    fn find(&mut self, mut node: usize) -> usize {
        let mut root = node;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        while self.parent[node] != node {
            let parent = self.parent[node];
            self.parent[node] = root;
            node = parent;
        }
        root
    }

    fn union(&mut self, left: usize, right: usize) -> usize {
        let mut left = self.find(left);
        let mut right = self.find(right);
        if left == right {
            return left;
        }
        if self.rank[left] < self.rank[right] {
            std::mem::swap(&mut left, &mut right);
        }
        self.parent[right] = left;
        if self.rank[left] == self.rank[right] {
            self.rank[left] = self.rank[left].saturating_add(1);
        }
        left
    }
}

fn member_size(member: Member, links: &[Link]) -> usize {
    match member {
        Member::Point(_) => 1,
        Member::Link(id) => links[id.0].size,
    }
}

fn member_points(member: Member, links: &[Link]) -> Vec<usize> {
    match member {
        Member::Point(index) => vec![index],
        Member::Link(id) => links[id.0].points.clone(),
    }
}

fn lambda_of_weight(weight: f32) -> f32 {
    if weight == 0.0 {
        f32::INFINITY
    } else {
        1.0 / weight
    }
}

/// Builds the dendrogram (§4.5) from `n` points and their edges, which must
/// already be in ascending-weight order (both [`crate::mst::build_mst`] and
/// [`crate::mutual_reachability::all_edges_sorted`] guarantee this).
///
/// Edges that would create a cycle are skipped, so this also implements the
/// "alternative path" of §4.4: feeding it every mutual-reachability edge
/// (rather than only the `n - 1` MST edges) still produces the correct
/// single-linkage hierarchy, just with more skipped work.
#[instrument(skip(edges), fields(n = n, edges = edges.len()))]
pub fn build(n: usize, edges: &[Edge]) -> Dendrogram {
    let mut dsu = DisjointSet::new(n);
    let mut links: Vec<Link> = Vec::with_capacity(n.saturating_sub(1));

    for edge in edges {
        let left_root = dsu.find(edge.source());
        let right_root = dsu.find(edge.target());
        if left_root == right_root {
            continue;
        }

        let left_member = dsu.component_member[left_root];
        let right_member = dsu.component_member[right_root];

        let mut points = member_points(left_member, &links);
        points.extend(member_points(right_member, &links));
        points.sort_unstable();

        let size = member_size(left_member, &links) + member_size(right_member, &links);
        let weight = edge.weight();
        let new_index = links.len();
        let new_id = LinkId(new_index);

        links.push(Link {
            id: n + new_index,
            weight,
            lambda_min: lambda_of_weight(weight),
            size,
            points,
            parent: None,
            children: [Some(left_member), Some(right_member)],
            delta: true,
        });

        if let Member::Link(child_id) = left_member {
            links[child_id.0].parent = Some(new_id);
        }
        if let Member::Link(child_id) = right_member {
            links[child_id.0].parent = Some(new_id);
        }

        let merged_root = dsu.union(left_root, right_root);
        dsu.component_member[merged_root] = Member::Link(new_id);
    }

    let mut roots = Vec::new();
    for point in 0..n {
        let root = dsu.find(point);
        if root == point {
            roots.push(dsu.component_member[root]);
        }
    }

    Dendrogram { links, roots }
}
