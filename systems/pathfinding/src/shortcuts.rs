use std::collections::BTreeMap;

use tileworld_core::{NavMesh, TileCoord, TileSize, WalkabilityGrid};

use crate::sight::line_of_sight;

/// Mesh visibility edges projected onto grid indices.
///
/// Each mesh node is snapped to the nearest tile. Nodes landing on blocking
/// tiles are dropped, as are edges whose endpoints collapse onto one tile or
/// lose sight of each other after snapping. Outgoing links are sorted by
/// target index and deduplicated, keeping the cheapest.
#[derive(Debug, Default)]
pub(crate) struct Shortcuts {
    nodes: Vec<TileCoord>,
    links: BTreeMap<usize, Vec<(usize, f32)>>,
}

impl Shortcuts {
    pub(crate) fn snap(mesh: &NavMesh, grid: &WalkabilityGrid, tile_size: TileSize) -> Self {
        let snapped: Vec<_> = mesh
            .nodes()
            .map(|(_, position)| {
                grid.nearest_tile(position, tile_size)
                    .filter(|tile| grid.is_walkable(*tile))
            })
            .collect();

        let mut nodes: Vec<TileCoord> = snapped.iter().flatten().copied().collect();
        nodes.sort_unstable_by_key(|tile| (tile.row(), tile.column()));
        nodes.dedup();

        let mut links: BTreeMap<usize, Vec<(usize, f32)>> = BTreeMap::new();
        for (node, _) in mesh.nodes() {
            let Some(Some(from)) = snapped.get(node.get() as usize).copied() else {
                continue;
            };
            let Some(from_index) = grid.index(from) else {
                continue;
            };
            for other in mesh.visible_from(node) {
                let Some(Some(to)) = snapped.get(other.get() as usize).copied() else {
                    continue;
                };
                if to == from || !line_of_sight(grid, from, to) {
                    continue;
                }
                let Some(to_index) = grid.index(to) else {
                    continue;
                };
                links
                    .entry(from_index)
                    .or_default()
                    .push((to_index, from.euclidean_distance(to)));
            }
        }

        let mut shortcuts = Self { nodes, links };
        shortcuts.normalize();
        shortcuts
    }

    /// Links the route endpoints to every snapped node they can see, and to
    /// each other when the straight segment between them is clear.
    pub(crate) fn attach_endpoints(
        &mut self,
        grid: &WalkabilityGrid,
        start: TileCoord,
        goal: TileCoord,
    ) {
        let mut visible = Vec::new();
        for endpoint in [start, goal] {
            for &node in &self.nodes {
                if node != endpoint && line_of_sight(grid, endpoint, node) {
                    visible.push((endpoint, node));
                }
            }
        }
        if line_of_sight(grid, start, goal) {
            visible.push((start, goal));
        }

        for (a, b) in visible {
            let (Some(a_index), Some(b_index)) = (grid.index(a), grid.index(b)) else {
                continue;
            };
            let cost = a.euclidean_distance(b);
            self.links.entry(a_index).or_default().push((b_index, cost));
            self.links.entry(b_index).or_default().push((a_index, cost));
        }
        self.normalize();
    }

    pub(crate) fn outgoing(&self, index: usize) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.links
            .get(&index)
            .into_iter()
            .flat_map(|outgoing| outgoing.iter().copied())
    }

    fn normalize(&mut self) {
        for outgoing in self.links.values_mut() {
            outgoing.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));
            outgoing.dedup_by_key(|(target, _)| *target);
        }
    }

    #[cfg(test)]
    fn targets(&self, index: usize) -> Vec<usize> {
        self.outgoing(index).map(|(target, _)| target).collect()
    }
}
