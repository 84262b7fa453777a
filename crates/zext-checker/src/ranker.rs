//! Dependency ranking
//!
//! Orders definitions so that supertypes and interfaces are compiled before
//! the classes that need them. This is not a topological sort: every edge
//! E -> D adds `rank(D) + 1` to `rank(E)`, visiting definitions in the order
//! given, and the result is sorted ascending with ties kept in that order.
//!
//! A chain declared base-first (A <- B <- C) ranks strictly increasing. When a
//! dependent is visited before its dependency, or through a diamond, ranks
//! can tie and the dependent may sort first. The class graph is assumed to be
//! acyclic; cycles are not detected.

use tracing::{debug, trace};

use zext_model::{ClassId, ClassRegistry};

/// Accumulates dependency ranks over a registry
pub struct DependencyRanker<'a> {
    registry: &'a ClassRegistry,
}

impl<'a> DependencyRanker<'a> {
    pub fn new(registry: &'a ClassRegistry) -> Self {
        Self { registry }
    }

    /// Accumulate ranks for `ids` and return them in compile order.
    ///
    /// Ranks are written back to each definition. They accumulate, so a
    /// definition should be ranked once per compilation.
    pub fn rank(&self, ids: &[ClassId]) -> Vec<ClassId> {
        let _section = self.registry.rank_section();

        for &id in ids {
            let handle = self.registry.get(id);
            let dependencies = handle.read().dependencies(self.registry);

            let mut increase = 0;
            for dependency in dependencies {
                increase += self.registry.get(dependency).read().dependency_rank() + 1;
            }
            if increase > 0 {
                let mut definition = handle.write();
                definition.increase_dependency_rank(increase);
                trace!(
                    class = %definition.complete_name(),
                    rank = definition.dependency_rank(),
                    "increased dependency rank"
                );
            }
        }

        let mut order: Vec<(usize, ClassId)> = ids
            .iter()
            .map(|&id| (self.registry.get(id).read().dependency_rank(), id))
            .collect();
        order.sort_by_key(|(rank, _)| *rank);

        debug!(classes = order.len(), "ranked class dependencies");
        order.into_iter().map(|(_, id)| id).collect()
    }
}
