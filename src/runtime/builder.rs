use std::sync::Arc;

use tracing::{debug, error, info_span};

use super::{ComponentSlot, Runtime, RuntimeLimit, Simulation, VoteTally};
use crate::net::{ComponentInit, ConfigError, ElementRegistry, Link, Rank, TopologyDef};
use crate::time::SimTime;

/// A builder for a simulation instance.
#[must_use]
#[derive(Debug, Clone, Default)]
pub struct Builder {
    pub(super) quiet: bool,
    pub(super) limit: RuntimeLimit,
}

impl Builder {
    /// Creates a new unconfigured builder.
    pub fn new() -> Builder {
        Builder {
            quiet: false,
            limit: RuntimeLimit::None,
        }
    }

    ///
    /// Suppresses runtime messages from the simulation framework.
    ///
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    ///
    /// Limits the number of events each rank dispatches.
    ///
    pub fn max_itr(mut self, max_itr: usize) -> Self {
        self.limit.add(RuntimeLimit::EventCount(max_itr));
        self
    }

    ///
    /// Changes the maximum time of the simulation (default: inf).
    ///
    pub fn max_time(mut self, max_time: SimTime) -> Self {
        self.limit.add(RuntimeLimit::SimTime(max_time));
        self
    }

    ///
    /// Adds a custom limit, stopping when either this or
    /// any previously set limit applies.
    ///
    pub fn limit(mut self, limit: RuntimeLimit) -> Self {
        self.limit.add(limit);
        self
    }

    ///
    /// Builds a new [`Simulation`] from a topology, creating every
    /// component with the factory registered for its type.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found in the topology or
    /// raised by a factory. No simulation is created in this case.
    ///
    pub fn build(
        self,
        topology: &TopologyDef,
        registry: &ElementRegistry,
    ) -> Result<Simulation, ConfigError> {
        let resolved = topology.resolve(registry).map_err(|e| {
            error!("{e}");
            e
        })?;

        let mut ranks = resolved.components.iter().map(|c| c.rank).collect::<Vec<_>>();
        ranks.sort_unstable();
        ranks.dedup();
        if ranks.is_empty() {
            ranks.push(Rank(0));
        }

        let tallies = ranks.iter().map(|_| VoteTally::new()).collect::<Vec<_>>();
        let mut slots = ranks
            .iter()
            .map(|_| {
                std::iter::repeat_with(|| None)
                    .take(resolved.components.len())
                    .collect::<Vec<Option<ComponentSlot>>>()
            })
            .collect::<Vec<_>>();

        for (idx, c) in resolved.components.iter().enumerate() {
            let r = ranks.binary_search(&c.rank).unwrap_or_default();
            let mut init = ComponentInit::new(
                c.name,
                c.rank,
                &c.params,
                c.descriptor.ports,
                &c.wiring,
                &tallies[r],
            );

            let span = info_span!("component", name = %c.name, rank = %c.rank);
            let component = span.in_scope(|| (c.descriptor.factory)(&mut init)).map_err(|e| {
                error!("failed to create component '{}': {e}", c.name);
                e
            })?;
            debug!(
                "created component '{}' of type {} on rank {}",
                c.name,
                c.descriptor.type_name(),
                c.rank
            );

            slots[r][idx] = Some(ComponentSlot {
                name: c.name.to_string(),
                component,
                declared: c.descriptor.ports,
                ports: init.into_ports(),
            });
        }

        let lookahead = resolved
            .links
            .iter()
            .filter(|l| l.is_cross_rank())
            .map(Link::latency)
            .min();
        let links: Arc<[Link]> = resolved.links.into();

        let runtimes = ranks
            .into_iter()
            .zip(slots)
            .zip(tallies)
            .map(|((rank, slots), tally)| {
                Runtime::new(rank, slots, links.clone(), tally, self.limit.clone())
            })
            .collect();

        Ok(Simulation {
            runtimes,
            lookahead,
            limit: self.limit,
            quiet: self.quiet,
        })
    }
}

impl Simulation {
    /// Builds a simulation with default options.
    ///
    /// # Errors
    ///
    /// See [`Builder::build`].
    pub fn new(topology: &TopologyDef, registry: &ElementRegistry) -> Result<Self, ConfigError> {
        Builder::new().build(topology, registry)
    }
}
