//! Which lanelets a participant may use, and how they connect.

use std::collections::HashMap;

use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;

use abstutil::Timer;
use geom::HashablePt2D;

use crate::{Lanelet, LaneletID, Map, Participant, Regulation};

/// The traffic rules for one kind of participant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrafficRules {
    participant: Participant,
}

impl TrafficRules {
    pub fn for_participant(participant: Participant) -> TrafficRules {
        TrafficRules { participant }
    }

    /// The lanelet's type has to allow the participant, and so does every access restriction
    /// attached to it.
    pub fn can_pass(&self, map: &Map, lanelet: &Lanelet) -> bool {
        if !lanelet.subtype.allows(self.participant) {
            return false;
        }
        for id in &lanelet.regulatory_elements {
            let regem = match map.maybe_get_regem(*id) {
                Some(r) => r,
                None => continue,
            };
            match &regem.regulation {
                Regulation::RegionAccess { participants } => {
                    if !participants.contains(&self.participant) {
                        return false;
                    }
                }
                Regulation::MaxSpeed(_) | Regulation::MinSpeed(_) | Regulation::StopLine => {}
            }
        }
        true
    }
}

/// Lanelets are nodes; an edge from A to B means a participant can drive straight from the end of
/// A into the start of B. Lane changes aren't represented.
pub struct RoutingGraph {
    graph: DiGraphMap<LaneletID, ()>,
}

impl RoutingGraph {
    /// Built on demand; cheap enough to redo after the map changes.
    pub fn build(map: &Map, rules: &TrafficRules) -> RoutingGraph {
        let mut timer = Timer::new(format!("build routing graph for {:?}", rules.participant));
        let mut graph = DiGraphMap::new();
        let mut by_start: HashMap<(HashablePt2D, HashablePt2D), Vec<LaneletID>> = HashMap::new();
        for l in map.all_lanelets() {
            if !rules.can_pass(map, l) {
                continue;
            }
            graph.add_node(l.id);
            by_start
                .entry((
                    l.left_bound.first_pt().to_snapped_hashable(),
                    l.right_bound.first_pt().to_snapped_hashable(),
                ))
                .or_insert_with(Vec::new)
                .push(l.id);
        }

        for l in map.all_lanelets() {
            if !graph.contains_node(l.id) {
                continue;
            }
            let end = (
                l.left_bound.last_pt().to_snapped_hashable(),
                l.right_bound.last_pt().to_snapped_hashable(),
            );
            if let Some(next) = by_start.get(&end) {
                for to in next {
                    if *to != l.id {
                        graph.add_edge(l.id, *to, ());
                    }
                }
            }
        }
        timer.note(format!(
            "{} passable lanelets, {} connections",
            graph.node_count(),
            graph.edge_count()
        ));
        timer.done();

        RoutingGraph { graph }
    }

    pub fn contains(&self, id: LaneletID) -> bool {
        self.graph.contains_node(id)
    }

    /// Lanelets directly reachable from the end of this one. Empty if this lanelet isn't
    /// passable.
    pub fn following(&self, id: LaneletID) -> Vec<LaneletID> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Lanelets leading directly into this one.
    pub fn previous(&self, id: LaneletID) -> Vec<LaneletID> {
        self.neighbors(id, Direction::Incoming)
    }

    fn neighbors(&self, id: LaneletID, dir: Direction) -> Vec<LaneletID> {
        if !self.graph.contains_node(id) {
            return Vec::new();
        }
        let mut result: Vec<LaneletID> = self.graph.neighbors_directed(id, dir).collect();
        result.sort();
        result
    }
}
