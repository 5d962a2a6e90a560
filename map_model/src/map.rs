//! A bunch of (mostly read-only) queries on a Map, plus the few mutations a regulatory-element
//! update needs.

use std::collections::{BTreeMap, HashSet};

use anyhow::Result;

use abstutil::Timer;
use geom::{Distance, Pt2D};

use crate::{
    Area, AreaID, ElementID, Lanelet, LaneletID, LaneletIndex, Map, MapConfig, RegulatoryElement,
    RegulatoryElementID,
};

impl Map {
    /// Assembles a map from its parts. IDs must be unique within each kind. Attachments to
    /// regulatory elements that don't exist are allowed here; `conformance::ensure_compliance`
    /// cleans them up.
    pub fn create(
        name: String,
        lanelets: Vec<Lanelet>,
        areas: Vec<Area>,
        regulatory_elements: Vec<RegulatoryElement>,
        config: MapConfig,
        timer: &mut Timer,
    ) -> Result<Map> {
        timer.start(format!("assemble map {}", name));
        let mut map = Map {
            name,
            lanelets: BTreeMap::new(),
            areas: BTreeMap::new(),
            regulatory_elements: BTreeMap::new(),
            next_regulatory_element_id: 0,
            config,
            lanelet_index: LaneletIndex::default(),
        };
        for l in lanelets {
            if map.lanelets.contains_key(&l.id) {
                bail!("Duplicate {}", l.id);
            }
            map.lanelets.insert(l.id, l);
        }
        for a in areas {
            if map.areas.contains_key(&a.id) {
                bail!("Duplicate {}", a.id);
            }
            map.areas.insert(a.id, a);
        }
        for regem in regulatory_elements {
            if map.regulatory_elements.contains_key(&regem.id) {
                bail!("Duplicate {}", regem.id);
            }
            map.next_regulatory_element_id =
                map.next_regulatory_element_id.max(regem.id.0 + 1);
            map.regulatory_elements.insert(regem.id, regem);
        }
        map.rebuild_index();
        timer.note(format!(
            "{} has {} lanelets, {} areas, {} regulatory elements",
            map.name,
            map.lanelets.len(),
            map.areas.len(),
            map.regulatory_elements.len()
        ));
        timer.stop(format!("assemble map {}", map.name));
        Ok(map)
    }

    pub fn blank() -> Map {
        Map {
            name: "blank".to_string(),
            lanelets: BTreeMap::new(),
            areas: BTreeMap::new(),
            regulatory_elements: BTreeMap::new(),
            next_regulatory_element_id: 0,
            config: MapConfig::default(),
            lanelet_index: LaneletIndex::default(),
        }
    }

    /// Decodes the binary format that both inbound map updates and published maps use.
    pub fn from_binary(raw: &[u8]) -> Result<Map> {
        let mut map: Map = abstutil::from_binary(raw)?;
        map.after_decode();
        Ok(map)
    }

    pub fn to_binary(&self) -> Result<Vec<u8>> {
        abstutil::to_binary(self)
    }

    pub fn from_json(raw: &[u8]) -> Result<Map> {
        let mut map: Map = abstutil::from_json(raw)?;
        map.after_decode();
        Ok(map)
    }

    pub fn to_json(&self) -> Result<String> {
        abstutil::to_json(self)
    }

    /// Derived state isn't trusted from the input.
    fn after_decode(&mut self) {
        if let Some(max) = self.regulatory_elements.keys().next_back() {
            if self.next_regulatory_element_id <= max.0 {
                warn!(
                    "{} claims the next regulatory element ID is {}, but {} exists",
                    self.name, self.next_regulatory_element_id, max
                );
                self.next_regulatory_element_id = max.0 + 1;
            }
        }
        self.rebuild_index();
    }

    fn rebuild_index(&mut self) {
        self.lanelet_index = LaneletIndex::new(self.lanelets.values());
        debug!("Indexed {} lanelets of {}", self.lanelet_index.len(), self.name);
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_config(&self) -> &MapConfig {
        &self.config
    }

    /// Conformance and the lifecycle controller may want to override what a decoded map says.
    pub fn set_config(&mut self, config: MapConfig) {
        self.config = config;
    }

    pub fn all_lanelets(&self) -> impl Iterator<Item = &Lanelet> {
        self.lanelets.values()
    }

    pub fn all_areas(&self) -> impl Iterator<Item = &Area> {
        self.areas.values()
    }

    pub fn all_regulatory_elements(&self) -> impl Iterator<Item = &RegulatoryElement> {
        self.regulatory_elements.values()
    }

    pub fn maybe_get_l(&self, id: LaneletID) -> Option<&Lanelet> {
        self.lanelets.get(&id)
    }

    pub fn maybe_get_a(&self, id: AreaID) -> Option<&Area> {
        self.areas.get(&id)
    }

    pub fn maybe_get_regem(&self, id: RegulatoryElementID) -> Option<&RegulatoryElement> {
        self.regulatory_elements.get(&id)
    }

    pub fn get_l(&self, id: LaneletID) -> &Lanelet {
        &self.lanelets[&id]
    }

    pub fn get_regem(&self, id: RegulatoryElementID) -> &RegulatoryElement {
        &self.regulatory_elements[&id]
    }

    pub fn element_exists(&self, id: ElementID) -> bool {
        match id {
            ElementID::Lanelet(l) => self.maybe_get_l(l).is_some(),
            ElementID::Area(a) => self.maybe_get_a(a).is_some(),
        }
    }

    /// None if the element doesn't exist.
    pub fn regulatory_elements_of(&self, id: ElementID) -> Option<&[RegulatoryElementID]> {
        match id {
            ElementID::Lanelet(l) => self.maybe_get_l(l).map(|l| &l.regulatory_elements[..]),
            ElementID::Area(a) => self.maybe_get_a(a).map(|a| &a.regulatory_elements[..]),
        }
    }

    fn regulatory_elements_of_mut(
        &mut self,
        id: ElementID,
    ) -> Option<&mut Vec<RegulatoryElementID>> {
        match id {
            ElementID::Lanelet(l) => self
                .lanelets
                .get_mut(&l)
                .map(|l| &mut l.regulatory_elements),
            ElementID::Area(a) => self.areas.get_mut(&a).map(|a| &mut a.regulatory_elements),
        }
    }

    /// Visits lanelets in increasing order of bounding-box distance from `pt`, until `stop`
    /// returns true. The bounding-box distance is a lower bound on the distance to the lanelet
    /// itself, so once it exceeds some cutoff, nothing later can be within the cutoff.
    pub fn nearest_lanelets_until<F: FnMut(Distance, &Lanelet) -> bool>(
        &self,
        pt: Pt2D,
        mut stop: F,
    ) {
        for id in self.lanelet_index.nearest(pt) {
            let l = &self.lanelets[&id];
            let (min, max) = l.polygon().get_bounds().corners();
            let dx = (min[0] - pt.x()).max(pt.x() - max[0]).max(0.0);
            let dy = (min[1] - pt.y()).max(pt.y() - max[1]).max(0.0);
            if stop(Distance::meters(dx.hypot(dy)), l) {
                return;
            }
        }
    }

    pub fn new_regulatory_element_id(&mut self) -> RegulatoryElementID {
        let id = RegulatoryElementID(self.next_regulatory_element_id);
        self.next_regulatory_element_id += 1;
        id
    }

    /// Adds the regulatory element to the layer if it isn't there already, then attaches it to
    /// the element. Attaching twice is a no-op. Fails if the element is missing, or if a
    /// different regulatory element already has the same ID.
    pub fn attach_regulatory_element(
        &mut self,
        element: ElementID,
        regem: RegulatoryElement,
    ) -> Result<()> {
        if !self.element_exists(element) {
            bail!("Can't attach {} to {}; it doesn't exist", regem, element);
        }
        if let Some(existing) = self.regulatory_elements.get(&regem.id) {
            if existing != &regem {
                bail!(
                    "Can't attach {} to {}; the layer already has {}",
                    regem,
                    element,
                    existing
                );
            }
        }

        let id = regem.id;
        self.next_regulatory_element_id = self.next_regulatory_element_id.max(id.0 + 1);
        self.regulatory_elements.entry(id).or_insert(regem);
        if let Some(list) = self.regulatory_elements_of_mut(element) {
            if !list.contains(&id) {
                list.push(id);
            }
        }
        Ok(())
    }

    /// Removes the regulatory element from the layer and detaches it from everything that
    /// referenced it. Returns None if the layer didn't have it, but still detaches dangling
    /// references.
    pub fn remove_regulatory_element(
        &mut self,
        id: RegulatoryElementID,
    ) -> Option<RegulatoryElement> {
        let removed = self.regulatory_elements.remove(&id);
        let mut detached = 0;
        for l in self.lanelets.values_mut() {
            let before = l.regulatory_elements.len();
            l.regulatory_elements.retain(|x| *x != id);
            detached += before - l.regulatory_elements.len();
        }
        for a in self.areas.values_mut() {
            let before = a.regulatory_elements.len();
            a.regulatory_elements.retain(|x| *x != id);
            detached += before - a.regulatory_elements.len();
        }
        debug!("Removed {} from the map, detaching it from {} elements", id, detached);
        removed
    }

    /// Drops the listed IDs from one element's attachments, without touching the layer.
    pub(crate) fn retain_attachments<F: Fn(&RegulatoryElementID) -> bool>(
        &mut self,
        element: ElementID,
        keep: F,
    ) -> usize {
        match self.regulatory_elements_of_mut(element) {
            Some(list) => {
                let before = list.len();
                let mut seen = HashSet::new();
                list.retain(|id| keep(id) && seen.insert(*id));
                before - list.len()
            }
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use geom::Speed;

    use super::*;
    use crate::{LaneletType, Regulation};

    fn lanelet(id: usize, x1: f64, x2: f64) -> Lanelet {
        Lanelet::straight(
            LaneletID(id),
            Pt2D::new(x1, 0.0),
            Pt2D::new(x2, 0.0),
            Distance::meters(4.0),
            LaneletType::Road,
        )
        .unwrap()
    }

    fn two_lanelets() -> Map {
        Map::create(
            "test".to_string(),
            vec![lanelet(1, 0.0, 10.0), lanelet(2, 10.0, 20.0)],
            Vec::new(),
            Vec::new(),
            MapConfig::default(),
            &mut Timer::throwaway(),
        )
        .unwrap()
    }

    fn max_speed(id: RegulatoryElementID, mph: f64) -> RegulatoryElement {
        RegulatoryElement {
            id,
            regulation: Regulation::MaxSpeed(Speed::miles_per_hour(mph)),
        }
    }

    #[test]
    fn shared_attachment_and_removal() {
        let mut map = two_lanelets();
        let id = map.new_regulatory_element_id();
        let regem = max_speed(id, 25.0);
        map.attach_regulatory_element(ElementID::Lanelet(LaneletID(1)), regem.clone())
            .unwrap();
        map.attach_regulatory_element(ElementID::Lanelet(LaneletID(2)), regem.clone())
            .unwrap();
        // Attaching twice doesn't duplicate
        map.attach_regulatory_element(ElementID::Lanelet(LaneletID(2)), regem.clone())
            .unwrap();
        assert_eq!(map.all_regulatory_elements().count(), 1);
        assert_eq!(map.get_l(LaneletID(2)).regulatory_elements, vec![id]);

        assert_eq!(map.remove_regulatory_element(id), Some(regem));
        assert!(map.get_l(LaneletID(1)).regulatory_elements.is_empty());
        assert!(map.get_l(LaneletID(2)).regulatory_elements.is_empty());
        assert_eq!(map.remove_regulatory_element(id), None);

        // IDs aren't reused after removal
        assert_ne!(map.new_regulatory_element_id(), id);
    }

    #[test]
    fn attach_failures() {
        let mut map = two_lanelets();
        let id = map.new_regulatory_element_id();
        assert!(map
            .attach_regulatory_element(ElementID::Lanelet(LaneletID(99)), max_speed(id, 25.0))
            .is_err());
        assert_eq!(map.all_regulatory_elements().count(), 0);

        map.attach_regulatory_element(ElementID::Lanelet(LaneletID(1)), max_speed(id, 25.0))
            .unwrap();
        assert!(map
            .attach_regulatory_element(ElementID::Lanelet(LaneletID(2)), max_speed(id, 30.0))
            .is_err());
    }

    #[test]
    fn nearest_search_stops_early() {
        let map = two_lanelets();
        let mut visited = Vec::new();
        map.nearest_lanelets_until(Pt2D::new(5.0, 0.0), |dist, l| {
            if dist > Distance::meters(4.0) {
                return true;
            }
            visited.push(l.id);
            false
        });
        assert_eq!(visited, vec![LaneletID(1)]);

        let mut visited = Vec::new();
        map.nearest_lanelets_until(Pt2D::new(10.0, 0.0), |_, l| {
            visited.push(l.id);
            false
        });
        visited.sort();
        assert_eq!(visited, vec![LaneletID(1), LaneletID(2)]);
    }

    #[test]
    fn binary_codec_rebuilds_index() {
        let mut map = two_lanelets();
        let id = map.new_regulatory_element_id();
        map.attach_regulatory_element(ElementID::Lanelet(LaneletID(1)), max_speed(id, 25.0))
            .unwrap();

        let decoded = Map::from_binary(&map.to_binary().unwrap()).unwrap();
        assert_eq!(decoded.get_l(LaneletID(1)).regulatory_elements, vec![id]);
        assert_eq!(decoded.get_regem(id), map.get_regem(id));
        let mut found = None;
        decoded.nearest_lanelets_until(Pt2D::new(15.0, 1.0), |_, l| {
            found = Some(l.id);
            true
        });
        assert_eq!(found, Some(LaneletID(2)));

        assert!(Map::from_binary(b"definitely not a map").is_err());
    }

    #[test]
    fn blank_map() {
        let mut map = Map::blank();
        assert!(!map.element_exists(ElementID::Lanelet(LaneletID(1))));
        assert!(map.regulatory_elements_of(ElementID::Area(AreaID(1))).is_none());
        let id = map.new_regulatory_element_id();
        assert!(map
            .attach_regulatory_element(ElementID::Area(AreaID(1)), max_speed(id, 25.0))
            .is_err());
        let mut visited = 0;
        map.nearest_lanelets_until(Pt2D::new(0.0, 0.0), |_, _| {
            visited += 1;
            false
        });
        assert_eq!(visited, 0);
    }

    #[test]
    fn decoding_reseeds_regulatory_element_ids() {
        let mut map = two_lanelets();
        let id = map.new_regulatory_element_id();
        map.attach_regulatory_element(ElementID::Lanelet(LaneletID(1)), max_speed(id, 25.0))
            .unwrap();

        let mut raw: serde_json::Value = serde_json::from_str(&map.to_json().unwrap()).unwrap();
        raw["next_regulatory_element_id"] = serde_json::json!(0);
        let mut decoded = Map::from_json(raw.to_string().as_bytes()).unwrap();
        let fresh = decoded.new_regulatory_element_id();
        assert_ne!(fresh, id);
        assert!(decoded.maybe_get_regem(fresh).is_none());
        decoded
            .attach_regulatory_element(ElementID::Lanelet(LaneletID(2)), max_speed(fresh, 45.0))
            .unwrap();
    }
}
