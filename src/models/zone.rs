use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ScoringError;

/// Directed travel time between two zones of one company.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ZoneTravelTime {
    pub id: String,
    pub company_id: String,
    pub from_zone_id: String,
    pub to_zone_id: String,
    pub travel_minutes: u32,
}

/// Lookup table over ordered (from, to) zone pairs.
#[derive(Debug, Clone, Default)]
pub struct TravelTable {
    minutes: HashMap<(String, String), u32>,
}

impl TravelTable {
    pub fn build(entries: &[ZoneTravelTime]) -> Result<Self, ScoringError> {
        let mut minutes = HashMap::with_capacity(entries.len());

        for entry in entries {
            let key = (entry.from_zone_id.clone(), entry.to_zone_id.clone());
            if minutes.insert(key, entry.travel_minutes).is_some() {
                return Err(ScoringError::InvalidInput(format!(
                    "duplicate travel time for zones {} -> {}",
                    entry.from_zone_id, entry.to_zone_id
                )));
            }
        }

        Ok(Self { minutes })
    }

    pub fn directed(&self, from: &str, to: &str) -> Option<u32> {
        self.minutes
            .get(&(from.to_string(), to.to_string()))
            .copied()
    }

    /// Minutes from `from` to `to`, falling back to the reverse edge.
    pub fn between(&self, from: &str, to: &str) -> Option<u32> {
        self.directed(from, to).or_else(|| self.directed(to, from))
    }
}

#[cfg(test)]
mod tests {
    use super::{TravelTable, ZoneTravelTime};

    fn edge(from: &str, to: &str, minutes: u32) -> ZoneTravelTime {
        ZoneTravelTime {
            id: format!("{from}-{to}"),
            company_id: "acme".to_string(),
            from_zone_id: from.to_string(),
            to_zone_id: to.to_string(),
            travel_minutes: minutes,
        }
    }

    #[test]
    fn directed_lookup_prefers_exact_edge() {
        let table = TravelTable::build(&[edge("z1", "z2", 10), edge("z2", "z1", 25)]).unwrap();
        assert_eq!(table.between("z1", "z2"), Some(10));
        assert_eq!(table.between("z2", "z1"), Some(25));
    }

    #[test]
    fn reverse_edge_is_used_when_forward_is_missing() {
        let table = TravelTable::build(&[edge("z1", "z2", 10)]).unwrap();
        assert_eq!(table.directed("z2", "z1"), None);
        assert_eq!(table.between("z2", "z1"), Some(10));
        assert_eq!(table.between("z1", "z3"), None);
    }

    #[test]
    fn duplicate_ordered_pair_is_rejected() {
        let result = TravelTable::build(&[edge("z1", "z2", 10), edge("z1", "z2", 12)]);
        assert!(result.is_err());
    }
}
