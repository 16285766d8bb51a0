//! Nested state comparison
//!
//! Walks an expected [`ParameterTree`] against an observed one and records a
//! result for every device, interface and neighbor it checks. The walk is
//! strictly expected → actual: state present only on the actual side is
//! never looked at.
//!
//! ```text
//! device -> interface -> { "neighbors": { router-id -> { attribute: value } } }
//! ```

use crate::results::{ResultCollector, ResultStatus};
use crate::ParameterTree;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;
use tracing::info;

/// Key holding the neighbor table of an interface
pub const NEIGHBORS_KEY: &str = "neighbors";

/// The single neighbor attribute a test case verifies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NeighborAttribute {
    Address,
    Priority,
    State,
}

impl NeighborAttribute {
    /// Key of the attribute in parsed output and in parameter files
    pub fn key(self) -> &'static str {
        match self {
            NeighborAttribute::Address => "address",
            NeighborAttribute::Priority => "priority",
            NeighborAttribute::State => "state",
        }
    }

    /// Human-readable name used in result messages
    pub fn label(self) -> &'static str {
        match self {
            NeighborAttribute::Address => "IP address",
            NeighborAttribute::Priority => "priority",
            NeighborAttribute::State => "state",
        }
    }
}

impl fmt::Display for NeighborAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Malformed input. Mismatches are never errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompareError {
    #[error("Malformed {side} state at '{path}': expected a mapping, found {found}")]
    NotAMapping {
        side: &'static str,
        path: String,
        found: &'static str,
    },
}

const EXPECTED: &str = "expected";
const ACTUAL: &str = "actual";

/// Compares one neighbor attribute across two parameter trees
#[derive(Debug, Clone, Copy)]
pub struct StateComparator {
    attribute: NeighborAttribute,
}

impl StateComparator {
    pub fn new(attribute: NeighborAttribute) -> Self {
        Self { attribute }
    }

    pub fn attribute(&self) -> NeighborAttribute {
        self.attribute
    }

    /// Check that `expected` is satisfied by `actual`.
    ///
    /// Every check is recorded into `results`; a mismatch never stops the
    /// walk. Returns an error only if a level that must be a mapping is not.
    pub fn compare(
        &self,
        actual: &ParameterTree,
        expected: &ParameterTree,
        results: &ResultCollector,
    ) -> Result<(), CompareError> {
        info!("Validating current state of devices against expected parameters");

        for (device, expected_device) in expected {
            info!("Checking current state of device {}", device);
            let expected_interfaces = as_mapping(expected_device, EXPECTED, device)?;

            let Some(actual_device) = actual.get(device) else {
                results.add_result(
                    ResultStatus::Failed,
                    format!("Expected device {} not found in current state", device),
                );
                continue;
            };
            let actual_interfaces = as_mapping(actual_device, ACTUAL, device)?;

            results.add_result(
                ResultStatus::Passed,
                format!("Found expected device {} in current state", device),
            );

            for (interface, expected_interface) in expected_interfaces {
                self.compare_interface(
                    device,
                    interface,
                    expected_interface,
                    actual_interfaces.get(interface),
                    results,
                )?;
            }
        }

        Ok(())
    }

    fn compare_interface(
        &self,
        device: &str,
        interface: &str,
        expected: &Value,
        actual: Option<&Value>,
        results: &ResultCollector,
    ) -> Result<(), CompareError> {
        info!(
            "Checking current state of interface {} on device {}",
            interface, device
        );
        let path = format!("{}/{}", device, interface);
        let expected_neighbors = neighbors_of(expected, EXPECTED, &path)?;

        let Some(actual) = actual else {
            results.add_result(
                ResultStatus::Failed,
                format!(
                    "Interface {} not found in current state for device {}",
                    interface, device
                ),
            );
            return Ok(());
        };
        let actual_neighbors = neighbors_of(actual, ACTUAL, &path)?;

        results.add_result(
            ResultStatus::Passed,
            format!("Found expected interface {} on device {}", interface, device),
        );

        let expected_count = expected_neighbors.map_or(0, Map::len);
        let actual_count = actual_neighbors.map_or(0, Map::len);
        results.add_result(
            ResultStatus::Info,
            format!(
                "Found {} neighbors on interface {} of device {}, expecting {}",
                actual_count, interface, device, expected_count
            ),
        );

        for (neighbor, expected_neighbor) in expected_neighbors.into_iter().flatten() {
            let neighbor_path = format!("{}/{}/{}", path, NEIGHBORS_KEY, neighbor);
            let expected_attrs = as_mapping(expected_neighbor, EXPECTED, &neighbor_path)?;

            let Some(actual_neighbor) = actual_neighbors.and_then(|n| n.get(neighbor)) else {
                results.add_result(
                    ResultStatus::Failed,
                    format!(
                        "Neighbor {} on interface {} not found in current state for device {}",
                        neighbor, interface, device
                    ),
                );
                continue;
            };
            let actual_attrs = as_mapping(actual_neighbor, ACTUAL, &neighbor_path)?;

            self.compare_attribute(
                device,
                interface,
                neighbor,
                expected_attrs.get(self.attribute.key()),
                actual_attrs.get(self.attribute.key()),
                results,
            );
        }

        Ok(())
    }

    fn compare_attribute(
        &self,
        device: &str,
        interface: &str,
        neighbor: &str,
        expected: Option<&Value>,
        actual: Option<&Value>,
        results: &ResultCollector,
    ) {
        let label = self.attribute.label();
        let expected_shown = display_value(expected);
        let actual_shown = display_value(actual);

        info!(
            "Comparing current {} '{}' of neighbor {} on interface {} of device {} against expected {} '{}'",
            label, actual_shown, neighbor, interface, device, label, expected_shown
        );

        // Exact JSON equality: "1" and 1 are different values.
        if actual != expected {
            results.add_result(
                ResultStatus::Failed,
                format!(
                    "The current {label} of neighbor {neighbor} on interface {interface} of device {device} \
                     is {actual_shown}, which does not match the expected {label} of this neighbor \
                     which is {expected_shown}"
                ),
            );
        } else {
            results.add_result(
                ResultStatus::Passed,
                format!(
                    "Neighbor {} on interface {} of device {} {} matches expected: {}",
                    neighbor, interface, device, label, actual_shown
                ),
            );
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a mapping",
    }
}

fn as_mapping<'a>(
    value: &'a Value,
    side: &'static str,
    path: &str,
) -> Result<&'a Map<String, Value>, CompareError> {
    value.as_object().ok_or_else(|| CompareError::NotAMapping {
        side,
        path: path.to_string(),
        found: kind_of(value),
    })
}

/// Neighbor table of an interface entry; a missing table means no neighbors
fn neighbors_of<'a>(
    interface: &'a Value,
    side: &'static str,
    path: &str,
) -> Result<Option<&'a Map<String, Value>>, CompareError> {
    let interface = as_mapping(interface, side, path)?;
    interface
        .get(NEIGHBORS_KEY)
        .map(|n| as_mapping(n, side, &format!("{}/{}", path, NEIGHBORS_KEY)))
        .transpose()
}

fn display_value(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "<missing>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(value: Value) -> ParameterTree {
        match value {
            Value::Object(map) => map,
            _ => panic!("test tree must be an object"),
        }
    }

    fn priority_tree(priority: &str) -> ParameterTree {
        tree(json!({
            "R1": {"Gi0/1": {"neighbors": {"10.0.0.2": {"priority": priority}}}}
        }))
    }

    fn lab_tree() -> ParameterTree {
        tree(json!({
            "R1": {
                "Gi0/1": {"neighbors": {
                    "10.0.0.2": {"priority": "1"},
                    "10.0.0.3": {"priority": "0"}
                }},
                "Gi0/2": {"neighbors": {"10.0.1.2": {"priority": "1"}}}
            },
            "R2": {
                "Gi0/0": {"neighbors": {"10.0.0.1": {"priority": "1"}}}
            }
        }))
    }

    fn failures(results: &ResultCollector) -> Vec<String> {
        results
            .results()
            .into_iter()
            .filter(|r| r.status == ResultStatus::Failed)
            .map(|r| r.message)
            .collect()
    }

    #[test]
    fn test_identical_trees_have_no_failures() {
        let comparator = StateComparator::new(NeighborAttribute::Priority);
        let results = ResultCollector::new();
        let state = lab_tree();

        comparator.compare(&state, &state, &results).unwrap();

        assert_eq!(results.count(ResultStatus::Failed), 0);
        // 4 neighbors, 3 interfaces, 2 devices
        assert_eq!(results.count(ResultStatus::Passed), 4 + 3 + 2);
        assert_eq!(results.status(), ResultStatus::Passed);
    }

    #[test]
    fn test_priority_mismatch_names_every_coordinate() {
        let comparator = StateComparator::new(NeighborAttribute::Priority);
        let results = ResultCollector::new();

        comparator
            .compare(&priority_tree("0"), &priority_tree("1"), &results)
            .unwrap();

        let failed = failures(&results);
        assert_eq!(failed.len(), 1);
        let msg = &failed[0];
        assert!(msg.contains("R1"));
        assert!(msg.contains("Gi0/1"));
        assert!(msg.contains("10.0.0.2"));
        assert!(msg.contains("is 0, which does not match"));
        assert!(msg.contains("which is 1"));
        assert_eq!(results.status(), ResultStatus::Failed);
    }

    #[test]
    fn test_single_leaf_mutation() {
        let comparator = StateComparator::new(NeighborAttribute::Priority);
        let results = ResultCollector::new();
        let expected = lab_tree();
        let mut actual = lab_tree();
        actual["R1"]["Gi0/1"]["neighbors"]["10.0.0.3"]["priority"] = json!("255");

        comparator.compare(&actual, &expected, &results).unwrap();

        let failed = failures(&results);
        assert_eq!(failed.len(), 1);
        assert!(failed[0].contains("10.0.0.3"));
        assert!(failed[0].contains("255"));

        let leaf_passes = results
            .results()
            .into_iter()
            .filter(|r| r.status == ResultStatus::Passed && r.message.contains("matches expected"))
            .count();
        assert_eq!(leaf_passes, 3);
    }

    #[test]
    fn test_extra_actual_state_is_ignored() {
        let comparator = StateComparator::new(NeighborAttribute::Priority);
        let expected = priority_tree("1");
        let mut actual = priority_tree("1");
        actual.insert("R9".into(), json!({"Gi9/9": {"neighbors": {}}}));
        actual["R1"]["Gi0/7"] = json!({"neighbors": {"10.9.9.9": {"priority": "5"}}});
        actual["R1"]["Gi0/1"]["neighbors"]["10.0.0.99"] = json!({"priority": "9"});

        let with_extra = ResultCollector::new();
        comparator.compare(&actual, &expected, &with_extra).unwrap();

        let without_extra = ResultCollector::new();
        comparator.compare(&expected, &expected, &without_extra).unwrap();

        assert_eq!(with_extra.count(ResultStatus::Failed), 0);
        assert!(with_extra
            .results()
            .iter()
            .all(|r| !r.message.contains("R9") && !r.message.contains("10.0.0.99")));
        // Only the Info neighbor count may differ
        assert_eq!(with_extra.len(), without_extra.len());
    }

    #[test]
    fn test_missing_device_does_not_stop_walk() {
        let comparator = StateComparator::new(NeighborAttribute::Priority);
        let results = ResultCollector::new();
        let expected = lab_tree();
        let mut actual = lab_tree();
        actual.remove("R1");
        actual["R2"]["Gi0/0"]["neighbors"]["10.0.0.1"]["priority"] = json!("2");

        comparator.compare(&actual, &expected, &results).unwrap();

        let failed = failures(&results);
        assert_eq!(failed.len(), 2);
        assert_eq!(failed[0], "Expected device R1 not found in current state");
        assert!(failed[1].contains("10.0.0.1"));
    }

    #[test]
    fn test_missing_interface_and_neighbor_each_fail() {
        let comparator = StateComparator::new(NeighborAttribute::Priority);
        let results = ResultCollector::new();
        let expected = lab_tree();
        let mut actual = lab_tree();
        actual["R1"].as_object_mut().unwrap().remove("Gi0/2");
        actual["R1"]["Gi0/1"]["neighbors"]
            .as_object_mut()
            .unwrap()
            .remove("10.0.0.2");

        comparator.compare(&actual, &expected, &results).unwrap();

        let failed = failures(&results);
        assert_eq!(failed.len(), 2);
        assert_eq!(
            failed[0],
            "Neighbor 10.0.0.2 on interface Gi0/1 not found in current state for device R1"
        );
        assert_eq!(
            failed[1],
            "Interface Gi0/2 not found in current state for device R1"
        );
    }

    #[test]
    fn test_neighbor_count_info_precedes_neighbors() {
        let comparator = StateComparator::new(NeighborAttribute::Priority);
        let results = ResultCollector::new();
        let expected = priority_tree("1");
        let mut actual = priority_tree("1");
        actual["R1"]["Gi0/1"]["neighbors"]["10.0.0.5"] = json!({"priority": "1"});

        comparator.compare(&actual, &expected, &results).unwrap();

        let recorded = results.results();
        let info = recorded
            .iter()
            .position(|r| r.status == ResultStatus::Info)
            .unwrap();
        assert_eq!(
            recorded[info].message,
            "Found 2 neighbors on interface Gi0/1 of device R1, expecting 1"
        );
        let leaf = recorded
            .iter()
            .position(|r| r.message.contains("matches expected"))
            .unwrap();
        assert!(info < leaf);
    }

    #[test]
    fn test_no_type_coercion() {
        let comparator = StateComparator::new(NeighborAttribute::Priority);
        let results = ResultCollector::new();
        let expected = priority_tree("1");
        let actual = tree(json!({
            "R1": {"Gi0/1": {"neighbors": {"10.0.0.2": {"priority": 1}}}}
        }));

        comparator.compare(&actual, &expected, &results).unwrap();
        assert_eq!(results.count(ResultStatus::Failed), 1);
    }

    #[test]
    fn test_compares_only_selected_attribute() {
        let comparator = StateComparator::new(NeighborAttribute::State);
        let results = ResultCollector::new();
        let expected = tree(json!({
            "R1": {"Gi0/1": {"neighbors": {"10.0.0.2": {"state": "FULL/DR"}}}}
        }));
        let actual = tree(json!({
            "R1": {"Gi0/1": {"neighbors": {"10.0.0.2": {"state": "FULL/DR", "priority": "7"}}}}
        }));

        comparator.compare(&actual, &expected, &results).unwrap();
        assert_eq!(results.count(ResultStatus::Failed), 0);
    }

    #[test]
    fn test_missing_neighbors_key_means_none_expected() {
        let comparator = StateComparator::new(NeighborAttribute::Priority);
        let results = ResultCollector::new();
        let expected = tree(json!({"R1": {"Gi0/1": {}}}));
        let actual = priority_tree("1");

        comparator.compare(&actual, &expected, &results).unwrap();
        assert_eq!(results.count(ResultStatus::Failed), 0);
        assert!(results
            .results()
            .iter()
            .any(|r| r.message == "Found 1 neighbors on interface Gi0/1 of device R1, expecting 0"));
    }

    #[test]
    fn test_malformed_expected_is_an_error() {
        let comparator = StateComparator::new(NeighborAttribute::Priority);
        let results = ResultCollector::new();
        let expected = tree(json!({"R1": ["Gi0/1"]}));

        let err = comparator
            .compare(&priority_tree("1"), &expected, &results)
            .unwrap_err();
        assert_eq!(
            err,
            CompareError::NotAMapping {
                side: "expected",
                path: "R1".into(),
                found: "an array",
            }
        );
    }

    #[test]
    fn test_malformed_neighbor_table_reports_path() {
        let comparator = StateComparator::new(NeighborAttribute::Priority);
        let results = ResultCollector::new();
        let actual = tree(json!({"R1": {"Gi0/1": {"neighbors": "none"}}}));

        let err = comparator
            .compare(&actual, &priority_tree("1"), &results)
            .unwrap_err();
        assert!(err.to_string().contains("R1/Gi0/1/neighbors"));
        assert!(err.to_string().contains("actual"));
    }
}
