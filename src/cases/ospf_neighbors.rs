//! OSPF IPv4 neighbor verification cases
//!
//! All three cases run `show ip ospf neighbor` and differ only in which
//! neighbor attribute they keep and compare.

use super::VerificationCase;
use crate::command::{CommandDispatcher, DispatchError, DispatchResults};
use crate::testbed::Testbed;
use async_trait::async_trait;
use ospf_verify_shared::{
    CompareError, NeighborAttribute, ParameterTree, ResultCollector, ResultStatus,
    StateComparator, NEIGHBORS_KEY,
};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

pub const SHOW_IP_OSPF_NEIGHBOR: &str = "show ip ospf neighbor";

/// Verifies one attribute of every OSPF neighbor on every device
#[derive(Debug, Clone, Copy)]
pub struct OspfNeighborCase {
    id: &'static str,
    title: &'static str,
    comparator: StateComparator,
}

impl OspfNeighborCase {
    /// Neighbor priority, which drives DR/BDR election
    pub fn priority() -> Self {
        Self {
            id: "ospf_neighbors_priority",
            title: "OSPF IPv4 Neighbors Priority",
            comparator: StateComparator::new(NeighborAttribute::Priority),
        }
    }

    /// Neighbor interface address
    pub fn ip_addresses() -> Self {
        Self {
            id: "ospf_neighbors_ip_addresses",
            title: "OSPF IPv4 Neighbors IP Addresses",
            comparator: StateComparator::new(NeighborAttribute::Address),
        }
    }

    /// Neighbor adjacency state, e.g. `FULL/DR`
    pub fn status() -> Self {
        Self {
            id: "ospf_neighbors_status",
            title: "OSPF IPv4 Neighbors Status",
            comparator: StateComparator::new(NeighborAttribute::State),
        }
    }

    pub fn attribute(&self) -> NeighborAttribute {
        self.comparator.attribute()
    }

    /// Build the parameter tree for this case from dispatch output.
    ///
    /// Walks the testbed in device order. A device missing from `dispatched`
    /// failed upstream and is recorded as a failure here.
    pub fn extract_state(
        &self,
        testbed: &Testbed,
        dispatched: &DispatchResults,
        results: &ResultCollector,
    ) -> ParameterTree {
        let attribute = self.attribute();
        let mut state = ParameterTree::new();

        for name in testbed.device_names() {
            let Some(execution) = dispatched.get(&name) else {
                results.add_result(
                    ResultStatus::Failed,
                    format!("No OSPF data found for device {}", name),
                );
                continue;
            };

            let interfaces = non_empty_mapping(execution.data.get("interfaces"));
            let Some(interfaces) = interfaces else {
                warn!("No OSPF interfaces found on {}", name);
                results.add_result(
                    ResultStatus::Info,
                    format!("No OSPF interfaces found on {}", name),
                );
                state.insert(name, Value::Object(Map::new()));
                continue;
            };

            let mut device_state = Map::new();
            for (interface, interface_data) in interfaces {
                let Some(neighbors) = non_empty_mapping(interface_data.get(NEIGHBORS_KEY)) else {
                    continue;
                };

                let mut table = Map::new();
                for (neighbor, neighbor_data) in neighbors {
                    let value = neighbor_data
                        .get(attribute.key())
                        .cloned()
                        .unwrap_or_else(|| Value::String(String::new()));
                    results.add_result(
                        ResultStatus::Info,
                        format!(
                            "Found neighbor {} on interface {} of device {} with {} {}",
                            neighbor,
                            interface,
                            name,
                            attribute.label(),
                            display(&value)
                        ),
                    );
                    table.insert(neighbor.clone(), json!({ attribute.key(): value }));
                }
                device_state.insert(interface.clone(), json!({ NEIGHBORS_KEY: table }));
            }

            info!(
                "Gathered {} OSPF interfaces with neighbors from {}",
                device_state.len(),
                name
            );
            state.insert(name.clone(), Value::Object(device_state));
            results.add_result(
                ResultStatus::Passed,
                format!("Successfully gathered OSPF data from {}", name),
            );
        }

        state
    }
}

fn non_empty_mapping(value: Option<&Value>) -> Option<&Map<String, Value>> {
    value
        .and_then(Value::as_object)
        .filter(|map| !map.is_empty())
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl VerificationCase for OspfNeighborCase {
    fn id(&self) -> &str {
        self.id
    }

    fn title(&self) -> &str {
        self.title
    }

    async fn gather_current_state(
        &self,
        testbed: &Testbed,
        dispatcher: &CommandDispatcher,
        results: &ResultCollector,
    ) -> Result<ParameterTree, DispatchError> {
        let dispatched = dispatcher
            .dispatch(SHOW_IP_OSPF_NEIGHBOR, testbed.devices())
            .await?;
        Ok(self.extract_state(testbed, &dispatched, results))
    }

    fn compare(
        &self,
        current: &ParameterTree,
        expected: &ParameterTree,
        results: &ResultCollector,
    ) -> Result<(), CompareError> {
        self.comparator.compare(current, expected, results)
    }
}
