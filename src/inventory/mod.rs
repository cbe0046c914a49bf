//! Inventory input decoding.
//!
//! Devices arrive either as normalized [`DeviceRecord`]s or as the raw device
//! query response of the source of truth, where every attribute is wrapped as
//! `{"value": ...}` and relationships are `{"node": ...}` / `{"edges": [{"node": ...}]}`.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

use crate::models::{BgpSessionRecord, DeviceRecord, InterfaceRecord, IpAddressRecord, VlanRecord};

/// Root key of the device query response
pub const DEVICE_QUERY_ROOT: &str = "InfraDevice";

#[derive(Debug, Error, PartialEq)]
pub enum InventoryError {
    #[error("missing field: {path}")]
    MissingField { path: String },

    #[error("invalid value at {path}: {reason}")]
    InvalidValue { path: String, reason: String },

    #[error("device query returned no devices")]
    NoDevices,
}

/// A value inside the query response, with its path for error messages
struct Located<'a> {
    value: &'a Value,
    path: String,
}

impl<'a> Located<'a> {
    fn root(value: &'a Value, path: &str) -> Self {
        Self {
            value,
            path: path.to_string(),
        }
    }

    fn child_path(&self, key: &str) -> String {
        format!("{}.{}", self.path, key)
    }

    fn get(&self, key: &str) -> Option<Located<'a>> {
        self.value.get(key).filter(|v| !v.is_null()).map(|value| Located {
            value,
            path: self.child_path(key),
        })
    }

    fn field(&self, key: &str) -> Result<Located<'a>, InventoryError> {
        self.get(key).ok_or_else(|| InventoryError::MissingField {
            path: self.child_path(key),
        })
    }

    /// `{"<key>": {"value": X}}` -> X
    fn attr<T: DeserializeOwned>(&self, key: &str) -> Result<T, InventoryError> {
        self.field(key)?.field("value")?.decode()
    }

    /// Like `attr`, but an absent attribute or a null value is None
    fn opt_attr<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, InventoryError> {
        match self.get(key).and_then(|a| a.get("value")) {
            Some(v) => v.decode().map(Some),
            None => Ok(None),
        }
    }

    /// `{"<key>": {"node": {...}}}`
    fn related(&self, key: &str) -> Result<Located<'a>, InventoryError> {
        self.field(key)?.field("node")
    }

    /// `{"<key>": {"edges": [{"node": {...}}, ...]}}`; an absent relationship is empty
    fn edges(&self, key: &str) -> Result<Vec<Located<'a>>, InventoryError> {
        let Some(rel) = self.get(key) else {
            return Ok(Vec::new());
        };
        let Some(edges) = rel.get("edges") else {
            return Ok(Vec::new());
        };
        let items = edges.value.as_array().ok_or_else(|| InventoryError::InvalidValue {
            path: edges.path.clone(),
            reason: "expected a list".to_string(),
        })?;

        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                Located {
                    value: item,
                    path: format!("{}[{}]", edges.path, i),
                }
                .field("node")
            })
            .collect()
    }

    fn decode<T: DeserializeOwned>(&self) -> Result<T, InventoryError> {
        T::deserialize(self.value).map_err(|e| InventoryError::InvalidValue {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }
}

fn strip_host_mask(address: &str) -> String {
    address.replace("/32", "")
}

fn parse_interface(node: &Located<'_>) -> Result<InterfaceRecord, InventoryError> {
    let ip_addresses = node
        .edges("ip_addresses")?
        .iter()
        .map(|ip| Ok(IpAddressRecord { address: ip.attr("address")? }))
        .collect::<Result<Vec<_>, InventoryError>>()?;

    let vlans = node
        .edges("tagged_vlan")?
        .iter()
        .map(|vlan| Ok(VlanRecord { vlan_id: vlan.attr("vlan_id")? }))
        .collect::<Result<Vec<_>, InventoryError>>()?;

    Ok(InterfaceRecord {
        name: node.attr("name")?,
        description: node.opt_attr("description")?,
        enabled: node.attr("enabled")?,
        status: node.attr("status")?,
        role: node.attr("role")?,
        l2_mode: node.opt_attr("l2_mode")?,
        ip_addresses,
        vlans,
    })
}

fn parse_bgp_session(node: &Located<'_>) -> Result<BgpSessionRecord, InventoryError> {
    let local_ip: String = node.related("local_ip")?.attr("address")?;
    let remote_ip: String = node.related("remote_ip")?.attr("address")?;

    Ok(BgpSessionRecord {
        status: node.attr("status")?,
        local_ip: strip_host_mask(&local_ip),
        remote_ip: strip_host_mask(&remote_ip),
        local_as: node.related("local_as")?.attr("asn")?,
        remote_as: node.related("remote_as")?.attr("asn")?,
        peer_group: node.related("peer_group")?.field("display_label")?.decode()?,
    })
}

fn parse_device(node: &Located<'_>) -> Result<DeviceRecord, InventoryError> {
    Ok(DeviceRecord {
        name: node.attr("name")?,
        description: node.opt_attr("description")?,
        platform: node.related("platform")?.attr("name")?,
        device_type: node.attr("type")?,
        role: node.attr("role")?,
        interfaces: node
            .edges("interfaces")?
            .iter()
            .map(parse_interface)
            .collect::<Result<_, _>>()?,
        bgp_sessions: node
            .edges("bgp_sessions")?
            .iter()
            .map(parse_bgp_session)
            .collect::<Result<_, _>>()?,
    })
}

/// Decode every device in a device query response
pub fn parse_device_query(data: &Value) -> Result<Vec<DeviceRecord>, InventoryError> {
    let root = Located::root(data, "$");
    let devices = root
        .field(DEVICE_QUERY_ROOT)
        .and_then(|_| root.edges(DEVICE_QUERY_ROOT))?;

    if devices.is_empty() {
        return Err(InventoryError::NoDevices);
    }

    devices.iter().map(parse_device).collect()
}

/// Decode an inventory document: a raw device query response, one normalized
/// record, or a list of normalized records.
pub fn parse_inventory(data: Value) -> Result<Vec<DeviceRecord>> {
    if data.get(DEVICE_QUERY_ROOT).is_some() {
        return Ok(parse_device_query(&data)?);
    }

    match data {
        Value::Array(_) => serde_json::from_value(data).context("Invalid device record list"),
        other => {
            let record: DeviceRecord =
                serde_json::from_value(other).context("Invalid device record")?;
            Ok(vec![record])
        }
    }
}

/// Load devices from a JSON or YAML inventory file
pub async fn load_devices(path: &Path) -> Result<Vec<DeviceRecord>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read inventory file {}", path.display()))?;

    // YAML is a superset of the JSON documents we accept
    let data: Value = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse inventory file {}", path.display()))?;

    let devices = parse_inventory(data)
        .with_context(|| format!("Invalid inventory in {}", path.display()))?;

    tracing::debug!("Loaded {} device(s) from {}", devices.len(), path.display());
    Ok(devices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InterfaceRole, L2Mode, ObjectStatus};
    use serde_json::json;

    fn query_response() -> Value {
        json!({
            "InfraDevice": {"edges": [{"node": {
                "name": {"value": "leaf1"},
                "description": {"value": null},
                "platform": {"node": {"name": {"value": "Nokia SR Linux"}}},
                "type": {"value": "7220 IXR-D2"},
                "role": {"value": "leaf"},
                "interfaces": {"edges": [
                    {"node": {
                        "name": {"value": "system0"},
                        "description": {"value": "router id"},
                        "enabled": {"value": true},
                        "status": {"value": "active"},
                        "role": {"value": "loopback"},
                        "ip_addresses": {"edges": [{"node": {"address": {"value": "10.0.0.11/32"}}}]}
                    }},
                    {"node": {
                        "name": {"value": "ethernet-1/10"},
                        "description": {"value": null},
                        "enabled": {"value": true},
                        "status": {"value": "provisioning"},
                        "role": {"value": "leaf"},
                        "l2_mode": {"value": "Trunk"},
                        "tagged_vlan": {"edges": [{"node": {"vlan_id": {"value": 100}}}]}
                    }}
                ]},
                "bgp_sessions": {"edges": [{"node": {
                    "status": {"value": "active"},
                    "local_ip": {"node": {"address": {"value": "10.0.0.11/32"}}},
                    "remote_ip": {"node": {"address": {"value": "10.0.0.1/32"}}},
                    "local_as": {"node": {"asn": {"value": 65011}}},
                    "remote_as": {"node": {"asn": {"value": 65000}}},
                    "peer_group": {"node": {"display_label": "SPINES"}}
                }}]}
            }}]}
        })
    }

    #[test]
    fn test_parse_device_query() {
        let devices = parse_device_query(&query_response()).unwrap();
        assert_eq!(devices.len(), 1);

        let device = &devices[0];
        assert_eq!(device.name, "leaf1");
        assert_eq!(device.description, None);
        assert_eq!(device.platform, "Nokia SR Linux");
        assert_eq!(device.role, "leaf");

        assert_eq!(device.interfaces[0].role, InterfaceRole::Loopback);
        assert_eq!(device.interfaces[0].ip_addresses[0].address, "10.0.0.11/32");
        assert_eq!(device.interfaces[1].status, ObjectStatus::Provisioning);
        assert_eq!(device.interfaces[1].l2_mode, Some(L2Mode::Trunk));
        assert_eq!(device.interfaces[1].vlans, vec![VlanRecord { vlan_id: 100 }]);
        assert!(device.interfaces[1].ip_addresses.is_empty());

        let session = &device.bgp_sessions[0];
        assert_eq!(session.local_ip, "10.0.0.11");
        assert_eq!(session.remote_ip, "10.0.0.1");
        assert_eq!(session.remote_as, 65000);
        assert_eq!(session.peer_group, "SPINES");
    }

    #[test]
    fn test_missing_field_reports_path() {
        let mut data = query_response();
        data["InfraDevice"]["edges"][0]["node"]["interfaces"]["edges"][0]["node"]
            .as_object_mut()
            .unwrap()
            .remove("enabled");

        let err = parse_device_query(&data).unwrap_err();
        assert_eq!(
            err,
            InventoryError::MissingField {
                path: "$.InfraDevice.edges[0].node.interfaces.edges[0].node.enabled".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_enum_value() {
        let mut data = query_response();
        data["InfraDevice"]["edges"][0]["node"]["interfaces"]["edges"][0]["node"]["role"] =
            json!({"value": "mgmt"});

        let err = parse_device_query(&data).unwrap_err();
        assert!(matches!(err, InventoryError::InvalidValue { ref path, .. } if path.ends_with("role.value")));
    }

    #[test]
    fn test_empty_query_response() {
        let err = parse_device_query(&json!({"InfraDevice": {"edges": []}})).unwrap_err();
        assert_eq!(err, InventoryError::NoDevices);
    }

    #[test]
    fn test_parse_inventory_shapes() {
        let record = json!({
            "name": "spine1", "platform": "Arista EOS", "type": "7050", "role": "spine"
        });
        assert_eq!(parse_inventory(record.clone()).unwrap()[0].name, "spine1");
        assert_eq!(parse_inventory(json!([record.clone(), record])).unwrap().len(), 2);
        assert_eq!(parse_inventory(query_response()).unwrap()[0].name, "leaf1");
        assert!(parse_inventory(json!({"name": "x"})).is_err());
    }

    #[tokio::test]
    async fn test_load_devices_from_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.yaml");
        tokio::fs::write(
            &path,
            "- name: leaf2\n  platform: Arista EOS\n  type: 7050SX3\n  role: leaf\n",
        )
        .await
        .unwrap();

        let devices = load_devices(&path).await.unwrap();
        assert_eq!(devices[0].device_type, "7050SX3");
    }
}
