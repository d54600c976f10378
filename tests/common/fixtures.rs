//! Documents and registries shared by the integration tests.

use netxpath::{ModuleRegistry, YangModule};

/// Three `<b>` children under `<a>`, no whitespace text in between.
pub const THREE_BS: &str = "<a><b>x</b><b>y</b><b>z</b></a>";

/// A NETCONF-style running configuration with two modules' namespaces.
pub const INTERFACES: &str = r#"<config xmlns="urn:ietf:params:xml:ns:netconf:base:1.0">
  <interfaces xmlns="urn:example:if" xmlns:ip="urn:example:ip">
    <interface>
      <name>eth0</name>
      <enabled>true</enabled>
      <ip:address ip:prefix-length="24">192.0.2.1</ip:address>
    </interface>
    <interface>
      <name>eth1</name>
      <enabled>false</enabled>
    </interface>
    <interface>
      <name>lo</name>
      <enabled>true</enabled>
      <ip:address ip:prefix-length="8">127.0.0.1</ip:address>
    </interface>
  </interfaces>
</config>"#;

pub const IF_NS: &str = "urn:example:if";
pub const IP_NS: &str = "urn:example:ip";

/// Modules for [`INTERFACES`] plus the `example-a`/`example-b` pair.
pub fn registry() -> ModuleRegistry {
    ModuleRegistry::new()
        .with_module(YangModule::new("example-interfaces", IF_NS).with_prefix("if"))
        .with_module(YangModule::new("example-ip", IP_NS).with_prefix("ip"))
        .with_module(YangModule::new("example-a", "urn:example:a").with_prefix("ex"))
        .with_module(YangModule::new("example-b", "urn:example:b").with_prefix("b"))
        .with_module(YangModule::new("example-submodule", "urn:example:sub"))
}

pub const REGISTRY_JSON: &str = r#"{
  "modules": [
    {"name": "example-a", "prefix": "ex", "namespace": "urn:example:a"},
    {"name": "example-b", "prefix": "b", "namespace": "urn:example:b"}
  ]
}"#;
