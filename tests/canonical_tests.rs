mod common;

use common::TestResult;
use common::fixtures::{IF_NS, IP_NS, REGISTRY_JSON, registry};
use netxpath::canonical::{CanonicalXPath, xpath_to_canonical};
use netxpath::{ModuleRegistry, NamespaceContext, NetXPathError, parse_expression};
use netxpath_xpath1::{Canonicalized, canonicalize, unparse};
use std::io::Write;

fn canonical(xpath: &str, nsc: &NamespaceContext) -> CanonicalXPath {
    xpath_to_canonical(xpath, nsc, &registry())
        .unwrap_or_else(|e| panic!("'{}' does not parse: {}", xpath, e))
}

#[test]
fn test_prefix_is_replaced_by_module_prefix() {
    let nsc = NamespaceContext::new().with(Some("x"), "urn:example:a");
    assert_eq!(
        canonical("/x:a", &nsc),
        CanonicalXPath::Canonical {
            xpath: "/ex:a".to_string(),
            namespaces: NamespaceContext::new().with(Some("ex"), "urn:example:a"),
        }
    );
}

#[test]
fn test_unknown_prefix_reason_names_it() {
    let result = canonical("/z:a", &NamespaceContext::new());
    let CanonicalXPath::Failed { reason } = result else {
        panic!("expected a failure");
    };
    assert!(reason.contains("z"), "{}", reason);
}

#[test]
fn test_failure_reasons() {
    let nsc = NamespaceContext::new()
        .with(Some("u"), "urn:example:unknown")
        .with(Some("s"), "urn:example:sub");
    assert_eq!(
        canonical("/u:a", &nsc),
        CanonicalXPath::Failed {
            reason: "No modules found for namespace: urn:example:unknown".to_string()
        }
    );
    assert_eq!(
        canonical("/s:a", &nsc),
        CanonicalXPath::Failed {
            reason: "No prefix found in module: example-submodule".to_string()
        }
    );
    assert_eq!(
        canonical("/a", &nsc),
        CanonicalXPath::Failed {
            reason: "No namespace found for default prefix".to_string()
        }
    );
}

#[test]
fn test_filter_from_a_netconf_request() {
    // Bindings as a client would declare them on its <filter> element.
    let nsc = NamespaceContext::new()
        .with(None, IF_NS)
        .with(Some("addr"), IP_NS);
    let result = canonical(
        "/interfaces/interface[addr:address/@addr:prefix-length &gt; 16]/name | //addr:*",
        &nsc,
    );
    assert_eq!(
        result,
        CanonicalXPath::Canonical {
            xpath: "/if:interfaces/if:interface[ip:address/@ip:prefix-length>16]/if:name|//ip:*"
                .to_string(),
            namespaces: NamespaceContext::new()
                .with(Some("if"), IF_NS)
                .with(Some("ip"), IP_NS),
        }
    );
}

#[test]
fn test_canonical_form_is_a_fixed_point() {
    let input = NamespaceContext::new()
        .with(Some("x"), "urn:example:a")
        .with(Some("y"), "urn:example:b")
        .with(Some("unused"), "urn:example:unused");
    let expr = parse_expression("/x:a/y:b[count(x:c) = 2]/text()").unwrap();
    let modules = registry();

    let Canonicalized::Rewritten { expr, namespaces } = canonicalize(expr, &modules, &input) else {
        panic!("first pass failed");
    };
    let Canonicalized::Rewritten {
        expr: again,
        namespaces: again_ns,
    } = canonicalize(expr.clone(), &modules, &namespaces)
    else {
        panic!("second pass failed");
    };
    assert_eq!(again, expr);
    assert_eq!(again_ns, namespaces);
    assert_eq!(unparse(&again), "/ex:a/b:b[count(ex:c)=2]/text()");
}

#[test]
fn test_syntax_errors_are_not_reasons() {
    let err = xpath_to_canonical("/x:a[", &NamespaceContext::new(), &registry()).unwrap_err();
    assert!(matches!(err, NetXPathError::XPath(_)));
    assert_eq!(err.syntax_line(), Some(1));
}

#[test]
fn test_registry_from_file() -> TestResult {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(REGISTRY_JSON.as_bytes())?;
    let modules = ModuleRegistry::from_json_file(file.path())?;
    assert_eq!(modules.len(), 2);

    let nsc = NamespaceContext::new().with(Some("q"), "urn:example:b");
    let result = xpath_to_canonical("//q:leaf", &nsc, &modules)?;
    assert_eq!(
        result,
        CanonicalXPath::Canonical {
            xpath: "//b:leaf".to_string(),
            namespaces: NamespaceContext::new().with(Some("b"), "urn:example:b"),
        }
    );
    Ok(())
}

#[test]
fn test_missing_registry_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ModuleRegistry::from_json_file(dir.path().join("absent.json")).unwrap_err();
    let err = NetXPathError::from(err);
    assert!(matches!(err, NetXPathError::Registry(_)));
}
