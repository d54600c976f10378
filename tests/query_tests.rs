mod common;

use common::fixtures::{INTERFACES, IF_NS, IP_NS, THREE_BS};
use common::{TestResult, id_of, local_names, parse_tree, string_values};
use netxpath::query::{self, boolean, count, first, first_local_only, nodes, nodes_with_flags};
use netxpath::{
    DataSourceNode, NamespaceContext, NetXPathError, NodeFlags, QueryOptions, XPathError,
    XPathValue,
};

const NC_NS: &str = "urn:ietf:params:xml:ns:netconf:base:1.0";

fn interfaces_nsc() -> NamespaceContext {
    NamespaceContext::new()
        .with(Some("nc"), NC_NS)
        .with(None, IF_NS)
        .with(Some("ip"), IP_NS)
}

#[test]
fn test_count_children() -> TestResult {
    let tree = parse_tree(THREE_BS);
    assert_eq!(count(tree.root(), None, "/a/b")?, 3);
    assert_eq!(count(tree.root(), None, "/a/c")?, 0);
    assert_eq!(count(tree.root(), None, "//text()")?, 3);
    Ok(())
}

#[test]
fn test_boolean_conversions() -> TestResult {
    let tree = parse_tree(THREE_BS);
    let root = tree.root();
    assert!(!boolean(root, None, "//nonexistent")?);
    assert!(boolean(root, None, "1")?);
    assert!(!boolean(root, None, "0")?);
    assert!(boolean(root, None, "/a/b = 'z'")?);
    assert!(!boolean(root, None, "''")?);
    Ok(())
}

#[test]
fn test_positional_predicate() {
    let tree = parse_tree(THREE_BS);
    let second = first(tree.root(), None, "/a/b[2]").expect("b[2] exists");
    assert_eq!(second.string_value(), "y");
    assert_eq!(first(tree.root(), None, "/a/b[last()]").map(|n| n.string_value()), Some("z".to_string()));
    assert_eq!(first(tree.root(), None, "/a/b[4]"), None);
    // 1.5 is never a position.
    assert_eq!(first(tree.root(), None, "/a/b[1.5]"), None);
}

#[test]
fn test_preceding_siblings_nearest_first() -> TestResult {
    let tree = parse_tree(THREE_BS);
    let third = first(tree.root(), None, "/a/b[3]").expect("b[3] exists");

    let siblings = nodes(third, None, "preceding-sibling::*")?;
    assert_eq!(string_values(&siblings), vec!["y", "x"]);
    let nearest = first(third, None, "preceding-sibling::*[1]").expect("has a sibling");
    assert_eq!(nearest.string_value(), "y");
    // Through a parenthesized filter the positions are document order again.
    let first_in_doc = first(third, None, "(preceding-sibling::*)[1]").expect("has a sibling");
    assert_eq!(first_in_doc.string_value(), "x");
    Ok(())
}

#[test]
fn test_union_of_numbers_is_a_type_error() {
    let tree = parse_tree(THREE_BS);
    let err = query::evaluate_ctx(tree.root(), None, "1 | 2", &QueryOptions::default()).unwrap_err();
    assert!(matches!(err, NetXPathError::XPath(XPathError::TypeError(_))), "{err:?}");
    // The convenience form swallows it.
    assert_eq!(first(tree.root(), None, "1 | 2"), None);
}

#[test]
fn test_syntax_error_carries_line() {
    let tree = parse_tree(THREE_BS);
    let err = nodes(tree.root(), None, "a =\n  b ]").unwrap_err();
    assert_eq!(err.syntax_line(), Some(2));
    let err = nodes(tree.root(), None, "   ").unwrap_err();
    assert!(matches!(err, NetXPathError::XPath(XPathError::EmptyExpression)));
}

#[test]
fn test_namespace_aware_queries() -> TestResult {
    let tree = parse_tree(INTERFACES);
    let nsc = interfaces_nsc();
    let root = tree.root();

    assert_eq!(count(root, Some(&nsc), "/nc:config/interfaces/interface")?, 3);
    let with_address = nodes(root, Some(&nsc), "/nc:config/interfaces/interface[ip:address]/name")?;
    assert_eq!(string_values(&with_address), vec!["eth0", "lo"]);

    let wide = nodes(
        root,
        Some(&nsc),
        "//interface[enabled = 'true' and ip:address/@ip:prefix-length > 16]/name",
    )?;
    assert_eq!(string_values(&wide), vec!["eth0"]);

    // The default namespace does not apply to the netconf envelope.
    assert_eq!(count(root, Some(&nsc), "/config")?, 0);
    Ok(())
}

#[test]
fn test_unbound_prefix_fails_only_with_a_context() -> TestResult {
    let tree = parse_tree(INTERFACES);
    let root = tree.root();
    let nsc = interfaces_nsc();

    let err = nodes(root, Some(&nsc), "//q:interface").unwrap_err();
    assert!(matches!(err, NetXPathError::XPath(XPathError::UnresolvedPrefix(ref p)) if p == "q"));
    // Without a context, prefixes compare literally.
    assert!(nodes(root, None, "//q:interface")?.is_empty());
    assert_eq!(count(root, None, "//ip:address")?, 2);
    assert_eq!(count(root, None, "/config/interfaces/interface")?, 3);
    Ok(())
}

#[test]
fn test_local_only_ignores_prefixes_and_namespaces() {
    let tree = parse_tree(INTERFACES);
    let lo = first_local_only(tree.root(), "/foo:config/bar:interfaces/interface[3]/name")
        .expect("third interface");
    assert_eq!(lo.string_value(), "lo");
    assert_eq!(first(tree.root(), None, "/foo:config"), None);
}

#[test]
fn test_namespace_context_from_node() {
    let tree = parse_tree(INTERFACES);
    let address = id_of(&tree, "//ip:address");
    let nsc = tree.namespace_context(address);
    assert_eq!(nsc.default_namespace(), Some(IF_NS));
    assert_eq!(nsc.get(Some("ip")), Some(IP_NS));

    let envelope = tree.namespace_context(id_of(&tree, "/config"));
    assert_eq!(envelope.default_namespace(), Some(NC_NS));
    assert_eq!(envelope.get(Some("ip")), None);
}

#[test]
fn test_namespace_nodes_belong_to_their_element() -> TestResult {
    let tree = parse_tree(INTERFACES);
    let root = tree.root();
    let eth0 = id_of(&tree, "//interface[1]");

    // The default binding and `ip`, both inherited from <interfaces>.
    assert_eq!(count(root, None, "//interface[1]/namespace::*")?, 2);
    let owners = nodes(root, None, "//interface[1]/namespace::*/..")?;
    assert_eq!(owners.iter().map(|n| n.id()).collect::<Vec<_>>(), vec![eth0]);
    // Every interface has namespace nodes of its own.
    assert_eq!(count(root, None, "//interface/namespace::*")?, 6);
    assert_eq!(count(root, None, "//interface/namespace::*/..")?, 3);
    // The envelope only sees its own default namespace.
    let envelope = nodes(root, None, "/config/namespace::*")?;
    assert_eq!(string_values(&envelope), vec![NC_NS]);
    Ok(())
}

#[test]
fn test_fractional_literal_comparison() -> TestResult {
    let tree = parse_tree("<a><p>2.5</p><q>0.75</q></a>");
    let root = tree.root();
    assert!(boolean(root, None, "/a/p = 2.5")?);
    assert!(boolean(root, None, "/a/q = 0.5 + 0.25")?);
    assert!(!boolean(root, None, "/a/p = 2")?);
    let value = query::evaluate_ctx(root, None, "/a/p * 12.345", &QueryOptions::default())?;
    assert_eq!(value, XPathValue::Number(2.5 * 12.345));
    Ok(())
}

#[test]
fn test_nodes_with_flags() -> TestResult {
    let mut tree = parse_tree(INTERFACES);
    let eth1 = id_of(&tree, "//interface[name = 'eth1']");
    tree.insert_flags(eth1, NodeFlags::CHANGE);
    let lo = id_of(&tree, "//interface[name = 'lo']");
    tree.set_flags(lo, NodeFlags::ADD | NodeFlags::MARK);

    let root = tree.root();
    let changed = nodes_with_flags(root, None, "//interface", NodeFlags::CHANGE)?;
    assert_eq!(changed.iter().map(|n| n.id()).collect::<Vec<_>>(), vec![eth1]);

    let touched = nodes_with_flags(root, None, "//interface", NodeFlags::CHANGE | NodeFlags::ADD)?;
    assert_eq!(touched.iter().map(|n| n.id()).collect::<Vec<_>>(), vec![eth1, lo]);

    let all = nodes_with_flags(root, None, "//interface", NodeFlags::empty())?;
    assert_eq!(local_names(&all), vec!["interface"; 3]);
    Ok(())
}

#[test]
fn test_current_is_the_starting_node() -> TestResult {
    let tree = parse_tree(INTERFACES);
    let name = first(tree.root(), None, "//interface[1]/name").expect("eth0 name");
    let same_state = nodes(name, None, "../../interface[enabled = current()/../enabled]/name")?;
    assert_eq!(string_values(&same_state), vec!["eth0", "lo"]);
    Ok(())
}

#[test]
fn test_scalar_results() -> TestResult {
    let tree = parse_tree(INTERFACES);
    let root = tree.root();
    let options = QueryOptions::default();

    let last = query::evaluate_ctx(root, None, "string(//interface[last()]/name)", &options)?;
    assert_eq!(last, XPathValue::String("lo".to_string()));
    let total = query::evaluate_ctx(root, None, "sum(//ip:address/@ip:prefix-length)", &options)?;
    assert_eq!(total, XPathValue::Number(32.0));
    let matched = query::evaluate_ctx(
        root,
        None,
        "count(//name[re-match(., 'eth[0-9]+')])",
        &options,
    )?;
    assert_eq!(matched, XPathValue::Number(2.0));
    assert!(nodes(root, None, "count(//name)")?.is_empty());
    Ok(())
}
