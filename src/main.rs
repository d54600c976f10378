use clap::{Args, Parser, Subcommand};
use netxpath::canonical::{CanonicalXPath, xpath_to_canonical};
use netxpath::config::QueryOptions;
use netxpath::query;
use netxpath::{
    ModuleRegistry, NamespaceContext, NetXPathError, NodeFlags, NodeId, XPathValue,
    XmlTree,
};
use netxpath_xpath1::{parse_expression, print, unparse};
use std::path::PathBuf;
use std::process::ExitCode;

/// Evaluate and canonicalize XPath 1.0 expressions over NETCONF configuration data.
#[derive(Parser, Debug)]
#[command(name = "netxpath", version, about)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate an expression against an XML document.
    Eval {
        #[command(flatten)]
        namespaces: NamespaceArgs,

        /// The XML document to query.
        #[arg(long)]
        xml: PathBuf,

        /// Compare names by local part only.
        #[arg(long)]
        local_only: bool,

        /// Set the MARK flag on every node this expression selects, before evaluating.
        #[arg(long, value_name = "XPATH")]
        mark: Vec<String>,

        /// Keep only result nodes carrying one of these flags, e.g. `mark,change` or `0x11`.
        #[arg(long, value_name = "MASK")]
        flags: Option<NodeFlags>,

        xpath: String,
    },
    /// Print the parsed expression tree.
    Parse { xpath: String },
    /// Parse an expression and print it back in normalized form.
    Unparse { xpath: String },
    /// Rewrite prefixes to the prefixes of the YANG modules owning their namespaces.
    Canonical {
        #[command(flatten)]
        namespaces: NamespaceArgs,

        /// JSON module registry: `{"modules": [{"name", "prefix", "namespace"}]}`.
        #[arg(long)]
        modules: PathBuf,

        xpath: String,
    },
}

#[derive(Args, Debug)]
struct NamespaceArgs {
    /// Bind a prefix, `prefix=uri`; `=uri` binds the default namespace. Repeatable.
    #[arg(long = "ns", value_name = "PREFIX=URI", value_parser = parse_binding)]
    bindings: Vec<(Option<String>, String)>,
}

impl NamespaceArgs {
    fn context(&self) -> Option<NamespaceContext> {
        if self.bindings.is_empty() {
            return None;
        }
        let mut nsc = NamespaceContext::new();
        for (prefix, uri) in &self.bindings {
            nsc.insert(prefix.as_deref(), uri.as_str());
        }
        Some(nsc)
    }
}

fn parse_binding(arg: &str) -> Result<(Option<String>, String), String> {
    let (prefix, uri) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected PREFIX=URI, got '{}'", arg))?;
    if uri.is_empty() {
        return Err(format!("empty namespace URI in '{}'", arg));
    }
    let prefix = (!prefix.is_empty()).then(|| prefix.to_string());
    Ok((prefix, uri.to_string()))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "netxpath=debug" } else { "netxpath=info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match run(cli.command) {
        Ok(code) => code,
        Err(e) => {
            match e.syntax_line() {
                Some(line) => eprintln!("error (line {}): {}", line, e),
                None => eprintln!("error: {}", e),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<ExitCode, NetXPathError> {
    match command {
        Command::Eval {
            namespaces,
            xml,
            local_only,
            mark,
            flags,
            xpath,
        } => {
            let text = std::fs::read_to_string(&xml)?;
            let mut tree = XmlTree::parse(&text)?;
            let nsc = namespaces.context();
            let options = QueryOptions { local_only };

            for selector in &mark {
                let marked = select_ids(&tree, nsc.as_ref(), selector, &options)?;
                log::info!("'{}' marked {} nodes", selector, marked.len());
                for id in marked {
                    tree.insert_flags(id, NodeFlags::MARK);
                }
            }

            let value = query::evaluate_ctx(tree.root(), nsc.as_ref(), &xpath, &options)?;
            match value {
                XPathValue::NodeSet(mut nodes) => {
                    query::retain_flagged(&mut nodes, flags.unwrap_or_default());
                    for node in nodes {
                        println!("{}", node.to_xml_string());
                    }
                }
                scalar => println!("{}", scalar),
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Parse { xpath } => {
            print!("{}", print(&parse_expression(&xpath)?));
            Ok(ExitCode::SUCCESS)
        }
        Command::Unparse { xpath } => {
            println!("{}", unparse(&parse_expression(&xpath)?));
            Ok(ExitCode::SUCCESS)
        }
        Command::Canonical {
            namespaces,
            modules,
            xpath,
        } => {
            let registry = ModuleRegistry::from_json_file(&modules)?;
            let nsc = namespaces.context().unwrap_or_default();
            match xpath_to_canonical(&xpath, &nsc, &registry)? {
                CanonicalXPath::Canonical { xpath, namespaces } => {
                    println!("{}", xpath);
                    if !namespaces.is_empty() {
                        println!("{}", namespaces);
                    }
                    Ok(ExitCode::SUCCESS)
                }
                CanonicalXPath::Failed { reason } => {
                    eprintln!("{}", reason);
                    Ok(ExitCode::from(2))
                }
            }
        }
    }
}

fn select_ids(
    tree: &XmlTree,
    nsc: Option<&NamespaceContext>,
    xpath: &str,
    options: &QueryOptions,
) -> Result<Vec<NodeId>, NetXPathError> {
    match query::evaluate_ctx(tree.root(), nsc, xpath, options)? {
        XPathValue::NodeSet(nodes) => Ok(nodes.iter().map(|n| n.id()).collect()),
        _ => Ok(vec![]),
    }
}
