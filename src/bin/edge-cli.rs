use clap::{Parser, Subcommand};

use edge_redirect::edge::{Decision, EdgeRequest, RequestProcessor};
use edge_redirect::rules::{defaults, Condition, RedirectTarget, RuleSet};
use edge_redirect::source::{HttpFetcher, RuleFetcher};

#[derive(Parser)]
#[command(name = "edge-cli")]
#[command(about = "Inspect and try out redirect rule documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a rule document and list its rules
    Check {
        /// File path or http(s) URL; the bundled rules when omitted
        source: Option<String>,

        /// Key holding the rule array
        #[arg(long)]
        json_key: Option<String>,
    },
    /// Show what the interceptor would do with a request path
    Resolve {
        /// Request path, optionally with a query string (e.g. "/blog/2024/post?x=1")
        path: String,

        /// File path or http(s) URL; the bundled rules when omitted
        #[arg(short, long)]
        rules: Option<String>,

        /// Key holding the rule array
        #[arg(long)]
        json_key: Option<String>,

        #[arg(long, default_value = "www.example.com")]
        host: String,

        #[arg(long, default_value = "https")]
        scheme: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { source, json_key } => {
            let rules = load_rules(source.as_deref(), json_key.as_deref()).await?;
            println!("{} rule(s)", rules.len());
            for (index, rule) in rules.iter().enumerate() {
                println!(
                    "#{index:<3} {} {:<12} {:<30} -> {}",
                    rule.redirect.status_code.as_u16(),
                    rule.condition.kind(),
                    describe_condition(&rule.condition),
                    describe_target(&rule.redirect.uri),
                );
            }
        }
        Commands::Resolve {
            path,
            rules,
            json_key,
            host,
            scheme,
        } => {
            let rules = load_rules(rules.as_deref(), json_key.as_deref()).await?;
            let (uri, querystring) = match path.split_once('?') {
                Some((uri, query)) => (uri.to_string(), query.to_string()),
                None => (path.clone(), String::new()),
            };
            let request = EdgeRequest {
                uri,
                querystring,
                host: Some(host),
                authorization: None,
                client_ip: "127.0.0.1".to_string(),
            };

            match RequestProcessor::new(scheme).process(&request, &rules)? {
                Decision::Redirect { status, location, stage } => {
                    println!("{} {} ({})", status.as_u16(), location, stage.as_str());
                }
                Decision::Forward { uri } => println!("forward {uri}"),
            }
        }
    }

    Ok(())
}

async fn load_rules(source: Option<&str>, json_key: Option<&str>) -> Result<RuleSet, Box<dyn std::error::Error>> {
    let rules = match source {
        None => defaults::bundled()?,
        Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
            let document = HttpFetcher::default().fetch(url).await?;
            RuleSet::from_json_value(document, json_key)?
        }
        Some(path) => RuleSet::from_json_str(&std::fs::read_to_string(path)?, json_key)?,
    };
    Ok(rules)
}

fn describe_condition(condition: &Condition) -> String {
    match condition {
        Condition::ExactMatch(value) | Condition::PrefixMatch(value) => format!("{value:?}"),
        Condition::Regexp { pattern, regex: Some(_) } => format!("/{pattern}/"),
        Condition::Regexp { pattern, regex: None } => format!("/{pattern}/ (invalid, disabled)"),
        Condition::Unsupported { .. } => "(unsupported, never matches)".to_string(),
    }
}

fn describe_target(target: &RedirectTarget) -> String {
    match target {
        RedirectTarget::Uri(uri) => uri.clone(),
        RedirectTarget::Location(loc) => {
            let mut out = format!("{}{}", loc.origin().unwrap_or("<request origin>"), loc.path);
            if let Some(qs) = loc.querystring() {
                out.push_str(&format!(" (+?{qs})"));
            }
            out
        }
    }
}
