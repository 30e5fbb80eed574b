use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use dogma_ir::{StructuralValidator, WorkflowGraph};
use dogma_policy::{Policy, PolicyDocument};
use dogma_verify::{Verifier, VerifierConfig};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod render;

const EXIT_ALLOW: u8 = 0;
const EXIT_DENY: u8 = 1;
const EXIT_ERROR: u8 = 2;

fn workflow_arg() -> Arg {
    Arg::new("workflow")
        .long("workflow")
        .short('w')
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Workflow IR document (JSON)")
}

fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .short('c')
        .value_parser(value_parser!(PathBuf))
        .help("Verifier configuration (TOML)")
}

fn json_arg() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Output as JSON")
}

fn cli() -> Command {
    Command::new("dogma")
        .version(dogma_verify::VERSION)
        .about("Static column-policy admission for data workflows")
        .subcommand_required(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit diagnostics on stderr as JSON lines"),
        )
        .subcommand(
            Command::new("verify")
                .about("Admit or deny a workflow against one or more policy documents")
                .arg(workflow_arg())
                .arg(
                    Arg::new("policy")
                        .long("policy")
                        .short('p')
                        .required(true)
                        .num_args(1..)
                        .action(ArgAction::Append)
                        .value_parser(value_parser!(PathBuf))
                        .help("Policy document(s); the verifier checks against their union"),
                )
                .arg(config_arg())
                .arg(json_arg())
                .arg(
                    Arg::new("no-unobserved-check")
                        .long("no-unobserved-check")
                        .action(ArgAction::SetTrue)
                        .help("Skip reads of sources that reach no sink"),
                )
                .arg(
                    Arg::new("no-witness")
                        .long("no-witness")
                        .action(ArgAction::SetTrue)
                        .help("Do not compute witness paths"),
                ),
        )
        .subcommand(
            Command::new("validate")
                .about("Check workflow structure without a policy")
                .arg(workflow_arg())
                .arg(config_arg())
                .arg(json_arg()),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    // a second init (tests, embedding) keeps the first subscriber
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

fn load_config(args: &ArgMatches) -> Result<VerifierConfig> {
    match args.get_one::<PathBuf>("config") {
        Some(path) => VerifierConfig::from_path(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(VerifierConfig::default()),
    }
}

fn load_graph(path: &Path) -> Result<WorkflowGraph> {
    WorkflowGraph::from_path(path).with_context(|| format!("loading workflow {}", path.display()))
}

fn load_policy<'a>(paths: impl IntoIterator<Item = &'a PathBuf>) -> Result<Policy> {
    let mut documents = Vec::new();
    for path in paths {
        let doc = PolicyDocument::from_path(path)
            .with_context(|| format!("loading policy {}", path.display()))?;
        tracing::debug!(file = %doc.file_name, path = %path.display(), "loaded policy document");
        documents.push(doc);
    }
    Ok(Policy::from_documents(documents))
}

fn cmd_verify(args: &ArgMatches) -> Result<u8> {
    let mut config = load_config(args)?;
    if args.get_flag("no-unobserved-check") {
        config = config.with_unobserved_sources(false);
    }
    if args.get_flag("no-witness") {
        config = config.with_witnesses(false);
    }

    let workflow_path = args
        .get_one::<PathBuf>("workflow")
        .context("missing --workflow")?;
    let graph = load_graph(workflow_path)?;
    let policy = load_policy(args.get_many::<PathBuf>("policy").into_iter().flatten())?;

    let verdict = Verifier::with_config(config)
        .verify_graph(graph, &policy)
        .with_context(|| format!("verifying {}", workflow_path.display()))?;

    println!("{}", render::verdict(&verdict, args.get_flag("json"))?);
    Ok(if verdict.is_allowed() { EXIT_ALLOW } else { EXIT_DENY })
}

fn cmd_validate(args: &ArgMatches) -> Result<u8> {
    let config = load_config(args)?;
    let workflow_path = args
        .get_one::<PathBuf>("workflow")
        .context("missing --workflow")?;

    let workflow = StructuralValidator::with_context(config.validation_context())
        .validate(load_graph(workflow_path)?)
        .with_context(|| format!("validating {}", workflow_path.display()))?;

    let summary = render::ValidationSummary::of(&workflow);
    println!("{}", render::summary(&summary, args.get_flag("json"))?);
    Ok(EXIT_ALLOW)
}

fn run(matches: &ArgMatches) -> Result<u8> {
    match matches.subcommand() {
        Some(("verify", args)) => cmd_verify(args),
        Some(("validate", args)) => cmd_validate(args),
        _ => anyhow::bail!("unknown command"),
    }
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    match run(&matches) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}
