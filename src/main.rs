mod client;
mod completion;
mod config;
mod dashboard;
mod datasource;
mod edit;
mod exit;
mod models;
mod prompt;
mod reference;
mod resolve;
mod template;
mod walker;

use crate::client::{ApiClient, ApiError, DashboardStore, ResponseData};
use crate::config::{ConfigError, Profile, Scope, resolve, save};
use crate::datasource::NewDatasource;
use crate::edit::{ExternalEditor, Outcome};
use crate::exit::{ExitCode, ExitCodeExt};
use crate::models::SearchHit;
use crate::prompt::LinePrompter;
use crate::template::Template;
use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use reqwest::Method;
use serde::Serialize;
use serde_json::{Value, json};
use std::io::Write;
use std::path::Path;
use std::{fs, path::PathBuf};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "grafctl", version, about = "CLI for the Grafana HTTP API")]
struct Cli {
    #[arg(
        long,
        global = true,
        env = "GRAFCTL_PROFILE",
        help = "Profile to use for this invocation (otherwise the active one)"
    )]
    profile: Option<String>,

    #[arg(
        long,
        global = true,
        value_name = "ORG_ID",
        env = "GRAFCTL_ORG",
        help = "Organization id sent as X-Grafana-Org-Id (otherwise the active one)"
    )]
    org: Option<String>,

    #[arg(
        long,
        short = 'o',
        value_enum,
        default_value_t = OutputFormat::Pretty,
        global = true,
        help = "Output format (propagates to subcommands)"
    )]
    output: OutputFormat,

    #[arg(
        long,
        value_name = "COL1,COL2",
        global = true,
        help = "Override table columns (comma-separated)"
    )]
    columns: Option<String>,

    #[arg(
        long,
        value_name = "COLUMN",
        global = true,
        help = "Sort table rows by column (ascending)"
    )]
    sort_by: Option<String>,

    #[arg(
        long,
        value_name = "TEXT",
        global = true,
        help = "Filter rows containing TEXT (case-insensitive)"
    )]
    filter: Option<String>,

    #[arg(
        long,
        short = 'v',
        global = true,
        help = "Log requests and decisions to stderr"
    )]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage connection profiles
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Organization operations
    #[command(subcommand)]
    Org(OrgCommand),
    /// Data source operations
    #[command(subcommand)]
    Ds(DsCommand),
    /// Dashboard operations
    #[command(subcommand)]
    Dash(DashCommand),
    /// Send a raw request to the active server
    Request {
        #[arg(value_name = "METHOD")]
        method: String,
        #[arg(value_name = "PATH")]
        path: String,
        #[arg(long, value_name = "JSON", help = "Inline JSON body")]
        body: Option<String>,
        #[arg(long, value_name = "FILE", help = "Path to JSON body")]
        body_file: Option<PathBuf>,
    },
    /// Generate or install shell completion scripts
    #[command(subcommand)]
    Completion(CompletionCommand),
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Save a profile to the chosen scope
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, value_name = "URL")]
        url: String,
        #[arg(long)]
        user: String,
        #[arg(long)]
        pass: String,
        #[arg(
            long,
            value_enum,
            default_value_t = ScopeArg::User,
            help = "Where to write the config (local project dir or user config dir)"
        )]
        scope: ScopeArg,
        #[arg(long = "use", help = "Make the profile active right away")]
        activate: bool,
    },
    /// List saved profiles (passwords masked)
    List,
    /// Select the active profile
    Use {
        #[arg(value_name = "PROFILE")]
        name: String,
        #[arg(long, value_enum, default_value_t = ScopeArg::User)]
        scope: ScopeArg,
    },
    /// Show the merged configuration (passwords masked)
    Show,
}

#[derive(Subcommand)]
enum OrgCommand {
    /// List organizations
    List,
    /// Select the organization for subsequent commands
    Use {
        #[arg(value_name = "ID|NAME")]
        org: String,
        #[arg(long, value_enum, default_value_t = ScopeArg::User)]
        scope: ScopeArg,
    },
    /// Create an organization
    Create {
        #[arg(long)]
        name: String,
    },
    /// Delete an organization
    Rm {
        #[arg(value_name = "ID|NAME")]
        org: String,
    },
    /// Rename an organization
    Update {
        #[arg(value_name = "ID|NAME")]
        org: String,
        #[arg(long)]
        name: String,
    },
}

#[derive(Subcommand)]
enum DsCommand {
    /// List data sources of the active organization
    List,
    /// Show a data source definition
    Read {
        #[arg(value_name = "ID|UID|NAME")]
        ds: String,
    },
    /// Create a data source from a file or from flags
    Create {
        #[arg(long, value_name = "FILE", conflicts_with_all = ["name", "plugin_type", "url"])]
        file: Option<PathBuf>,
        #[arg(long, required_unless_present = "file")]
        name: Option<String>,
        #[arg(long = "type", value_name = "PLUGIN", required_unless_present = "file")]
        plugin_type: Option<String>,
        #[arg(long, value_name = "URL", required_unless_present = "file")]
        url: Option<String>,
        #[arg(long, default_value = "proxy")]
        access: String,
        #[arg(long)]
        basic_auth: bool,
    },
    /// Delete a data source
    Rm {
        #[arg(value_name = "ID|UID|NAME")]
        ds: String,
    },
    /// Update a data source from a file, or interactively in $EDITOR
    Update {
        #[arg(value_name = "ID|UID|NAME", required_unless_present = "file")]
        ds: Option<String>,
        #[arg(long, value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum DashCommand {
    /// List dashboards of the active organization
    List,
    /// Print a dashboard definition
    Read {
        #[arg(value_name = "UID")]
        uid: String,
        #[arg(long, help = "Export as a portable template with datasource inputs")]
        external: bool,
    },
    /// Delete a dashboard
    Rm {
        #[arg(value_name = "UID")]
        uid: String,
    },
    /// Edit a dashboard in $EDITOR and save it back
    Update {
        #[arg(value_name = "UID")]
        uid: String,
    },
    /// Create a dashboard from a file (templates are mapped interactively)
    Create {
        #[arg(long, value_name = "FILE")]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum CompletionCommand {
    /// Print the bash completion script
    Bash,
    /// Print the zsh completion script
    Zsh,
    /// Print the fish completion script
    Fish,
    /// Print the PowerShell completion script
    #[command(name = "powershell")]
    PowerShell,
    /// Add completion to ~/.bashrc or ~/.zshrc for the current shell
    Install,
    /// Remove completion from ~/.bashrc or ~/.zshrc
    Uninstall,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Pretty,
    Json,
    Raw,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ScopeArg {
    Local,
    User,
}

impl From<ScopeArg> for Scope {
    fn from(value: ScopeArg) -> Self {
        match value {
            ScopeArg::Local => Scope::Local,
            ScopeArg::User => Scope::User,
        }
    }
}

#[derive(Clone, Default)]
struct RenderOpts {
    columns_override: Option<Vec<String>>,
    sort_by: Option<String>,
    filter: Option<String>,
}

const ORG_COLUMNS: &[&str] = &["id", "name"];
const DS_COLUMNS: &[&str] = &["id", "uid", "name", "type", "url", "isDefault"];
const DASH_COLUMNS: &[&str] = &["uid", "title", "folderTitle", "tags"];
const PROFILE_COLUMNS: &[&str] = &["active", "name", "url", "user"];
const MASK: &str = "*****";

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let code = match run(cli) {
        Ok(()) => ExitCode::Success,
        Err(err) => {
            eprintln!("Error: {err:#}");
            err.exit_code()
        }
    };
    std::process::exit(code.as_i32());
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("grafctl=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("reading current directory")?;
    let render_opts = RenderOpts {
        columns_override: cli.columns.as_ref().map(|c| {
            c.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        }),
        sort_by: cli.sort_by.clone(),
        filter: cli.filter.clone(),
    };

    // Commands that never talk to a server.
    match cli.command {
        Commands::Config(command) => {
            return handle_config(command, &cwd, cli.output, &render_opts);
        }
        Commands::Completion(command) => return handle_completion(command),
        _ => {}
    }

    let ctx = resolve(&cwd, cli.profile.clone(), cli.org.clone())?;
    tracing::debug!(profile = %ctx.profile.name, org = ?ctx.org_id, "resolved active context");
    let client = ApiClient::new(&ctx)?;

    match cli.command {
        Commands::Org(command) => handle_org(command, &client, &cwd, cli.output, &render_opts)?,
        Commands::Ds(command) => handle_ds(command, &client, cli.output, &render_opts)?,
        Commands::Dash(command) => handle_dash(command, &client, cli.output, &render_opts)?,
        Commands::Request {
            method,
            path,
            body,
            body_file,
        } => {
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .map_err(|_| anyhow!("invalid HTTP method `{method}`"))?;
            let payload = parse_body(&body, &body_file)?;
            let response = client.send(method.clone(), &path, payload.as_ref())?;
            let status = response.status;
            let body = response.body.clone();
            render_response(response, cli.output, &render_opts, None)?;
            if !(200..300).contains(&status) {
                return Err(ApiError::Status {
                    action: format!("{method} {path}"),
                    status,
                    body,
                }
                .into());
            }
        }
        Commands::Config(_) | Commands::Completion(_) => unreachable!("handled earlier"),
    }

    Ok(())
}

fn handle_config(
    command: ConfigCommand,
    cwd: &Path,
    output: OutputFormat,
    render_opts: &RenderOpts,
) -> Result<()> {
    match command {
        ConfigCommand::Add {
            name,
            url,
            user,
            pass,
            scope,
            activate,
        } => {
            let mut existing = config::load_scope(scope.into(), cwd)?;
            existing.upsert_profile(Profile {
                name: name.clone(),
                url,
                user,
                pass,
            });
            if activate {
                existing.set_active(&name)?;
            }
            let path = save(scope.into(), &existing, cwd)?;
            println!("Saved profile {name} to {}", path.display());
        }
        ConfigCommand::List => {
            let merged = config::load(cwd)?;
            let rows: Vec<Value> = merged
                .profiles
                .values()
                .map(|p| {
                    let active = merged.active.as_deref() == Some(p.name.as_str());
                    json!({
                        "active": if active { "*" } else { "" },
                        "name": p.name,
                        "url": p.url,
                        "user": p.user,
                        "pass": MASK,
                    })
                })
                .collect();
            render_value(&Value::Array(rows), output, render_opts, Some(PROFILE_COLUMNS))?;
        }
        ConfigCommand::Use { name, scope } => {
            let merged = config::load(cwd)?;
            if !merged.profiles.contains_key(&name) {
                return Err(ConfigError::UnknownProfile(name).into());
            }
            let mut scoped = config::load_scope(scope.into(), cwd)?;
            scoped.active = Some(name.clone());
            let path = save(scope.into(), &scoped, cwd)?;
            println!("Active profile set to {name} ({})", path.display());
        }
        ConfigCommand::Show => {
            let mut masked = config::load(cwd)?;
            for profile in masked.profiles.values_mut() {
                profile.pass = MASK.into();
            }
            println!("{}", serde_json::to_string_pretty(&masked)?);
        }
    }
    Ok(())
}

fn handle_org(
    command: OrgCommand,
    client: &ApiClient,
    cwd: &Path,
    output: OutputFormat,
    render_opts: &RenderOpts,
) -> Result<()> {
    // Org management is server-wide.
    let server = client.unscoped();
    match command {
        OrgCommand::List => {
            let response = server.get("/api/orgs", &[])?.ensure_success("listing organizations")?;
            render_response(response, output, render_opts, Some(ORG_COLUMNS))?;
        }
        OrgCommand::Use { org, scope } => {
            let found = client.find_org(&org)?;
            let mut scoped = config::load_scope(scope.into(), cwd)?;
            scoped.active_org = Some(found.id.to_string());
            save(scope.into(), &scoped, cwd)?;
            println!("Active organization set to {} (ID: {})", found.name, found.id);
        }
        OrgCommand::Create { name } => {
            let response = server
                .post_json("/api/orgs", &json!({ "name": name }))?
                .ensure_success("creating organization")?;
            render_response(response, output, render_opts, None)?;
        }
        OrgCommand::Rm { org } => {
            let found = client.find_org(&org)?;
            let response = server
                .delete(&format!("/api/orgs/{}", found.id))?
                .ensure_success("deleting organization")?;
            render_response(response, output, render_opts, None)?;
        }
        OrgCommand::Update { org, name } => {
            let found = client.find_org(&org)?;
            let response = server
                .put_json(&format!("/api/orgs/{}", found.id), &json!({ "name": name }))?
                .ensure_success("updating organization")?;
            render_response(response, output, render_opts, None)?;
        }
    }
    Ok(())
}

fn handle_ds(
    command: DsCommand,
    client: &ApiClient,
    output: OutputFormat,
    render_opts: &RenderOpts,
) -> Result<()> {
    match command {
        DsCommand::List => {
            let response = client
                .get("/api/datasources", &[])?
                .ensure_success("listing datasources")?;
            render_response(response, output, render_opts, Some(DS_COLUMNS))?;
        }
        DsCommand::Read { ds } => {
            render_response(datasource::read(client, &ds)?, output, render_opts, None)?;
        }
        DsCommand::Create {
            file,
            name,
            plugin_type,
            url,
            access,
            basic_auth,
        } => {
            let payload = match (file, name, plugin_type, url) {
                (Some(path), ..) => read_json_file(&path)?,
                (None, Some(name), Some(plugin_type), Some(url)) => NewDatasource {
                    name,
                    plugin_type,
                    url,
                    access,
                    basic_auth,
                }
                .payload(),
                _ => return Err(anyhow!("provide --file or all of --name, --type, --url")),
            };
            let response = client
                .post_json("/api/datasources", &payload)?
                .ensure_success("creating datasource")?;
            render_response(response, output, render_opts, None)?;
        }
        DsCommand::Rm { ds } => {
            render_response(datasource::remove(client, &ds)?, output, render_opts, None)?;
        }
        DsCommand::Update { ds, file: Some(path) } => {
            let document = match read_json_file(&path)? {
                Value::Object(map) => map,
                _ => return Err(anyhow!("{} does not contain a JSON object", path.display())),
            };
            let response = datasource::update_from_document(client, document, ds.as_deref())?;
            render_response(response, output, render_opts, None)?;
        }
        DsCommand::Update { ds, file: None } => {
            let ds = ds.ok_or_else(|| anyhow!("name a datasource to edit or pass --file"))?;
            let outcome = datasource::update_interactive(client, &ds, ExternalEditor::from_env())?;
            report_outcome(outcome, "Datasource", output, render_opts)?;
        }
    }
    Ok(())
}

fn handle_dash(
    command: DashCommand,
    client: &ApiClient,
    output: OutputFormat,
    render_opts: &RenderOpts,
) -> Result<()> {
    match command {
        DashCommand::List => {
            let response = client
                .get("/api/search", &[("type", "dash-db".to_string())])?
                .ensure_success("listing dashboards")?;
            if output == OutputFormat::Raw {
                println!("{}", response.body);
                return Ok(());
            }
            let hits: Vec<SearchHit> = response.parse()?;
            let rows: Vec<Value> = hits
                .iter()
                .map(|hit| {
                    json!({
                        "uid": hit.uid,
                        "title": hit.title,
                        "folderTitle": hit.folder(),
                        "tags": hit.tags.join(", "),
                    })
                })
                .collect();
            render_value(&Value::Array(rows), output, render_opts, Some(DASH_COLUMNS))?;
        }
        DashCommand::Read { uid, external } => {
            if external {
                let exported = dashboard::export(client, client, &uid)?;
                print_document(&exported, output)?;
            } else {
                let envelope = client.dashboard(&uid)?;
                print_document(&envelope.dashboard, output)?;
            }
        }
        DashCommand::Rm { uid } => {
            let response = client
                .delete(&format!("/api/dashboards/uid/{uid}"))?
                .ensure_success("deleting dashboard")?;
            render_response(response, output, render_opts, None)?;
        }
        DashCommand::Update { uid } => {
            let outcome = dashboard::update(client, &uid, ExternalEditor::from_env())?;
            report_outcome(outcome, "Dashboard", output, render_opts)?;
        }
        DashCommand::Create { file } => {
            let raw = fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
            let template = Template::parse(&raw)
                .with_context(|| format!("parsing {}", file.display()))?;
            if !template.inputs.is_empty() {
                println!(
                    "This dashboard is an external template and requires datasource mapping."
                );
            }
            let mut prompter = LinePrompter::stdio();
            let response = dashboard::create(template, client, client, &mut prompter)?;
            println!("Dashboard created successfully.");
            render_response(response, output, render_opts, None)?;
        }
    }
    Ok(())
}

fn report_outcome(
    outcome: Outcome,
    what: &str,
    output: OutputFormat,
    render_opts: &RenderOpts,
) -> Result<()> {
    match outcome {
        Outcome::Submitted(response) => {
            println!("{what} updated successfully.");
            render_response(response, output, render_opts, None)
        }
        Outcome::Aborted => {
            println!("No content, skipping update.");
            Ok(())
        }
    }
}

fn handle_completion(command: CompletionCommand) -> Result<()> {
    use clap_complete::shells;
    let mut out = std::io::stdout();
    match command {
        CompletionCommand::Bash => out.write_all(&completion_script(shells::Bash))?,
        CompletionCommand::Zsh => out.write_all(&completion_script(shells::Zsh))?,
        CompletionCommand::Fish => out.write_all(&completion_script(shells::Fish))?,
        CompletionCommand::PowerShell => out.write_all(&completion_script(shells::PowerShell))?,
        CompletionCommand::Install | CompletionCommand::Uninstall => {
            let shell = completion::detect_shell().ok_or_else(|| {
                anyhow!("could not detect a bash or zsh shell; install the completion script manually")
            })?;
            let install = completion::Install::new(completion::home_dir()?, shell);
            if matches!(command, CompletionCommand::Install) {
                let script = match shell {
                    completion::RcShell::Bash => completion_script(shells::Bash),
                    completion::RcShell::Zsh => completion_script(shells::Zsh),
                };
                install.install(&script)?;
                println!(
                    "Installed grafctl completion for {0}. Restart your shell or run `source {1}`.",
                    shell.name(),
                    install.rc_file().display()
                );
            } else if install.uninstall()? {
                println!(
                    "Removed grafctl completion for {}. Restart your shell.",
                    shell.name()
                );
            } else {
                println!("No grafctl completion found in {}.", install.rc_file().display());
            }
        }
    }
    Ok(())
}

fn completion_script<G: clap_complete::Generator>(generator: G) -> Vec<u8> {
    let mut cmd = Cli::command();
    let bin = cmd.get_name().to_string();
    let mut script = Vec::new();
    clap_complete::generate(generator, &mut cmd, bin, &mut script);
    script
}

fn print_document<T: Serialize>(document: &T, output: OutputFormat) -> Result<()> {
    let text = match output {
        OutputFormat::Pretty => serde_json::to_string_pretty(document)?,
        OutputFormat::Json | OutputFormat::Raw => serde_json::to_string(document)?,
    };
    println!("{text}");
    Ok(())
}

fn render_response(
    response: ResponseData,
    output: OutputFormat,
    render_opts: &RenderOpts,
    columns: Option<&[&str]>,
) -> Result<()> {
    match (output, response.json) {
        (OutputFormat::Raw, _) | (_, None) => {
            println!("{}", response.body);
            Ok(())
        }
        (_, Some(json)) => render_value(&json, output, render_opts, columns),
    }
}

fn render_value(
    json: &Value,
    output: OutputFormat,
    render_opts: &RenderOpts,
    columns: Option<&[&str]>,
) -> Result<()> {
    match output {
        OutputFormat::Json | OutputFormat::Raw => println!("{}", serde_json::to_string(json)?),
        OutputFormat::Pretty => match format_table(json, columns, render_opts) {
            Some(table) => print!("{table}"),
            None => println!("{}", serde_json::to_string_pretty(json)?),
        },
    }
    Ok(())
}

/// Renders an array of objects as aligned columns, or `None` when the value
/// is not tabular.
fn format_table(
    json: &Value,
    columns_hint: Option<&[&str]>,
    render_opts: &RenderOpts,
) -> Option<String> {
    let rows = match json {
        Value::Array(arr) => arr,
        _ => return None,
    };

    if rows.is_empty() {
        return Some("No resources found.\n".into());
    }

    let first_obj = rows[0].as_object()?;
    let has_values = |key: &str| rows.iter().any(|row| row.get(key).is_some_and(is_non_empty));

    let mut columns: Vec<String> = Vec::new();

    if let Some(override_cols) = &render_opts.columns_override {
        columns.extend(override_cols.iter().filter(|k| has_values(k.as_str())).cloned());
    }

    if columns.is_empty()
        && let Some(hint) = columns_hint
    {
        columns.extend(hint.iter().copied().filter(|k| has_values(*k)).map(str::to_string));
    }

    if columns.is_empty() {
        // Up to 8 fields of the first object that carry a value somewhere.
        columns.extend(first_obj.keys().filter(|k| has_values(k.as_str())).take(8).cloned());
    }

    if columns.is_empty() {
        return None;
    }

    let mut widths: Vec<usize> = columns.iter().map(|c| c.len()).collect();
    let mut table: Vec<Vec<String>> = Vec::new();
    let needle = render_opts.filter.as_ref().map(|f| f.to_ascii_lowercase());

    for row in rows {
        let Value::Object(map) = row else { continue };
        let out_row: Vec<String> = columns
            .iter()
            .map(|col| value_to_str(map.get(col).unwrap_or(&Value::Null)))
            .collect();
        if let Some(needle) = &needle
            && !out_row
                .iter()
                .any(|cell| cell.to_ascii_lowercase().contains(needle))
        {
            continue;
        }
        for (idx, cell) in out_row.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
        table.push(out_row);
    }

    if table.is_empty() {
        return Some("No resources found.\n".into());
    }

    if let Some(sort) = &render_opts.sort_by
        && let Some(idx) = columns.iter().position(|c| c == sort)
    {
        table.sort_by(|a, b| a[idx].cmp(&b[idx]));
    }

    let mut out = String::new();
    let mut push_line = |cells: &[String]| {
        let line: Vec<String> = cells
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{:width$}", cell, width = widths[i]))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    };
    push_line(&columns);
    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&separator);
    for row in &table {
        push_line(row);
    }
    Some(out)
}

fn value_to_str(value: &Value) -> String {
    match value {
        Value::Null => "".into(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

fn is_non_empty(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(_) => true,
        Value::Number(_) => true,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(arr) => !arr.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn read_json_file(path: &Path) -> Result<Value> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {} as JSON", path.display()))
}

fn parse_body(body: &Option<String>, body_file: &Option<PathBuf>) -> Result<Option<Value>> {
    match (body, body_file) {
        (Some(inline), None) => {
            let value = serde_json::from_str(inline).context("parsing --body as JSON")?;
            Ok(Some(value))
        }
        (None, Some(path)) => read_json_file(path).map(Some),
        (None, None) => Ok(None),
        (Some(_), Some(_)) => Err(anyhow!("use only one of --body or --body-file")),
    }
}
