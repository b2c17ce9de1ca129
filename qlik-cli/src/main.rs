use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use env_logger::Env;

use qlik_core::differ::{create_plan, destroy_plan};
use qlik_core::effect::Effect;
use qlik_core::plan::Plan;
use qlik_core::provider::{Provider, ResourceType};
use qlik_core::resource::{Resource, ResourceId, State, Value, attributes_to_json};
use qlik_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use qlik_provider::data_sources::data_source_types;
use qlik_provider::resources::resource_types;
use qlik_provider::{ProcessEnv, ProviderSettings, QlikProvider};

mod manifest;
mod state;

use manifest::{Bindings, Manifest, Reference, first_unresolved, sort_by_dependencies};
use state::{LocalState, StateFile};

#[derive(Parser)]
#[command(name = "qlik")]
#[command(about = "Manage Qlik Cloud spaces, connections and data integration projects", long_about = None)]
struct Cli {
    /// Path to the state file
    #[arg(long, global = true, default_value = LocalState::DEFAULT_STATE_FILE)]
    state: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print resource and data source schemas
    Schema {
        /// Only this type
        type_name: Option<String>,
    },
    /// Validate the manifest against the schemas
    Validate {
        /// Path to the JSON manifest
        #[arg(default_value = "qlik.json")]
        file: PathBuf,
    },
    /// Show execution plan without applying changes
    Plan {
        /// Path to the JSON manifest
        #[arg(default_value = "qlik.json")]
        file: PathBuf,
    },
    /// Apply changes to reach the desired state
    Apply {
        /// Path to the JSON manifest
        #[arg(default_value = "qlik.json")]
        file: PathBuf,
    },
    /// Destroy every resource recorded in the state file
    Destroy {
        /// Path to the JSON manifest
        #[arg(default_value = "qlik.json")]
        file: PathBuf,

        /// Skip confirmation prompt (auto-approve)
        #[arg(long)]
        auto_approve: bool,
    },
    /// Run a data source and print the result as JSON
    Query {
        /// Data source type, e.g. qlik_spaces
        type_name: String,

        /// Query attribute as key=value
        #[arg(long = "attr", value_parser = parse_attr)]
        attrs: Vec<(String, String)>,

        /// Manifest holding the provider settings
        #[arg(long, default_value = "qlik.json")]
        file: PathBuf,
    },
}

fn parse_attr(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", s)),
    }
}

#[tokio::main]
async fn main() {
    env_logger::init_from_env(Env::default().default_filter_or("warn"));
    let cli = Cli::parse();
    let store = LocalState::with_path(cli.state);

    let result = match cli.command {
        Commands::Schema { type_name } => run_schema(type_name.as_deref()),
        Commands::Validate { file } => run_validate(&file),
        Commands::Plan { file } => run_plan(&file, &store).await,
        Commands::Apply { file } => run_apply(&file, &store).await,
        Commands::Destroy { file, auto_approve } => run_destroy(&file, &store, auto_approve).await,
        Commands::Query {
            type_name,
            attrs,
            file,
        } => run_query(&type_name, attrs, &file).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// Schemas by type name, kept apart because `qlik_space` is both kinds
struct Schemas {
    resources: HashMap<String, ResourceSchema>,
    data_sources: HashMap<String, ResourceSchema>,
}

impl Schemas {
    fn load() -> Self {
        fn by_name(types: Vec<Box<dyn ResourceType>>) -> HashMap<String, ResourceSchema> {
            types
                .into_iter()
                .map(|t| (t.name().to_string(), t.schema()))
                .collect()
        }
        Self {
            resources: by_name(resource_types()),
            data_sources: by_name(data_source_types()),
        }
    }

    fn of(&self, resource_type: &str, data_source: bool) -> Option<&ResourceSchema> {
        if data_source {
            self.data_sources.get(resource_type)
        } else {
            self.resources.get(resource_type)
        }
    }
}

fn validate_resources(resources: &[Resource]) -> Result<(), String> {
    let schemas = Schemas::load();
    let mut all_errors = Vec::new();

    for resource in resources {
        match schemas.of(&resource.id.resource_type, resource.is_data_source()) {
            Some(schema) => {
                if let Err(errors) = schema.validate_config(&resource.attributes) {
                    for error in errors {
                        all_errors.push(format!("{}: {}", resource.id, error));
                    }
                }
            }
            None => all_errors.push(format!(
                "{}: unknown type '{}'",
                resource.id, resource.id.resource_type
            )),
        }
    }

    if all_errors.is_empty() {
        Ok(())
    } else {
        Err(format!("Validation failed:\n  {}", all_errors.join("\n  ")))
    }
}

/// Manifest entries validated and ordered so references point backwards
fn load_desired(file: &Path) -> Result<(Manifest, Vec<Resource>), String> {
    let manifest = Manifest::load(file).map_err(|e| e.to_string())?;
    let resources = manifest.to_resources().map_err(|e| e.to_string())?;
    validate_resources(&resources)?;
    let sorted = sort_by_dependencies(&resources).map_err(|e| e.to_string())?;
    Ok((manifest, sorted))
}

fn configure(settings: &ProviderSettings) -> Result<QlikProvider, String> {
    QlikProvider::configure(settings, &ProcessEnv).map_err(|diagnostics| {
        diagnostics
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    })
}

fn run_schema(type_name: Option<&str>) -> Result<(), String> {
    let kinds = resource_types()
        .into_iter()
        .map(|t| ("resource", t))
        .chain(data_source_types().into_iter().map(|t| ("data source", t)));

    let mut printed = 0;
    for (kind, resource_type) in kinds {
        if type_name.is_some_and(|name| name != resource_type.name()) {
            continue;
        }
        let schema = resource_type.schema();
        println!("{} {}", schema.resource_type.cyan().bold(), format!("({})", kind).dimmed());
        for name in schema.attribute_names() {
            if let Some(attr) = schema.attributes.get(name) {
                print_attribute_schema(attr, "  ");
            }
        }
        println!();
        printed += 1;
    }

    match (printed, type_name) {
        (0, Some(name)) => Err(format!("Unknown type: {}", name)),
        _ => Ok(()),
    }
}

fn print_attribute_schema(attr: &AttributeSchema, indent: &str) {
    let presence = if attr.is_required() {
        "required"
    } else if !attr.is_configurable() {
        "computed"
    } else if attr.is_computed() {
        "optional, computed"
    } else {
        "optional"
    };
    let mut flags = vec![presence.to_string()];
    if attr.sensitive {
        flags.push("sensitive".to_string());
    }
    if attr.write_only {
        flags.push("write-only".to_string());
    }
    if let Some(default) = &attr.default {
        flags.push(format!("default {}", format_value(default)));
    }

    println!(
        "{}{:<24} {:<14} {}",
        indent,
        attr.name,
        attr.attr_type.to_string(),
        flags.join(", ").dimmed()
    );
    if let Some(description) = &attr.description {
        println!("{}  {}", indent, description.dimmed());
    }

    if let AttributeType::Object(fields) | AttributeType::ListOfObjects(fields) = &attr.attr_type {
        let nested = format!("{}    ", indent);
        for field in fields {
            print_attribute_schema(field, &nested);
        }
    }
}

fn run_validate(file: &Path) -> Result<(), String> {
    println!("{}", "Validating...".cyan());

    let (_, resources) = load_desired(file)?;

    println!(
        "{}",
        format!("✓ {} resources validated successfully.", resources.len())
            .green()
            .bold()
    );
    for resource in &resources {
        println!("  • {}", resource.id);
    }
    Ok(())
}

/// Re-read every resource in state; those gone remotely are dropped
async fn refresh(provider: &QlikProvider, state_file: &mut StateFile) -> Result<(), String> {
    for id in state_file.ids() {
        let Some(recorded) = state_file.find(&id) else {
            continue;
        };
        let current = provider
            .read(&recorded.to_state())
            .await
            .map_err(|e| format!("Failed to refresh {}: {}", id, e))?;

        if current.exists {
            state_file.upsert(&current);
        } else {
            println!(
                "{}",
                format!("{} no longer exists and was removed from state.", id).yellow()
            );
            state_file.remove(&id);
        }
    }
    Ok(())
}

struct PlannedRun {
    plan: Plan,
    bindings: Bindings,
    /// Data sources already queried while planning
    queried: HashSet<ResourceId>,
}

async fn build_plan(
    provider: &QlikProvider,
    resources: &[Resource],
    state_file: &StateFile,
) -> Result<PlannedRun, String> {
    let current_states = state_file.states();
    let mut bindings = Bindings::new();
    for (id, state) in &current_states {
        bindings.insert(id, &state.attributes);
    }

    let mut queried = HashSet::new();
    let mut desired = Vec::with_capacity(resources.len());
    for resource in resources {
        let resolved = bindings.resolve(resource);
        if resolved.is_data_source() && first_unresolved(&resolved).is_none() {
            let result = provider
                .read_data_source(&resolved)
                .await
                .map_err(|e| e.to_string())?;
            bindings.insert(&resolved.id, &result.attributes);
            queried.insert(resolved.id.clone());
        } else {
            bindings.insert(&resolved.id, &resolved.attributes);
        }
        desired.push(resolved);
    }

    let plan = create_plan(
        &desired,
        &current_states,
        &state_file.ids(),
        &Schemas::load().resources,
    );
    Ok(PlannedRun {
        plan,
        bindings,
        queried,
    })
}

async fn run_plan(file: &Path, store: &LocalState) -> Result<(), String> {
    let (manifest, resources) = load_desired(file)?;
    let provider = configure(&manifest.provider)?;

    let mut state_file = store.read_or_default().map_err(|e| e.to_string())?;
    refresh(&provider, &mut state_file).await?;

    let planned = build_plan(&provider, &resources, &state_file).await?;
    print_plan(&planned.plan);
    Ok(())
}

async fn run_apply(file: &Path, store: &LocalState) -> Result<(), String> {
    let (manifest, resources) = load_desired(file)?;
    let provider = configure(&manifest.provider)?;

    let mut state_file = store.read_or_default().map_err(|e| e.to_string())?;
    refresh(&provider, &mut state_file).await?;
    store.write(&mut state_file).map_err(|e| e.to_string())?;

    let PlannedRun {
        plan,
        mut bindings,
        queried,
    } = build_plan(&provider, &resources, &state_file).await?;

    if !plan.has_changes() {
        println!("{}", "No changes needed.".green());
        return Ok(());
    }

    print_plan(&plan);
    println!();
    println!("{}", "Applying changes...".cyan().bold());
    println!();

    let mut success_count = 0;
    let mut failure_count = 0;

    for effect in plan.effects() {
        if let Effect::Read(r) = effect
            && queried.contains(&r.id)
        {
            continue;
        }

        match execute(&provider, effect, &mut bindings).await {
            Ok(Outcome::Stored(state)) => {
                state_file.upsert(&state);
                store.write(&mut state_file).map_err(|e| e.to_string())?;
            }
            Ok(Outcome::Removed(id)) => {
                state_file.remove(&id);
                store.write(&mut state_file).map_err(|e| e.to_string())?;
            }
            Ok(Outcome::Queried) => {}
            Err(e) => {
                println!("  {} {} - {}", "✗".red(), effect, e);
                failure_count += 1;
                continue;
            }
        }
        println!("  {} {}", "✓".green(), effect);
        if effect.is_mutating() {
            success_count += 1;
        }
    }

    println!();
    if failure_count == 0 {
        println!(
            "{}",
            format!("Apply complete! {} changes applied.", success_count)
                .green()
                .bold()
        );
        Ok(())
    } else {
        Err(format!(
            "Apply failed. {} succeeded, {} failed.",
            success_count, failure_count
        ))
    }
}

enum Outcome {
    Stored(State),
    Removed(ResourceId),
    Queried,
}

fn resolve(resource: &Resource, bindings: &Bindings) -> Result<Resource, String> {
    let resolved = bindings.resolve(resource);
    match first_unresolved(&resolved) {
        Some(reference) => Err(format!("unresolved reference {}", reference)),
        None => Ok(resolved),
    }
}

/// Run one effect with references resolved against everything known so far
async fn execute(
    provider: &QlikProvider,
    effect: &Effect,
    bindings: &mut Bindings,
) -> Result<Outcome, String> {
    match effect {
        Effect::Read(query) => {
            let query = resolve(query, bindings)?;
            let result = provider
                .read_data_source(&query)
                .await
                .map_err(|e| e.to_string())?;
            bindings.insert(&query.id, &result.attributes);
            Ok(Outcome::Queried)
        }
        Effect::Create(resource) => {
            let resource = resolve(resource, bindings)?;
            let state = provider.create(&resource).await.map_err(|e| e.to_string())?;
            bindings.insert(&state.id, &state.attributes);
            Ok(Outcome::Stored(state))
        }
        Effect::Update { id, from, to, .. } => {
            let to = resolve(to, bindings)?;
            let state = provider
                .update(id, from, &to)
                .await
                .map_err(|e| e.to_string())?;
            bindings.insert(&state.id, &state.attributes);
            Ok(Outcome::Stored(state))
        }
        Effect::Delete(state) => {
            provider.delete(state).await.map_err(|e| e.to_string())?;
            Ok(Outcome::Removed(state.id.clone()))
        }
    }
}

async fn run_destroy(file: &Path, store: &LocalState, auto_approve: bool) -> Result<(), String> {
    let manifest = Manifest::load(file).map_err(|e| e.to_string())?;
    let provider = configure(&manifest.provider)?;

    let mut state_file = store.read_or_default().map_err(|e| e.to_string())?;
    refresh(&provider, &mut state_file).await?;
    store.write(&mut state_file).map_err(|e| e.to_string())?;

    let plan = destroy_plan(&state_file.states(), &state_file.ids());
    if !plan.has_changes() {
        println!("{}", "No resources to destroy.".green());
        return Ok(());
    }

    println!("{}", "Destroy Plan:".red().bold());
    println!();
    for effect in plan.effects() {
        println!("  {} {}", "-".red().bold(), effect.resource_id());
    }
    println!();
    println!("{}", plan.summary());
    println!();

    if !auto_approve {
        println!(
            "{}",
            "Do you really want to destroy all resources?"
                .yellow()
                .bold()
        );
        println!(
            "  {}",
            "This action cannot be undone. Type 'yes' to confirm.".yellow()
        );
        print!("\n  Enter a value: ");
        std::io::Write::flush(&mut std::io::stdout()).map_err(|e| e.to_string())?;

        let mut input = String::new();
        std::io::stdin()
            .read_line(&mut input)
            .map_err(|e| e.to_string())?;

        if input.trim() != "yes" {
            println!();
            println!("{}", "Destroy cancelled.".yellow());
            return Ok(());
        }
        println!();
    }

    println!("{}", "Destroying resources...".red().bold());
    println!();

    let mut success_count = 0;
    let mut failure_count = 0;

    for effect in plan.effects() {
        let Effect::Delete(current) = effect else {
            continue;
        };
        let id = &current.id;
        match provider.delete(current).await {
            Ok(()) => {
                println!("  {} delete {}", "✓".green(), id);
                state_file.remove(id);
                store.write(&mut state_file).map_err(|e| e.to_string())?;
                success_count += 1;
            }
            Err(e) => {
                println!("  {} delete {} - {}", "✗".red(), id, e);
                failure_count += 1;
            }
        }
    }

    println!();
    if failure_count == 0 {
        println!(
            "{}",
            format!("Destroy complete! {} resources destroyed.", success_count)
                .green()
                .bold()
        );
        Ok(())
    } else {
        Err(format!(
            "Destroy failed. {} succeeded, {} failed.",
            success_count, failure_count
        ))
    }
}

async fn run_query(
    type_name: &str,
    attrs: Vec<(String, String)>,
    file: &Path,
) -> Result<(), String> {
    let settings = if file.exists() {
        Manifest::load(file).map_err(|e| e.to_string())?.provider
    } else {
        ProviderSettings::default()
    };
    let provider = configure(&settings)?;

    let mut query = Resource::new(type_name, "query").with_read_only(true);
    for (key, value) in attrs {
        query = query.with_attribute(key, Value::String(value));
    }
    validate_resources(std::slice::from_ref(&query))?;

    let result = provider
        .read_data_source(&query)
        .await
        .map_err(|e| e.to_string())?;
    let json = serde_json::Value::Object(attributes_to_json(&result.attributes));
    let rendered = serde_json::to_string_pretty(&json).map_err(|e| e.to_string())?;
    println!("{}", rendered);
    Ok(())
}

fn print_plan(plan: &Plan) {
    if !plan.has_changes() {
        println!("{}", "No changes. Infrastructure is up-to-date.".green());
        return;
    }

    let schemas = Schemas::load();
    println!("{}", "Execution Plan:".cyan().bold());
    println!();

    for effect in plan.effects() {
        let schema = schemas.of(
            &effect.resource_id().resource_type,
            matches!(effect, Effect::Read(_)),
        );
        let attribute = |name: &str| schema.and_then(|s| s.attributes.get(name));

        match effect {
            Effect::Read(r) => {
                println!("  {} {}", "<=".cyan().bold(), r.id);
            }
            Effect::Create(r) => {
                println!("  {} {}", "+".green().bold(), r.id);
                let mut names: Vec<&String> = r.attributes.keys().collect();
                names.sort();
                for name in names {
                    println!(
                        "      {}: {}",
                        name,
                        format_attribute(attribute(name), &r.attributes[name])
                    );
                }
            }
            Effect::Update {
                id,
                from,
                to,
                changed_attributes,
            } => {
                println!("  {} {}", "~".yellow().bold(), id);
                for name in changed_attributes {
                    let old = from
                        .attributes
                        .get(name)
                        .map(|v| format_attribute(attribute(name), v))
                        .unwrap_or_else(|| "(none)".to_string());
                    let new = to
                        .attributes
                        .get(name)
                        .map(|v| format_attribute(attribute(name), v))
                        .unwrap_or_else(|| "(none)".to_string());
                    println!("      {}: {} → {}", name, old.red(), new.green());
                }
            }
            Effect::Delete(state) => {
                println!("  {} {}", "-".red().bold(), state.id);
            }
        }
    }

    println!();
    println!("{}", plan.summary());
}

/// Render a value, hiding anything the schema marks sensitive
fn format_attribute(schema: Option<&AttributeSchema>, value: &Value) -> String {
    let Some(schema) = schema else {
        return format_value(value);
    };
    if schema.sensitive {
        return "(sensitive)".to_string();
    }
    match (&schema.attr_type, value) {
        (AttributeType::Object(fields), Value::Map(_)) => format_object(fields, value),
        (AttributeType::ListOfObjects(fields), Value::List(items)) => {
            let strs: Vec<_> = items.iter().map(|v| format_object(fields, v)).collect();
            format!("[{}]", strs.join(", "))
        }
        _ => format_value(value),
    }
}

fn format_object(fields: &[AttributeSchema], value: &Value) -> String {
    let Value::Map(map) = value else {
        return format_value(value);
    };
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    let strs: Vec<_> = keys
        .into_iter()
        .map(|k| {
            let field = fields.iter().find(|f| &f.name == k);
            format!("{}: {}", k, format_attribute(field, &map[k]))
        })
        .collect();
    format!("{{{}}}", strs.join(", "))
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) if Reference::parse(s).is_some() => "(known after apply)".to_string(),
        Value::String(s) => format!("\"{}\"", s),
        Value::Int(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::List(items) => {
            let strs: Vec<_> = items.iter().map(format_value).collect();
            format!("[{}]", strs.join(", "))
        }
        Value::Map(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let strs: Vec<_> = keys
                .into_iter()
                .map(|k| format!("{}: {}", k, format_value(&map[k])))
                .collect();
            format!("{{{}}}", strs.join(", "))
        }
    }
}
