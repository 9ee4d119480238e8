//! Manuscript CLI: chapters, versions and the codex of a writing project.
//!
//! Usage:
//!   manuscript --user <id> project create <title>
//!   manuscript --user <id> chapter add <project> <title> [--text ...]
//!   manuscript --user <id> entity add <project> <type> <name> [--attr key=value] [--image ...]
//!   manuscript --user <id> rel add <project> <source> <target> <type> [--inverse]
//!   manuscript --user <id> rel for <project> <entity>
//!   manuscript --user <id> network <project> [--type character]
//!
//! Results are printed to stdout as JSON. Failures are printed to stderr as
//! `{"kind": ..., "message": ...}` and exit with status 1.

use clap::{Parser, Subcommand};
use manuscript::{
    AttributeValue, Attributes, ChapterId, ChapterPatch, Config, Content, EntityId, EntityPatch,
    EntityType, Environment, ManuscriptApi, ManuscriptError, ManuscriptResult, NewEntity,
    NewRelationship, OpenStore, ProjectId, RelationshipId, RelationshipPatch, SqliteStore, UserId,
    VersionId,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "manuscript",
    version,
    about = "Chapter ordering, version history and story codex"
)]
struct Cli {
    /// Path to SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Caller identity used for ownership checks
    #[arg(long, global = true, env = "MANUSCRIPT_USER")]
    user: Option<String>,
    /// development | production
    #[arg(long = "env", global = true)]
    environment: Option<Environment>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage projects
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },
    /// Manage chapters and their order
    Chapter {
        #[command(subcommand)]
        action: ChapterAction,
    },
    /// Capture, list and restore chapter versions
    Version {
        #[command(subcommand)]
        action: VersionAction,
    },
    /// Manage codex entities
    Entity {
        #[command(subcommand)]
        action: EntityAction,
    },
    /// Manage relationships between entities
    Rel {
        #[command(subcommand)]
        action: RelAction,
    },
    /// Export the relationship network as nodes and edges
    Network {
        project: String,
        /// Restrict to entity types (repeatable)
        #[arg(long = "type")]
        types: Vec<String>,
    },
}

#[derive(Subcommand)]
enum ProjectAction {
    /// Register a new project owned by the caller
    Create { title: String },
    Show { project: String },
    /// Delete a project and everything in it
    Delete { project: String },
}

#[derive(Subcommand)]
enum ChapterAction {
    /// Append a chapter to the end of a project
    Add {
        project: String,
        title: String,
        /// Plain-text content
        #[arg(long, conflicts_with = "content_json")]
        text: Option<String>,
        /// Content as JSON, e.g. '{"blocks":[{"text":"..."}]}'
        #[arg(long)]
        content_json: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    List { project: String },
    Show { chapter: String },
    Edit {
        chapter: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, conflicts_with = "content_json")]
        text: Option<String>,
        #[arg(long)]
        content_json: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        complete: Option<bool>,
    },
    Delete { chapter: String },
    /// Assign positions 1..N in the given order
    Reorder {
        project: String,
        #[arg(required = true)]
        chapters: Vec<String>,
    },
}

#[derive(Subcommand)]
enum VersionAction {
    /// Snapshot a chapter's current content
    Save {
        chapter: String,
        #[arg(long)]
        description: Option<String>,
    },
    List { chapter: String },
    Show { version: String },
    /// Restore a version onto its chapter
    Restore { version: String },
}

#[derive(Subcommand)]
enum EntityAction {
    Add {
        project: String,
        /// character | location | item | event | concept
        entity_type: String,
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[command(flatten)]
        attributes: AttributeArgs,
        /// Image reference (repeatable)
        #[arg(long = "image")]
        images: Vec<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    List {
        project: String,
        #[arg(long = "type")]
        types: Vec<String>,
    },
    Show { entity: String },
    Edit {
        entity: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[command(flatten)]
        attributes: AttributeArgs,
        /// Replaces the image list (repeatable)
        #[arg(long = "image")]
        images: Vec<String>,
        /// Replaces the tag list (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Delete an entity and every relationship touching it
    Delete { entity: String },
}

#[derive(Subcommand)]
enum RelAction {
    Add {
        project: String,
        source: String,
        target: String,
        relationship_type: String,
        #[arg(long)]
        description: Option<String>,
        /// 1..=10
        #[arg(long)]
        strength: Option<u8>,
        /// Also create the target -> source edge
        #[arg(long)]
        inverse: bool,
        /// Label for the inverse edge (defaults to the same type)
        #[arg(long, requires = "inverse")]
        inverse_type: Option<String>,
    },
    Show { relationship: String },
    List { project: String },
    /// Relationships touching an entity, with direction
    For { project: String, entity: String },
    Edit {
        relationship: String,
        #[arg(long = "type")]
        relationship_type: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        strength: Option<u8>,
    },
    Delete { relationship: String },
}

fn open_api(config: &Config) -> ManuscriptResult<ManuscriptApi> {
    let store = SqliteStore::open(&config.db_path)?;
    tracing::debug!(db = %config.db_path.display(), "store opened");
    Ok(ManuscriptApi::with_store(Arc::new(store)))
}

/// Print a result as JSON, or its error report; returns the exit code
fn emit<T: Serialize>(result: ManuscriptResult<T>, environment: Environment) -> i32 {
    match result {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(json) => {
                println!("{}", json);
                0
            }
            Err(e) => {
                eprintln!("Error: failed to serialize result: {}", e);
                1
            }
        },
        Err(err) => {
            tracing::debug!(error = %err, "command failed");
            let report = err.report(environment);
            match serde_json::to_string(&report) {
                Ok(json) => eprintln!("{}", json),
                Err(_) => eprintln!("Error: {}", report.message),
            }
            1
        }
    }
}

fn parse_types(labels: &[String]) -> ManuscriptResult<Option<Vec<EntityType>>> {
    if labels.is_empty() {
        return Ok(None);
    }
    labels
        .iter()
        .map(|l| l.parse::<EntityType>().map_err(ManuscriptError::InvalidInput))
        .collect::<ManuscriptResult<Vec<_>>>()
        .map(Some)
}

/// Attribute bag flags shared by `entity add` and `entity edit`
#[derive(clap::Args)]
struct AttributeArgs {
    /// Attribute as key=value; numbers and booleans keep their type (repeatable)
    #[arg(long = "attr", value_name = "KEY=VALUE")]
    pairs: Vec<String>,
    /// Attribute bag as a JSON object; --attr entries apply on top. On edit,
    /// either flag replaces the whole bag.
    #[arg(long)]
    attributes_json: Option<String>,
}

impl AttributeArgs {
    /// `None` when no attribute flag was given
    fn parse(self) -> ManuscriptResult<Option<Attributes>> {
        if self.pairs.is_empty() && self.attributes_json.is_none() {
            return Ok(None);
        }

        let mut attributes = match self.attributes_json {
            Some(json) => serde_json::from_str::<Attributes>(&json)
                .map_err(|e| ManuscriptError::invalid(format!("attributes must be a JSON object: {}", e)))?,
            None => Attributes::new(),
        };
        for pair in self.pairs {
            let (key, raw) = pair
                .split_once('=')
                .ok_or_else(|| ManuscriptError::invalid(format!("expected key=value, got {:?}", pair)))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(ManuscriptError::invalid(format!("attribute key missing in {:?}", pair)));
            }
            let value = serde_json::from_str::<AttributeValue>(raw)
                .unwrap_or_else(|_| AttributeValue::from(raw));
            attributes.insert(key.to_string(), value);
        }
        Ok(Some(attributes))
    }
}

fn parse_content(text: Option<String>, json: Option<String>) -> ManuscriptResult<Option<Content>> {
    match (text, json) {
        (Some(text), _) => Ok(Some(Content::plain(text))),
        (None, Some(json)) => serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| ManuscriptError::invalid(format!("content is not valid JSON: {}", e))),
        (None, None) => Ok(None),
    }
}

fn cmd_project(api: &ManuscriptApi, caller: &UserId, action: ProjectAction, env: Environment) -> i32 {
    match action {
        ProjectAction::Create { title } => emit(api.register_project(caller, &title), env),
        ProjectAction::Show { project } => emit(api.get_project(caller, &ProjectId::from(project)), env),
        ProjectAction::Delete { project } => {
            let id = ProjectId::from(project);
            emit(
                api.delete_project(caller, &id)
                    .map(|()| serde_json::json!({ "deleted": id })),
                env,
            )
        }
    }
}

fn cmd_chapter(api: &ManuscriptApi, caller: &UserId, action: ChapterAction, env: Environment) -> i32 {
    match action {
        ChapterAction::Add {
            project,
            title,
            text,
            content_json,
            notes,
        } => {
            let result = parse_content(text, content_json).and_then(|content| {
                api.create_chapter(caller, &ProjectId::from(project), &title, content, notes)
            });
            emit(result, env)
        }
        ChapterAction::List { project } => emit(api.list_chapters(caller, &ProjectId::from(project)), env),
        ChapterAction::Show { chapter } => emit(api.get_chapter(caller, &ChapterId::from(chapter)), env),
        ChapterAction::Edit {
            chapter,
            title,
            text,
            content_json,
            notes,
            complete,
        } => {
            let result = parse_content(text, content_json).and_then(|content| {
                let patch = ChapterPatch {
                    title,
                    content,
                    notes,
                    is_complete: complete,
                };
                api.update_chapter(caller, &ChapterId::from(chapter), patch)
            });
            emit(result, env)
        }
        ChapterAction::Delete { chapter } => emit(api.delete_chapter(caller, &ChapterId::from(chapter)), env),
        ChapterAction::Reorder { project, chapters } => {
            let order: Vec<ChapterId> = chapters.into_iter().map(ChapterId::from).collect();
            emit(api.reorder_chapters(caller, &ProjectId::from(project), &order), env)
        }
    }
}

fn cmd_version(api: &ManuscriptApi, caller: &UserId, action: VersionAction, env: Environment) -> i32 {
    match action {
        VersionAction::Save { chapter, description } => {
            emit(api.create_version(caller, &ChapterId::from(chapter), description), env)
        }
        VersionAction::List { chapter } => emit(api.list_versions(caller, &ChapterId::from(chapter)), env),
        VersionAction::Show { version } => emit(api.get_version(caller, &VersionId::from(version)), env),
        VersionAction::Restore { version } => emit(api.restore_version(caller, &VersionId::from(version)), env),
    }
}

fn cmd_entity(api: &ManuscriptApi, caller: &UserId, action: EntityAction, env: Environment) -> i32 {
    match action {
        EntityAction::Add {
            project,
            entity_type,
            name,
            description,
            attributes,
            images,
            tags,
        } => {
            let result = entity_type
                .parse::<EntityType>()
                .map_err(ManuscriptError::InvalidInput)
                .and_then(|t| {
                    let input = NewEntity {
                        entity_type: t,
                        name,
                        description,
                        attributes: attributes.parse()?.unwrap_or_default(),
                        images,
                        tags,
                    };
                    api.create_entity(caller, &ProjectId::from(project), input)
                });
            emit(result, env)
        }
        EntityAction::List { project, types } => {
            let result = parse_types(&types).and_then(|t| api.list_entities(caller, &ProjectId::from(project), t));
            emit(result, env)
        }
        EntityAction::Show { entity } => emit(api.get_entity(caller, &EntityId::from(entity)), env),
        EntityAction::Edit {
            entity,
            name,
            description,
            attributes,
            images,
            tags,
        } => {
            let result = attributes.parse().and_then(|attributes| {
                let patch = EntityPatch {
                    name,
                    description,
                    attributes,
                    images: (!images.is_empty()).then_some(images),
                    tags: (!tags.is_empty()).then_some(tags),
                };
                api.update_entity(caller, &EntityId::from(entity), patch)
            });
            emit(result, env)
        }
        EntityAction::Delete { entity } => {
            let id = EntityId::from(entity);
            emit(
                api.delete_entity(caller, &id)
                    .map(|removed| serde_json::json!({ "deleted": id, "relationships_removed": removed })),
                env,
            )
        }
    }
}

fn cmd_rel(api: &ManuscriptApi, caller: &UserId, action: RelAction, env: Environment) -> i32 {
    match action {
        RelAction::Add {
            project,
            source,
            target,
            relationship_type,
            description,
            strength,
            inverse,
            inverse_type,
        } => {
            let input = NewRelationship {
                source_id: EntityId::from(source),
                target_id: EntityId::from(target),
                relationship_type,
                description,
                strength,
                create_inverse: inverse,
                inverse_type,
            };
            emit(api.create_relationship(caller, &ProjectId::from(project), input), env)
        }
        RelAction::Show { relationship } => {
            emit(api.get_relationship(caller, &RelationshipId::from(relationship)), env)
        }
        RelAction::List { project } => emit(api.list_relationships(caller, &ProjectId::from(project)), env),
        RelAction::For { project, entity } => emit(
            api.relationships_for_entity(caller, &ProjectId::from(project), &EntityId::from(entity)),
            env,
        ),
        RelAction::Edit {
            relationship,
            relationship_type,
            description,
            strength,
        } => {
            let patch = RelationshipPatch {
                relationship_type,
                description,
                strength,
            };
            emit(api.update_relationship(caller, &RelationshipId::from(relationship), patch), env)
        }
        RelAction::Delete { relationship } => {
            let id = RelationshipId::from(relationship);
            emit(
                api.delete_relationship(caller, &id)
                    .map(|()| serde_json::json!({ "deleted": id })),
                env,
            )
        }
    }
}

fn cmd_network(api: &ManuscriptApi, caller: &UserId, project: String, types: &[String], env: Environment) -> i32 {
    let result = parse_types(types).and_then(|t| api.network_export(caller, &ProjectId::from(project), t));
    emit(result, env)
}

fn main() {
    let cli = Cli::parse();
    let config = Config::from_env()
        .with_db_path(cli.db)
        .with_environment(cli.environment);
    let env = config.environment;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("manuscript=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let caller = match cli.user.filter(|u| !u.trim().is_empty()) {
        Some(user) => UserId::from(user),
        None => {
            let err = ManuscriptError::invalid("caller identity required (--user or MANUSCRIPT_USER)");
            std::process::exit(emit::<()>(Err(err), env));
        }
    };

    let api = match open_api(&config) {
        Ok(api) => api,
        Err(err) => std::process::exit(emit::<()>(Err(err), env)),
    };

    let code = match cli.command {
        Commands::Project { action } => cmd_project(&api, &caller, action, env),
        Commands::Chapter { action } => cmd_chapter(&api, &caller, action, env),
        Commands::Version { action } => cmd_version(&api, &caller, action, env),
        Commands::Entity { action } => cmd_entity(&api, &caller, action, env),
        Commands::Rel { action } => cmd_rel(&api, &caller, action, env),
        Commands::Network { project, types } => cmd_network(&api, &caller, project, &types, env),
    };
    std::process::exit(code);
}
