#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use std::ffi::OsString;
use std::sync::OnceLock;

use anyhow::{bail, Result};
use argh::FromArgs;
use diesel::SqliteConnection;
use itertools::Itertools;
use pollbot::config::Config;
use pollbot::db::{self, DbMessageId, DbPollId, DbReferenceId, DbUserId};
use pollbot::reference::NewReference;
use pollbot::repository;

static VERSION: OnceLock<String> = OnceLock::new();

fn version() -> &'static str {
    VERSION.get().map_or("unknown", String::as_str)
}

/// pollbot references
#[derive(FromArgs, PartialEq, Debug)]
struct Args {
    #[argh(option, hidden_help = true, long = "-set-revision")]
    set_revision: Option<String>,

    #[argh(subcommand)]
    subcommand: SubCommand,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand)]
enum SubCommand {
    Migrate(SubCommandMigrate),
    Add(SubCommandAdd),
    List(SubCommandList),
    Remove(SubCommandRemove),
}

/// create the database schema
#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "migrate")]
struct SubCommandMigrate {
    /// config file
    #[argh(positional)]
    config_file: OsString,
}

/// attach a message reference to a poll
#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "add")]
struct SubCommandAdd {
    /// config file
    #[argh(positional)]
    config_file: OsString,

    /// poll id
    #[argh(option)]
    poll: i32,

    /// reference type: inline, admin or private_vote
    #[argh(option, long = "type")]
    reference_type: String,

    /// owning user id (admin, private_vote)
    #[argh(option)]
    user: Option<i64>,

    /// chat message id (admin, private_vote)
    #[argh(option)]
    message_id: Option<i64>,

    /// inline message id (inline)
    #[argh(option)]
    inline_message_id: Option<String>,
}

/// list references of a poll or a user
#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "list")]
struct SubCommandList {
    /// config file
    #[argh(positional)]
    config_file: OsString,

    /// poll id
    #[argh(option)]
    poll: Option<i32>,

    /// user id
    #[argh(option)]
    user: Option<i64>,
}

/// delete a reference
#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "remove")]
struct SubCommandRemove {
    /// config file
    #[argh(positional)]
    config_file: OsString,

    /// reference id
    #[argh(positional)]
    id: i32,
}

fn main() -> Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init();
    let args: Args = argh::from_env();
    VERSION
        .set(args.set_revision.unwrap_or_else(|| {
            git_version::git_version!(fallback = "unknown").to_string()
        }))
        .ok();
    log::info!("Version {}", version());
    match args.subcommand {
        SubCommand::Migrate(c) => {
            let mut conn = connect(&c.config_file)?;
            db::migrate(&mut conn)?;
            log::info!("Schema is up to date");
        }
        SubCommand::Add(c) => add_reference(c)?,
        SubCommand::List(c) => list_references(&c)?,
        SubCommand::Remove(c) => {
            let mut conn = connect(&c.config_file)?;
            if !repository::delete_reference(&mut conn, DbReferenceId(c.id))? {
                bail!("Reference {} not found", c.id);
            }
        }
    }
    Ok(())
}

fn connect(config_file: &OsString) -> Result<SqliteConnection> {
    let config = Config::load(config_file)?;
    db::establish(&config.database_url(), config.busy_timeout_ms)
}

fn add_reference(c: SubCommandAdd) -> Result<()> {
    let reference = NewReference::new(
        DbPollId(c.poll),
        &c.reference_type,
        c.user.map(DbUserId),
        c.message_id.map(DbMessageId),
        c.inline_message_id,
    )?;

    let mut conn = connect(&c.config_file)?;
    if repository::find_poll_by_id(&mut conn, reference.poll_id)?.is_none() {
        bail!("Poll {} not found", reference.poll_id);
    }
    if let Some(user_id) = reference.kind.user_id() {
        if repository::find_user_by_id(&mut conn, user_id)?.is_none() {
            bail!("User {user_id} not found");
        }
    }

    let reference = repository::insert_reference(&mut conn, &reference)?;
    println!("{reference}");
    Ok(())
}

fn list_references(c: &SubCommandList) -> Result<()> {
    let mut conn = connect(&c.config_file)?;
    let references = match (c.poll, c.user) {
        (Some(poll), None) => {
            repository::find_references_by_poll(&mut conn, DbPollId(poll))?
        }
        (None, Some(user)) => {
            repository::find_references_by_user(&mut conn, DbUserId(user))?
        }
        _ => bail!("Specify either --poll or --user"),
    };
    let unreachable = references
        .iter()
        .filter(|r| r.target().is_err())
        .map(|r| r.id)
        .collect_vec();
    if !unreachable.is_empty() {
        log::warn!(
            "Message ids out of Telegram range: {}",
            unreachable.iter().join(", ")
        );
    }
    for reference in &references {
        println!("{reference}");
    }
    Ok(())
}
