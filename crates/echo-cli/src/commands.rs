use std::fs;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use colored::Colorize;
use rand::Rng;
use tracing::warn;

use echo_discovery::{
    DiscoveryConfig, DiscoveryService, Identity, PeerTable, BROADCAST_INTERVAL,
    DEFAULT_DISCOVERY_PORT,
};
use echo_meta::{MetadataStore, StoreConfig};
use echo_net::{connect_all_readers, connect_to_peer, start_server, FrameHandler, SessionRegistry};
use echo_sync::{FsNotepadHooks, NotepadHooks, SyncConfig, SyncEngine};
use echo_types::Role;

use crate::cli::{Cli, RoleArg};
use crate::viewer::ViewerHooks;

const DEFAULT_NOTEPAD: &str = "notepad.txt";

type StdinLines = io::Lines<io::StdinLock<'static>>;

/// One line of the interactive prompt.
#[derive(Debug, PartialEq, Eq)]
enum ReplCommand {
    Empty,
    List,
    Connect(String),
    Notepad(String),
    Dump,
    Quit,
    Unknown(String),
}

impl ReplCommand {
    fn parse(line: &str) -> Self {
        let mut words = line.split_whitespace();
        match words.next() {
            None => Self::Empty,
            Some("list") => Self::List,
            Some("connect") => match words.next() {
                Some(name) => Self::Connect(name.to_string()),
                None => Self::Unknown("connect needs a username".into()),
            },
            Some("notepad") => {
                Self::Notepad(words.next().unwrap_or(DEFAULT_NOTEPAD).to_string())
            }
            Some("dump") => Self::Dump,
            Some("quit") => Self::Quit,
            Some(other) => Self::Unknown(other.to_string()),
        }
    }
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let mut lines = io::stdin().lock().lines();

    let username = match cli.username {
        Some(u) => u,
        None => prompt_username(&mut lines)?,
    };
    anyhow::ensure!(
        !username.is_empty() && !username.contains('|'),
        "username must be non-empty and must not contain '|'"
    );
    let role = match cli.role {
        Some(RoleArg::Writer) => Role::Writer,
        Some(RoleArg::Reader) => Role::Reader,
        None => prompt_role(&mut lines)?,
    };

    let discovery_port = cli
        .discovery_port
        .or_else(|| env_port("ECHO_DISCOVERY_PORT"))
        .unwrap_or(DEFAULT_DISCOVERY_PORT);
    let tcp_port_pref = cli
        .tcp_port
        .or_else(|| env_port("ECHO_TCP_PORT"))
        .unwrap_or_else(|| rand::thread_rng().gen_range(40_000..50_000));

    fs::create_dir_all(&cli.root)?;
    let root = cli.root;

    let store = Arc::new(MetadataStore::open(StoreConfig::in_dir(&root))?);
    let registry = Arc::new(SessionRegistry::new());
    let table = Arc::new(PeerTable::new());

    let hooks: Arc<dyn NotepadHooks> = match role {
        Role::Reader => Arc::new(ViewerHooks::new(root.clone())),
        Role::Writer => Arc::new(FsNotepadHooks::new(root.clone())),
    };
    let engine = SyncEngine::new(
        SyncConfig::new(root.clone()),
        Arc::clone(&store),
        Arc::clone(&registry),
        Arc::clone(&hooks),
    );
    let handler: Arc<dyn FrameHandler> = engine.clone();

    // Readers accept inbound sessions on the advertised port.
    let tcp_port = if role == Role::Reader {
        start_server(tcp_port_pref, Arc::clone(&registry), Arc::clone(&handler))?
    } else {
        0
    };

    let discovery = DiscoveryService::new(
        DiscoveryConfig {
            port: discovery_port,
            interval: BROADCAST_INTERVAL,
        },
        Identity {
            username: username.clone(),
            role,
            tcp_port,
        },
        Arc::clone(&table),
    );
    discovery.start()?;

    println!(
        "{} up as {} ({})",
        "Echo".bold(),
        username.bold(),
        role.to_string().yellow()
    );
    println!("Commands: list, connect <username>, notepad [name], dump, quit");

    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        match ReplCommand::parse(&line?) {
            ReplCommand::Empty => {}
            ReplCommand::List => cmd_list(&table),
            ReplCommand::Connect(peer) => {
                cmd_connect(role, &peer, &table, &registry, &handler, &engine);
            }
            ReplCommand::Notepad(name) => {
                cmd_notepad(
                    role, &name, &mut lines, &hooks, &table, &registry, &handler, &engine,
                )?;
            }
            ReplCommand::Dump => cmd_dump(&store),
            ReplCommand::Quit => break,
            ReplCommand::Unknown(what) => println!("Unknown command: {what}"),
        }
    }

    discovery.stop();
    for session in registry.snapshot() {
        session.close();
    }
    Ok(())
}

fn cmd_list(table: &PeerTable) {
    let peers = table.snapshot();
    if peers.is_empty() {
        println!("No peers discovered yet.");
        return;
    }
    println!("Discovered peers:");
    for p in peers {
        let role = match p.role {
            Role::Writer => "Writer".yellow(),
            Role::Reader => "Reader".green(),
        };
        println!(" - {} [{}:{}] {}", p.username.bold(), p.ip, p.tcp_port, role);
    }
}

fn cmd_connect(
    role: Role,
    username: &str,
    table: &PeerTable,
    registry: &Arc<SessionRegistry>,
    handler: &Arc<dyn FrameHandler>,
    engine: &Arc<SyncEngine>,
) {
    if role == Role::Reader {
        println!("Only a writer dials; readers accept connections.");
        return;
    }
    let bootstrap = Arc::clone(engine);
    match connect_to_peer(username, table, registry, handler, |s| {
        bootstrap.announce_current_to(s)
    }) {
        Ok(session) => println!("Connected to {} ({})", username.bold(), session.key()),
        Err(e) => println!("{e}"),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_notepad(
    role: Role,
    name: &str,
    lines: &mut StdinLines,
    hooks: &Arc<dyn NotepadHooks>,
    table: &PeerTable,
    registry: &Arc<SessionRegistry>,
    handler: &Arc<dyn FrameHandler>,
    engine: &Arc<SyncEngine>,
) -> anyhow::Result<()> {
    if role == Role::Reader {
        println!("Notepad is available on the writer only.");
        return Ok(());
    }

    // First open creates the notepad empty.
    if hooks.read_current_text(name).is_err() {
        hooks.write_current_text(name, b"")?;
    }

    let bootstrap = Arc::clone(engine);
    let n = connect_all_readers(table, registry, handler, |s| {
        bootstrap.announce_current_to(s)
    });
    if n > 0 {
        println!("Connected {n} reader(s).");
    }
    engine.open_notepad(name)?;

    println!(
        "{} type lines; {} to exit",
        "[notepad]".cyan().bold(),
        "/quit".bold()
    );
    loop {
        print!("{} ", ">>".dimmed());
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;
        if line.trim() == "/quit" {
            break;
        }
        let mut text = hooks.read_current_text(name).unwrap_or_default();
        text.extend_from_slice(line.as_bytes());
        text.push(b'\n');
        hooks.write_current_text(name, &text)?;
        if let Err(e) = engine.commit(name) {
            warn!(error = %e, "commit failed");
        }
    }
    engine.close_notepad();
    Ok(())
}

fn cmd_dump(store: &MetadataStore) {
    let entries: std::collections::BTreeMap<String, echo_types::FileMeta> =
        store.dump_all().into_iter().collect();
    match serde_json::to_string_pretty(&entries) {
        Ok(json) => println!("{json}"),
        Err(e) => println!("dump failed: {e}"),
    }
}

fn prompt_username(lines: &mut StdinLines) -> anyhow::Result<String> {
    loop {
        print!("Enter username: ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            anyhow::bail!("stdin closed before a username was given")
        };
        let name = line?.trim().to_string();
        if name.is_empty() {
            continue;
        }
        if name.contains('|') {
            println!("Usernames cannot contain '|'.");
            continue;
        }
        return Ok(name);
    }
}

fn prompt_role(lines: &mut StdinLines) -> anyhow::Result<Role> {
    loop {
        print!("Choose role (W=writer, R=reader): ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            anyhow::bail!("stdin closed before a role was chosen")
        };
        match line?.trim().to_ascii_uppercase().as_str() {
            "W" => return Ok(Role::Writer),
            "R" => return Ok(Role::Reader),
            _ => continue,
        }
    }
}

fn env_port(key: &str) -> Option<u16> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_commands() {
        assert_eq!(ReplCommand::parse(""), ReplCommand::Empty);
        assert_eq!(ReplCommand::parse("  "), ReplCommand::Empty);
        assert_eq!(ReplCommand::parse("list"), ReplCommand::List);
        assert_eq!(ReplCommand::parse("dump"), ReplCommand::Dump);
        assert_eq!(ReplCommand::parse("quit"), ReplCommand::Quit);
    }

    #[test]
    fn parse_connect() {
        assert_eq!(
            ReplCommand::parse("connect alice"),
            ReplCommand::Connect("alice".into())
        );
        assert!(matches!(
            ReplCommand::parse("connect"),
            ReplCommand::Unknown(_)
        ));
    }

    #[test]
    fn parse_notepad_with_default() {
        assert_eq!(
            ReplCommand::parse("notepad"),
            ReplCommand::Notepad(DEFAULT_NOTEPAD.into())
        );
        assert_eq!(
            ReplCommand::parse("notepad journal.txt"),
            ReplCommand::Notepad("journal.txt".into())
        );
    }

    #[test]
    fn parse_unknown() {
        assert!(matches!(
            ReplCommand::parse("teleport"),
            ReplCommand::Unknown(_)
        ));
    }

    #[test]
    fn env_port_parses() {
        std::env::set_var("ECHO_TEST_PORT_A", "40123");
        assert_eq!(env_port("ECHO_TEST_PORT_A"), Some(40123));
        std::env::set_var("ECHO_TEST_PORT_A", "notaport");
        assert_eq!(env_port("ECHO_TEST_PORT_A"), None);
        assert_eq!(env_port("ECHO_TEST_PORT_MISSING"), None);
    }
}
