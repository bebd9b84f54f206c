//! Command dispatch: wires the backend, the use cases and the shell
//! together for each CLI command.

use std::{
    io::{self, Write},
    sync::mpsc,
    time::Duration,
};

use anyhow::{anyhow, Result};

use crate::{
    backend::adapter::FirebaseAdapter,
    cli::{Cli, Command},
    domain::session::{AuthUser, Session},
    ui::{
        event_source::{ChannelFeedSource, CompositeEventSource, CrosstermEventSource},
        shell,
    },
    usecases::{
        bootstrap::bootstrap,
        context::AppContext,
        logout::{logout, LogoutError},
        shell::DefaultShellOrchestrator,
        sign_in::{sign_in, Credentials, SignInError},
        sync_conversations::ConversationSync,
    },
};

const INPUT_POLL_TIMEOUT: Duration = Duration::from_millis(100);

pub fn run(cli: Cli) -> Result<()> {
    let (context, _log_guard) = bootstrap(cli.config.as_deref())?;
    let AppContext { backend, .. } = context;

    match cli.command_or_default() {
        Command::Run => run_shell(backend),
        Command::Login => run_login(backend),
        Command::Logout => run_logout(backend),
    }
}

fn run_shell(mut backend: FirebaseAdapter) -> Result<()> {
    let user = ensure_identity(&mut backend)?;

    let (messages_tx, messages_rx) = mpsc::channel();
    let (directory_tx, directory_rx) = mpsc::channel();
    let mut feeds = backend.subscribe_message_feeds(messages_tx);
    feeds.extend(backend.subscribe_directory_feed(directory_tx));

    let sync = ConversationSync::start(user.id.clone(), feeds);
    let state = crate::domain::shell_state::ShellState::new(Session::authenticated(user));
    let mut orchestrator = DefaultShellOrchestrator::new(state, sync, backend);

    let mut events = CompositeEventSource::new(vec![
        Box::new(ChannelFeedSource::new(messages_rx, directory_rx)),
        Box::new(CrosstermEventSource::new(INPUT_POLL_TIMEOUT)),
    ]);

    shell::start(&mut events, &mut orchestrator)
}

fn run_login(mut backend: FirebaseAdapter) -> Result<()> {
    let user = ensure_identity(&mut backend)?;
    println!("signed in as {} <{}>", user.display_name, user.email);
    Ok(())
}

fn run_logout(mut backend: FirebaseAdapter) -> Result<()> {
    // Restore the cached session first so the offline presence update
    // and the provider sign-out have an identity to work with.
    let _ = backend.restore_session();

    match logout(&mut backend) {
        Ok(outcome) => {
            if outcome.session_scrubbed {
                println!("signed out; cached session removed");
            } else {
                println!("signed out; no cached session to remove");
            }
            if !outcome.went_offline {
                println!("note: the directory may still show you as online");
            }
            Ok(())
        }
        Err(LogoutError::SignOutRejected) => {
            Err(anyhow!("the identity provider refused to end the session"))
        }
        Err(LogoutError::TemporarilyUnavailable) => {
            Err(anyhow!("the identity provider is unavailable; try again later"))
        }
        Err(LogoutError::Storage(error)) => Err(error.into()),
    }
}

/// Returns the restored session identity, or walks the user through an
/// interactive sign-in.
fn ensure_identity(backend: &mut FirebaseAdapter) -> Result<AuthUser> {
    if let Some(user) = backend.restore_session() {
        println!("welcome back, {}", user.display_name);
        return Ok(user);
    }

    loop {
        let credentials = prompt_credentials()?;
        match sign_in(backend, &credentials) {
            Ok(user) => return Ok(user),
            Err(SignInError::MissingCredentials) => {
                eprintln!("email and password are required");
            }
            Err(SignInError::InvalidCredentials) => {
                eprintln!("invalid email or password, try again");
            }
            Err(SignInError::TemporarilyUnavailable) => {
                return Err(anyhow!("the identity provider is unavailable; try again later"));
            }
            Err(SignInError::ProfileUnavailable) => {
                return Err(anyhow!(
                    "signed in, but the directory profile could not be published; \
                     other users would not see you, so aborting"
                ));
            }
        }
    }
}

fn prompt_credentials() -> Result<Credentials> {
    print!("email: ");
    io::stdout().flush()?;
    let mut email = String::new();
    io::stdin().read_line(&mut email)?;
    let password = rpassword::prompt_password("password: ")?;

    Ok(Credentials {
        email: email.trim().to_owned(),
        password,
    })
}
