//! create / fetch / destroy / status command implementations.

use anyhow::{Context, Result, bail};
use dialoguer::{Confirm, Password, theme::ColorfulTheme};
use std::fs;
use std::path::{Path, PathBuf};
use time::format_description;

use whisper::encoding::{format_bytes, generate_secret};
use whisper::retrieve::{self, DESTROYED_NOTICE};
use whisper::{
    Client, Config, Credential, CreationFlow, CreationState, DestroyOutcome, FileSession,
    PasswordCache, RetrievalFlow, RetrievalState, SecretFile, SecretForm, SecretPayload,
    SecretRecord, fetch_badge, token_from_link,
};

use crate::{CreateArgs, DestroyArgs, FetchArgs};

const DEFAULT_FILENAME: &str = "secret.dat";

pub fn create(client: &Client, config: &Config, args: CreateArgs) -> Result<()> {
    let sources = [
        args.secret.is_some(),
        args.input.is_some(),
        args.generate.is_some(),
    ];
    match sources.iter().filter(|s| **s).count() {
        0 => bail!("specify one of --secret, --in, or --generate"),
        1 => {}
        _ => bail!("specify only one of --secret, --in, or --generate"),
    }

    let mut form = if let Some(secret) = args.secret {
        SecretForm::message(secret).with_encoded(args.b64encoded)
    } else if let Some(path) = &args.input {
        let file = SecretFile::read(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        SecretForm::file(file)
    } else {
        SecretForm::message(generate_secret(args.generate.unwrap_or_default()))
    };

    form.password = match (args.password, args.generate_password) {
        (Some(_), Some(_)) => bail!("specify either --password or --generate-password, not both"),
        (Some(password), None) => password,
        (None, Some(len)) => {
            let password = generate_secret(len);
            eprintln!("Password for retrieval: {password}");
            password
        }
        (None, None) => String::new(),
    };

    let accesses = if args.unlimited {
        -1
    } else {
        args.accesses.unwrap_or(config.default_accesses)
    };
    if accesses != -1 {
        form = form.with_accesses(accesses);
    }

    form = form.with_lifetime(
        args.lifetime
            .unwrap_or_else(|| config.default_lifetime.to_string()),
    );

    let mut cache = PasswordCache::new(FileSession::open_default()?);
    let mut flow = CreationFlow::new(config.ui_url.as_str());
    match flow.submit(client, &mut cache, &form)? {
        CreationState::Succeeded(link) => {
            // Share link alone on stdout for piping
            println!("{}", link.url);
            let format = format_description::parse("[year]-[month]-[day] [hour]:[minute] UTC")?;
            eprintln!(
                "Expires: {}",
                link.expires.format(&format).unwrap_or_default()
            );
            Ok(())
        }
        CreationState::Failed { message, .. } => bail!("{message}"),
        other => bail!("unexpected state after submit: {other:?}"),
    }
}

pub fn fetch(client: &Client, args: FetchArgs) -> Result<()> {
    let token = token_from_link(&args.token)
        .with_context(|| format!("not a secret token or link: {}", args.token))?;
    let theme = ColorfulTheme::default();
    let mut cache = PasswordCache::new(FileSession::open_default()?);
    let mut flow = RetrievalFlow::new(token);
    let mut password = args.password;

    flow.load(client);
    while let RetrievalState::Unauthorized { error } = flow.state() {
        if let Some(error) = error {
            eprintln!("{error}");
        }
        let attempt = match password.take() {
            Some(password) => password,
            None => Password::with_theme(&theme)
                .with_prompt("This Secret requires a password for access")
                .allow_empty_password(true)
                .interact()?,
        };
        flow.submit_password(client, &mut cache, &attempt);
    }

    let record = match flow.state() {
        RetrievalState::Success(record) => record.clone(),
        RetrievalState::Error { message } => bail!("{message}"),
        other => bail!("unexpected state after fetch: {other:?}"),
    };

    if record.destroyed {
        eprintln!("Secret Expired: {DESTROYED_NOTICE}");
    }
    show_secret(&record, args.out.as_deref())?;

    if args.destroy {
        let outcome = flow.destroy(client, &mut cache, || confirm_destroy(&theme, args.yes));
        report_destroy(outcome);
    }
    Ok(())
}

pub fn destroy(client: &Client, args: DestroyArgs) -> Result<()> {
    let token = token_from_link(&args.token)
        .with_context(|| format!("not a secret token or link: {}", args.token))?;
    let theme = ColorfulTheme::default();
    let mut cache = PasswordCache::new(FileSession::open_default()?);
    let credential = args.password.as_deref().map(Credential::from_password);

    match retrieve::destroy_secret(client, &mut cache, &token, credential, || {
        confirm_destroy(&theme, args.yes)
    }) {
        DestroyOutcome::Failed(err) => Err(err.into()),
        outcome => {
            report_destroy(outcome);
            Ok(())
        }
    }
}

pub fn status(client: &Client) -> Result<()> {
    let badge = fetch_badge(client);
    let status = badge
        .status
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "unknown".to_string());
    println!("status:   {status} ({})", badge.color);
    println!("version:  {}", badge.version);
    println!("endpoint: {}", client.base_url());
    Ok(())
}

fn confirm_destroy(theme: &ColorfulTheme, skip: bool) -> bool {
    if skip {
        return true;
    }
    Confirm::with_theme(theme)
        .with_prompt("Do you really want to destroy the secret?")
        .default(false)
        .interact()
        .unwrap_or(false)
}

fn report_destroy(outcome: DestroyOutcome) {
    match outcome {
        DestroyOutcome::Destroyed { .. } => eprintln!("Secret destroyed."),
        DestroyOutcome::Cancelled => eprintln!("Destroy cancelled."),
        DestroyOutcome::Unavailable => eprintln!("Secret is already destroyed."),
        DestroyOutcome::Failed(err) => eprintln!("Destroy failed: {err}"),
    }
}

fn show_secret(record: &SecretRecord, out: Option<&Path>) -> Result<()> {
    let payload = record.payload()?;
    let created = record.created.and_then(|created| {
        let format = format_description::parse("[year]-[month]-[day] [hour]:[minute]").ok()?;
        created.format(&format).ok()
    });

    let (filename, bytes) = match payload {
        SecretPayload::Text(text) if out.is_none() => {
            println!("{text}");
            if let Some(created) = created {
                eprintln!("Created: {created}");
            }
            return Ok(());
        }
        SecretPayload::Text(text) => (None, text.into_bytes()),
        SecretPayload::File { filename, bytes } => {
            (Some(filename).filter(|f| !f.is_empty()), bytes)
        }
    };

    let path = output_path(out, filename.as_deref());
    fs::write(&path, &bytes).with_context(|| format!("failed to write {}", path.display()))?;
    eprintln!(
        "secret written to {} ({})",
        path.display(),
        format_bytes(bytes.len() as u64)
    );
    if let Some(created) = created {
        eprintln!("Uploaded: {created}");
    }
    Ok(())
}

/// Where a secret lands: `out` itself, or `out/<filename>` when `out` is a directory.
/// Without `out`, the secret's own filename in the current directory.
fn output_path(out: Option<&Path>, filename: Option<&str>) -> PathBuf {
    let name = Path::new(filename.unwrap_or(DEFAULT_FILENAME))
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_FILENAME));
    match out {
        Some(dir) if dir.is_dir() => dir.join(name),
        Some(path) => path.to_path_buf(),
        None => name,
    }
}
