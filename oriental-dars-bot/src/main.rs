#[macro_use]
extern crate log;

#[cfg(test)]
mod tests;

mod app;
mod callback_query;
mod catalog;
mod db;
mod dispatch;
mod gate;
mod global_state;
mod input_error;
mod invalid_action;
mod media;
mod message;
mod message_queue;
mod state;
mod store;
mod strings;
mod types;
mod ui;
mod user_error;
mod user_facing_error;

use crate::app::App;
use std::collections::HashSet;
use std::env;
use std::error::Error;
use teloxide::types::UserId;

/// A wrapper around [`std::env::VarError`] containing the variable name that
/// has caused the error.
#[derive(Debug, Clone)]
struct EnvError {
    inner: std::env::VarError,
    variable_name: String,
}

impl std::fmt::Display for EnvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cannot read environment variable `{}`: {}",
            self.variable_name, self.inner
        )
    }
}

impl Error for EnvError {}

/// Read the bot API token from an environment variable.
fn read_api_token() -> Result<String, EnvError> {
    const VAR_NAME: &'static str = "BOT_TOKEN";
    env::var(VAR_NAME).map_err(|e| EnvError {
        inner: e,
        variable_name: String::from(VAR_NAME),
    })
}

/// Read the static admin allow-list: a comma-separated id list, empty when
/// the variable is absent.
fn read_admin_ids() -> Result<HashSet<UserId>, Box<dyn Error>> {
    const VAR_NAME: &'static str = "ADMINS";
    let raw = match env::var(VAR_NAME) {
        Ok(raw) => raw,
        Err(env::VarError::NotPresent) => return Ok(HashSet::new()),
        Err(e) => {
            return Err(Box::new(EnvError {
                inner: e,
                variable_name: String::from(VAR_NAME),
            }))
        }
    };

    let mut admins = HashSet::new();
    for item in raw.split(',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let id = item
            .parse::<u64>()
            .map_err(|e| format!("cannot parse `{}` entry `{}`: {}", VAR_NAME, item, e))?;
        admins.insert(UserId(id));
    }
    Ok(admins)
}

/// Optional sticker sent to admins along with the new-user report.
fn read_new_user_sticker() -> Option<String> {
    env::var("NEW_USER_STICKER").ok().filter(|s| !s.is_empty())
}

async fn fallible_main() -> Result<(), Box<dyn Error>> {
    pretty_env_logger::init();
    let admins = read_admin_ids()?;
    info!("Configured {} static admins", admins.len());
    let app = App::new(read_api_token()?, admins, read_new_user_sticker());
    app.run().await
}

#[tokio::main]
async fn main() {
    // Handle errors in a custom way manually. Returning a `Result` would
    // not allow for such degree of customization of output.
    match fallible_main().await {
        Ok(()) => (),
        Err(e) => {
            error!("The bot has terminated because of an error: {}", e);

            let mut current_error = e.as_ref();
            while let Some(cause) = current_error.source() {
                error!("This error has been caused by another error: {}", cause);
                current_error = cause;
            }

            std::process::exit(1)
        }
    }
}
