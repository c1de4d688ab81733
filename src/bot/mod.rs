//! Update dispatch and the error boundary around it.

pub mod admin;
pub mod apartment;
pub mod cars;
pub mod context;
pub mod menu;
pub mod picker;
pub mod registration;
pub mod reply;
pub mod residents;
pub mod route;
pub mod start;
pub mod update;

use std::{any::Any, future::Future, panic::AssertUnwindSafe};

use botcomod_shared::{Error, callback::Callback};
use futures::FutureExt;
use sqlx::SqlitePool;

pub use context::{Context, Services};
pub use reply::{Button, Keyboard, Outbound};
pub use route::Route;
pub use update::{Inbound, Update};

const APOLOGY: &str = "Sorry, something went wrong. We are already looking into it.";

/// Why an update could not be handled.
#[derive(Debug)]
pub enum Failure {
    Handler(Error),
    Panic(String),
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Handler(err) => write!(f, "{err}"),
            Self::Panic(message) => write!(f, "panic: {message}"),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_owned();
    }

    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }

    "unknown panic".to_owned()
}

/// Turns both errors and panics of `fut` into a [`Failure`].
pub async fn guard<T>(fut: impl Future<Output = botcomod_shared::Result<T>>) -> Result<T, Failure> {
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(Failure::Handler(err)),
        Err(payload) => Err(Failure::Panic(panic_message(payload.as_ref()))),
    }
}

/// Handles one update inside one transaction.
///
/// The transaction commits only when the handler succeeds. Otherwise it is
/// rolled back and the sender gets an explanation instead of the handler's
/// replies.
#[tracing::instrument(skip_all, fields(update_id = update.update_id))]
pub async fn process(
    pool: &SqlitePool,
    services: &Services,
    update: &Update,
) -> Result<Vec<Outbound>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let Some(mut ctx) = Context::new(update, &mut tx, services) else {
        tracing::debug!("update without sender ignored");
        return Ok(vec![]);
    };

    let outcome = guard(async move {
        dispatch(&mut ctx).await?;
        Ok(ctx.into_outbox())
    })
    .await;

    match outcome {
        Ok(outbox) => {
            tx.commit().await?;
            Ok(outbox)
        }
        Err(failure) => {
            if let Err(err) = tx.rollback().await {
                tracing::error!(error = %err, "rollback failed");
            }

            Ok(failure_outbox(services, update, &failure))
        }
    }
}

fn validation_summary(errors: &validator::ValidationErrors) -> String {
    let mut messages = errors
        .errors()
        .values()
        .flat_map(|kind| match kind {
            validator::ValidationErrorsKind::Field(errors) => errors.clone(),
            validator::ValidationErrorsKind::Struct(errors) => errors
                .field_errors()
                .into_values()
                .flatten()
                .cloned()
                .collect(),
            validator::ValidationErrorsKind::List(_) => vec![],
        })
        .map(|error| {
            error
                .message
                .map(|message| message.into_owned())
                .unwrap_or_else(|| error.code.into_owned())
        })
        .collect::<Vec<_>>();
    messages.sort();
    messages.join(", ")
}

fn failure_outbox(services: &Services, update: &Update, failure: &Failure) -> Vec<Outbound> {
    let chat_id = update.chat_id().unwrap_or_default();
    let sender_id = update.sender().map(|sender| sender.id).unwrap_or_default();

    let mut outbox = vec![];
    if let Some(query) = &update.callback_query {
        outbox.push(Outbound::AnswerCallbackQuery {
            callback_query_id: query.id.clone(),
            text: None,
        });
    }

    let text = match failure {
        Failure::Handler(Error::Forbidden) => {
            tracing::warn!(sender_id, "forbidden");
            "You are not allowed to do that.".to_owned()
        }
        Failure::Handler(Error::Validate(errors)) => {
            tracing::warn!(sender_id, errors = %errors, "invalid input");
            format!("Cannot do that: {}", validation_summary(errors))
        }
        Failure::Handler(Error::User(message)) => {
            tracing::warn!(sender_id, message = %message, "rejected");
            format!("Cannot do that: {message}")
        }
        _ => {
            tracing::error!(sender_id, failure = %failure, "update failed");
            outbox.push(Outbound::SendMessage {
                chat_id: services.bot.developer_chat_id,
                text: format!(
                    "Update {} from {} failed: {}",
                    update.update_id, sender_id, failure
                ),
                reply_markup: None,
            });
            APOLOGY.to_owned()
        }
    };

    outbox.push(Outbound::SendMessage {
        chat_id,
        text,
        reply_markup: None,
    });

    outbox
}

pub async fn dispatch(ctx: &mut Context<'_>) -> botcomod_shared::Result<()> {
    let user_id = ctx.sender_id();
    let username = ctx.sender.username.clone();
    ctx.users().set_username(user_id, username).await?;

    let update = ctx.update;
    match update.inbound() {
        Inbound::Command { name, payload } => match name {
            "start" => start::handle(ctx, payload).await,
            "help" => {
                menu::help(ctx);
                Ok(())
            }
            "menu" => menu::show(ctx).await,
            "whois" => cars::handle_whois_command(ctx, payload).await,
            "whoami" => admin::whoami(ctx, payload).await,
            "manual_register" => admin::manual_register(ctx, payload).await,
            "clear_events" => admin::clear_events(ctx, payload).await,
            "update" => admin::update(ctx, payload).await,
            "reload_houses" => admin::reload_houses(ctx),
            _ => {
                menu::help(ctx);
                Ok(())
            }
        },
        Inbound::Callback(callback) => {
            route_callback(ctx, &callback).await?;
            ctx.answer_callback(None);
            Ok(())
        }
        Inbound::Photo => {
            if !registration::handle_photo(ctx).await? && is_private(update) {
                menu::show(ctx).await?;
            }
            Ok(())
        }
        Inbound::Text(_) if is_private(update) => menu::show(ctx).await,
        Inbound::Text(_) | Inbound::Other => Ok(()),
    }
}

fn is_private(update: &Update) -> bool {
    update
        .message()
        .is_some_and(|message| message.chat.kind == "private")
}

async fn route_callback(ctx: &mut Context<'_>, callback: &Callback) -> botcomod_shared::Result<()> {
    let Ok(route) = callback.unique.parse::<Route>() else {
        tracing::warn!(unique = %callback.unique, "unknown callback route");
        return Ok(());
    };

    match route {
        Route::Menu => menu::show(ctx).await,
        Route::Registration => registration::handle_wizard(ctx, callback).await,
        Route::AdminApproveRegistration => registration::handle_admin_approve(ctx, callback).await,
        Route::AdminDisapproveRegistration => {
            registration::handle_admin_disapprove(ctx, callback).await
        }
        Route::AdminFailRegistration => registration::handle_admin_fail(ctx, callback).await,
        Route::RegisterCar => cars::handle_register(ctx, callback).await,
        Route::Whois => cars::handle_whois(ctx, callback).await,
        Route::FindResident => residents::handle_find(ctx, callback).await,
        Route::ContactAllow => residents::handle_answer(ctx, callback, true).await,
        Route::ContactDeny => residents::handle_answer(ctx, callback, false).await,
        Route::AddApartment => apartment::handle_add(ctx, callback).await,
        Route::AdminConfirmApartment => apartment::handle_admin_confirm(ctx, callback).await,
        Route::AdminDeclineApartment => apartment::handle_admin_decline(ctx, callback).await,
    }
}
