//! Walks a contact form through editing, an unload attempt and submission.
//!
//! Run with `cargo run -p oxide-forms --example contact_form`.

use std::error::Error;

use oxide_forms::fields::{char_field, email_field, text_field};
use oxide_forms::{
    FieldProps, FormOptions, PageEvents, RuleSchema, SchemaForm, SubmitEvent, SubmitOutcome,
};
use serde::{Deserialize, Serialize};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Contact {
    name: String,
    email: String,
    message: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let schema = RuleSchema::<Contact>::new()
        .field(char_field("name", 80, true)?)
        .field(email_field("email", true)?)
        .field(text_field("message", false)?);

    let page = PageEvents::current();
    let form = SchemaForm::new(
        schema,
        &Contact::default(),
        |contact: Contact| async move {
            info!(name = %contact.name, email = %contact.email, "Sending contact request");
            Ok::<(), std::io::Error>(())
        },
        FormOptions::new().warn_on_unsaved_changes(true).form_key("contact"),
        page.clone(),
    )?;

    let components = form.components();
    let name = components.input(FieldProps::new("name").label("Name"))?;
    let email = components.input(
        FieldProps::new("email")
            .label("Email")
            .description("We never share your address.")
            .attr("type", "email"),
    )?;
    let message = components.textarea(FieldProps::new("message").label("Message"))?;

    name.change("Ada")?;
    name.blur()?;

    let unload = page.dispatch_before_unload();
    info!(
        blocked = unload.is_default_prevented(),
        prompt = %unload.return_value().unwrap_or_default(),
        "Tried to leave the page"
    );

    match form.handle_submit(&SubmitEvent::new()).await? {
        SubmitOutcome::Invalid(errors) => info!(%errors, "Submit blocked"),
        other => info!(?other, "Unexpected outcome"),
    }

    email.change("ada@example.com")?;
    message.change("Hello!")?;
    let outcome = form.handle_submit(&SubmitEvent::new()).await?;
    info!(?outcome, "Submitted");

    let unload = page.dispatch_before_unload();
    info!(blocked = unload.is_default_prevented(), "Tried to leave the page again");

    println!(
        "{}",
        form.render(|_| [name.render(), email.render(), message.render()].concat())
    );
    Ok(())
}
