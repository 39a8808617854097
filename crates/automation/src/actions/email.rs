//! Email action: render templates against the target and hand the message
//! to the mail transport.

use dealflow_core::actions::{EmailAction, Recipient};
use dealflow_core::placeholders::substitute_placeholders;
use dealflow_core::values::stringify;
use dealflow_notify::OutgoingEmail;
use serde_json::json;

use super::{ActionContext, ActionFailure, ActionOutput};
use crate::target::TargetEntity;

pub async fn send_email(
    action: &EmailAction,
    target: &TargetEntity,
    ctx: &ActionContext<'_>,
) -> Result<ActionOutput, ActionFailure> {
    let to = resolve_recipient(action.recipient.as_ref(), target)?;
    if to.is_none() && action.cc.is_empty() && action.bcc.is_empty() {
        return Err(ActionFailure::Misconfigured(
            "no recipient could be resolved".to_string(),
        ));
    }

    let email = OutgoingEmail {
        to,
        from: None,
        subject: substitute_placeholders(&action.subject, &target.fields),
        text_body: substitute_placeholders(&action.body, &target.fields),
        html_body: action
            .html_body
            .as_deref()
            .map(|html| substitute_placeholders(html, &target.fields)),
        cc: action.cc.clone(),
        bcc: action.bcc.clone(),
    };
    ctx.mailer.send(&email).await?;

    let shown = match email.to {
        Some(ref to) => to.clone(),
        None => email
            .cc
            .iter()
            .chain(&email.bcc)
            .cloned()
            .collect::<Vec<_>>()
            .join(", "),
    };
    Ok(ActionOutput {
        message: format!("Email sent to {shown}"),
        data: Some(json!({
            "recipient": email.to,
            "cc": email.cc,
            "bcc": email.bcc,
            "subject": email.subject,
        })),
    })
}

/// Literal addresses pass through; field recipients read the target.
fn resolve_recipient(
    recipient: Option<&Recipient>,
    target: &TargetEntity,
) -> Result<Option<String>, ActionFailure> {
    match recipient {
        None => Ok(None),
        Some(Recipient::Address(address)) => Ok(Some(address.clone())),
        Some(Recipient::Field(field)) => {
            let address = target
                .field(field)
                .map(stringify)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty());
            match address {
                Some(address) => Ok(Some(address)),
                None => Err(ActionFailure::Misconfigured(format!(
                    "recipient field '{field}' is empty on {} {}",
                    target.entity_type, target.id
                ))),
            }
        }
    }
}
