//! Workflow action types and their strongly-typed detail payloads.
//!
//! Actions are stored as an `action_type` tag plus a JSON `action_details`
//! blob. [`ActionDetails::parse`] turns the pair into a closed sum type so
//! the executors never re-interpret raw JSON, and so malformed definitions
//! are rejected when a workflow is saved rather than when it runs.

use chrono::{DateTime, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::ValidateEmail;

use crate::attributes::{EntityType, StartupAttribute};
use crate::error::CoreError;
use crate::priority::Priority;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// ActionType
// ---------------------------------------------------------------------------

/// The kind of side effect an action performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Email,
    AttributeChange,
    TaskCreation,
    StatusQuery,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::AttributeChange => "attribute_change",
            Self::TaskCreation => "task_creation",
            Self::StatusQuery => "status_query",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "email" => Ok(Self::Email),
            "attribute_change" => Ok(Self::AttributeChange),
            "task_creation" => Ok(Self::TaskCreation),
            "status_query" => Ok(Self::StatusQuery),
            _ => Err(CoreError::Validation(format!(
                "Invalid action_type: '{s}'. Must be one of: email, attribute_change, \
                 task_creation, status_query"
            ))),
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Where an email's primary recipient comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// A literal address.
    Address(String),
    /// A field on the triggering entity holding the address.
    Field(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAction {
    pub recipient: Option<Recipient>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: String,
    pub body: String,
    pub html_body: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeChangeAction {
    /// Attribute/value pairs in the order they are applied.
    pub changes: Vec<(StartupAttribute, Value)>,
}

/// Upper bound accepted for `due_in_days`, roughly ten years.
pub const MAX_DUE_IN_DAYS: u64 = 3650;

/// Due date of a created task: fixed, or relative to the run date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueDate {
    On(NaiveDate),
    InDays(u64),
}

impl DueDate {
    /// The concrete date, or `None` if it falls outside the calendar range.
    pub fn resolve(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::On(date) => Some(*date),
            Self::InDays(days) => today.checked_add_days(Days::new(*days)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCreationAction {
    pub title: String,
    pub description: Option<String>,
    pub due: Option<DueDate>,
    pub assignee_id: Option<DbId>,
    pub priority: Priority,
}

/// Parsed action definition, one variant per [`ActionType`].
#[derive(Debug, Clone, PartialEq)]
pub enum ActionDetails {
    Email(EmailAction),
    AttributeChange(AttributeChangeAction),
    TaskCreation(TaskCreationAction),
    StatusQuery,
}

impl ActionDetails {
    /// Parse and validate the stored JSON details for `action_type`.
    pub fn parse(action_type: ActionType, details: &Value) -> Result<Self, CoreError> {
        let empty = Map::new();
        let obj = match details {
            Value::Object(obj) => obj,
            Value::Null => &empty,
            _ => {
                return Err(CoreError::Validation(
                    "action_details must be a JSON object".to_string(),
                ))
            }
        };

        match action_type {
            ActionType::Email => parse_email(obj).map(Self::Email),
            ActionType::AttributeChange => parse_attribute_change(obj).map(Self::AttributeChange),
            ActionType::TaskCreation => parse_task_creation(obj).map(Self::TaskCreation),
            ActionType::StatusQuery => Ok(Self::StatusQuery),
        }
    }

    pub fn action_type(&self) -> ActionType {
        match self {
            Self::Email(_) => ActionType::Email,
            Self::AttributeChange(_) => ActionType::AttributeChange,
            Self::TaskCreation(_) => ActionType::TaskCreation,
            Self::StatusQuery => ActionType::StatusQuery,
        }
    }

    /// Check the action against the entity its workflow runs on.
    ///
    /// Attribute changes and status queries need a startup target, and a
    /// field-based email recipient must name a field of the target.
    pub fn validate_for(&self, target: EntityType) -> Result<(), CoreError> {
        match self {
            Self::AttributeChange(_) | Self::StatusQuery if target != EntityType::Startup => {
                Err(CoreError::Validation(format!(
                    "{} actions require a startup target, not {target}",
                    self.action_type()
                )))
            }
            Self::Email(EmailAction {
                recipient: Some(Recipient::Field(field)),
                ..
            }) if !target.has_field(field) => Err(CoreError::Validation(format!(
                "Recipient field '{field}' does not exist on {target}"
            ))),
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Parsers
// ---------------------------------------------------------------------------

fn parse_email(obj: &Map<String, Value>) -> Result<EmailAction, CoreError> {
    let recipient = if let Some(field) = non_empty_str(obj, "recipient_field") {
        Some(Recipient::Field(field.to_string()))
    } else if let Some(recipient) = non_empty_str(obj, "recipient") {
        if recipient.contains('@') {
            Some(Recipient::Address(validated_address(recipient)?))
        } else {
            Some(Recipient::Field(recipient.to_string()))
        }
    } else {
        None
    };

    let cc = address_list(obj.get("cc"), "cc")?;
    let bcc = address_list(obj.get("bcc"), "bcc")?;
    if recipient.is_none() && cc.is_empty() && bcc.is_empty() {
        return Err(CoreError::Validation(
            "email action must have a recipient, recipient_field, cc or bcc".to_string(),
        ));
    }

    let subject = non_empty_str(obj, "subject").ok_or_else(|| {
        CoreError::Validation("email action must contain a 'subject'".to_string())
    })?;
    let body = non_empty_str(obj, "body").ok_or_else(|| {
        CoreError::Validation("email action must contain a 'body'".to_string())
    })?;

    Ok(EmailAction {
        recipient,
        cc,
        bcc,
        subject: subject.to_string(),
        body: body.to_string(),
        html_body: non_empty_str(obj, "html_body").map(str::to_string),
    })
}

fn parse_attribute_change(obj: &Map<String, Value>) -> Result<AttributeChangeAction, CoreError> {
    let mut changes = Vec::new();

    if let Some(name) = non_empty_str(obj, "attribute") {
        let value = obj.get("value").cloned().ok_or_else(|| {
            CoreError::Validation("attribute_change action must contain a 'value'".to_string())
        })?;
        changes.push((StartupAttribute::from_str(name)?, value));
    }

    if let Some(map) = obj.get("attributes").filter(|v| !v.is_null()) {
        let map = map.as_object().ok_or_else(|| {
            CoreError::Validation("'attributes' must be a JSON object".to_string())
        })?;
        for (name, value) in map {
            changes.push((StartupAttribute::from_str(name)?, value.clone()));
        }
    }

    if changes.is_empty() {
        return Err(CoreError::Validation(
            "attribute_change action must contain 'attribute' or 'attributes'".to_string(),
        ));
    }
    Ok(AttributeChangeAction { changes })
}

fn parse_task_creation(obj: &Map<String, Value>) -> Result<TaskCreationAction, CoreError> {
    let title = non_empty_str(obj, "title").ok_or_else(|| {
        CoreError::Validation("task_creation action must contain a 'title'".to_string())
    })?;

    let due_date = non_empty_str(obj, "due_date").map(parse_date).transpose()?;
    let due_in_days = match obj.get("due_in_days").filter(|v| !v.is_null()) {
        None => None,
        Some(v) => Some(
            v.as_u64()
                .filter(|d| *d <= MAX_DUE_IN_DAYS)
                .ok_or_else(|| {
                    CoreError::Validation(format!(
                        "due_in_days must be an integer between 0 and {MAX_DUE_IN_DAYS}"
                    ))
                })?,
        ),
    };
    let due = match (due_date, due_in_days) {
        (Some(_), Some(_)) => {
            return Err(CoreError::Validation(
                "use either due_date or due_in_days, not both".to_string(),
            ))
        }
        (Some(date), None) => Some(DueDate::On(date)),
        (None, Some(days)) => Some(DueDate::InDays(days)),
        (None, None) => None,
    };

    Ok(TaskCreationAction {
        title: title.to_string(),
        description: non_empty_str(obj, "description").map(str::to_string),
        due,
        assignee_id: optional_id(obj.get("assignee_id"), "assignee_id")?,
        priority: obj.get("priority").map(Priority::from_value).unwrap_or_default(),
    })
}

fn non_empty_str<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// An id given as a number or numeric string; null and `""` mean unset.
fn optional_id(value: Option<&Value>, key: &str) -> Result<Option<DbId>, CoreError> {
    let id = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<DbId>().ok(),
        Some(_) => None,
    };
    id.map(Some)
        .ok_or_else(|| CoreError::Validation(format!("{key} must be an integer id")))
}

fn validated_address(address: &str) -> Result<String, CoreError> {
    let address = address.trim().to_string();
    if address.validate_email() {
        Ok(address)
    } else {
        Err(CoreError::Validation(format!(
            "'{address}' is not a valid email address"
        )))
    }
}

/// Accept a comma-separated string or an array of strings.
fn address_list(value: Option<&Value>, key: &str) -> Result<Vec<String>, CoreError> {
    let raw: Vec<&str> = match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) => s.split(',').collect(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().ok_or_else(|| {
                    CoreError::Validation(format!("'{key}' entries must be strings"))
                })
            })
            .collect::<Result<_, _>>()?,
        Some(_) => {
            return Err(CoreError::Validation(format!(
                "'{key}' must be a string or an array of strings"
            )))
        }
    };
    raw.into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(validated_address)
        .collect()
}

fn parse_date(s: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(s).map(|dt| dt.date_naive()))
        .map_err(|_| {
            CoreError::Validation(format!(
                "'{s}' is not a valid date (expected YYYY-MM-DD or RFC 3339)"
            ))
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
