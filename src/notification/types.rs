use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a toast, stable for its whole lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToastId(Uuid);

impl ToastId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ToastId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ToastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Semantic category of a toast. Affects presentation only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Success,
    Error,
    Warning,
    #[default]
    Info,
}

impl Variant {
    /// Default heading used by renderers when a toast carries no title
    pub fn label(&self) -> &'static str {
        match self {
            Variant::Success => "Success",
            Variant::Error => "Error",
            Variant::Warning => "Warning",
            Variant::Info => "Info",
        }
    }
}

/// Lifecycle phase of a toast.
///
/// Renderers should treat this as an animation hint only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Just created, enter animation not started yet
    Entering,
    /// Fully shown
    Visible,
    /// Exit animation running; removal follows after the exit delay
    Leaving,
}

/// Screen corner the toast stack is anchored to (presentation only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    #[default]
    TopRight,
    TopLeft,
    BottomRight,
    BottomLeft,
}

/// Order in which the published snapshot lists toasts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum StackOrder {
    /// Insertion order, newest last
    #[default]
    OldestFirst,
    /// Reverse insertion order, newest on top
    NewestFirst,
}

/// A live toast as seen by observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Toast {
    pub id: ToastId,
    pub variant: Variant,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub message: String,
    /// Auto-dismiss delay
    #[serde(rename = "duration_ms", with = "duration_ms")]
    pub duration: Duration,
    pub phase: Phase,
    pub created_at: DateTime<Utc>,
}

impl Toast {
    /// Materialize a toast from caller input, filling defaults
    pub fn from_input(input: ToastInput, default_duration: Duration) -> Self {
        Self {
            id: ToastId::new(),
            variant: input.variant.unwrap_or_default(),
            title: input.title,
            message: input.message,
            duration: input.duration.unwrap_or(default_duration),
            phase: Phase::Entering,
            created_at: Utc::now(),
        }
    }

    /// Title if present, otherwise the variant label
    pub fn heading(&self) -> &str {
        self.title.as_deref().unwrap_or_else(|| self.variant.label())
    }

    pub fn is_leaving(&self) -> bool {
        self.phase == Phase::Leaving
    }
}

/// Caller input for `show`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToastInput {
    #[serde(default)]
    pub title: Option<String>,
    pub message: String,
    #[serde(default)]
    pub variant: Option<Variant>,
    #[serde(default, with = "opt_duration_ms")]
    pub duration: Option<Duration>,
}

impl ToastInput {
    /// Create an input with only a message; variant and duration use defaults
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message).variant(Variant::Success)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message).variant(Variant::Error)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message).variant(Variant::Warning)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message).variant(Variant::Info)
    }

    /// Set the title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the variant
    pub fn variant(mut self, variant: Variant) -> Self {
        self.variant = Some(variant);
        self
    }

    /// Override the scope's default duration
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Override the duration in milliseconds. Non-positive values mean "dismiss at once".
    pub fn duration_ms(self, millis: i64) -> Self {
        self.duration(Duration::from_millis(millis.max(0) as u64))
    }
}

impl From<&str> for ToastInput {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for ToastInput {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

mod opt_duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        // Negative values collapse to zero
        Ok(Option::<i64>::deserialize(d)?.map(|ms| Duration::from_millis(ms.max(0) as u64)))
    }
}
